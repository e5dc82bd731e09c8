//! Inline filter classification and matching.
//!
//! Filter text typed into a column's input is guessed into a [`FilterRule`]:
//!
//! | text        | rule                  |
//! |-------------|-----------------------|
//! | `>x`, `<x`  | greater / less than   |
//! | `=x`        | equals                |
//! | `!=x`       | not equals            |
//! | `a:b`       | inclusive range       |
//! | `42`        | equals (numeric)      |
//! | other       | contains (ignore case)|
//!
//! Comparisons are numeric when both the cell and the operand parse as
//! numbers, string-based otherwise.

use std::cmp::Ordering;

use crate::types::{parse_number, CellValue};

#[derive(Debug, Clone, PartialEq)]
pub enum FilterRule {
    Contains(String),
    Equals(String),
    NotEquals(String),
    GreaterThan(String),
    LessThan(String),
    Range(f64, f64),
}

impl FilterRule {
    /// Guess the rule for the given filter text; `None` means "no filter".
    pub fn parse(keyword: &str) -> Option<Self> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return None;
        }

        let operand = |prefix: &str| {
            keyword
                .strip_prefix(prefix)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        if let Some(rest) = operand("!=") {
            return Some(FilterRule::NotEquals(rest));
        }
        if let Some(rest) = operand(">") {
            return Some(FilterRule::GreaterThan(rest));
        }
        if let Some(rest) = operand("<") {
            return Some(FilterRule::LessThan(rest));
        }
        if let Some(rest) = operand("=") {
            return Some(FilterRule::Equals(rest));
        }
        if parse_number(keyword).is_some() {
            return Some(FilterRule::Equals(keyword.to_string()));
        }
        if let Some((lo, hi)) = keyword.split_once(':') {
            if let (Some(lo), Some(hi)) = (parse_number(lo), parse_number(hi)) {
                return Some(FilterRule::Range(lo.min(hi), lo.max(hi)));
            }
        }
        Some(FilterRule::Contains(keyword.to_string()))
    }

    /// Does a cell pass this rule?
    ///
    /// `text` is the formatted display text of the cell, `value` its content.
    pub fn matches(&self, text: &str, value: &CellValue) -> bool {
        match self {
            FilterRule::Contains(needle) => text.to_lowercase().contains(&needle.to_lowercase()),
            FilterRule::Equals(operand) => compare(text, value, operand) == Some(Ordering::Equal),
            FilterRule::NotEquals(operand) => {
                compare(text, value, operand) != Some(Ordering::Equal)
            }
            FilterRule::GreaterThan(operand) => {
                compare(text, value, operand) == Some(Ordering::Greater)
            }
            FilterRule::LessThan(operand) => compare(text, value, operand) == Some(Ordering::Less),
            FilterRule::Range(lo, hi) => cell_number(text, value)
                .is_some_and(|n| n >= *lo && n <= *hi),
        }
    }
}

fn cell_number(text: &str, value: &CellValue) -> Option<f64> {
    value.as_number().or_else(|| parse_number(text))
}

/// Order the cell against the operand.
///
/// A numeric operand against a non-numeric cell never compares (`None`).
fn compare(text: &str, value: &CellValue, operand: &str) -> Option<Ordering> {
    match parse_number(operand) {
        Some(rhs) => cell_number(text, value).and_then(|lhs| lhs.partial_cmp(&rhs)),
        None => Some(text.to_lowercase().cmp(&operand.to_lowercase())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("", None ; "empty")]
    #[test_case("> 6000", Some(FilterRule::GreaterThan("6000".into())) ; "greater")]
    #[test_case("<10", Some(FilterRule::LessThan("10".into())) ; "less")]
    #[test_case("=Tokyo", Some(FilterRule::Equals("Tokyo".into())) ; "equals")]
    #[test_case("!=Tokyo", Some(FilterRule::NotEquals("Tokyo".into())) ; "not equals")]
    #[test_case("42", Some(FilterRule::Equals("42".into())) ; "plain number")]
    #[test_case("10:20", Some(FilterRule::Range(10.0, 20.0)) ; "range")]
    #[test_case("20:10", Some(FilterRule::Range(10.0, 20.0)) ; "reversed range")]
    #[test_case("lon", Some(FilterRule::Contains("lon".into())) ; "contains")]
    #[test_case(">", Some(FilterRule::Contains(">".into())) ; "bare operator")]
    fn test_parse(keyword: &str, expected: Option<FilterRule>) {
        assert_eq!(FilterRule::parse(keyword), expected);
    }

    #[test]
    fn test_greater_than_numeric() {
        let rule = FilterRule::parse("> 6000").unwrap_or(FilterRule::Contains(String::new()));
        assert!(rule.matches("7000", &CellValue::Number(7000.0)));
        assert!(!rule.matches("6000", &CellValue::Number(6000.0)));
        assert!(!rule.matches("n/a", &CellValue::from("n/a")));
        assert!(rule.matches("$6,500", &CellValue::from("6,500")));
    }

    #[test]
    fn test_contains_ignores_case() {
        let rule = FilterRule::Contains("LON".into());
        assert!(rule.matches("London", &CellValue::from("London")));
        assert!(!rule.matches("Tokyo", &CellValue::from("Tokyo")));
    }

    #[test]
    fn test_range_and_not_equals() {
        let range = FilterRule::Range(10.0, 20.0);
        assert!(range.matches("10", &CellValue::Number(10.0)));
        assert!(!range.matches("21", &CellValue::Number(21.0)));
        let ne = FilterRule::NotEquals("tokyo".into());
        assert!(!ne.matches("Tokyo", &CellValue::from("Tokyo")));
        assert!(ne.matches("London", &CellValue::from("London")));
    }
}
