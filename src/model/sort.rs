//! Cell comparators used by `sortRows`.
//!
//! `Text` columns keep the coarse raw comparison (what `<` / `>` do on the
//! content); `Number` and `Date` columns opt into typed ordering.

use std::cmp::Ordering;

use crate::types::{CellValue, Column, ColumnKind};

/// Compare two cells of `column` in ascending order.
pub fn compare_cells(column: &Column, a: &CellValue, b: &CellValue) -> Ordering {
    match column.kind {
        ColumnKind::Text => raw_compare(a, b),
        ColumnKind::Number => compare_with_fallback(a.as_number(), b.as_number()),
        ColumnKind::Date => compare_with_fallback(parse_date(a), parse_date(b)),
        ColumnKind::Custom => match &column.comparator {
            Some(comparator) => comparator.compare(a, b),
            None => raw_compare(a, b),
        },
    }
}

/// Raw operator semantics: numbers numerically, strings lexicographically,
/// mixed pairs coerce the string to a number and tie when that fails.
pub fn raw_compare(a: &CellValue, b: &CellValue) -> Ordering {
    match (a, b) {
        (CellValue::Number(x), CellValue::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (CellValue::Number(x), other) => coerce(other)
            .and_then(|y| x.partial_cmp(&y))
            .unwrap_or(Ordering::Equal),
        (other, CellValue::Number(y)) => coerce(other)
            .and_then(|x| x.partial_cmp(y))
            .unwrap_or(Ordering::Equal),
        _ => text_of(a).cmp(text_of(b)),
    }
}

fn text_of(value: &CellValue) -> &str {
    match value {
        CellValue::Text(s) => s,
        _ => "",
    }
}

/// String-to-number coercion: blank is 0, unparseable is NaN (`None`).
fn coerce(value: &CellValue) -> Option<f64> {
    let text = text_of(value).trim();
    if text.is_empty() {
        Some(0.0)
    } else {
        text.parse::<f64>().ok()
    }
}

/// Values that parse order before those that do not.
fn compare_with_fallback<T: PartialOrd>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Parse `YYYY-MM-DD` / `YYYY/MM/DD` with optional `HH:MM[:SS]` into a
/// sortable tuple.
fn parse_date(value: &CellValue) -> Option<(i64, u32, u32, u32, u32, u32)> {
    let CellValue::Text(text) = value else {
        return None;
    };
    let text = text.trim();
    let (date, time) = match text.split_once(|c: char| c == ' ' || c == 'T') {
        Some((d, t)) => (d, Some(t)),
        None => (text, None),
    };
    let mut parts = date.split(['-', '/']);
    let year = parts.next()?.parse::<i64>().ok()?;
    let month = parts.next()?.parse::<u32>().ok().filter(|m| (1..=12).contains(m))?;
    let day = parts.next()?.parse::<u32>().ok().filter(|d| (1..=31).contains(d))?;
    if parts.next().is_some() {
        return None;
    }
    let (hour, minute, second) = match time {
        Some(t) => {
            let mut hms = t.trim_end_matches('Z').split(':');
            let h = hms.next()?.parse::<u32>().ok()?;
            let m = hms.next()?.parse::<u32>().ok()?;
            let s = match hms.next() {
                Some(s) => s.split('.').next()?.parse::<u32>().ok()?,
                None => 0,
            };
            (h, m, s)
        }
        None => (0, 0, 0),
    };
    Some((year, month, day, hour, minute, second))
}
