use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Stable row identity, assigned once at ingestion and never reused.
pub type RowIndex = u32;

/// Identity of a cell: `(rowIndex, colIndex)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRef {
    pub row_index: RowIndex,
    pub col_index: usize,
}

impl CellRef {
    pub fn new(row_index: RowIndex, col_index: usize) -> Self {
        Self {
            row_index,
            col_index,
        }
    }
}

/// Raw cell content: a string, a number, or nothing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl CellValue {
    /// Convert a JSON primitive into cell content.
    ///
    /// Booleans become `true` / `false` text; arrays and objects are
    /// stringified so nothing is silently dropped.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => CellValue::Empty,
            serde_json::Value::Bool(b) => CellValue::Text(b.to_string()),
            serde_json::Value::Number(n) => n.as_f64().map_or(CellValue::Empty, CellValue::Number),
            serde_json::Value::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// Numeric view of the content.
    ///
    /// Text is trimmed and thousands separators are ignored; anything that
    /// still fails to parse yields `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::Number(_) | CellValue::Empty => None,
            CellValue::Text(s) => parse_number(s),
        }
    }

    /// Default display text.
    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// Lenient number parsing used by filters and numeric columns.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let cleaned: String = trimmed.chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Integers print without a fractional part, like JS number-to-string.
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        #[allow(clippy::cast_possible_truncation)]
        let whole = n as i64;
        whole.to_string()
    } else {
        n.to_string()
    }
}

/// Display formatter attached to a column or a single cell.
#[derive(Clone)]
pub struct Formatter(Rc<dyn Fn(&CellValue) -> String>);

impl Formatter {
    pub fn new(f: impl Fn(&CellValue) -> String + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn format(&self, value: &CellValue) -> String {
        (self.0)(value)
    }
}

impl fmt::Debug for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Formatter(..)")
    }
}

/// A single cell of a row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub row_index: RowIndex,
    pub col_index: usize,
    pub content: CellValue,
    /// Per-cell override; `None` inherits the column's flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editable: Option<bool>,
    #[serde(skip)]
    pub format: Option<Formatter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent: Option<u32>,
}

impl Cell {
    pub fn new(row_index: RowIndex, col_index: usize, content: CellValue) -> Self {
        Self {
            row_index,
            col_index,
            content,
            editable: None,
            format: None,
            indent: None,
        }
    }

    pub fn cell_ref(&self) -> CellRef {
        CellRef::new(self.row_index, self.col_index)
    }
}

/// Partial update for a cell; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct CellPatch {
    pub content: Option<CellValue>,
    pub editable: Option<bool>,
    pub format: Option<Formatter>,
}

impl CellPatch {
    pub fn content(value: impl Into<CellValue>) -> Self {
        Self {
            content: Some(value.into()),
            ..Self::default()
        }
    }
}
