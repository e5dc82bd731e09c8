use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::cell::{CellValue, Formatter};

/// Id of the injected row-index column.
pub const ROW_INDEX_COLUMN_ID: &str = "_rowIndex";
/// Id of the injected checkbox column.
pub const CHECKBOX_COLUMN_ID: &str = "_checkbox";

/// Horizontal alignment of a column's content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    pub fn as_css(self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
        }
    }
}

/// Sort state of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    None,
    Asc,
    Desc,
}

impl SortOrder {
    /// Header-click cycle: none → asc → desc → none.
    pub fn next(self) -> Self {
        match self {
            SortOrder::None => SortOrder::Asc,
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::None,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            SortOrder::None => SortOrder::None,
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Some(SortOrder::None),
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// How a column's content compares when sorting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Raw `<` / `>` comparison of the content.
    #[default]
    Text,
    Number,
    Date,
    /// Uses the column's installed [`Comparator`]; falls back to `Text`.
    Custom,
}

/// Which injected column a column is, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Synthetic {
    RowIndex,
    Checkbox,
}

/// Pluggable sort comparator for `ColumnKind::Custom`.
#[derive(Clone)]
pub struct Comparator(Rc<dyn Fn(&CellValue, &CellValue) -> Ordering>);

impl Comparator {
    pub fn new(f: impl Fn(&CellValue, &CellValue) -> Ordering + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn compare(&self, a: &CellValue, b: &CellValue) -> Ordering {
        (self.0)(a, b)
    }
}

impl fmt::Debug for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Comparator(..)")
    }
}

/// A column of the table
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    pub content: String,
    pub col_index: usize,
    pub align: Align,
    pub sort_order: SortOrder,
    pub editable: bool,
    pub sortable: bool,
    pub resizable: bool,
    pub focusable: bool,
    pub dropdown: bool,
    pub width: Option<f32>,
    pub min_width: Option<f32>,
    pub kind: ColumnKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthetic: Option<Synthetic>,
    #[serde(skip)]
    pub format: Option<Formatter>,
    #[serde(skip)]
    pub comparator: Option<Comparator>,
}

impl Column {
    /// A plain user column with default flags.
    pub fn new(id: impl Into<String>, content: impl Into<String>, col_index: usize) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            col_index,
            align: Align::Left,
            sort_order: SortOrder::None,
            editable: true,
            sortable: true,
            resizable: true,
            focusable: true,
            dropdown: true,
            width: None,
            min_width: None,
            kind: ColumnKind::Text,
            synthetic: None,
            format: None,
            comparator: None,
        }
    }

    pub(crate) fn checkbox(col_index: usize) -> Self {
        Self {
            width: Some(32.0),
            ..Self::pinned(CHECKBOX_COLUMN_ID, "", col_index, Synthetic::Checkbox)
        }
    }

    pub(crate) fn row_index(col_index: usize) -> Self {
        Self {
            align: Align::Right,
            ..Self::pinned(ROW_INDEX_COLUMN_ID, "", col_index, Synthetic::RowIndex)
        }
    }

    fn pinned(id: &str, content: &str, col_index: usize, synthetic: Synthetic) -> Self {
        Self {
            editable: false,
            sortable: false,
            resizable: false,
            focusable: false,
            dropdown: false,
            synthetic: Some(synthetic),
            ..Self::new(id, content, col_index)
        }
    }

    /// True for the injected row-index / checkbox columns.
    pub fn is_standard(&self) -> bool {
        self.synthetic.is_some()
    }

    /// Display text for a value in this column.
    pub fn format_value(&self, value: &CellValue) -> String {
        match &self.format {
            Some(f) => f.format(value),
            None => value.display(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_cycle() {
        assert_eq!(SortOrder::None.next(), SortOrder::Asc);
        assert_eq!(SortOrder::Asc.next(), SortOrder::Desc);
        assert_eq!(SortOrder::Desc.next(), SortOrder::None);
    }

    #[test]
    fn test_synthetic_columns_are_pinned() {
        let cb = Column::checkbox(0);
        assert!(cb.is_standard());
        assert!(!cb.focusable && !cb.sortable && !cb.resizable && !cb.editable);
        let ri = Column::row_index(1);
        assert_eq!(ri.id, ROW_INDEX_COLUMN_ID);
        assert_eq!(ri.align, Align::Right);
    }

    #[test]
    fn test_column_serializes_camel_case() {
        let col = Column::new("name", "Name", 2);
        let json = serde_json::to_value(&col).unwrap_or_default();
        assert_eq!(json["colIndex"], 2);
        assert_eq!(json["sortOrder"], "none");
    }
}
