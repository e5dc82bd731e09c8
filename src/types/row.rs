use serde::Serialize;

use super::cell::{Cell, RowIndex};

/// Row metadata carried alongside the cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowMeta {
    pub row_index: RowIndex,
    /// Tree depth; `None` is treated as depth 0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_leaf: Option<bool>,
}

/// An ordered sequence of cells, one per column
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub cells: Vec<Cell>,
    pub meta: RowMeta,
}

impl Row {
    pub fn row_index(&self) -> RowIndex {
        self.meta.row_index
    }

    pub fn depth(&self) -> u32 {
        self.meta.indent.unwrap_or(0)
    }

    pub fn cell(&self, col_index: usize) -> Option<&Cell> {
        self.cells.get(col_index)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
