//! Structured error types for datagrid.
//!
//! Validation failures at the ingestion boundary surface as [`DataError`];
//! everything else the public API can reject is a [`GridError`].

/// Malformed `columns` / `data` input, raised by `init` and `refresh` only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataError {
    /// `columns` was not an array of strings or objects.
    #[error("columns must be array-or-string-or-object")]
    Columns,

    /// `data` was not an array of arrays or an array of records.
    #[error("data must be array of arrays or objects")]
    Rows,
}

/// All errors that can occur while building or driving a grid.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// Input validation error.
    #[error("DataError: {0}")]
    Data(#[from] DataError),

    /// Malformed construction options.
    #[error("Invalid options: {0}")]
    Options(String),

    /// Column index (possibly negative) that does not resolve to a column.
    #[error("Column index out of range: {0}")]
    ColumnOutOfRange(isize),

    /// Row identity that was never assigned.
    #[error("Row index out of range: {0}")]
    RowOutOfRange(u32),

    /// Swap or removal touching a row-index / checkbox column.
    #[error("Column {0} is pinned and cannot be moved or removed")]
    PinnedColumn(usize),

    /// JSON (de)serialization error.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The grid was already torn down.
    #[error("Grid has been destroyed")]
    Destroyed,

    /// Catch-all for string errors.
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GridError>;

impl From<String> for GridError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for GridError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<GridError> for wasm_bindgen::JsValue {
    fn from(e: GridError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
