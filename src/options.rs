//! Construction options.
//!
//! Mirrors the JS options object: camelCase keys plus the legacy aliases
//! (`addSerialNoColumn`, `enableClusterize`, `rows`, ...). Callbacks such as
//! `getEditor` or `events` are not serialisable and travel separately in
//! [`crate::grid::GridHooks`].

use serde::Deserialize;

use crate::error::{GridError, Result};

/// Column width distribution policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Natural (content) widths.
    #[default]
    Fixed,
    /// Natural widths stretched to fill the container.
    Fluid,
    /// Container split proportionally by declared integer weights.
    Ratio,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridOptions {
    pub columns: serde_json::Value,
    #[serde(alias = "rows")]
    pub data: serde_json::Value,
    #[serde(alias = "addSerialNoColumn")]
    pub serial_no_column: bool,
    #[serde(alias = "addCheckboxColumn")]
    pub checkbox_column: bool,
    #[serde(alias = "enableClusterize")]
    pub clusterize: bool,
    pub layout: Layout,
    #[serde(alias = "enableInlineFilters")]
    pub inline_filters: bool,
    pub tree_view: bool,
    pub cell_height: Option<f32>,
    pub no_data_message: String,
    pub freeze_message: String,
    pub show_total_row: bool,
    /// Quiet period before an inline filter keystroke is applied.
    pub filter_debounce_ms: f64,
    /// Rows per virtualization block.
    pub rows_in_block: usize,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            columns: serde_json::Value::Array(Vec::new()),
            data: serde_json::Value::Array(Vec::new()),
            serial_no_column: true,
            checkbox_column: false,
            clusterize: true,
            layout: Layout::Fixed,
            inline_filters: false,
            tree_view: false,
            cell_height: None,
            no_data_message: "No Data".to_string(),
            freeze_message: String::new(),
            show_total_row: false,
            filter_debounce_ms: 300.0,
            rows_in_block: 50,
        }
    }
}

impl GridOptions {
    /// Parse options from a JSON document.
    ///
    /// # Errors
    /// Returns an error if the document is not a JSON object of options.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Build options from an already-parsed JSON value.
    ///
    /// # Errors
    /// Returns an error if the value is not an object or a key has the wrong type.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        if !value.is_object() {
            return Err(GridError::Options("options must be an object".into()));
        }
        serde_json::from_value(value).map_err(|e| GridError::Options(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = GridOptions::from_json("{}").unwrap();
        assert!(opts.serial_no_column);
        assert!(!opts.checkbox_column);
        assert!(opts.clusterize);
        assert_eq!(opts.layout, Layout::Fixed);
        assert_eq!(opts.no_data_message, "No Data");
        assert_eq!(opts.filter_debounce_ms, 300.0);
    }

    #[test]
    fn test_legacy_aliases() {
        let opts = GridOptions::from_json(
            r#"{"addSerialNoColumn": false, "addCheckboxColumn": true,
                "enableClusterize": false, "enableInlineFilters": true,
                "rows": [["a"]], "layout": "fluid"}"#,
        )
        .unwrap();
        assert!(!opts.serial_no_column);
        assert!(opts.checkbox_column);
        assert!(!opts.clusterize);
        assert!(opts.inline_filters);
        assert_eq!(opts.layout, Layout::Fluid);
        assert_eq!(opts.data, serde_json::json!([["a"]]));
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(GridOptions::from_json("[1, 2]").is_err());
        assert!(GridOptions::from_json(r#"{"layout": "diagonal"}"#).is_err());
    }
}
