//! Validation and normalisation of raw `columns` / `data` input.
//!
//! This is the only validated boundary of the model: everything downstream
//! assumes the shapes produced here.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{DataError, Result};
use crate::types::{
    Align, CellValue, Column, ColumnKind, CHECKBOX_COLUMN_ID, ROW_INDEX_COLUMN_ID,
};

/// A user column definition before it is placed in the model
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnDef {
    pub id: Option<String>,
    #[serde(alias = "name")]
    pub content: Option<String>,
    pub align: Option<Align>,
    pub width: Option<f32>,
    pub min_width: Option<f32>,
    pub editable: Option<bool>,
    pub sortable: Option<bool>,
    pub resizable: Option<bool>,
    pub focusable: Option<bool>,
    pub dropdown: Option<bool>,
    pub kind: Option<ColumnKind>,
}

impl ColumnDef {
    pub fn named(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    fn into_column(self, id: String, col_index: usize) -> Column {
        let defaults = Column::new(String::new(), String::new(), col_index);
        Column {
            id,
            content: self.content.unwrap_or_default(),
            align: self.align.unwrap_or(defaults.align),
            width: self.width,
            min_width: self.min_width,
            editable: self.editable.unwrap_or(defaults.editable),
            sortable: self.sortable.unwrap_or(defaults.sortable),
            resizable: self.resizable.unwrap_or(defaults.resizable),
            focusable: self.focusable.unwrap_or(defaults.focusable),
            dropdown: self.dropdown.unwrap_or(defaults.dropdown),
            kind: self.kind.unwrap_or(defaults.kind),
            ..defaults
        }
    }
}

/// One input cell: content plus optional per-cell overrides
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellInput {
    pub content: CellValue,
    pub editable: Option<bool>,
    pub indent: Option<u32>,
}

/// One input row, normalised to the user-column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowInput {
    pub cells: Vec<CellInput>,
    pub indent: Option<u32>,
}

/// Validate `columns`: an array whose items are strings or objects.
///
/// # Errors
/// Returns [`DataError::Columns`] for any other shape.
pub fn parse_columns(columns: &Value) -> Result<Vec<ColumnDef>> {
    let Value::Array(items) = columns else {
        return Err(DataError::Columns.into());
    };
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(ColumnDef::named(s.clone())),
            Value::Object(_) => {
                serde_json::from_value(item.clone()).map_err(|_| DataError::Columns.into())
            }
            _ => Err(DataError::Columns.into()),
        })
        .collect()
}

/// Validate `data`: an array of arrays or an array of records.
///
/// Records are resolved against `columns` by id first, then by display
/// content; missing keys become empty cells. `null` data is an empty table.
///
/// # Errors
/// Returns [`DataError::Rows`] for any other shape.
pub fn parse_rows(data: &Value, columns: &[Column]) -> Result<Vec<RowInput>> {
    let items = match data {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        _ => return Err(DataError::Rows.into()),
    };
    items
        .iter()
        .map(|item| match item {
            Value::Array(cells) => Ok(RowInput {
                cells: cells.iter().map(parse_cell).collect(),
                indent: None,
            }),
            Value::Object(record) => Ok(record_to_row(record, columns)),
            _ => Err(DataError::Rows.into()),
        })
        .collect()
}

fn record_to_row(record: &Map<String, Value>, columns: &[Column]) -> RowInput {
    let cells = columns
        .iter()
        .map(|column| {
            record
                .get(&column.id)
                .or_else(|| record.get(&column.content))
                .map(parse_cell)
                .unwrap_or_default()
        })
        .collect();
    RowInput {
        cells,
        indent: record.get("indent").and_then(value_as_u32),
    }
}

fn parse_cell(value: &Value) -> CellInput {
    match value {
        Value::Object(obj) => CellInput {
            content: obj.get("content").map(CellValue::from_json).unwrap_or_default(),
            editable: obj.get("editable").and_then(Value::as_bool),
            indent: obj.get("indent").and_then(value_as_u32),
        },
        other => CellInput {
            content: CellValue::from_json(other),
            ..CellInput::default()
        },
    }
}

fn value_as_u32(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|n| u32::try_from(n).ok())
}

/// Derive a column id from its display content.
///
/// Lower-cased; each run of non-alphanumeric characters becomes one `-`.
pub fn identify(content: &str) -> String {
    let mut id = String::with_capacity(content.len());
    let mut pending_dash = false;
    for ch in content.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !id.is_empty() {
                id.push('-');
            }
            pending_dash = false;
            id.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if id.is_empty() {
        "column".to_string()
    } else {
        id
    }
}

/// Turn definitions into columns starting at `first_index`, keeping ids unique.
pub(crate) fn build_columns(
    defs: Vec<ColumnDef>,
    first_index: usize,
    taken: &mut HashSet<String>,
) -> Vec<Column> {
    defs.into_iter()
        .enumerate()
        .map(|(offset, def)| {
            let base = def
                .id
                .clone()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| identify(def.content.as_deref().unwrap_or_default()));
            let id = unique_id(&base, taken);
            def.into_column(id, first_index + offset)
        })
        .collect()
}

/// Ids that `columns` resolve to once placed after the synthetic columns.
///
/// # Errors
/// Returns [`DataError::Columns`] for malformed definitions.
pub fn resolve_ids(columns: &Value) -> Result<Vec<String>> {
    let mut taken: HashSet<String> = [ROW_INDEX_COLUMN_ID, CHECKBOX_COLUMN_ID]
        .into_iter()
        .map(String::from)
        .collect();
    Ok(build_columns(parse_columns(columns)?, 0, &mut taken)
        .into_iter()
        .map(|c| c.id)
        .collect())
}

fn unique_id(base: &str, taken: &mut HashSet<String>) -> String {
    let mut candidate = base.to_string();
    let mut suffix = 2;
    while taken.contains(&candidate) {
        candidate = format!("{base}-{suffix}");
        suffix += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case("Name", "name")]
    #[test_case("Start Date", "start-date")]
    #[test_case("  Salary ($) ", "salary")]
    #[test_case("!!!", "column")]
    fn test_identify(content: &str, expected: &str) {
        assert_eq!(identify(content), expected);
    }

    #[test]
    fn test_columns_must_be_array_of_strings_or_objects() {
        assert!(parse_columns(&json!(["Name", {"name": "Position"}])).is_ok());
        let err = parse_columns(&json!("Name")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "DataError: columns must be array-or-string-or-object"
        );
        assert!(parse_columns(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_data_must_be_arrays_or_records() {
        let err = parse_rows(&json!([1, 2]), &[]).unwrap_err();
        assert_eq!(err.to_string(), "DataError: data must be array of arrays or objects");
        assert!(parse_rows(&json!({"a": 1}), &[]).is_err());
        assert!(parse_rows(&json!(null), &[]).unwrap().is_empty());
    }

    #[test]
    fn test_records_resolve_by_id_then_content() {
        let mut taken = HashSet::new();
        let columns = build_columns(
            vec![ColumnDef::named("Name"), ColumnDef::named("Office Location")],
            0,
            &mut taken,
        );
        let rows = parse_rows(
            &json!([{"name": "Faris", "Office Location": "Berlin", "indent": 1}]),
            &columns,
        )
        .unwrap();
        assert_eq!(rows[0].cells[0].content, CellValue::from("Faris"));
        assert_eq!(rows[0].cells[1].content, CellValue::from("Berlin"));
        assert_eq!(rows[0].indent, Some(1));
    }

    #[test]
    fn test_duplicate_ids_get_suffix() {
        let mut taken = HashSet::new();
        let columns = build_columns(
            vec![ColumnDef::named("Name"), ColumnDef::named("name")],
            2,
            &mut taken,
        );
        assert_eq!(columns[0].id, "name");
        assert_eq!(columns[1].id, "name-2");
        assert_eq!(columns[1].col_index, 3);
    }

    #[test]
    fn test_resolve_ids_matches_model() {
        let ids = resolve_ids(&json!(["Name", {"id": "pos", "name": "Position"}, "Name"])).unwrap();
        assert_eq!(ids, vec!["name", "pos", "name-2"]);
    }

    #[test]
    fn test_cell_objects() {
        let rows = parse_rows(&json!([[{"content": 5, "editable": false}, "x"]]), &[]).unwrap();
        assert_eq!(rows[0].cells[0].content, CellValue::Number(5.0));
        assert_eq!(rows[0].cells[0].editable, Some(false));
    }
}
