//! In-memory tabular data model.
//!
//! `TabularModel` owns columns, rows and the view order. It knows nothing
//! about the DOM. Every mutation keeps two invariants:
//! - every row has exactly one cell per column, with `cells[i].col_index == i`
//! - column `col_index` values are the contiguous range `0..columns.len()`

mod filter;
mod ingest;
mod sort;
mod tree;
mod view_order;

use std::collections::HashSet;

use serde_json::Value;

pub use filter::FilterRule;
pub use ingest::{
    identify, parse_columns, parse_rows, resolve_ids, CellInput, ColumnDef, RowInput,
};
pub use sort::{compare_cells, raw_compare};
pub use view_order::ViewOrder;

use crate::error::{GridError, Result};
use crate::types::{
    Cell, CellPatch, CellRef, CellValue, Column, Row, RowIndex, RowMeta, SortOrder, Synthetic,
};

/// Which synthetic columns to inject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModelConfig {
    pub checkbox_column: bool,
    pub serial_no_column: bool,
}

/// Outcome of a filter pass, as row identities in storage order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterResult {
    pub rows_to_show: Vec<RowIndex>,
    pub rows_to_hide: Vec<RowIndex>,
}

#[derive(Debug, Clone, Default)]
pub struct TabularModel {
    config: ModelConfig,
    columns: Vec<Column>,
    /// Indexed by row identity.
    rows: Vec<Row>,
    view_order: ViewOrder,
    /// Latest filter pass; `None` when no filter is active.
    shown: Option<HashSet<RowIndex>>,
    next_row_index: RowIndex,
}

impl TabularModel {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Replace all columns and rows.
    ///
    /// Synthetic columns come first, then user columns; row identities are
    /// re-assigned from zero.
    ///
    /// # Errors
    /// Returns a [`crate::error::DataError`] for malformed `columns` or `data`.
    pub fn init(&mut self, columns: &Value, data: &Value) -> Result<()> {
        let defs = parse_columns(columns)?;
        let columns = self.build_column_set(defs);
        let inputs = parse_rows(data, user_columns(&columns))?;

        self.columns = columns;
        self.rows.clear();
        self.view_order = ViewOrder::default();
        self.shown = None;
        self.next_row_index = 0;
        self.push_rows(inputs);
        log::debug!(
            "model init: {} columns, {} rows",
            self.columns.len(),
            self.rows.len()
        );
        Ok(())
    }

    /// Replace the rows, keeping the current columns.
    ///
    /// # Errors
    /// Returns a [`crate::error::DataError`] for malformed `data`.
    pub fn refresh_rows(&mut self, data: &Value) -> Result<()> {
        let inputs = parse_rows(data, user_columns(&self.columns))?;
        for column in &mut self.columns {
            column.sort_order = SortOrder::None;
        }
        self.rows.clear();
        self.view_order = ViewOrder::default();
        self.shown = None;
        self.next_row_index = 0;
        self.push_rows(inputs);
        Ok(())
    }

    /// Append rows without touching existing state.
    ///
    /// New rows join the end of the view order; an active sort is re-applied.
    ///
    /// # Errors
    /// Returns a [`crate::error::DataError`] for malformed `data`.
    pub fn append_rows(&mut self, data: &Value) -> Result<Vec<RowIndex>> {
        let inputs = parse_rows(data, user_columns(&self.columns))?;
        let added = self.push_rows(inputs);
        if let Some((col_index, order)) = self.current_sort() {
            self.resort(col_index, order);
        }
        Ok(added)
    }

    fn build_column_set(&self, defs: Vec<ColumnDef>) -> Vec<Column> {
        let mut columns = Vec::new();
        if self.config.checkbox_column {
            columns.push(Column::checkbox(columns.len()));
        }
        if self.config.serial_no_column {
            columns.push(Column::row_index(columns.len()));
        }
        let mut taken: HashSet<String> = columns.iter().map(|c| c.id.clone()).collect();
        let first = columns.len();
        columns.extend(ingest::build_columns(defs, first, &mut taken));
        columns
    }

    fn push_rows(&mut self, inputs: Vec<RowInput>) -> Vec<RowIndex> {
        let mut added = Vec::with_capacity(inputs.len());
        for input in inputs {
            let row_index = self.next_row_index;
            self.next_row_index += 1;
            let row = self.build_row(row_index, input);
            self.rows.push(row);
            self.view_order.push(row_index);
            added.push(row_index);
        }
        tree::mark_leaves(&mut self.rows);
        added
    }

    fn build_row(&self, row_index: RowIndex, input: RowInput) -> Row {
        let mut user_cells = input.cells.into_iter();
        let cells = self
            .columns
            .iter()
            .map(|column| {
                let mut cell = Cell::new(row_index, column.col_index, CellValue::Empty);
                match column.synthetic {
                    Some(Synthetic::RowIndex) => {
                        cell.content = CellValue::Number(f64::from(row_index) + 1.0);
                    }
                    Some(Synthetic::Checkbox) => {}
                    None => {
                        if let Some(cin) = user_cells.next() {
                            cell.content = cin.content;
                            cell.editable = cin.editable;
                            cell.indent = cin.indent.or(input.indent);
                        }
                    }
                }
                cell
            })
            .collect();
        Row {
            cells,
            meta: RowMeta {
                row_index,
                indent: input.indent,
                is_leaf: None,
            },
        }
    }

    // ------------------------------------------------------------------
    // Sorting
    // ------------------------------------------------------------------

    /// Sort the view by one column.
    ///
    /// Exactly one column may carry a non-`none` order afterwards. Flipping
    /// the active column to the opposite order reverses the view in place.
    ///
    /// # Errors
    /// Returns [`GridError::ColumnOutOfRange`] for an unknown column.
    pub fn sort_rows(&mut self, col_index: usize, order: SortOrder) -> Result<()> {
        if col_index >= self.columns.len() {
            return Err(GridError::ColumnOutOfRange(to_signed(col_index)));
        }
        let current = self.current_sort();
        for column in &mut self.columns {
            column.sort_order = if column.col_index == col_index {
                order
            } else {
                SortOrder::None
            };
        }

        match order {
            SortOrder::None => self.view_order.reset(),
            _ if current == Some((col_index, order.opposite())) => self.view_order.reverse(),
            _ => self.resort(col_index, order),
        }
        log::trace!("sorted column {col_index} {order:?}");
        Ok(())
    }

    fn resort(&mut self, col_index: usize, order: SortOrder) {
        let Some(column) = self.columns.get(col_index) else {
            return;
        };
        let rows = &self.rows;
        let content = |row: &RowIndex| {
            usize::try_from(*row)
                .ok()
                .and_then(|i| rows.get(i))
                .and_then(|r| r.cell(col_index))
                .map(|c| &c.content)
        };
        let empty = CellValue::Empty;
        self.view_order.sort_by(|a, b| {
            let ordering = compare_cells(
                column,
                content(a).unwrap_or(&empty),
                content(b).unwrap_or(&empty),
            );
            if order == SortOrder::Desc {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }

    /// The single column with a non-`none` order, if any.
    pub fn current_sort(&self) -> Option<(usize, SortOrder)> {
        self.columns
            .iter()
            .find(|c| c.sort_order != SortOrder::None)
            .map(|c| (c.col_index, c.sort_order))
    }

    // ------------------------------------------------------------------
    // Filtering
    // ------------------------------------------------------------------

    /// AND-combine per-column rules over every stored row.
    ///
    /// Records the shown set for later view queries. An empty rule list
    /// clears filtering.
    pub fn filter_rows(&mut self, rules: &[(usize, FilterRule)]) -> FilterResult {
        let mut result = FilterResult::default();
        for row in &self.rows {
            let keep = rules.iter().all(|(col_index, rule)| {
                match (self.columns.get(*col_index), row.cell(*col_index)) {
                    (Some(column), Some(cell)) => {
                        let text = display_text(column, cell);
                        rule.matches(&text, &cell.content)
                    }
                    _ => true,
                }
            });
            if keep {
                result.rows_to_show.push(row.row_index());
            } else {
                result.rows_to_hide.push(row.row_index());
            }
        }
        self.shown = if rules.is_empty() {
            None
        } else {
            Some(result.rows_to_show.iter().copied().collect())
        };
        result
    }

    pub fn is_filtered(&self) -> bool {
        self.shown.is_some()
    }

    pub fn is_shown(&self, row: RowIndex) -> bool {
        self.shown.as_ref().map_or(true, |s| s.contains(&row))
    }

    /// Shown rows in storage order.
    pub fn shown_rows(&self) -> Vec<RowIndex> {
        self.rows
            .iter()
            .map(Row::row_index)
            .filter(|r| self.is_shown(*r))
            .collect()
    }

    // ------------------------------------------------------------------
    // Column structure
    // ------------------------------------------------------------------

    /// Swap two columns and every row's cells in lockstep.
    ///
    /// # Errors
    /// Rejects unknown columns and synthetic (pinned) columns.
    pub fn switch_column(&mut self, a: usize, b: usize) -> Result<()> {
        self.check_movable(a)?;
        self.check_movable(b)?;
        if a == b {
            return Ok(());
        }
        self.columns.swap(a, b);
        for row in &mut self.rows {
            row.cells.swap(a, b);
        }
        self.reindex_columns();
        Ok(())
    }

    /// Remove a column from the model and every row.
    ///
    /// # Errors
    /// Rejects unknown columns and synthetic (pinned) columns.
    pub fn remove_column(&mut self, col_index: usize) -> Result<Column> {
        self.check_movable(col_index)?;
        let removed = self.columns.remove(col_index);
        for row in &mut self.rows {
            if col_index < row.cells.len() {
                row.cells.remove(col_index);
            }
        }
        self.reindex_columns();
        Ok(removed)
    }

    fn check_movable(&self, col_index: usize) -> Result<()> {
        let column = self
            .columns
            .get(col_index)
            .ok_or(GridError::ColumnOutOfRange(to_signed(col_index)))?;
        if column.is_standard() {
            return Err(GridError::PinnedColumn(col_index));
        }
        Ok(())
    }

    fn reindex_columns(&mut self) {
        for (i, column) in self.columns.iter_mut().enumerate() {
            column.col_index = i;
        }
        for row in &mut self.rows {
            for (i, cell) in row.cells.iter_mut().enumerate() {
                cell.col_index = i;
            }
        }
    }

    /// Install a width on a column (resize commit).
    ///
    /// # Errors
    /// Returns [`GridError::ColumnOutOfRange`] for an unknown column.
    pub fn set_column_width(&mut self, col_index: usize, width: f32) -> Result<()> {
        let column = self
            .columns
            .get_mut(col_index)
            .ok_or(GridError::ColumnOutOfRange(to_signed(col_index)))?;
        column.width = Some(width);
        Ok(())
    }

    /// Mutable access for installing formatters and comparators.
    pub fn column_mut_by_id(&mut self, id: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.id == id)
    }

    // ------------------------------------------------------------------
    // Cell / row mutation
    // ------------------------------------------------------------------

    /// Patch one cell in place; `None` patch fields are no-ops.
    ///
    /// # Errors
    /// Returns an error if the cell does not exist.
    pub fn update_cell(&mut self, cell: CellRef, patch: CellPatch) -> Result<&Cell> {
        let target = self
            .row_mut(cell.row_index)?
            .cells
            .get_mut(cell.col_index)
            .ok_or(GridError::ColumnOutOfRange(to_signed(cell.col_index)))?;
        if let Some(content) = patch.content {
            target.content = content;
        }
        if let Some(editable) = patch.editable {
            target.editable = Some(editable);
        }
        if let Some(format) = patch.format {
            target.format = Some(format);
        }
        Ok(target)
    }

    /// Replace cell values of a row.
    ///
    /// `values` may cover just the user columns or the full row width;
    /// `None` entries leave their cell unchanged.
    ///
    /// # Errors
    /// Returns [`GridError::RowOutOfRange`] for an unknown row.
    pub fn update_row(&mut self, row_index: RowIndex, values: &[Option<CellValue>]) -> Result<()> {
        let full_width = values.len() == self.columns.len();
        let targets: Vec<usize> = self
            .columns
            .iter()
            .filter(|c| full_width || !c.is_standard())
            .map(|c| c.col_index)
            .collect();
        let row = self.row_mut(row_index)?;
        for (col_index, value) in targets.into_iter().zip(values) {
            if let (Some(value), Some(cell)) = (value, row.cells.get_mut(col_index)) {
                cell.content = value.clone();
            }
        }
        Ok(())
    }

    fn row_mut(&mut self, row_index: RowIndex) -> Result<&mut Row> {
        usize::try_from(row_index)
            .ok()
            .and_then(|i| self.rows.get_mut(i))
            .ok_or(GridError::RowOutOfRange(row_index))
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Column by index; negative indices count from the end (`-1` = last).
    pub fn get_column(&self, col_index: isize) -> Option<&Column> {
        let resolved = if col_index < 0 {
            self.columns.len().checked_sub(col_index.unsigned_abs())?
        } else {
            usize::try_from(col_index).ok()?
        };
        self.columns.get(resolved)
    }

    pub fn column(&self, col_index: usize) -> Option<&Column> {
        self.columns.get(col_index)
    }

    pub fn column_by_id(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Columns, optionally without the synthetic ones.
    pub fn get_columns(&self, include_standard: bool) -> Vec<&Column> {
        self.columns
            .iter()
            .filter(|c| include_standard || !c.is_standard())
            .collect()
    }

    pub fn column_count(&self, include_standard: bool) -> usize {
        self.get_columns(include_standard).len()
    }

    /// Lowest user column index (past the synthetic columns).
    pub fn first_column_index(&self) -> usize {
        self.columns.iter().filter(|c| c.is_standard()).count()
    }

    pub fn get_row(&self, row_index: RowIndex) -> Option<&Row> {
        usize::try_from(row_index).ok().and_then(|i| self.rows.get(i))
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn get_cell(&self, col_index: usize, row_index: RowIndex) -> Option<&Cell> {
        self.get_row(row_index)?.cell(col_index)
    }

    /// Display text of a cell (cell formatter, then column formatter).
    pub fn cell_text(&self, cell: CellRef) -> Option<String> {
        let column = self.columns.get(cell.col_index)?;
        let cell = self.get_cell(cell.col_index, cell.row_index)?;
        Some(display_text(column, cell))
    }

    pub fn view_order(&self) -> &ViewOrder {
        &self.view_order
    }

    /// Row identities in view order, restricted to the shown set.
    pub fn view_row_indices(&self) -> Vec<RowIndex> {
        self.view_order.iter().filter(|r| self.is_shown(*r)).collect()
    }

    /// Rows `start..end` of the filtered view.
    pub fn get_rows_for_view(&self, start: usize, end: usize) -> Vec<&Row> {
        self.view_order
            .iter()
            .filter(|r| self.is_shown(*r))
            .skip(start)
            .take(end.saturating_sub(start))
            .filter_map(|r| self.get_row(r))
            .collect()
    }

    /// All descendants of a tree node.
    pub fn get_children(&self, parent: RowIndex) -> Vec<RowIndex> {
        tree::children(&self.rows, parent)
    }

    /// Direct children of a tree node.
    pub fn get_immediate_children(&self, parent: RowIndex) -> Vec<RowIndex> {
        tree::immediate_children(&self.rows, parent)
    }

    pub fn is_leaf(&self, row: RowIndex) -> bool {
        self.get_row(row)
            .and_then(|r| r.meta.is_leaf)
            .unwrap_or(true)
    }
}

/// Cell formatter wins over column formatter, which wins over raw display.
pub fn display_text(column: &Column, cell: &Cell) -> String {
    match &cell.format {
        Some(f) => f.format(&cell.content),
        None => column.format_value(&cell.content),
    }
}

fn user_columns(columns: &[Column]) -> &[Column] {
    let first = columns.iter().take_while(|c| c.is_standard()).count();
    columns.get(first..).unwrap_or_default()
}

fn to_signed(index: usize) -> isize {
    isize::try_from(index).unwrap_or(isize::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model(config: ModelConfig, columns: Value, data: Value) -> TabularModel {
        let mut m = TabularModel::new(config);
        m.init(&columns, &data).unwrap();
        m
    }

    fn assert_invariants(m: &TabularModel) {
        for (i, column) in m.columns().iter().enumerate() {
            assert_eq!(column.col_index, i);
        }
        for row in m.rows() {
            assert_eq!(row.len(), m.columns().len());
            for (i, cell) in row.cells.iter().enumerate() {
                assert_eq!(cell.col_index, i);
            }
        }
        assert!(m.columns().iter().filter(|c| c.sort_order != SortOrder::None).count() <= 1);
    }

    fn names(m: &TabularModel, col: usize) -> Vec<String> {
        m.view_row_indices()
            .into_iter()
            .map(|r| m.get_cell(col, r).unwrap().content.display())
            .collect()
    }

    #[test]
    fn test_synthetic_columns_come_first() {
        let m = model(
            ModelConfig {
                checkbox_column: true,
                serial_no_column: true,
            },
            json!(["Name"]),
            json!([["Faris"]]),
        );
        assert_eq!(m.columns()[0].id, "_checkbox");
        assert_eq!(m.columns()[1].id, "_rowIndex");
        assert_eq!(m.first_column_index(), 2);
        assert_eq!(m.column_count(false), 1);
        assert_eq!(m.get_cell(1, 0).unwrap().content, CellValue::Number(1.0));
        assert_eq!(m.get_cell(2, 0).unwrap().content, CellValue::from("Faris"));
        assert_invariants(&m);
    }

    #[test]
    fn test_short_and_long_rows_are_normalised() {
        let m = model(
            ModelConfig::default(),
            json!(["A", "B"]),
            json!([["1"], ["1", "2", "3"]]),
        );
        assert_eq!(m.get_cell(1, 0).unwrap().content, CellValue::Empty);
        assert_invariants(&m);
    }

    #[test]
    fn test_negative_column_index() {
        let m = model(ModelConfig::default(), json!(["A", "B", "C"]), json!([]));
        assert_eq!(m.get_column(-1).unwrap().id, "c");
        assert_eq!(m.get_column(-3).unwrap().id, "a");
        assert!(m.get_column(-4).is_none());
        assert!(m.get_column(3).is_none());
    }

    #[test]
    fn test_sort_round_trip_restores_storage_order() {
        let mut m = model(
            ModelConfig::default(),
            json!(["Name"]),
            json!([["b"], ["a"], ["c"], ["a"]]),
        );
        m.sort_rows(0, SortOrder::Asc).unwrap();
        assert_eq!(names(&m, 0), vec!["a", "a", "b", "c"]);
        m.sort_rows(0, SortOrder::Desc).unwrap();
        assert_eq!(names(&m, 0), vec!["c", "b", "a", "a"]);
        m.sort_rows(0, SortOrder::None).unwrap();
        assert_eq!(m.view_order().as_slice(), &[0, 1, 2, 3]);
        assert_invariants(&m);
    }

    #[test]
    fn test_sort_is_mutually_exclusive() {
        let mut m = model(ModelConfig::default(), json!(["A", "B"]), json!([[1, 2]]));
        m.sort_rows(0, SortOrder::Asc).unwrap();
        m.sort_rows(1, SortOrder::Desc).unwrap();
        assert_eq!(m.current_sort(), Some((1, SortOrder::Desc)));
        assert_eq!(m.columns()[0].sort_order, SortOrder::None);
        assert!(m.sort_rows(9, SortOrder::Asc).is_err());
    }

    #[test]
    fn test_filter_partitions_rows() {
        let mut m = model(
            ModelConfig::default(),
            json!(["Name", "Salary"]),
            json!([["a", 5000], ["b", 7000], ["c", 9000]]),
        );
        let result = m.filter_rows(&[(1, FilterRule::parse("> 6000").unwrap())]);
        assert_eq!(result.rows_to_show, vec![1, 2]);
        assert_eq!(result.rows_to_hide, vec![0]);
        assert_eq!(m.view_row_indices(), vec![1, 2]);
        assert_eq!(m.get_rows_for_view(1, 5).len(), 1);

        m.filter_rows(&[]);
        assert!(!m.is_filtered());
        assert_eq!(m.view_row_indices().len(), 3);
    }

    #[test]
    fn test_switch_and_remove_keep_invariants() {
        let mut m = model(
            ModelConfig {
                checkbox_column: false,
                serial_no_column: true,
            },
            json!(["A", "B", "C"]),
            json!([["a", "b", "c"]]),
        );
        m.switch_column(1, 3).unwrap();
        assert_eq!(m.columns()[1].id, "c");
        assert_eq!(m.get_cell(1, 0).unwrap().content, CellValue::from("c"));
        assert_invariants(&m);

        assert!(matches!(m.switch_column(0, 1), Err(GridError::PinnedColumn(0))));
        assert!(matches!(m.remove_column(0), Err(GridError::PinnedColumn(0))));

        let removed = m.remove_column(2).unwrap();
        assert_eq!(removed.id, "b");
        assert_eq!(m.columns().len(), 3);
        assert_invariants(&m);
    }

    #[test]
    fn test_update_cell_partial_patch() {
        let mut m = model(ModelConfig::default(), json!(["A"]), json!([["x"]]));
        m.update_cell(CellRef::new(0, 0), CellPatch::default()).unwrap();
        assert_eq!(m.get_cell(0, 0).unwrap().content, CellValue::from("x"));
        let patch = CellPatch {
            editable: Some(false),
            ..CellPatch::default()
        };
        let cell = m.update_cell(CellRef::new(0, 0), patch).unwrap();
        assert_eq!(cell.content, CellValue::from("x"));
        assert_eq!(cell.editable, Some(false));
    }

    #[test]
    fn test_update_row_skips_none_and_standard_columns() {
        let mut m = model(
            ModelConfig {
                checkbox_column: false,
                serial_no_column: true,
            },
            json!(["A", "B"]),
            json!([["a", "b"]]),
        );
        m.update_row(0, &[None, Some(CellValue::from("B2"))]).unwrap();
        assert_eq!(m.get_cell(1, 0).unwrap().content, CellValue::from("a"));
        assert_eq!(m.get_cell(2, 0).unwrap().content, CellValue::from("B2"));
        assert!(m.update_row(7, &[]).is_err());
    }

    #[test]
    fn test_append_rows_continues_identity_and_sort() {
        let mut m = model(ModelConfig::default(), json!(["N"]), json!([["b"], ["d"]]));
        m.sort_rows(0, SortOrder::Asc).unwrap();
        let added = m.append_rows(&json!([["a"], ["c"]])).unwrap();
        assert_eq!(added, vec![2, 3]);
        assert_eq!(names(&m, 0), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_init_resets_row_counter() {
        let mut m = model(ModelConfig::default(), json!(["N"]), json!([["a"], ["b"]]));
        m.init(&json!(["N"]), &json!([["z"]])).unwrap();
        assert_eq!(m.rows()[0].row_index(), 0);
        assert_eq!(m.row_count(), 1);
    }

    #[test]
    fn test_tree_queries_from_records() {
        let m = model(
            ModelConfig::default(),
            json!(["Name"]),
            json!([
                {"name": "root", "indent": 0},
                {"name": "child", "indent": 1},
                {"name": "grandchild", "indent": 2},
                {"name": "sibling", "indent": 0}
            ]),
        );
        assert_eq!(m.get_children(0), vec![1, 2]);
        assert_eq!(m.get_immediate_children(0), vec![1]);
        assert!(!m.is_leaf(0));
        assert!(m.is_leaf(2));
    }
}
