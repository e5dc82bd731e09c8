//! Checked rows and tree expansion.

use std::collections::{BTreeSet, HashSet};

use crate::model::TabularModel;
use crate::surface::ViewSurface;
use crate::types::RowIndex;

pub const ROW_HIGHLIGHT_CLASS: &str = "dt-row--highlight";

#[derive(Debug, Clone, Default)]
pub struct RowController {
    /// Independent of view order and filtering.
    checked: BTreeSet<RowIndex>,
    collapsed: HashSet<RowIndex>,
    /// Rows hidden by collapsed ancestors.
    tree_hidden: HashSet<RowIndex>,
}

impl RowController {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Checkboxes
    // ------------------------------------------------------------------

    pub fn is_checked(&self, row: RowIndex) -> bool {
        self.checked.contains(&row)
    }

    pub fn checked_rows(&self) -> Vec<RowIndex> {
        self.checked.iter().copied().collect()
    }

    /// Returns `true` when the checked state changed.
    pub fn check_row(&mut self, row: RowIndex, checked: bool, surface: &mut dyn ViewSurface) -> bool {
        let changed = if checked {
            self.checked.insert(row)
        } else {
            self.checked.remove(&row)
        };
        surface.set_row_checked(row, checked);
        surface.set_row_class(row, ROW_HIGHLIGHT_CLASS, checked);
        changed
    }

    /// Check or uncheck every stored row, filtered-out ones included.
    pub fn check_all(&mut self, checked: bool, model: &TabularModel, surface: &mut dyn ViewSurface) {
        if checked {
            self.checked = model.rows().iter().map(|r| r.row_index()).collect();
        } else {
            self.checked.clear();
        }
        for row in model.rows() {
            surface.set_row_checked(row.row_index(), checked);
            surface.set_row_class(row.row_index(), ROW_HIGHLIGHT_CLASS, checked);
        }
        surface.set_all_checked(checked);
    }

    /// Forget rows that no longer exist (after a refresh).
    pub fn clear(&mut self) {
        self.checked.clear();
        self.collapsed.clear();
        self.tree_hidden.clear();
    }

    /// Status line for the current checked count.
    pub fn status_message(&self) -> Option<String> {
        match self.checked.len() {
            0 => None,
            1 => Some("1 row selected".to_string()),
            n => Some(format!("{n} rows selected")),
        }
    }

    /// Push the status to the surface's toast.
    pub fn show_status(&self, surface: &mut dyn ViewSurface) {
        match self.status_message() {
            Some(message) => surface.show_toast(&message),
            None => surface.clear_toast(),
        }
    }

    /// Re-apply checkbox state and row highlight to rendered rows.
    pub fn restore(&self, rendered: &[RowIndex], row_count: usize, surface: &mut dyn ViewSurface) {
        for row in rendered {
            if self.checked.contains(row) {
                surface.set_row_checked(*row, true);
                surface.set_row_class(*row, ROW_HIGHLIGHT_CLASS, true);
            }
        }
        surface.set_all_checked(row_count > 0 && self.checked.len() == row_count);
    }

    // ------------------------------------------------------------------
    // Tree
    // ------------------------------------------------------------------

    pub fn collapsed(&self) -> &HashSet<RowIndex> {
        &self.collapsed
    }

    pub fn is_collapsed(&self, row: RowIndex) -> bool {
        self.collapsed.contains(&row)
    }

    pub fn is_tree_hidden(&self, row: RowIndex) -> bool {
        self.tree_hidden.contains(&row)
    }

    /// Hide every descendant of `row`.
    ///
    /// Non-leaf descendants are marked collapsed too, so a later expand
    /// that reveals only immediate children leaves glyphs truthful.
    pub fn collapse(&mut self, model: &TabularModel, row: RowIndex) -> bool {
        if model.is_leaf(row) {
            return false;
        }
        self.collapsed.insert(row);
        for child in model.get_children(row) {
            self.tree_hidden.insert(child);
            if !model.is_leaf(child) {
                self.collapsed.insert(child);
            }
        }
        true
    }

    /// Reveal the immediate children of `row`.
    ///
    /// Children that are themselves collapsed keep hiding their own
    /// descendants.
    pub fn expand(&mut self, model: &TabularModel, row: RowIndex) -> bool {
        if !self.collapsed.remove(&row) {
            return false;
        }
        for child in model.get_immediate_children(row) {
            self.tree_hidden.remove(&child);
            if !self.collapsed.contains(&child) {
                for grandchild in model.get_immediate_children(child) {
                    self.reveal_subtree(model, grandchild);
                }
            }
        }
        true
    }

    fn reveal_subtree(&mut self, model: &TabularModel, row: RowIndex) {
        self.tree_hidden.remove(&row);
        if self.collapsed.contains(&row) {
            return;
        }
        for child in model.get_immediate_children(row) {
            self.reveal_subtree(model, child);
        }
    }

    pub fn toggle(&mut self, model: &TabularModel, row: RowIndex) -> bool {
        if self.collapsed.contains(&row) {
            self.expand(model, row)
        } else {
            self.collapse(model, row)
        }
    }

    pub fn expand_all(&mut self) {
        self.collapsed.clear();
        self.tree_hidden.clear();
    }

    pub fn collapse_all(&mut self, model: &TabularModel) {
        self.expand_all();
        for row in model.rows() {
            if !model.is_leaf(row.row_index()) && !self.tree_hidden.contains(&row.row_index()) {
                self.collapse(model, row.row_index());
            }
        }
    }

    /// Show rows down to `depth`; nodes at `depth` end up collapsed.
    pub fn set_tree_depth(&mut self, model: &TabularModel, depth: u32) {
        self.expand_all();
        for row in model.rows() {
            if row.depth() >= depth && !model.is_leaf(row.row_index()) {
                self.collapsed.insert(row.row_index());
            }
            if row.depth() > depth {
                self.tree_hidden.insert(row.row_index());
            }
        }
    }

    /// Visible rows: model view order (filter applied) minus tree-hidden rows.
    pub fn visible_rows(&self, model: &TabularModel) -> Vec<RowIndex> {
        model
            .view_row_indices()
            .into_iter()
            .filter(|r| !self.tree_hidden.contains(r))
            .collect()
    }
}
