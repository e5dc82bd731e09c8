//! Focus, range selection and inline editing.
//!
//! The controller is a small state machine:
//!
//! ```text
//!  Idle --click/focus--> Focused --Enter/dblclick--> Editing
//!                          ^  |                         |
//!                          |  +--arrows/Shift+arrows    |
//!                          +------Enter (commit)--------+
//!                          +------Esc (cancel)----------+
//! ```
//!
//! Cells are held by identity (`rowIndex`, `colIndex`); the selection
//! rectangle is resolved against the current view order whenever it is
//! needed, so sorting and filtering never leave it pointing at stale
//! positions.

use crate::model::TabularModel;
use crate::surface::ViewSurface;
use crate::types::{CellPatch, CellRef, CellValue, RowIndex, Selection};

use super::editor::{CellEditor, CommitFuture};
use super::keyboard::Direction;

pub const FOCUS_CLASS: &str = "dt-cell--focus";
pub const HIGHLIGHT_CLASS: &str = "dt-cell--highlight";
pub const EDITING_CLASS: &str = "dt-cell--editing";

/// Externally visible state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Idle,
    Focused {
        focus: CellRef,
        anchor: Option<CellRef>,
    },
    Editing {
        cell: CellRef,
    },
}

/// Read-only view the controller navigates over
#[derive(Clone, Copy)]
pub struct CellView<'a> {
    pub model: &'a TabularModel,
    /// Visible rows in view order.
    pub rows: &'a [RowIndex],
}

impl<'a> CellView<'a> {
    pub fn new(model: &'a TabularModel, rows: &'a [RowIndex]) -> Self {
        Self { model, rows }
    }

    pub fn position_of(&self, row: RowIndex) -> Option<usize> {
        self.rows.iter().position(|r| *r == row)
    }

    fn row_at(&self, position: usize) -> Option<RowIndex> {
        self.rows.get(position).copied()
    }

    fn focusable_columns(&self) -> Vec<usize> {
        self.model
            .columns()
            .iter()
            .filter(|c| c.focusable && !c.is_standard())
            .map(|c| c.col_index)
            .collect()
    }

    /// Can `cell` take focus at all?
    pub fn is_focusable(&self, cell: CellRef) -> bool {
        let column_ok = self
            .model
            .column(cell.col_index)
            .is_some_and(|c| c.focusable && !c.is_standard());
        column_ok && self.position_of(cell.row_index).is_some()
    }

    /// Neighbour of `cell` one step in `dir`, or `None` at the edge.
    pub fn step(&self, cell: CellRef, dir: Direction) -> Option<CellRef> {
        match dir {
            Direction::Up | Direction::Down => {
                let pos = self.position_of(cell.row_index)?;
                let next = if dir == Direction::Up {
                    pos.checked_sub(1)?
                } else {
                    pos + 1
                };
                Some(CellRef::new(self.row_at(next)?, cell.col_index))
            }
            Direction::Left | Direction::Right => {
                let cols = self.focusable_columns();
                let idx = cols.iter().position(|c| *c == cell.col_index)?;
                let next = if dir == Direction::Left {
                    idx.checked_sub(1)?
                } else {
                    idx + 1
                };
                Some(CellRef::new(cell.row_index, *cols.get(next)?))
            }
        }
    }

    /// Extreme cell from `cell` in `dir`.
    pub fn edge(&self, cell: CellRef, dir: Direction) -> Option<CellRef> {
        match dir {
            Direction::Up => Some(CellRef::new(*self.rows.first()?, cell.col_index)),
            Direction::Down => Some(CellRef::new(*self.rows.last()?, cell.col_index)),
            Direction::Left => Some(CellRef::new(
                cell.row_index,
                *self.focusable_columns().first()?,
            )),
            Direction::Right => Some(CellRef::new(
                cell.row_index,
                *self.focusable_columns().last()?,
            )),
        }
    }

    fn can_edit(&self, cell: CellRef) -> bool {
        let Some(column) = self.model.column(cell.col_index) else {
            return false;
        };
        let Some(data) = self.model.get_cell(cell.col_index, cell.row_index) else {
            return false;
        };
        !column.is_standard() && column.editable && data.editable.unwrap_or(true)
    }
}

struct ActiveEdit {
    cell: CellRef,
    editor: Box<dyn CellEditor>,
}

/// A committed edit, for the orchestrator to render and settle
pub struct Commit {
    pub cell: CellRef,
    pub previous: CellValue,
    pub value: CellValue,
    /// Asynchronous save still in flight.
    pub pending: Option<CommitFuture>,
}

#[derive(Default)]
pub struct CellController {
    focus: Option<CellRef>,
    anchor: Option<CellRef>,
    editing: Option<ActiveEdit>,
}

impl CellController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CellState {
        match (&self.editing, self.focus) {
            (Some(edit), _) => CellState::Editing { cell: edit.cell },
            (None, Some(focus)) => CellState::Focused {
                focus,
                anchor: self.anchor,
            },
            (None, None) => CellState::Idle,
        }
    }

    pub fn focused(&self) -> Option<CellRef> {
        self.focus
    }

    pub fn editing(&self) -> Option<CellRef> {
        self.editing.as_ref().map(|e| e.cell)
    }

    /// Focus `cell`; silently refused for non-focusable or hidden cells.
    ///
    /// Clears any range selection. An open editor on another cell must be
    /// committed by the caller first.
    pub fn focus(&mut self, view: CellView<'_>, surface: &mut dyn ViewSurface, cell: CellRef) -> bool {
        if !view.is_focusable(cell) {
            log::debug!("focus refused for {cell:?}");
            return false;
        }
        self.clear_selection(surface);
        if let Some(old) = self.focus.replace(cell) {
            surface.set_cell_class(old, FOCUS_CLASS, false);
        }
        surface.set_cell_class(cell, FOCUS_CLASS, true);
        surface.scroll_into_view(cell);
        true
    }

    /// Arrow / Tab: move focus one cell; no-op at the grid edge.
    pub fn move_focus(&mut self, view: CellView<'_>, surface: &mut dyn ViewSurface, dir: Direction) -> bool {
        let Some(target) = self.focus.and_then(|f| view.step(f, dir)) else {
            return false;
        };
        self.focus(view, surface, target)
    }

    /// Ctrl+Arrow: jump to the first/last row or column.
    pub fn jump(&mut self, view: CellView<'_>, surface: &mut dyn ViewSurface, dir: Direction) -> bool {
        let Some(target) = self.focus.and_then(|f| view.edge(f, dir)) else {
            return false;
        };
        if Some(target) == self.focus {
            return false;
        }
        self.focus(view, surface, target)
    }

    /// Shift+Arrow: grow or shrink the selection one cell from its far corner.
    pub fn extend(&mut self, view: CellView<'_>, surface: &mut dyn ViewSurface, dir: Direction) -> bool {
        let Some(focus) = self.focus else {
            return false;
        };
        let corner = self.anchor.unwrap_or(focus);
        let Some(next) = view.step(corner, dir) else {
            return false;
        };
        self.select_range(view, surface, next)
    }

    /// Shift+click: select the rectangle from the focused cell to `to`.
    ///
    /// Rejected when `to` lies in a synthetic column.
    pub fn select_range(&mut self, view: CellView<'_>, surface: &mut dyn ViewSurface, to: CellRef) -> bool {
        if self.focus.is_none() || !view.is_focusable(to) {
            return false;
        }
        self.unhighlight(surface);
        self.anchor = Some(to);
        self.highlight(view, surface);
        true
    }

    /// Selection rectangle in view positions.
    pub fn selection(&self, view: CellView<'_>) -> Option<Selection> {
        let focus = self.focus?;
        let anchor = self.anchor?;
        Some(Selection::new(
            view.position_of(focus.row_index)?,
            focus.col_index,
            view.position_of(anchor.row_index)?,
            anchor.col_index,
        ))
    }

    fn selected_cells(&self, view: CellView<'_>) -> Vec<CellRef> {
        let Some(selection) = self.selection(view) else {
            return Vec::new();
        };
        let (min_row, min_col, max_row, max_col) = selection.bounds();
        let rows = view.rows.get(min_row..=max_row).unwrap_or_default();
        rows.iter()
            .flat_map(|row| (min_col..=max_col).map(move |col| CellRef::new(*row, col)))
            .collect()
    }

    fn highlight(&self, view: CellView<'_>, surface: &mut dyn ViewSurface) {
        for cell in self.selected_cells(view) {
            surface.set_cell_class(cell, HIGHLIGHT_CLASS, true);
        }
    }

    fn unhighlight(&self, surface: &mut dyn ViewSurface) {
        if self.anchor.is_some() {
            surface.clear_cell_class(HIGHLIGHT_CLASS);
        }
    }

    pub fn clear_selection(&mut self, surface: &mut dyn ViewSurface) {
        if self.anchor.take().is_some() {
            surface.clear_cell_class(HIGHLIGHT_CLASS);
        }
    }

    /// Drop focus and selection entirely (back to `Idle`).
    pub fn blur(&mut self, surface: &mut dyn ViewSurface) {
        self.clear_selection(surface);
        if let Some(old) = self.focus.take() {
            surface.set_cell_class(old, FOCUS_CLASS, false);
        }
    }

    /// Re-apply focus and selection classes after a body render.
    pub fn restore(&self, view: CellView<'_>, surface: &mut dyn ViewSurface) {
        if let Some(focus) = self.focus {
            surface.set_cell_class(focus, FOCUS_CLASS, true);
        }
        if let Some(edit) = &self.editing {
            surface.set_cell_class(edit.cell, EDITING_CLASS, true);
        }
        self.highlight(view, surface);
    }

    /// Forget focus / selection on rows that left the view.
    pub fn reconcile_rows(&mut self, view: CellView<'_>) {
        if self
            .anchor
            .is_some_and(|a| view.position_of(a.row_index).is_none())
        {
            self.anchor = None;
        }
        if self
            .focus
            .is_some_and(|f| view.position_of(f.row_index).is_none())
        {
            self.focus = None;
            self.anchor = None;
            // Editing always sits on the focus.
            if let Some(mut edit) = self.editing.take() {
                log::debug!("edit of {:?} discarded: row left the view", edit.cell);
                edit.editor.hide();
            }
        }
    }

    /// Follow a column permutation; cells whose column vanished lose focus.
    pub fn remap_columns(&mut self, map: impl Fn(usize) -> Option<usize>) {
        let remap = |cell: CellRef| map(cell.col_index).map(|c| CellRef::new(cell.row_index, c));
        self.focus = self.focus.and_then(remap);
        self.anchor = match self.focus {
            Some(_) => self.anchor.and_then(remap),
            None => None,
        };
    }

    /// Can `cell` be edited?
    pub fn can_edit(&self, view: CellView<'_>, cell: CellRef) -> bool {
        view.is_focusable(cell) && view.can_edit(cell)
    }

    /// Enter edit mode on `cell` with `editor`.
    ///
    /// The caller focuses the cell and commits any other open edit first.
    pub fn begin_edit(
        &mut self,
        view: CellView<'_>,
        surface: &mut dyn ViewSurface,
        cell: CellRef,
        mut editor: Box<dyn CellEditor>,
    ) -> bool {
        if self.focus != Some(cell) || !self.can_edit(view, cell) {
            return false;
        }
        let value = view
            .model
            .get_cell(cell.col_index, cell.row_index)
            .map(|c| c.content.clone())
            .unwrap_or_default();
        editor.init_value(cell, &value);
        surface.set_cell_class(cell, EDITING_CLASS, true);
        self.editing = Some(ActiveEdit { cell, editor });
        true
    }

    /// Write the editor's value into the model.
    pub fn commit(&mut self, model: &mut TabularModel, surface: &mut dyn ViewSurface) -> Option<Commit> {
        let ActiveEdit { cell, mut editor } = self.editing.take()?;
        surface.set_cell_class(cell, EDITING_CLASS, false);
        let value = editor.value();
        let previous = model
            .get_cell(cell.col_index, cell.row_index)
            .map(|c| c.content.clone())
            .unwrap_or_default();
        if let Err(e) = model.update_cell(cell, CellPatch::content(value.clone())) {
            log::warn!("edit commit failed for {cell:?}: {e}");
            editor.hide();
            return None;
        }
        let pending = editor.set_value(cell, &value);
        editor.hide();
        Some(Commit {
            cell,
            previous,
            value,
            pending,
        })
    }

    /// Esc: drop the edit without touching the model.
    pub fn cancel(&mut self, surface: &mut dyn ViewSurface) -> bool {
        let Some(ActiveEdit { cell, mut editor }) = self.editing.take() else {
            return false;
        };
        editor.hide();
        surface.set_cell_class(cell, EDITING_CLASS, false);
        true
    }

    /// Clipboard text for the selection (or the focused cell) and its cell count.
    pub fn copy_text(&self, view: CellView<'_>) -> Option<(String, usize)> {
        let text_of = |cell: CellRef| view.model.cell_text(cell).unwrap_or_default();
        let Some(selection) = self.selection(view) else {
            let focus = self.focus?;
            return Some((text_of(focus), 1));
        };
        let (min_row, min_col, max_row, max_col) = selection.bounds();
        let rows = view.rows.get(min_row..=max_row).unwrap_or_default();
        let text = rows
            .iter()
            .map(|row| {
                (min_col..=max_col)
                    .map(|col| escape_cell_value(&text_of(CellRef::new(*row, col))))
                    .collect::<Vec<_>>()
                    .join("\t")
            })
            .collect::<Vec<_>>()
            .join("\n");
        Some((text, selection.cell_count()))
    }
}

/// Escape a value for TSV/clipboard text: quote when it holds a tab,
/// newline or quote, doubling inner quotes.
pub fn escape_cell_value(value: &str) -> String {
    let needs_quoting = value.contains('\t')
        || value.contains('\n')
        || value.contains('\r')
        || value.contains('"');
    if needs_quoting {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
