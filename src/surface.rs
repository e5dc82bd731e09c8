//! The UI surface the grid renders into.
//!
//! [`ViewSurface`] is the narrow contract between the orchestrator and
//! whatever displays the grid: the DOM on wasm, or [`MemorySurface`] in
//! native tests and tools. Row and cell operations address elements by
//! identity and are no-ops for elements that are not currently rendered.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::types::{CellRef, RowIndex};

pub trait ViewSurface {
    fn set_header(&mut self, html: &str);
    /// Replace the body; `rows` are the identities now rendered, in order.
    fn set_body(&mut self, html: &str, rows: &[RowIndex]);
    fn set_footer(&mut self, html: &str);
    /// Put text back into a column's inline filter input after the header
    /// was re-rendered.
    fn set_filter_value(&mut self, _col_index: usize, _text: &str) {}
    /// Replace the inner markup of one rendered cell.
    fn set_cell_html(&mut self, cell: CellRef, html: &str);

    fn set_row_class(&mut self, row: RowIndex, class: &str, on: bool);
    fn set_cell_class(&mut self, cell: CellRef, class: &str, on: bool);
    /// Remove `class` from every rendered cell.
    fn clear_cell_class(&mut self, class: &str);
    fn set_row_checked(&mut self, row: RowIndex, checked: bool);
    fn set_all_checked(&mut self, checked: bool);

    fn show_toast(&mut self, message: &str);
    fn clear_toast(&mut self);
    fn freeze(&mut self, message: &str);
    fn unfreeze(&mut self);
    fn copy_text(&mut self, text: &str);

    /// Bring a rendered cell into view and give it keyboard focus.
    fn scroll_into_view(&mut self, cell: CellRef);
    /// Natural width of a column as laid out, when measurable.
    fn measure_column(&self, _col_index: usize) -> Option<f32> {
        None
    }
    fn container_width(&self) -> Option<f32> {
        None
    }
    /// Height of a rendered body row, when measurable.
    fn measure_row_height(&self) -> Option<f32> {
        None
    }
    /// Tear down all markup.
    fn destroy(&mut self);
}

/// What a [`MemorySurface`] currently shows
#[derive(Debug, Clone, Default)]
pub struct SurfaceState {
    pub header: String,
    pub body: String,
    pub footer: String,
    pub filter_values: BTreeMap<usize, String>,
    pub rendered_rows: Vec<RowIndex>,
    pub row_classes: BTreeMap<RowIndex, BTreeSet<String>>,
    pub cell_classes: BTreeMap<CellRef, BTreeSet<String>>,
    pub cell_html: BTreeMap<CellRef, String>,
    pub checked: BTreeSet<RowIndex>,
    pub all_checked: bool,
    pub toast: Option<String>,
    pub frozen: bool,
    /// Every freeze / unfreeze, in order (`true` = freeze).
    pub freeze_log: Vec<bool>,
    pub clipboard: Option<String>,
    pub scrolled_to: Option<CellRef>,
    pub body_renders: usize,
    pub destroyed: bool,
    pub container_width: Option<f32>,
}

/// Recording surface for native use.
///
/// Cloning shares the underlying state, so a test can keep a handle while
/// the grid owns the surface. Replacing the body drops all row and cell
/// decoration, the way recycled DOM nodes lose theirs.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    state: Rc<RefCell<SurfaceState>>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_container_width(width: f32) -> Self {
        let surface = Self::new();
        surface.state.borrow_mut().container_width = Some(width);
        surface
    }

    pub fn state(&self) -> std::cell::Ref<'_, SurfaceState> {
        self.state.borrow()
    }

    pub fn is_rendered(&self, row: RowIndex) -> bool {
        self.state.borrow().rendered_rows.contains(&row)
    }

    pub fn row_has_class(&self, row: RowIndex, class: &str) -> bool {
        self.state
            .borrow()
            .row_classes
            .get(&row)
            .is_some_and(|set| set.contains(class))
    }

    pub fn cell_has_class(&self, cell: CellRef, class: &str) -> bool {
        self.state
            .borrow()
            .cell_classes
            .get(&cell)
            .is_some_and(|set| set.contains(class))
    }

    /// Cells carrying `class`, in (row, col) order.
    pub fn cells_with_class(&self, class: &str) -> Vec<CellRef> {
        self.state
            .borrow()
            .cell_classes
            .iter()
            .filter(|(_, set)| set.contains(class))
            .map(|(cell, _)| *cell)
            .collect()
    }

    pub fn toast(&self) -> Option<String> {
        self.state.borrow().toast.clone()
    }

    pub fn clipboard(&self) -> Option<String> {
        self.state.borrow().clipboard.clone()
    }

    pub fn body(&self) -> String {
        self.state.borrow().body.clone()
    }

    pub fn header(&self) -> String {
        self.state.borrow().header.clone()
    }

    pub fn rendered_rows(&self) -> Vec<RowIndex> {
        self.state.borrow().rendered_rows.clone()
    }
}

impl ViewSurface for MemorySurface {
    fn set_header(&mut self, html: &str) {
        let mut s = self.state.borrow_mut();
        s.header = html.to_string();
        s.filter_values.clear();
    }

    fn set_body(&mut self, html: &str, rows: &[RowIndex]) {
        let mut s = self.state.borrow_mut();
        s.body = html.to_string();
        s.rendered_rows = rows.to_vec();
        s.row_classes.clear();
        s.cell_classes.clear();
        s.cell_html.clear();
        s.checked.clear();
        s.body_renders += 1;
    }

    fn set_footer(&mut self, html: &str) {
        self.state.borrow_mut().footer = html.to_string();
    }

    fn set_filter_value(&mut self, col_index: usize, text: &str) {
        self.state
            .borrow_mut()
            .filter_values
            .insert(col_index, text.to_string());
    }

    fn set_cell_html(&mut self, cell: CellRef, html: &str) {
        let mut s = self.state.borrow_mut();
        if s.rendered_rows.contains(&cell.row_index) {
            s.cell_html.insert(cell, html.to_string());
        }
    }

    fn set_row_class(&mut self, row: RowIndex, class: &str, on: bool) {
        let mut s = self.state.borrow_mut();
        if !s.rendered_rows.contains(&row) {
            return;
        }
        let set = s.row_classes.entry(row).or_default();
        if on {
            set.insert(class.to_string());
        } else {
            set.remove(class);
        }
    }

    fn set_cell_class(&mut self, cell: CellRef, class: &str, on: bool) {
        let mut s = self.state.borrow_mut();
        if !s.rendered_rows.contains(&cell.row_index) {
            return;
        }
        let set = s.cell_classes.entry(cell).or_default();
        if on {
            set.insert(class.to_string());
        } else {
            set.remove(class);
        }
    }

    fn clear_cell_class(&mut self, class: &str) {
        for set in self.state.borrow_mut().cell_classes.values_mut() {
            set.remove(class);
        }
    }

    fn set_row_checked(&mut self, row: RowIndex, checked: bool) {
        let mut s = self.state.borrow_mut();
        if !s.rendered_rows.contains(&row) {
            return;
        }
        if checked {
            s.checked.insert(row);
        } else {
            s.checked.remove(&row);
        }
    }

    fn set_all_checked(&mut self, checked: bool) {
        self.state.borrow_mut().all_checked = checked;
    }

    fn show_toast(&mut self, message: &str) {
        self.state.borrow_mut().toast = Some(message.to_string());
    }

    fn clear_toast(&mut self) {
        self.state.borrow_mut().toast = None;
    }

    fn freeze(&mut self, _message: &str) {
        let mut s = self.state.borrow_mut();
        s.frozen = true;
        s.freeze_log.push(true);
    }

    fn unfreeze(&mut self) {
        let mut s = self.state.borrow_mut();
        s.frozen = false;
        s.freeze_log.push(false);
    }

    fn copy_text(&mut self, text: &str) {
        self.state.borrow_mut().clipboard = Some(text.to_string());
    }

    fn scroll_into_view(&mut self, cell: CellRef) {
        self.state.borrow_mut().scrolled_to = Some(cell);
    }

    fn container_width(&self) -> Option<f32> {
        self.state.borrow().container_width
    }

    fn destroy(&mut self) {
        let mut s = self.state.borrow_mut();
        let width = s.container_width;
        *s = SurfaceState {
            destroyed: true,
            container_width: width,
            ..SurfaceState::default()
        };
    }
}
