//! The grid orchestrator.
//!
//! [`DataGrid`] wires the model, the render engine and the three
//! controllers together and exposes the public widget API. Structural
//! operations (sort, column switch, column removal, filter) are async and
//! run strictly one at a time:
//!
//! ```text
//! freeze → next tick → mutate model → header → body → restore → unfreeze → event
//! ```
//!
//! Everything else (focus, editing, checking, resizing, tree toggles) is
//! synchronous. Event listeners and hook callbacks are always invoked with
//! no grid state borrowed.

mod defer;
mod events;
mod flight;
mod hooks;

pub use defer::{next_tick, now_ms, TaskSpawner};
pub use events::{GridEvent, GridEvents};
pub use flight::{Claim, Dispatch, FlightGuard, StructuralOp};
pub use hooks::{DropdownItem, GridHooks};

use std::cell::RefCell;
use std::cmp::Ordering;
use std::future::Future;
use std::ops::Range;
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::controller::{
    CellController, CellState, CellView, ColumnController, Commit, DropdownAction, KeyCommand,
    KeyInput, KeyboardDispatcher, RowController,
};
use crate::error::{GridError, Result};
use crate::model::{ModelConfig, TabularModel};
use crate::options::GridOptions;
use crate::render::{style, HeaderDecor, RenderEngine, RowDecor, StyleSink};
use crate::surface::ViewSurface;
use crate::types::{
    Cell, CellPatch, CellRef, CellValue, Column, ColumnKind, Row, RowIndex, Selection, SortOrder,
    Synthetic,
};

fn to_signed(index: usize) -> isize {
    isize::try_from(index).unwrap_or(isize::MAX)
}

fn row_decor<'a>(options: &GridOptions, rows: &'a RowController) -> RowDecor<'a> {
    RowDecor {
        tree_view: options.tree_view,
        collapsed: Some(rows.collapsed()),
    }
}

/// Display texts of the first visible row, one per column.
fn first_row_texts(model: &TabularModel, visible: &[RowIndex]) -> Vec<String> {
    let Some(row) = visible.first().copied() else {
        return Vec::new();
    };
    model
        .columns()
        .iter()
        .map(|c| {
            model
                .cell_text(CellRef::new(row, c.col_index))
                .unwrap_or_default()
        })
        .collect()
}

struct GridState {
    this: Weak<RefCell<GridState>>,
    spawner: TaskSpawner,
    options: GridOptions,
    model: TabularModel,
    engine: RenderEngine,
    columns: ColumnController,
    cells: CellController,
    rows: RowController,
    keyboard: KeyboardDispatcher,
    flight: FlightGuard,
    surface: Box<dyn ViewSurface>,
    sink: Box<dyn StyleSink>,
    hooks: Rc<GridHooks>,
    /// Visible rows in view order: filters and collapsed nodes applied.
    visible: Vec<RowIndex>,
    destroyed: bool,
}

impl GridState {
    fn ensure_alive(&self) -> Result<()> {
        if self.destroyed {
            Err(GridError::Destroyed)
        } else {
            Ok(())
        }
    }

    fn install_hooks(&mut self) {
        for (id, format) in &self.hooks.formats {
            if let Some(column) = self.model.column_mut_by_id(id) {
                column.format = Some(format.clone());
            }
        }
        for (id, comparator) in &self.hooks.comparators {
            if let Some(column) = self.model.column_mut_by_id(id) {
                column.comparator = Some(comparator.clone());
                column.kind = ColumnKind::Custom;
            }
        }
    }

    fn all_checked(&self) -> bool {
        let total = self.model.row_count();
        total > 0 && self.rows.checked_rows().len() == total
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Layout, header and body from scratch.
    fn render_all(&mut self) {
        self.visible = self.rows.visible_rows(&self.model);
        self.engine.reset();
        self.layout_columns();
        self.render_header();
        self.render_body();
        self.detect_row_height();
    }

    fn layout_columns(&mut self) {
        let first_row = first_row_texts(&self.model, &self.visible);
        self.columns.layout(
            &self.model,
            &first_row,
            self.options.layout,
            self.surface.as_ref(),
            self.sink.as_mut(),
        );
        style::apply_row_height(self.sink.as_mut(), self.engine.row_height());
    }

    fn detect_row_height(&mut self) {
        if self.options.cell_height.is_some() {
            return;
        }
        let Some(measured) = self.surface.measure_row_height() else {
            return;
        };
        if (measured - self.engine.row_height()).abs() < 0.5 || measured <= 0.0 {
            return;
        }
        log::debug!("row height measured at {measured}px");
        self.engine.set_row_height(measured);
        style::apply_row_height(self.sink.as_mut(), measured);
        self.render_body();
    }

    fn render_header(&mut self) {
        let decor = HeaderDecor {
            inline_filters: self.options.inline_filters,
            all_checked: self.all_checked(),
        };
        self.engine
            .render_header(&self.model, decor, self.surface.as_mut());
        for column in self.model.columns() {
            if let Some(text) = self.columns.filter_text(column) {
                self.surface.set_filter_value(column.col_index, text);
            }
        }
    }

    /// Recompute the visible rows, re-render the body and restore
    /// checked rows, focus and selection onto it.
    fn render_body(&mut self) {
        self.visible = self.rows.visible_rows(&self.model);
        self.cells
            .reconcile_rows(CellView::new(&self.model, &self.visible));
        let decor = row_decor(&self.options, &self.rows);
        self.engine
            .render_body(&self.model, &self.visible, decor, self.surface.as_mut());
        self.restore();
        self.render_footer();
    }

    fn restore(&mut self) {
        let rendered = self.engine.rendered_rows(&self.visible);
        self.rows
            .restore(rendered, self.model.row_count(), self.surface.as_mut());
        self.cells.restore(
            CellView::new(&self.model, &self.visible),
            self.surface.as_mut(),
        );
    }

    fn render_footer(&mut self) {
        if self.options.show_total_row {
            self.engine
                .render_footer(&self.model, &self.visible, self.surface.as_mut());
        }
    }

    fn render_cell(&mut self, cell: CellRef) {
        let decor = row_decor(&self.options, &self.rows);
        self.engine
            .render_cell(&self.model, cell, decor, self.surface.as_mut());
    }

    /// Materialize the row holding the focus (or the selection's far
    /// corner) if the virtualizer has it outside the window.
    fn reveal_focus(&mut self) {
        let target = match self.cells.state() {
            CellState::Focused { focus, anchor } => anchor.unwrap_or(focus),
            CellState::Editing { cell } => cell,
            CellState::Idle => return,
        };
        let Some(position) = self.visible.iter().position(|r| *r == target.row_index) else {
            return;
        };
        let decor = row_decor(&self.options, &self.rows);
        if self.engine.reveal(
            position,
            &self.model,
            &self.visible,
            decor,
            self.surface.as_mut(),
        ) {
            self.restore();
            self.surface.scroll_into_view(target);
        }
    }

    fn scroll(&mut self, scroll_top: f32) -> bool {
        let decor = row_decor(&self.options, &self.rows);
        let rerendered = self.engine.on_scroll(
            scroll_top,
            &self.model,
            &self.visible,
            decor,
            self.surface.as_mut(),
        );
        if rerendered {
            self.restore();
        }
        rerendered
    }

    // ------------------------------------------------------------------
    // Structural operations
    // ------------------------------------------------------------------

    fn column_id(&self, col_index: usize) -> Result<String> {
        self.model
            .column(col_index)
            .map(|c| c.id.clone())
            .ok_or(GridError::ColumnOutOfRange(to_signed(col_index)))
    }

    fn movable_id(&self, col_index: usize) -> Result<String> {
        let column = self
            .model
            .column(col_index)
            .ok_or(GridError::ColumnOutOfRange(to_signed(col_index)))?;
        if column.is_standard() {
            return Err(GridError::PinnedColumn(col_index));
        }
        Ok(column.id.clone())
    }

    fn sort_request(&self, col_index: usize, order: SortOrder) -> Result<Option<StructuralOp>> {
        self.ensure_alive()?;
        let column = self.column_id(col_index)?;
        if self.options.tree_view {
            log::debug!("sorting is disabled in tree view");
            return Ok(None);
        }
        Ok(Some(StructuralOp::Sort { column, order }))
    }

    fn switch_request(&self, a: usize, b: usize) -> Result<Option<StructuralOp>> {
        self.ensure_alive()?;
        Ok(Some(StructuralOp::Switch {
            a: self.movable_id(a)?,
            b: self.movable_id(b)?,
        }))
    }

    fn remove_request(&self, col_index: usize) -> Result<Option<StructuralOp>> {
        self.ensure_alive()?;
        Ok(Some(StructuralOp::Remove {
            column: self.movable_id(col_index)?,
        }))
    }

    fn filter_request(&self) -> Result<Option<StructuralOp>> {
        self.ensure_alive()?;
        Ok(Some(StructuralOp::Filter))
    }

    fn freeze(&mut self) -> Result<()> {
        self.ensure_alive()?;
        self.surface.freeze(&self.options.freeze_message);
        Ok(())
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        let index = self.model.column_by_id(id).map(|c| c.col_index);
        if index.is_none() {
            log::debug!("column {id} vanished before its operation ran");
        }
        index
    }

    fn refilter(&mut self) {
        let rules = self.columns.active_rules(&self.model);
        let result = self.model.filter_rows(&rules);
        log::debug!(
            "filter: {} shown, {} hidden",
            result.rows_to_show.len(),
            result.rows_to_hide.len()
        );
    }

    /// Mutate the model and re-render for one operation.
    fn apply(&mut self, op: StructuralOp) -> Result<Option<GridEvent>> {
        self.commit_edit();
        let event = match op {
            StructuralOp::Sort { column, order } => {
                let Some(col_index) = self.index_of(&column) else {
                    return Ok(None);
                };
                self.model.sort_rows(col_index, order)?;
                self.render_header();
                self.render_body();
                self.model
                    .column(col_index)
                    .cloned()
                    .map(GridEvent::SortColumn)
            }
            StructuralOp::Switch { a, b } => {
                let (Some(ia), Some(ib)) = (self.index_of(&a), self.index_of(&b)) else {
                    return Ok(None);
                };
                self.model.switch_column(ia, ib)?;
                self.columns.on_switch(&self.model, ia, ib, self.sink.as_mut());
                self.cells.remap_columns(|c| {
                    if c == ia {
                        Some(ib)
                    } else if c == ib {
                        Some(ia)
                    } else {
                        Some(c)
                    }
                });
                self.render_header();
                self.render_body();
                match (self.model.column(ib), self.model.column(ia)) {
                    (Some(first), Some(second)) => {
                        Some(GridEvent::SwitchColumn(first.clone(), second.clone()))
                    }
                    _ => None,
                }
            }
            StructuralOp::Remove { column } => {
                let Some(col_index) = self.index_of(&column) else {
                    return Ok(None);
                };
                let removed = self.model.remove_column(col_index)?;
                self.columns.on_remove(&self.model, &removed, self.sink.as_mut());
                self.cells.remap_columns(|c| match c.cmp(&col_index) {
                    Ordering::Less => Some(c),
                    Ordering::Equal => None,
                    Ordering::Greater => Some(c - 1),
                });
                if self.model.is_filtered() {
                    self.refilter();
                }
                self.render_header();
                self.render_body();
                Some(GridEvent::RemoveColumn(removed))
            }
            StructuralOp::Filter => {
                if self.columns.settle_filters() {
                    log::debug!("pending filter input applied ahead of its deadline");
                }
                self.refilter();
                self.cells.clear_selection(self.surface.as_mut());
                self.render_body();
                None
            }
        };
        Ok(event)
    }

    // ------------------------------------------------------------------
    // Data
    // ------------------------------------------------------------------

    fn refresh(&mut self, data: &Value, columns: Option<&Value>) -> Result<()> {
        self.ensure_alive()?;
        // The model parses the whole payload before touching its rows, so
        // a malformed payload returns here with nothing changed.
        match columns {
            Some(columns) => {
                self.model.init(columns, data)?;
                self.columns = ColumnController::new(self.options.filter_debounce_ms);
            }
            None => {
                self.model.refresh_rows(data)?;
                self.columns.clear_filters();
            }
        }
        self.cells.cancel(self.surface.as_mut());
        self.cells.blur(self.surface.as_mut());
        self.rows.clear();
        self.install_hooks();
        self.render_all();
        log::debug!("refreshed with {} rows", self.model.row_count());
        Ok(())
    }

    fn append_rows(&mut self, data: &Value) -> Result<Vec<RowIndex>> {
        self.ensure_alive()?;
        let added = self.model.append_rows(data)?;
        if self.model.is_filtered() {
            self.refilter();
        }
        self.render_body();
        log::debug!("appended {} rows", added.len());
        Ok(added)
    }

    fn update_cell(&mut self, cell: CellRef, patch: CellPatch) -> Result<()> {
        self.ensure_alive()?;
        self.model.update_cell(cell, patch)?;
        self.render_cell(cell);
        self.render_footer();
        Ok(())
    }

    fn update_row(&mut self, row: RowIndex, values: &[Option<CellValue>]) -> Result<()> {
        self.ensure_alive()?;
        self.model.update_row(row, values)?;
        for col_index in 0..self.model.columns().len() {
            self.render_cell(CellRef::new(row, col_index));
        }
        self.render_footer();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Cells
    // ------------------------------------------------------------------

    fn navigate(
        &mut self,
        step: impl FnOnce(&mut CellController, CellView<'_>, &mut dyn ViewSurface) -> bool,
    ) -> bool {
        let moved = step(
            &mut self.cells,
            CellView::new(&self.model, &self.visible),
            self.surface.as_mut(),
        );
        if moved {
            self.reveal_focus();
        }
        moved
    }

    fn click_cell(&mut self, cell: CellRef, shift: bool) -> Option<GridEvent> {
        let synthetic = self.model.column(cell.col_index).and_then(|c| c.synthetic);
        if synthetic == Some(Synthetic::Checkbox) {
            let checked = !self.rows.is_checked(cell.row_index);
            return self.check_row(cell.row_index, checked).ok().flatten();
        }
        if self.cells.editing().is_some_and(|editing| editing != cell) {
            self.commit_edit();
        }
        if shift && self.cells.focused().is_some() {
            self.navigate(|cells, view, surface| cells.select_range(view, surface, cell));
        } else {
            self.navigate(|cells, view, surface| cells.focus(view, surface, cell));
        }
        None
    }

    /// Commit the open edit, if any.
    ///
    /// An asynchronous save is spawned; if it fails the cell goes back to
    /// its previous content.
    fn commit_edit(&mut self) -> Option<CellRef> {
        let Commit {
            cell,
            previous,
            value,
            pending,
        } = self.cells.commit(&mut self.model, self.surface.as_mut())?;
        self.render_cell(cell);
        self.render_footer();
        if let Some(pending) = pending {
            let this = self.this.clone();
            self.spawner.spawn(async move {
                let Err(reason) = pending.await else {
                    return;
                };
                log::warn!("edit of {cell:?} rejected ({reason}), rolling back");
                let Some(state) = this.upgrade() else {
                    return;
                };
                match state.try_borrow_mut() {
                    Ok(mut s) => s.rollback(cell, previous, &value),
                    Err(_) => log::warn!("grid busy, rollback of {cell:?} dropped"),
                };
            });
        }
        Some(cell)
    }

    fn rollback(&mut self, cell: CellRef, previous: CellValue, committed: &CellValue) {
        if self.destroyed {
            return;
        }
        let current = self
            .model
            .get_cell(cell.col_index, cell.row_index)
            .map(|c| &c.content);
        if current != Some(committed) {
            log::debug!("{cell:?} changed again since the rejected edit");
            return;
        }
        if let Err(e) = self.model.update_cell(cell, CellPatch::content(previous)) {
            log::warn!("rollback of {cell:?} failed: {e}");
            return;
        }
        self.render_cell(cell);
        self.render_footer();
    }

    /// Focus `cell` and check it may be edited; returns what the editor
    /// hook needs.
    fn prepare_edit(&mut self, cell: CellRef) -> Option<(Column, Cell)> {
        if self.cells.editing().is_some() {
            self.commit_edit();
        }
        if self.cells.focused() != Some(cell)
            && !self.navigate(|cells, view, surface| cells.focus(view, surface, cell))
        {
            return None;
        }
        if !self
            .cells
            .can_edit(CellView::new(&self.model, &self.visible), cell)
        {
            log::debug!("{cell:?} is not editable");
            return None;
        }
        let column = self.model.column(cell.col_index)?.clone();
        let data = self.model.get_cell(cell.col_index, cell.row_index)?.clone();
        Some((column, data))
    }

    fn copy_selection(&mut self) -> bool {
        let Some((text, count)) = self
            .cells
            .copy_text(CellView::new(&self.model, &self.visible))
        else {
            return false;
        };
        self.surface.copy_text(&text);
        let message = if count == 1 {
            "1 cell copied".to_string()
        } else {
            format!("{count} cells copied")
        };
        self.surface.show_toast(&message);
        true
    }

    fn key_command(&mut self, command: KeyCommand) -> bool {
        let editing = self.cells.editing().is_some();
        match command {
            KeyCommand::Activate if editing => self.commit_edit().is_some(),
            KeyCommand::Cancel if editing => self.cells.cancel(self.surface.as_mut()),
            _ if editing => false,
            KeyCommand::Cancel => {
                self.cells.clear_selection(self.surface.as_mut());
                true
            }
            KeyCommand::Copy => self.copy_selection(),
            KeyCommand::Move(dir) => {
                self.navigate(|cells, view, surface| cells.move_focus(view, surface, dir))
            }
            KeyCommand::Jump(dir) => {
                self.navigate(|cells, view, surface| cells.jump(view, surface, dir))
            }
            KeyCommand::Extend(dir) => {
                self.navigate(|cells, view, surface| cells.extend(view, surface, dir))
            }
            // Needs the editor hook, handled by the caller.
            KeyCommand::Activate => false,
        }
    }

    // ------------------------------------------------------------------
    // Rows
    // ------------------------------------------------------------------

    fn check_row(&mut self, row: RowIndex, checked: bool) -> Result<Option<GridEvent>> {
        self.ensure_alive()?;
        let snapshot = self
            .model
            .get_row(row)
            .cloned()
            .ok_or(GridError::RowOutOfRange(row))?;
        let changed = self.rows.check_row(row, checked, self.surface.as_mut());
        self.rows.show_status(self.surface.as_mut());
        let all = self.all_checked();
        self.surface.set_all_checked(all);
        Ok(changed.then_some(GridEvent::CheckRow(snapshot)))
    }

    fn check_all(&mut self, checked: bool) -> Result<()> {
        self.ensure_alive()?;
        self.rows
            .check_all(checked, &self.model, self.surface.as_mut());
        self.rows.show_status(self.surface.as_mut());
        Ok(())
    }

    fn toggle_tree_node(&mut self, row: RowIndex) -> bool {
        if self.model.is_leaf(row) && !self.rows.is_collapsed(row) {
            return false;
        }
        self.update_tree(|rows, model| rows.toggle(model, row))
    }

    /// Change which tree rows are hidden and re-render.
    ///
    /// An open edit is committed first: its row may be about to leave the
    /// view.
    fn update_tree(&mut self, change: impl FnOnce(&mut RowController, &TabularModel) -> bool) -> bool {
        if self.destroyed {
            return false;
        }
        self.commit_edit();
        if !change(&mut self.rows, &self.model) {
            return false;
        }
        self.render_body();
        true
    }

    fn destroy(&mut self) -> Result<()> {
        self.ensure_alive()?;
        self.cells.cancel(self.surface.as_mut());
        self.keyboard.detach();
        self.surface.destroy();
        self.sink.clear();
        self.visible.clear();
        self.destroyed = true;
        log::debug!("grid destroyed");
        Ok(())
    }
}

/// Run one structural operation through the full sequence.
async fn run_operation(state: &Rc<RefCell<GridState>>, op: StructuralOp) -> Result<()> {
    let started = now_ms();
    state.borrow_mut().freeze()?;
    next_tick().await;
    let event = {
        let mut s = state.borrow_mut();
        s.ensure_alive()?;
        log::debug!("running {op:?}");
        let result = s.apply(op);
        s.surface.unfreeze();
        result?
    };
    log::debug!("structural operation took {:.1}ms", now_ms() - started);
    if let Some(event) = event {
        let hooks = Rc::clone(&state.borrow().hooks);
        hooks.events.fire(&event);
    }
    Ok(())
}

/// Claim the flight guard and run `request`, then everything queued
/// behind it. When another operation is in flight, queue `request` and
/// resolve once the flight owner has run it.
async fn dispatch(
    state: Rc<RefCell<GridState>>,
    request: Result<Option<StructuralOp>>,
) -> Result<Dispatch> {
    let Some(op) = request? else {
        return Ok(Dispatch::Skipped);
    };
    let claim = state.borrow_mut().flight.begin(op.clone());
    if let Claim::Waiting(done) = claim {
        log::debug!("queued {op:?}");
        return match done.await {
            Ok(Ok(())) => Ok(Dispatch::Queued),
            Ok(Err(message)) => Err(GridError::Other(message)),
            Err(_) => Err(GridError::Other(format!("{op:?} was dropped before it ran"))),
        };
    }
    let result = run_operation(&state, op).await;
    loop {
        let next = state.borrow_mut().flight.next();
        let Some(next) = next else {
            break;
        };
        let outcome = run_operation(&state, next.op.clone()).await;
        if let Err(e) = &outcome {
            log::warn!("queued operation failed: {e}");
        }
        next.finish(&outcome);
    }
    result.map(|()| Dispatch::Completed)
}

/// An interactive data table.
///
/// Cloning yields another handle onto the same grid.
#[derive(Clone)]
pub struct DataGrid {
    state: Rc<RefCell<GridState>>,
    spawner: TaskSpawner,
}

impl DataGrid {
    /// Build the model from `options` and render the initial view.
    ///
    /// # Errors
    /// Returns [`GridError::Data`] for malformed `columns` or `data`.
    pub fn new(
        options: GridOptions,
        surface: impl ViewSurface + 'static,
        sink: impl StyleSink + 'static,
        hooks: GridHooks,
    ) -> Result<Self> {
        let mut model = TabularModel::new(ModelConfig {
            checkbox_column: options.checkbox_column,
            serial_no_column: options.serial_no_column,
        });
        model.init(&options.columns, &options.data)?;

        let spawner = TaskSpawner::new();
        let mut keyboard = KeyboardDispatcher::new();
        keyboard.attach();
        let state = Rc::new_cyclic(|this| {
            RefCell::new(GridState {
                this: this.clone(),
                spawner: spawner.clone(),
                engine: RenderEngine::new(&options),
                columns: ColumnController::new(options.filter_debounce_ms),
                options,
                model,
                cells: CellController::new(),
                rows: RowController::new(),
                keyboard,
                flight: FlightGuard::default(),
                surface: Box::new(surface),
                sink: Box::new(sink),
                hooks: Rc::new(hooks),
                visible: Vec::new(),
                destroyed: false,
            })
        });
        {
            let mut s = state.borrow_mut();
            s.install_hooks();
            s.render_all();
            log::debug!(
                "grid created: {} columns, {} rows",
                s.model.columns().len(),
                s.model.row_count()
            );
        }
        Ok(Self { state, spawner })
    }

    /// Convenience constructor from a JSON options document.
    ///
    /// # Errors
    /// Returns an error for malformed options, columns or data.
    pub fn from_json(
        options: &str,
        surface: impl ViewSurface + 'static,
        sink: impl StyleSink + 'static,
    ) -> Result<Self> {
        Self::new(GridOptions::from_json(options)?, surface, sink, GridHooks::new())
    }

    fn spawn(&self, task: impl Future<Output = Result<Dispatch>> + 'static) {
        self.spawner.spawn(async move {
            if let Err(e) = task.await {
                log::warn!("structural operation failed: {e}");
            }
        });
    }

    /// Drive spawned work (header clicks, drops, debounced filters and
    /// async editor saves) until it stalls.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn run_until_stalled(&self) {
        self.spawner.run_until_stalled();
    }

    // ------------------------------------------------------------------
    // Data API
    // ------------------------------------------------------------------

    /// Replace all rows (and the columns, when given) and re-render.
    ///
    /// # Errors
    /// Returns [`GridError::Data`] for malformed input; the grid is left
    /// unchanged in that case.
    pub fn refresh(&self, data: &Value, columns: Option<&Value>) -> Result<()> {
        self.state.borrow_mut().refresh(data, columns)
    }

    /// Append rows, keeping sort, filters, checked rows and focus.
    ///
    /// # Errors
    /// Returns [`GridError::Data`] for malformed `data`.
    pub fn append_rows(&self, data: &Value) -> Result<Vec<RowIndex>> {
        self.state.borrow_mut().append_rows(data)
    }

    /// # Errors
    /// Returns an error for an unknown cell.
    pub fn update_cell(&self, cell: CellRef, patch: CellPatch) -> Result<()> {
        self.state.borrow_mut().update_cell(cell, patch)
    }

    /// # Errors
    /// Returns [`GridError::RowOutOfRange`] for an unknown row.
    pub fn update_row(&self, row: RowIndex, values: &[Option<CellValue>]) -> Result<()> {
        self.state.borrow_mut().update_row(row, values)
    }

    /// Sort by one column.
    ///
    /// An out-of-range column fails immediately; in tree view the request
    /// is skipped.
    pub fn sort_column(
        &self,
        col_index: usize,
        order: SortOrder,
    ) -> impl Future<Output = Result<Dispatch>> + 'static {
        let request = self.state.borrow().sort_request(col_index, order);
        dispatch(Rc::clone(&self.state), request)
    }

    /// Swap two user columns.
    pub fn switch_column(&self, a: usize, b: usize) -> impl Future<Output = Result<Dispatch>> + 'static {
        let request = self.state.borrow().switch_request(a, b);
        dispatch(Rc::clone(&self.state), request)
    }

    pub fn remove_column(&self, col_index: usize) -> impl Future<Output = Result<Dispatch>> + 'static {
        let request = self.state.borrow().remove_request(col_index);
        dispatch(Rc::clone(&self.state), request)
    }

    /// Re-run the current inline filters now.
    pub fn apply_filters(&self) -> impl Future<Output = Result<Dispatch>> + 'static {
        let request = self.state.borrow().filter_request();
        dispatch(Rc::clone(&self.state), request)
    }

    /// Set a column's filter text without debouncing; takes effect on the
    /// next [`DataGrid::apply_filters`].
    ///
    /// # Errors
    /// Rejects unknown and synthetic columns.
    pub fn set_filter(&self, col_index: usize, text: &str) -> Result<()> {
        let mut guard = self.state.borrow_mut();
        let s = &mut *guard;
        s.ensure_alive()?;
        let column = s
            .model
            .column(col_index)
            .ok_or(GridError::ColumnOutOfRange(to_signed(col_index)))?;
        if column.is_standard() {
            return Err(GridError::PinnedColumn(col_index));
        }
        s.columns.set_filter(column, text);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Column by index; negative indices count from the end.
    pub fn get_column(&self, col_index: isize) -> Option<Column> {
        self.state.borrow().model.get_column(col_index).cloned()
    }

    pub fn get_columns(&self, include_standard: bool) -> Vec<Column> {
        self.state
            .borrow()
            .model
            .get_columns(include_standard)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn column_count(&self, include_standard: bool) -> usize {
        self.state.borrow().model.column_count(include_standard)
    }

    pub fn get_rows(&self) -> Vec<Row> {
        self.state.borrow().model.rows().to_vec()
    }

    pub fn get_row(&self, row: RowIndex) -> Option<Row> {
        self.state.borrow().model.get_row(row).cloned()
    }

    pub fn row_count(&self) -> usize {
        self.state.borrow().model.row_count()
    }

    pub fn get_cell(&self, col_index: usize, row: RowIndex) -> Option<Cell> {
        self.state.borrow().model.get_cell(col_index, row).cloned()
    }

    pub fn checked_rows(&self) -> Vec<RowIndex> {
        self.state.borrow().rows.checked_rows()
    }

    /// Rows in view order after filters and collapsed nodes.
    pub fn visible_rows(&self) -> Vec<RowIndex> {
        self.state.borrow().visible.clone()
    }

    /// View positions currently in the body.
    pub fn rendered_range(&self) -> Range<usize> {
        self.state.borrow().engine.rendered_range()
    }

    pub fn cell_state(&self) -> CellState {
        self.state.borrow().cells.state()
    }

    pub fn selection(&self) -> Option<Selection> {
        let s = self.state.borrow();
        s.cells.selection(CellView::new(&s.model, &s.visible))
    }

    pub fn is_busy(&self) -> bool {
        self.state.borrow().flight.is_busy()
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.borrow().destroyed
    }

    /// Read-only access to the model.
    pub fn with_model<R>(&self, f: impl FnOnce(&TabularModel) -> R) -> R {
        f(&self.state.borrow().model)
    }

    // ------------------------------------------------------------------
    // Cell interaction
    // ------------------------------------------------------------------

    /// Pointer click; Shift extends the selection. Clicking a checkbox
    /// cell toggles the row.
    pub fn click_cell(&self, cell: CellRef, shift: bool) -> bool {
        let event = {
            let mut s = self.state.borrow_mut();
            if s.destroyed {
                return false;
            }
            s.click_cell(cell, shift)
        };
        self.fire(event);
        true
    }

    pub fn double_click_cell(&self, cell: CellRef) -> bool {
        self.begin_edit(cell)
    }

    /// Open an editor on `cell`, committing any other open edit first.
    pub fn begin_edit(&self, cell: CellRef) -> bool {
        let (prepared, hooks) = {
            let mut s = self.state.borrow_mut();
            if s.destroyed {
                return false;
            }
            if s.cells.editing() == Some(cell) {
                return true;
            }
            (s.prepare_edit(cell), Rc::clone(&s.hooks))
        };
        let Some((column, data)) = prepared else {
            return false;
        };
        let Some(editor) = hooks.editor_for(&column, &data) else {
            log::debug!("editing suppressed for {cell:?}");
            return false;
        };
        let mut guard = self.state.borrow_mut();
        let s = &mut *guard;
        s.cells.begin_edit(
            CellView::new(&s.model, &s.visible),
            s.surface.as_mut(),
            cell,
            editor,
        )
    }

    /// Commit the open edit (Enter, or focus leaving the editor).
    pub fn commit_edit(&self) -> bool {
        self.state.borrow_mut().commit_edit().is_some()
    }

    /// Discard the open edit (Esc).
    pub fn cancel_edit(&self) -> bool {
        let mut guard = self.state.borrow_mut();
        let s = &mut *guard;
        s.cells.cancel(s.surface.as_mut())
    }

    /// Commit any edit and drop focus and selection.
    pub fn blur(&self) {
        let mut s = self.state.borrow_mut();
        s.commit_edit();
        let s = &mut *s;
        s.cells.blur(s.surface.as_mut());
    }

    /// A key press; returns `true` when the grid handled it.
    pub fn key_down(&self, input: KeyInput) -> bool {
        let (command, focused, editing) = {
            let s = self.state.borrow();
            if s.destroyed {
                return false;
            }
            (s.keyboard.dispatch(input), s.cells.focused(), s.cells.editing())
        };
        let Some(command) = command else {
            return false;
        };
        match (command, focused, editing) {
            (KeyCommand::Activate, Some(cell), None) => self.begin_edit(cell),
            _ => self.state.borrow_mut().key_command(command),
        }
    }

    pub fn attach_keyboard(&self) {
        self.state.borrow_mut().keyboard.attach();
    }

    pub fn detach_keyboard(&self) {
        self.state.borrow_mut().keyboard.detach();
    }

    pub fn scroll(&self, scroll_top: f32) -> bool {
        let mut s = self.state.borrow_mut();
        !s.destroyed && s.scroll(scroll_top)
    }

    // ------------------------------------------------------------------
    // Row interaction
    // ------------------------------------------------------------------

    /// Check or uncheck a row; fires `CheckRow` when the state changed.
    ///
    /// # Errors
    /// Returns [`GridError::RowOutOfRange`] for an unknown row.
    pub fn check_row(&self, row: RowIndex, checked: bool) -> Result<bool> {
        let event = self.state.borrow_mut().check_row(row, checked)?;
        let changed = event.is_some();
        self.fire(event);
        Ok(changed)
    }

    /// Check or uncheck every row, filtered-out rows included.
    ///
    /// # Errors
    /// Returns [`GridError::Destroyed`] after teardown.
    pub fn check_all(&self, checked: bool) -> Result<()> {
        self.state.borrow_mut().check_all(checked)
    }

    pub fn toggle_tree_node(&self, row: RowIndex) -> bool {
        let mut s = self.state.borrow_mut();
        !s.destroyed && s.toggle_tree_node(row)
    }

    pub fn expand_all_nodes(&self) {
        self.state.borrow_mut().update_tree(|rows, _| {
            rows.expand_all();
            true
        });
    }

    pub fn collapse_all_nodes(&self) {
        self.state.borrow_mut().update_tree(|rows, model| {
            rows.collapse_all(model);
            true
        });
    }

    /// Show rows down to `depth`; nodes at that depth end up collapsed.
    pub fn set_tree_depth(&self, depth: u32) {
        self.state.borrow_mut().update_tree(|rows, model| {
            rows.set_tree_depth(model, depth);
            true
        });
    }

    // ------------------------------------------------------------------
    // Column interaction
    // ------------------------------------------------------------------

    /// Header click: cycle the column's sort order.
    pub fn click_header(&self, col_index: usize) -> bool {
        let order = {
            let s = self.state.borrow();
            if s.destroyed {
                return false;
            }
            s.columns.next_sort(&s.model, col_index)
        };
        let Some(order) = order else {
            return false;
        };
        self.spawn(self.sort_column(col_index, order));
        true
    }

    pub fn resize_start(&self, col_index: usize, x: f32) -> bool {
        let mut guard = self.state.borrow_mut();
        let s = &mut *guard;
        !s.destroyed && s.columns.start_resize(&s.model, col_index, x)
    }

    pub fn resize_move(&self, x: f32) -> Option<f32> {
        let mut guard = self.state.borrow_mut();
        let s = &mut *guard;
        s.columns
            .resize_to(x, s.sink.as_mut())
            .map(|(_, width)| width)
    }

    /// Pointer-up: commit the width into the model.
    pub fn resize_end(&self) -> Option<(usize, f32)> {
        let mut s = self.state.borrow_mut();
        let (col_index, width) = s.columns.end_resize()?;
        if let Err(e) = s.model.set_column_width(col_index, width) {
            log::warn!("resize commit failed: {e}");
            return None;
        }
        Some((col_index, width))
    }

    pub fn drag_start(&self, col_index: usize) -> bool {
        let mut guard = self.state.borrow_mut();
        let s = &mut *guard;
        !s.destroyed && s.columns.drag_start(&s.model, col_index)
    }

    /// Drop the dragged column onto `target`; spawns the switch.
    pub fn drop_on(&self, target: usize) -> bool {
        let pair = {
            let mut guard = self.state.borrow_mut();
            let s = &mut *guard;
            s.columns.drop_on(&s.model, target)
        };
        let Some((a, b)) = pair else {
            return false;
        };
        self.spawn(self.switch_column(a, b));
        true
    }

    /// Header dropdown labels: built-ins, then custom entries.
    pub fn dropdown_items(&self) -> Vec<String> {
        let s = self.state.borrow();
        s.columns.dropdown_items(&s.hooks.dropdown_labels())
    }

    /// Run dropdown entry `item` for a column.
    ///
    /// # Errors
    /// Rejects unknown columns and entries.
    pub fn dropdown_select(&self, col_index: usize, item: usize) -> Result<()> {
        let (action, column, hooks) = {
            let s = self.state.borrow();
            s.ensure_alive()?;
            let column = s
                .model
                .column(col_index)
                .cloned()
                .ok_or(GridError::ColumnOutOfRange(to_signed(col_index)))?;
            let action = DropdownAction::from_index(item, s.hooks.header_dropdown.len())
                .ok_or_else(|| GridError::Other(format!("no dropdown entry {item}")))?;
            (action, column, Rc::clone(&s.hooks))
        };
        match action {
            DropdownAction::Sort(order) => self.spawn(self.sort_column(col_index, order)),
            DropdownAction::Remove => self.spawn(self.remove_column(col_index)),
            DropdownAction::Custom(i) => {
                if let Some(entry) = hooks.header_dropdown.get(i) {
                    (entry.action)(&column);
                }
            }
        }
        Ok(())
    }

    /// A keystroke in a column's filter input at time `now_ms`; returns
    /// when the debounced filter becomes due.
    pub fn filter_input(&self, col_index: usize, text: &str, now_ms: f64) -> Option<f64> {
        let mut guard = self.state.borrow_mut();
        let s = &mut *guard;
        if s.destroyed {
            return None;
        }
        let column = s.model.column(col_index).filter(|c| !c.is_standard())?;
        Some(s.columns.on_filter_input(column, text, now_ms))
    }

    /// Apply the debounced filter once its quiet period has passed.
    pub fn poll_filters(&self, now_ms: f64) -> bool {
        let due = {
            let mut s = self.state.borrow_mut();
            !s.destroyed && s.columns.poll_filters(now_ms)
        };
        if due {
            self.spawn(self.apply_filters());
        }
        due
    }

    pub fn filter_deadline(&self) -> Option<f64> {
        self.state.borrow().columns.filter_deadline()
    }

    /// Redo column layout, e.g. after the container was resized.
    pub fn relayout(&self) {
        let mut s = self.state.borrow_mut();
        if !s.destroyed {
            s.layout_columns();
        }
    }

    /// Tear down markup, stylesheet and keyboard bindings.
    ///
    /// # Errors
    /// Returns [`GridError::Destroyed`] when called twice.
    pub fn destroy(&self) -> Result<()> {
        self.state.borrow_mut().destroy()
    }

    fn fire(&self, event: Option<GridEvent>) {
        let Some(event) = event else {
            return;
        };
        let hooks = Rc::clone(&self.state.borrow().hooks);
        hooks.events.fire(&event);
    }
}

impl std::fmt::Debug for DataGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.state.try_borrow() {
            Ok(s) => f
                .debug_struct("DataGrid")
                .field("columns", &s.model.columns().len())
                .field("rows", &s.model.row_count())
                .field("visible", &s.visible.len())
                .field("destroyed", &s.destroyed)
                .finish(),
            Err(_) => f.write_str("DataGrid { <busy> }"),
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::controller::{Direction, Key};
    use crate::render::MemoryStyleSink;
    use crate::surface::MemorySurface;
    use futures::executor::block_on;
    use serde_json::json;

    fn grid(extra: Value) -> (DataGrid, MemorySurface) {
        let mut options = json!({
            "columns": ["Name", "Position", {"name": "Salary", "kind": "number"}],
            "data": [
                ["Faris", "Developer", 4000],
                ["Airi", "Accountant", 7000],
                ["Cara", "CEO", 9000]
            ],
            "clusterize": false
        });
        if let (Some(base), Some(extra)) = (options.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        let surface = MemorySurface::new();
        let grid = DataGrid::new(
            GridOptions::from_value(options).unwrap(),
            surface.clone(),
            MemoryStyleSink::new(),
            GridHooks::new(),
        )
        .unwrap();
        (grid, surface)
    }

    #[test]
    fn test_failed_refresh_leaves_grid_untouched() {
        let (grid, surface) = grid(json!({}));
        let cell = CellRef::new(1, 1);
        assert!(grid.double_click_cell(cell));
        let body = surface.body();

        assert!(matches!(
            grid.refresh(&json!("not rows"), None),
            Err(GridError::Data(_))
        ));
        assert!(grid.refresh(&json!([["x"]]), Some(&json!(42))).is_err());

        assert_eq!(grid.cell_state(), CellState::Editing { cell });
        assert_eq!(grid.row_count(), 3);
        assert_eq!(surface.body(), body);
    }

    #[test]
    fn test_refresh_replaces_rows_and_drops_focus() {
        let (grid, _) = grid(json!({}));
        grid.click_cell(CellRef::new(2, 1), false);
        grid.refresh(&json!([["Yuri", "CMO", 6000]]), None).unwrap();
        assert_eq!(grid.row_count(), 1);
        assert_eq!(grid.cell_state(), CellState::Idle);
        assert_eq!(grid.get_cell(1, 0).unwrap().content.display(), "Yuri");
    }

    #[test]
    fn test_structural_sequence_is_frozen_and_ordered() {
        let (grid, surface) = grid(json!({}));
        let result = block_on(grid.sort_column(3, SortOrder::Desc)).unwrap();
        assert_eq!(result, Dispatch::Completed);
        assert_eq!(grid.visible_rows(), vec![2, 1, 0]);
        assert_eq!(surface.state().freeze_log, vec![true, false]);
        assert!(!surface.state().frozen);
        assert!(!grid.is_busy());
    }

    #[test]
    fn test_pinned_column_requests_fail_fast() {
        let (grid, surface) = grid(json!({}));
        let err = block_on(grid.remove_column(0)).unwrap_err();
        assert!(matches!(err, GridError::PinnedColumn(0)));
        assert!(surface.state().freeze_log.is_empty());
    }

    #[test]
    fn test_tree_view_skips_sorting() {
        let (grid, _) = grid(json!({"treeView": true}));
        let result = block_on(grid.sort_column(1, SortOrder::Asc)).unwrap();
        assert_eq!(result, Dispatch::Skipped);
    }

    #[test]
    fn test_enter_opens_and_commits_editor() {
        let (grid, _) = grid(json!({}));
        let cell = CellRef::new(0, 1);
        grid.click_cell(cell, false);
        assert!(grid.key_down(KeyInput::new(Key::Enter)));
        assert_eq!(grid.cell_state(), CellState::Editing { cell });
        assert!(!grid.key_down(KeyInput::new(Key::Arrow(Direction::Down))));
        assert!(grid.key_down(KeyInput::new(Key::Enter)));
        assert_eq!(grid.cell_state(), CellState::Focused { focus: cell, anchor: None });
    }

    #[test]
    fn test_destroy_twice_errors() {
        let (grid, surface) = grid(json!({}));
        grid.destroy().unwrap();
        assert!(surface.state().destroyed);
        assert!(matches!(grid.destroy(), Err(GridError::Destroyed)));
        assert!(!grid.key_down(KeyInput::new(Key::Enter)));
        assert!(block_on(grid.apply_filters()).is_err());
    }
}
