//! Browser bindings: the `DataTable` class exported to JavaScript.
//!
//! The DOM surface, stylesheet sink and editors live in submodules; this
//! module owns event wiring. Listeners are attached to the wrapper (plus
//! the scroll container, the document and the window where needed) and
//! removed again on `destroy`.

mod editor;
mod hooks;
pub(crate) mod logger;
mod surface;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use js_sys::{Array, Promise};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::future_to_promise;
use web_sys::{
    DragEvent, Element, Event, EventTarget, HtmlElement, HtmlInputElement, KeyboardEvent,
    MouseEvent,
};

use crate::controller::KeyInput;
use crate::error::{GridError, Result};
use crate::grid::{now_ms, DataGrid, Dispatch};
use crate::model::resolve_ids;
use crate::options::GridOptions;
use crate::types::{CellPatch, CellRef, SortOrder};

use editor::value_from_js;
use surface::{cell_at, header_col_at, scroll_top, DomStyleSink, DomSurface};

/// An event listener that detaches itself when dropped.
struct Listener {
    target: EventTarget,
    name: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn attach(target: &EventTarget, name: &'static str, f: impl FnMut(Event) + 'static) -> Self {
        let closure = Closure::wrap(Box::new(f) as Box<dyn FnMut(Event)>);
        target
            .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
            .ok();
        Self {
            target: target.clone(),
            name,
            closure,
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.name, self.closure.as_ref().unchecked_ref());
    }
}

/// Timer that applies the debounced inline filter.
#[derive(Default)]
struct FilterTimer {
    handle: Option<i32>,
    callback: Option<Closure<dyn FnMut()>>,
}

impl FilterTimer {
    fn cancel(&mut self) {
        if let (Some(handle), Some(window)) = (self.handle.take(), web_sys::window()) {
            window.clear_timeout_with_handle(handle);
        }
    }
}

fn schedule_filter(timer: &Rc<RefCell<FilterTimer>>, grid: &DataGrid, delay_ms: f64) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let mut t = timer.borrow_mut();
    t.cancel();
    if t.callback.is_none() {
        let weak: Weak<RefCell<FilterTimer>> = Rc::downgrade(timer);
        let grid = grid.clone();
        t.callback = Some(Closure::wrap(Box::new(move || {
            let Some(timer) = weak.upgrade() else {
                return;
            };
            timer.borrow_mut().handle = None;
            let now = now_ms();
            if !grid.poll_filters(now) {
                if let Some(deadline) = grid.filter_deadline() {
                    schedule_filter(&timer, &grid, deadline - now);
                }
            }
        }) as Box<dyn FnMut()>));
    }
    let Some(callback) = t.callback.as_ref() else {
        return;
    };
    #[allow(clippy::cast_possible_truncation)]
    let delay = delay_ms.clamp(0.0, f64::from(i32::MAX)).ceil() as i32;
    t.handle = window
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            delay,
        )
        .ok();
}

fn target_element(event: &Event) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()
}

fn matches(element: &Element, selector: &str) -> Option<Element> {
    element.closest(selector).ok().flatten()
}

fn to_js<T: serde::Serialize>(value: &T) -> std::result::Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn json_from_js(value: &JsValue) -> Result<serde_json::Value> {
    if value.is_undefined() || value.is_null() {
        return Ok(serde_json::Value::Null);
    }
    serde_wasm_bindgen::from_value(value.clone()).map_err(|e| GridError::Other(e.to_string()))
}

/// Serialisable part of the options; callbacks are dropped by `JSON.stringify`.
fn options_from_js(options: &JsValue) -> Result<GridOptions> {
    let text = js_sys::JSON::stringify(options)
        .ok()
        .and_then(|s| s.as_string())
        .ok_or_else(|| GridError::Options("options are not serialisable".into()))?;
    GridOptions::from_json(&text)
}

fn dispatch_promise(
    op: impl std::future::Future<Output = Result<Dispatch>> + 'static,
) -> Promise {
    future_to_promise(async move {
        let dispatch = op.await?;
        Ok(JsValue::from_str(match dispatch {
            Dispatch::Completed => "completed",
            Dispatch::Queued => "queued",
            Dispatch::Skipped => "skipped",
        }))
    })
}

fn open_dropdown(grid: &DataGrid, toggle: &Element) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let Some(cell) = toggle.parent_element() else {
        return;
    };
    if let Some(existing) = matches(&cell, ".dt-cell--header")
        .and_then(|c| c.query_selector(".dt-dropdown__list").ok().flatten())
    {
        existing.remove();
        return;
    }
    let Ok(list) = document.create_element("div") else {
        return;
    };
    list.set_class_name("dt-dropdown__list");
    for (i, label) in grid.dropdown_items().iter().enumerate() {
        let Ok(item) = document.create_element("div") else {
            continue;
        };
        item.set_class_name("dt-dropdown__list-item");
        let _ = item.set_attribute("data-index", &i.to_string());
        item.set_text_content(Some(label));
        let _ = list.append_child(&item);
    }
    let _ = cell.append_child(&list);
}

fn on_click(grid: &DataGrid, event: &Event) {
    let Some(target) = target_element(event) else {
        return;
    };
    let shift = event
        .dyn_ref::<MouseEvent>()
        .is_some_and(MouseEvent::shift_key);

    if let Some(item) = matches(&target, ".dt-dropdown__list-item") {
        let index = item.get_attribute("data-index").and_then(|i| i.parse().ok());
        if let (Some(col), Some(index)) = (header_col_at(&item), index) {
            if let Err(e) = grid.dropdown_select(col, index) {
                log::warn!("dropdown: {e}");
            }
        }
        if let Some(list) = matches(&item, ".dt-dropdown__list") {
            list.remove();
        }
        event.stop_propagation();
        return;
    }
    if let Some(toggle) = matches(&target, ".dt-dropdown__toggle") {
        open_dropdown(grid, &toggle);
        return;
    }
    if let Some(input) = target.dyn_ref::<HtmlInputElement>() {
        if input.class_list().contains("dt-check-all") {
            if let Err(e) = grid.check_all(input.checked()) {
                log::warn!("check all: {e}");
            }
            return;
        }
        if input.class_list().contains("dt-row-check") {
            if let Some(cell) = cell_at(&target) {
                if let Err(e) = grid.check_row(cell.row_index, input.checked()) {
                    log::warn!("check row: {e}");
                }
            }
            return;
        }
        if input.class_list().contains("dt-filter") {
            return;
        }
    }
    if matches(&target, ".dt-tree-node__toggle").is_some() {
        if let Some(cell) = cell_at(&target) {
            grid.toggle_tree_node(cell.row_index);
        }
        return;
    }
    if matches(&target, ".dt-cell__resize-handle").is_some() {
        return;
    }
    if let Some(col) = header_col_at(&target) {
        grid.click_header(col);
        return;
    }
    if let Some(cell) = cell_at(&target) {
        grid.click_cell(cell, shift);
    }
}

fn on_key_down(grid: &DataGrid, event: &Event) {
    let Some(key) = event.dyn_ref::<KeyboardEvent>() else {
        return;
    };
    if target_element(event).is_some_and(|t| t.class_list().contains("dt-filter")) {
        return;
    }
    let Some(input) = KeyInput::from_event(&key.key(), key.ctrl_key(), key.meta_key(), key.shift_key())
    else {
        return;
    };
    if grid.key_down(input) {
        event.prevent_default();
    }
}

/// An interactive data table mounted into a wrapper element.
#[wasm_bindgen]
pub struct DataTable {
    grid: DataGrid,
    listeners: Vec<Listener>,
    filter_timer: Rc<RefCell<FilterTimer>>,
}

#[wasm_bindgen]
impl DataTable {
    /// Mount a table into `wrapper`.
    ///
    /// # Errors
    /// Throws for malformed options, columns or data.
    #[wasm_bindgen(constructor)]
    pub fn new(wrapper: HtmlElement, options: JsValue) -> std::result::Result<DataTable, JsValue> {
        console_error_panic_hook::set_once();
        let grid_options = options_from_js(&options)?;
        let column_ids = resolve_ids(&grid_options.columns)?;

        let surface = DomSurface::mount(&wrapper)?;
        let root = surface.root();
        let scroll = surface.scroll_container();
        let sink = DomStyleSink::new(surface.scope());
        let grid_hooks = hooks::read_hooks(&options, &column_ids, &root, &scroll);
        let grid = DataGrid::new(grid_options, surface, sink, grid_hooks)?;

        let filter_timer = Rc::new(RefCell::new(FilterTimer::default()));
        let listeners = Self::attach_listeners(&grid, &wrapper, &scroll, &filter_timer);
        Ok(DataTable {
            grid,
            listeners,
            filter_timer,
        })
    }

    fn attach_listeners(
        grid: &DataGrid,
        wrapper: &HtmlElement,
        scroll: &HtmlElement,
        filter_timer: &Rc<RefCell<FilterTimer>>,
    ) -> Vec<Listener> {
        let mut listeners = Vec::new();

        {
            let grid = grid.clone();
            listeners.push(Listener::attach(wrapper, "click", move |event| {
                on_click(&grid, &event);
            }));
        }
        {
            let grid = grid.clone();
            listeners.push(Listener::attach(wrapper, "dblclick", move |event| {
                if let Some(cell) = target_element(&event).and_then(|t| cell_at(&t)) {
                    grid.double_click_cell(cell);
                }
            }));
        }
        {
            let grid = grid.clone();
            listeners.push(Listener::attach(wrapper, "keydown", move |event| {
                on_key_down(&grid, &event);
            }));
        }

        // Column resize: start on the handle, track on the document
        {
            let grid = grid.clone();
            listeners.push(Listener::attach(wrapper, "mousedown", move |event| {
                let Some(target) = target_element(&event) else {
                    return;
                };
                let Some(mouse) = event.dyn_ref::<MouseEvent>() else {
                    return;
                };
                if matches(&target, ".dt-cell__resize-handle").is_none() {
                    return;
                }
                if let Some(col) = header_col_at(&target) {
                    if grid.resize_start(col, mouse.client_x() as f32) {
                        event.prevent_default();
                    }
                }
            }));
        }
        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            {
                let grid = grid.clone();
                listeners.push(Listener::attach(&document, "mousemove", move |event| {
                    if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
                        grid.resize_move(mouse.client_x() as f32);
                    }
                }));
            }
            {
                let grid = grid.clone();
                listeners.push(Listener::attach(&document, "mouseup", move |_event| {
                    grid.resize_end();
                }));
            }
            {
                // Pointer down outside the table drops focus
                let grid = grid.clone();
                let wrapper = wrapper.clone();
                listeners.push(Listener::attach(&document, "mousedown", move |event| {
                    let inside = event
                        .target()
                        .and_then(|t| t.dyn_into::<web_sys::Node>().ok())
                        .is_some_and(|node| wrapper.contains(Some(&node)));
                    if !inside {
                        grid.blur();
                    }
                }));
            }
        }

        // Column drag and drop
        {
            let grid = grid.clone();
            listeners.push(Listener::attach(wrapper, "dragstart", move |event| {
                let Some(col) = target_element(&event).and_then(|t| header_col_at(&t)) else {
                    return;
                };
                if !grid.drag_start(col) {
                    event.prevent_default();
                    return;
                }
                if let Some(transfer) = event.dyn_ref::<DragEvent>().and_then(DragEvent::data_transfer) {
                    let _ = transfer.set_data("text/plain", &col.to_string());
                }
            }));
        }
        listeners.push(Listener::attach(wrapper, "dragover", move |event| {
            if target_element(&event).and_then(|t| header_col_at(&t)).is_some() {
                event.prevent_default();
            }
        }));
        {
            let grid = grid.clone();
            listeners.push(Listener::attach(wrapper, "drop", move |event| {
                if let Some(col) = target_element(&event).and_then(|t| header_col_at(&t)) {
                    event.prevent_default();
                    grid.drop_on(col);
                }
            }));
        }

        // Inline filters
        {
            let grid = grid.clone();
            let timer = Rc::clone(filter_timer);
            listeners.push(Listener::attach(wrapper, "input", move |event| {
                let Some(input) = event
                    .target()
                    .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
                    .filter(|i| i.class_list().contains("dt-filter"))
                else {
                    return;
                };
                let Some(col) = input
                    .get_attribute("data-col-index")
                    .and_then(|c| c.parse().ok())
                else {
                    return;
                };
                let now = now_ms();
                if let Some(deadline) = grid.filter_input(col, &input.value(), now) {
                    schedule_filter(&timer, &grid, deadline - now);
                }
            }));
        }

        {
            let grid = grid.clone();
            let container = scroll.clone();
            listeners.push(Listener::attach(scroll, "scroll", move |_event| {
                grid.scroll(scroll_top(&container));
            }));
        }
        if let Some(window) = web_sys::window() {
            let grid = grid.clone();
            listeners.push(Listener::attach(&window, "resize", move |_event| {
                grid.relayout();
            }));
        }

        listeners
    }

    // ------------------------------------------------------------------
    // Data
    // ------------------------------------------------------------------

    /// Replace the rows, and the columns when given.
    ///
    /// # Errors
    /// Throws a `DataError` message for malformed input.
    pub fn refresh(&self, data: JsValue, columns: JsValue) -> std::result::Result<(), JsValue> {
        let data = json_from_js(&data)?;
        let columns = json_from_js(&columns)?;
        let columns = (!columns.is_null()).then_some(&columns);
        Ok(self.grid.refresh(&data, columns)?)
    }

    /// # Errors
    /// Throws a `DataError` message for malformed rows.
    #[wasm_bindgen(js_name = appendRows)]
    pub fn append_rows(&self, data: JsValue) -> std::result::Result<Vec<u32>, JsValue> {
        Ok(self.grid.append_rows(&json_from_js(&data)?)?)
    }

    /// # Errors
    /// Throws for an unknown cell.
    #[wasm_bindgen(js_name = updateCell)]
    pub fn update_cell(
        &self,
        col_index: usize,
        row_index: u32,
        value: JsValue,
    ) -> std::result::Result<(), JsValue> {
        let patch = CellPatch::content(value_from_js(&value));
        Ok(self.grid.update_cell(CellRef::new(row_index, col_index), patch)?)
    }

    /// `undefined` entries leave their cell untouched.
    ///
    /// # Errors
    /// Throws for an unknown row.
    #[wasm_bindgen(js_name = updateRow)]
    pub fn update_row(&self, row_index: u32, values: Array) -> std::result::Result<(), JsValue> {
        let values: Vec<_> = values
            .iter()
            .map(|v| (!v.is_undefined()).then(|| value_from_js(&v)))
            .collect();
        Ok(self.grid.update_row(row_index, &values)?)
    }

    // ------------------------------------------------------------------
    // Structural operations (resolve to "completed" | "queued" | "skipped")
    // ------------------------------------------------------------------

    #[wasm_bindgen(js_name = sortColumn)]
    pub fn sort_column(&self, col_index: usize, order: &str) -> Promise {
        let order = SortOrder::parse(order).unwrap_or(SortOrder::Asc);
        dispatch_promise(self.grid.sort_column(col_index, order))
    }

    #[wasm_bindgen(js_name = switchColumn)]
    pub fn switch_column(&self, a: usize, b: usize) -> Promise {
        dispatch_promise(self.grid.switch_column(a, b))
    }

    #[wasm_bindgen(js_name = removeColumn)]
    pub fn remove_column(&self, col_index: usize) -> Promise {
        dispatch_promise(self.grid.remove_column(col_index))
    }

    /// Set a column filter and apply all filters.
    #[wasm_bindgen(js_name = applyFilter)]
    pub fn apply_filter(&self, col_index: usize, text: &str) -> Promise {
        if let Err(e) = self.grid.set_filter(col_index, text) {
            return Promise::reject(&e.into());
        }
        dispatch_promise(self.grid.apply_filters())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// # Errors
    /// Throws if the column cannot be serialised.
    #[wasm_bindgen(js_name = getColumn)]
    pub fn get_column(&self, col_index: isize) -> std::result::Result<JsValue, JsValue> {
        to_js(&self.grid.get_column(col_index))
    }

    /// # Errors
    /// Throws if the columns cannot be serialised.
    #[wasm_bindgen(js_name = getColumns)]
    pub fn get_columns(&self, include_standard: bool) -> std::result::Result<JsValue, JsValue> {
        to_js(&self.grid.get_columns(include_standard))
    }

    /// # Errors
    /// Throws if the rows cannot be serialised.
    #[wasm_bindgen(js_name = getRows)]
    pub fn get_rows(&self) -> std::result::Result<JsValue, JsValue> {
        to_js(&self.grid.get_rows())
    }

    /// # Errors
    /// Throws if the row cannot be serialised.
    #[wasm_bindgen(js_name = getRow)]
    pub fn get_row(&self, row_index: u32) -> std::result::Result<JsValue, JsValue> {
        to_js(&self.grid.get_row(row_index))
    }

    /// # Errors
    /// Throws if the cell cannot be serialised.
    #[wasm_bindgen(js_name = getCell)]
    pub fn get_cell(&self, col_index: usize, row_index: u32) -> std::result::Result<JsValue, JsValue> {
        to_js(&self.grid.get_cell(col_index, row_index))
    }

    #[wasm_bindgen(js_name = getCheckedRows)]
    pub fn get_checked_rows(&self) -> Vec<u32> {
        self.grid.checked_rows()
    }

    #[wasm_bindgen(js_name = getVisibleRows)]
    pub fn get_visible_rows(&self) -> Vec<u32> {
        self.grid.visible_rows()
    }

    #[wasm_bindgen(js_name = getRowCount)]
    pub fn row_count(&self) -> usize {
        self.grid.row_count()
    }

    #[wasm_bindgen(js_name = getColumnCount)]
    pub fn column_count(&self, include_standard: bool) -> usize {
        self.grid.column_count(include_standard)
    }

    #[wasm_bindgen(js_name = isBusy)]
    pub fn is_busy(&self) -> bool {
        self.grid.is_busy()
    }

    // ------------------------------------------------------------------
    // Rows
    // ------------------------------------------------------------------

    /// # Errors
    /// Throws for an unknown row.
    #[wasm_bindgen(js_name = checkRow)]
    pub fn check_row(&self, row_index: u32, checked: bool) -> std::result::Result<bool, JsValue> {
        Ok(self.grid.check_row(row_index, checked)?)
    }

    /// # Errors
    /// Throws after `destroy`.
    #[wasm_bindgen(js_name = checkAll)]
    pub fn check_all(&self, checked: bool) -> std::result::Result<(), JsValue> {
        Ok(self.grid.check_all(checked)?)
    }

    #[wasm_bindgen(js_name = toggleTreeNode)]
    pub fn toggle_tree_node(&self, row_index: u32) -> bool {
        self.grid.toggle_tree_node(row_index)
    }

    #[wasm_bindgen(js_name = expandAllNodes)]
    pub fn expand_all_nodes(&self) {
        self.grid.expand_all_nodes();
    }

    #[wasm_bindgen(js_name = collapseAllNodes)]
    pub fn collapse_all_nodes(&self) {
        self.grid.collapse_all_nodes();
    }

    #[wasm_bindgen(js_name = setTreeDepth)]
    pub fn set_tree_depth(&self, depth: u32) {
        self.grid.set_tree_depth(depth);
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    #[wasm_bindgen(js_name = attachKeyboard)]
    pub fn attach_keyboard(&self) {
        self.grid.attach_keyboard();
    }

    #[wasm_bindgen(js_name = detachKeyboard)]
    pub fn detach_keyboard(&self) {
        self.grid.detach_keyboard();
    }

    /// Recompute column widths, e.g. after the wrapper was resized.
    pub fn relayout(&self) {
        self.grid.relayout();
    }

    /// Remove the table, its stylesheet and every listener.
    ///
    /// # Errors
    /// Throws when called twice.
    pub fn destroy(&mut self) -> std::result::Result<(), JsValue> {
        self.filter_timer.borrow_mut().cancel();
        self.listeners.clear();
        Ok(self.grid.destroy()?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn mount(options: &str) -> (HtmlElement, DataTable) {
        let document = web_sys::window().and_then(|w| w.document()).unwrap();
        let wrapper = document
            .create_element("div")
            .unwrap()
            .dyn_into::<HtmlElement>()
            .unwrap();
        document.body().unwrap().append_child(&wrapper).unwrap();
        let options = js_sys::JSON::parse(options).unwrap();
        let table = DataTable::new(wrapper.clone(), options).unwrap();
        (wrapper, table)
    }

    #[wasm_bindgen_test]
    fn test_mount_renders_rows_and_destroy_cleans_up() {
        let (wrapper, mut table) = mount(
            r#"{"columns": ["Name", "Office"], "data": [["Airi", "Tokyo"], ["Cara", "London"]]}"#,
        );
        assert_eq!(wrapper.query_selector_all(".dt-body .dt-row[data-row-index]").unwrap().length(), 2);
        assert_eq!(table.row_count(), 2);
        table.destroy().unwrap();
        assert!(wrapper.query_selector(".datatable").unwrap().is_none());
        assert!(table.destroy().is_err());
    }

    #[wasm_bindgen_test]
    fn test_checkbox_click_checks_row() {
        let (wrapper, table) = mount(
            r#"{"columns": ["Name"], "data": [["Airi"], ["Cara"]], "checkboxColumn": true}"#,
        );
        let check = wrapper
            .query_selector(".dt-row-1 .dt-row-check")
            .unwrap()
            .unwrap()
            .dyn_into::<HtmlElement>()
            .unwrap();
        check.click();
        assert_eq!(table.get_checked_rows(), vec![1]);
    }
}
