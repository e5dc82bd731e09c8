//! DOM cell editors: the built-in `<input>` overlay and the adapter for
//! editors returned by a JS `getEditor` hook.

use js_sys::{Function, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Element, HtmlElement, HtmlInputElement};

use crate::controller::{parse_input, CellEditor, CommitFuture};
use crate::types::{CellRef, CellValue};

use super::surface::cell_selector;

pub(crate) fn value_to_js(value: &CellValue) -> JsValue {
    match value {
        CellValue::Number(n) => JsValue::from_f64(*n),
        CellValue::Text(s) => JsValue::from_str(s),
        CellValue::Empty => JsValue::NULL,
    }
}

pub(crate) fn value_from_js(value: &JsValue) -> CellValue {
    if let Some(n) = value.as_f64() {
        return CellValue::Number(n);
    }
    if let Some(s) = value.as_string() {
        return CellValue::Text(s);
    }
    if value.is_null() || value.is_undefined() {
        return CellValue::Empty;
    }
    js_sys::JSON::stringify(value)
        .ok()
        .and_then(|s| s.as_string())
        .map_or(CellValue::Empty, CellValue::Text)
}

/// Message text of a thrown JS value.
pub(crate) fn js_error_text(error: &JsValue) -> String {
    Reflect::get(error, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .or_else(|| error.as_string())
        .unwrap_or_else(|| format!("{error:?}"))
}

/// Text input laid over the cell being edited.
pub(crate) struct InputEditor {
    root: Element,
    container: HtmlElement,
    input: Option<HtmlInputElement>,
}

impl InputEditor {
    pub(crate) fn new(root: Element, container: HtmlElement) -> Self {
        Self {
            root,
            container,
            input: None,
        }
    }

    fn get_or_create_input(&mut self) -> Option<&HtmlInputElement> {
        if self.input.is_none() {
            let document = web_sys::window()?.document()?;
            let input = document
                .create_element("input")
                .ok()?
                .dyn_into::<HtmlInputElement>()
                .ok()?;
            input.set_type("text");
            input.set_class_name("dt-input dt-cell__edit");
            let style = input.style();
            let _ = style.set_property("position", "absolute");
            let _ = style.set_property("z-index", "10");
            let _ = style.set_property("box-sizing", "border-box");
            let _ = style.set_property("display", "none");
            let _ = self.container.append_child(&input);
            self.input = Some(input);
        }
        self.input.as_ref()
    }

    /// Cell rectangle relative to the scroll container's content.
    fn cell_rect(&self, cell: CellRef) -> Option<[f64; 4]> {
        let td = self.root.query_selector(&cell_selector(cell)).ok()??;
        let rect = td.get_bounding_client_rect();
        let origin = self.container.get_bounding_client_rect();
        Some([
            rect.left() - origin.left() + f64::from(self.container.scroll_left()),
            rect.top() - origin.top() + f64::from(self.container.scroll_top()),
            rect.width(),
            rect.height(),
        ])
    }
}

impl CellEditor for InputEditor {
    fn init_value(&mut self, cell: CellRef, value: &CellValue) {
        let rect = self.cell_rect(cell);
        let Some(input) = self.get_or_create_input() else {
            log::warn!("could not create the cell editor input");
            return;
        };
        let style = input.style();
        if let Some([x, y, w, h]) = rect {
            let _ = style.set_property("left", &format!("{x}px"));
            let _ = style.set_property("top", &format!("{y}px"));
            let _ = style.set_property("width", &format!("{w}px"));
            let _ = style.set_property("height", &format!("{h}px"));
        }
        let _ = style.set_property("display", "block");
        input.set_value(&value.display());
        let _ = input.focus();
        input.select();
    }

    fn value(&self) -> CellValue {
        self.input
            .as_ref()
            .map_or(CellValue::Empty, |input| parse_input(&input.value()))
    }

    fn set_value(&mut self, _cell: CellRef, _value: &CellValue) -> Option<CommitFuture> {
        self.hide();
        None
    }

    fn hide(&mut self) {
        if let Some(input) = &self.input {
            let _ = input.style().set_property("display", "none");
            let _ = input.blur();
        }
    }
}

impl Drop for InputEditor {
    fn drop(&mut self) {
        if let Some(input) = self.input.take() {
            input.remove();
        }
    }
}

/// Adapter for `{ initValue, getValue, setValue }` objects.
///
/// A `setValue` that returns a Promise makes the save asynchronous; a
/// rejected Promise rolls the cell back.
pub(crate) struct JsEditor {
    object: JsValue,
}

impl JsEditor {
    pub(crate) fn new(object: JsValue) -> Self {
        Self { object }
    }

    fn call(&self, name: &str, args: &[JsValue]) -> Option<JsValue> {
        let f = Reflect::get(&self.object, &JsValue::from_str(name))
            .ok()?
            .dyn_into::<Function>()
            .ok()?;
        let args: js_sys::Array = args.iter().collect();
        match f.apply(&self.object, &args) {
            Ok(result) => Some(result),
            Err(e) => {
                log::error!("editor {name} threw: {}", js_error_text(&e));
                None
            }
        }
    }
}

fn cell_args(cell: CellRef, value: &CellValue) -> [JsValue; 3] {
    [
        value_to_js(value),
        JsValue::from_f64(f64::from(cell.row_index)),
        JsValue::from_f64(cell.col_index as f64),
    ]
}

impl CellEditor for JsEditor {
    fn init_value(&mut self, cell: CellRef, value: &CellValue) {
        self.call("initValue", &cell_args(cell, value));
    }

    fn value(&self) -> CellValue {
        self.call("getValue", &[])
            .map_or(CellValue::Empty, |v| value_from_js(&v))
    }

    fn set_value(&mut self, cell: CellRef, value: &CellValue) -> Option<CommitFuture> {
        let result = self.call("setValue", &cell_args(cell, value))?;
        let promise = result.dyn_into::<Promise>().ok()?;
        Some(Box::pin(async move {
            JsFuture::from(promise)
                .await
                .map(|_| ())
                .map_err(|e| js_error_text(&e))
        }))
    }
}
