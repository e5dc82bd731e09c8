//! Extract the callback options of a JS options object into [`GridHooks`].

use std::cmp::Ordering;

use js_sys::{Array, Function, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement};

use crate::controller::{CellEditor, EditorChoice};
use crate::grid::{DropdownItem, GridEvent, GridEvents, GridHooks};
use crate::types::{Cell, Column};

use super::editor::{js_error_text, value_to_js, InputEditor, JsEditor};
use super::surface::cell_selector;

fn get(object: &JsValue, key: &str) -> Option<JsValue> {
    Reflect::get(object, &JsValue::from_str(key))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

fn get_fn(object: &JsValue, key: &str) -> Option<Function> {
    get(object, key)?.dyn_into::<Function>().ok()
}

fn to_js<T: serde::Serialize>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or(JsValue::UNDEFINED)
}

/// Call `f`, logging anything it throws.
fn call(f: &Function, what: &str, args: &[JsValue]) -> Option<JsValue> {
    let args: Array = args.iter().collect();
    match f.apply(&JsValue::NULL, &args) {
        Ok(result) => Some(result),
        Err(e) => {
            log::warn!("{what} threw: {}", js_error_text(&e));
            None
        }
    }
}

/// Build hooks from `options`.
///
/// `column_ids` are the ids the user column definitions resolve to, in
/// the order of `options.columns`.
pub(crate) fn read_hooks(
    options: &JsValue,
    column_ids: &[String],
    root: &Element,
    container: &HtmlElement,
) -> GridHooks {
    let editor_root = root.clone();
    let editor_container = container.clone();
    let mut hooks = GridHooks::new().with_default_editor(move || -> Box<dyn CellEditor> {
        Box::new(InputEditor::new(editor_root.clone(), editor_container.clone()))
    });

    if let Some(get_editor) = get_fn(options, "getEditor") {
        let root = root.clone();
        hooks = hooks.with_editor(move |column, cell| editor_choice(&get_editor, &root, column, cell));
    }

    if let Some(items) = get(options, "headerDropdown").and_then(|v| v.dyn_into::<Array>().ok()) {
        for item in items.iter() {
            let label = get(&item, "label").and_then(|l| l.as_string()).unwrap_or_default();
            let Some(action) = get_fn(&item, "action") else {
                log::warn!("headerDropdown entry {label:?} has no action");
                continue;
            };
            hooks = hooks.with_dropdown_item(DropdownItem::new(label, move |column: &Column| {
                call(&action, "headerDropdown action", &[to_js(column)]);
            }));
        }
    }

    if let Some(events) = get(options, "events") {
        hooks = hooks.with_events(GridEvents::new().on(move |event| {
            let Some(f) = get_fn(&events, event.name()) else {
                return;
            };
            let args = match event {
                GridEvent::SortColumn(c) | GridEvent::RemoveColumn(c) => vec![to_js(c)],
                GridEvent::SwitchColumn(a, b) => vec![to_js(a), to_js(b)],
                GridEvent::CheckRow(row) => vec![to_js(row)],
            };
            call(&f, event.name(), &args);
        }));
    }

    if let Some(columns) = get(options, "columns").and_then(|v| v.dyn_into::<Array>().ok()) {
        for (def, id) in columns.iter().zip(column_ids) {
            if let Some(format) = get_fn(&def, "format") {
                hooks = hooks.with_format(id.clone(), move |value| {
                    call(&format, "column format", &[value_to_js(value)])
                        .and_then(|text| text.as_string())
                        .unwrap_or_else(|| value.display())
                });
            }
            if let Some(compare) = get_fn(&def, "compare") {
                hooks = hooks.with_comparator(id.clone(), move |a, b| {
                    call(&compare, "column compare", &[value_to_js(a), value_to_js(b)])
                        .and_then(|n| n.as_f64())
                        .and_then(|n| n.partial_cmp(&0.0))
                        .unwrap_or(Ordering::Equal)
                });
            }
        }
    }
    hooks
}

/// `getEditor(colIndex, rowIndex, value, parent, column, cell)`:
/// `false` suppresses editing, nothing keeps the built-in editor.
fn editor_choice(get_editor: &Function, root: &Element, column: &Column, cell: &Cell) -> EditorChoice {
    let parent: JsValue = root
        .query_selector(&cell_selector(cell.cell_ref()))
        .ok()
        .flatten()
        .map_or(JsValue::NULL, Into::into);
    let args = [
        JsValue::from_f64(cell.col_index as f64),
        JsValue::from_f64(f64::from(cell.row_index)),
        value_to_js(&cell.content),
        parent,
        to_js(column),
        to_js(cell),
    ];
    match call(get_editor, "getEditor", &args) {
        Some(v) if v.as_bool() == Some(false) => EditorChoice::Disabled,
        Some(v) if v.is_object() => EditorChoice::Custom(Box::new(JsEditor::new(v))),
        _ => EditorChoice::Default,
    }
}

