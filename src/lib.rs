//! datagrid - interactive data tables for the web
//!
//! A spreadsheet-like table widget compiled to WebAssembly:
//! - Sorting, inline filters, column resize / reorder / removal
//! - Cell focus, range selection, copy, inline and custom editors
//! - Checkbox and serial-number columns, tree rows, total row
//! - Virtualized body rendering for large datasets
//!
//! The core ([`grid::DataGrid`]) renders into any [`surface::ViewSurface`];
//! on `wasm32` the [`DataTable`] class binds it to the DOM.
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { DataTable } from 'datagrid';
//! await init();
//! const table = new DataTable(document.querySelector('#table'), {
//!     columns: ['Name', 'Position', { name: 'Salary', kind: 'number' }],
//!     data: [['Airi Satou', 'Accountant', 162700]],
//!     inlineFilters: true,
//! });
//! await table.sortColumn(3, 'desc');
//! ```

pub mod controller;
pub mod error;
pub mod grid;
pub mod model;
pub mod options;
pub mod render;
pub mod surface;
pub mod types;

#[cfg(target_arch = "wasm32")]
mod web;

use wasm_bindgen::prelude::*;

pub use error::{DataError, GridError, Result};
pub use grid::{DataGrid, Dispatch, DropdownItem, GridEvent, GridEvents, GridHooks};
pub use model::TabularModel;
pub use options::{GridOptions, Layout};
pub use render::{MemoryStyleSink, StyleSink};
pub use surface::{MemorySurface, ViewSurface};
pub use types::*;

#[cfg(target_arch = "wasm32")]
pub use web::DataTable;

/// Install the panic hook and the console logger.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    web::logger::init(log::LevelFilter::Warn);
}

/// Set the console log level (`error`, `warn`, `info`, `debug`, `trace`).
///
/// # Errors
/// Returns an error for an unknown level name.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(js_name = setLogLevel)]
pub fn set_log_level(level: &str) -> std::result::Result<(), JsValue> {
    let filter = web::logger::parse_level(level)
        .ok_or_else(|| JsValue::from_str(&format!("unknown log level: {level}")))?;
    web::logger::init(filter);
    Ok(())
}

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
