//! DOM-backed [`ViewSurface`] and [`StyleSink`].
//!
//! Layout inside the user's wrapper element:
//!
//! ```text
//! div.datatable.dt-instance-N
//! ├── table.dt-table.dt-header      (thead: header + filter row)
//! ├── div.dt-scrollable             (scroll container)
//! │   └── table.dt-table.dt-body    (tbody)
//! ├── table.dt-table.dt-footer      (tfoot: totals)
//! ├── div.dt-freeze                 (overlay while frozen)
//! └── div.dt-toast
//! ```

use std::sync::atomic::{AtomicU32, Ordering};

use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, HtmlDivElement, HtmlElement, HtmlInputElement, HtmlStyleElement, Node,
};

use crate::error::{GridError, Result};
use crate::render::{MemoryStyleSink, StyleSink};
use crate::surface::ViewSurface;
use crate::types::{CellRef, RowIndex};

static NEXT_INSTANCE: AtomicU32 = AtomicU32::new(1);

pub(crate) fn cell_selector(cell: CellRef) -> String {
    format!(".dt-cell--{}-{}", cell.col_index, cell.row_index)
}

fn row_selector(row: RowIndex) -> String {
    format!(".dt-body .dt-row-{row}")
}

fn create_div(document: &Document, class: &str) -> Result<HtmlDivElement> {
    let div = document
        .create_element("div")
        .map_err(|_| GridError::Other("could not create div".into()))?
        .dyn_into::<HtmlDivElement>()
        .map_err(|_| GridError::Other("created element is not a div".into()))?;
    div.set_class_name(class);
    Ok(div)
}

fn create_table(document: &Document, class: &str) -> Result<Element> {
    let table = document
        .create_element("table")
        .map_err(|_| GridError::Other("could not create table".into()))?;
    table.set_class_name(class);
    Ok(table)
}

/// The grid's DOM
pub(crate) struct DomSurface {
    root: HtmlDivElement,
    header: Element,
    scroll: HtmlDivElement,
    body: Element,
    footer: Element,
    freeze_overlay: HtmlDivElement,
    toast: HtmlDivElement,
    scope: String,
}

impl DomSurface {
    /// Build the grid's elements inside `wrapper`, replacing its content.
    pub(crate) fn mount(wrapper: &HtmlElement) -> Result<Self> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| GridError::Other("no document".into()))?;
        let scope = format!(
            "dt-instance-{}",
            NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed)
        );

        let root = create_div(&document, &format!("datatable {scope}"))?;
        let header = create_table(&document, "dt-table dt-header")?;
        let scroll = create_div(&document, "dt-scrollable")?;
        let body = create_table(&document, "dt-table dt-body")?;
        let footer = create_table(&document, "dt-table dt-footer")?;
        let freeze_overlay = create_div(&document, "dt-freeze")?;
        let toast = create_div(&document, "dt-toast")?;

        let root_style = root.style();
        let _ = root_style.set_property("position", "relative");
        let scroll_style = scroll.style();
        let _ = scroll_style.set_property("overflow", "auto");
        let _ = scroll_style.set_property("position", "relative");
        let freeze_style = freeze_overlay.style();
        let _ = freeze_style.set_property("position", "absolute");
        let _ = freeze_style.set_property("inset", "0");
        let _ = freeze_style.set_property("z-index", "20");
        let _ = freeze_style.set_property("display", "none");
        let _ = toast.style().set_property("display", "none");

        let _ = scroll.append_child(&body);
        let children: [&Node; 5] = [&header, &scroll, &footer, &freeze_overlay, &toast];
        for child in children {
            let _ = root.append_child(child);
        }
        wrapper.set_inner_html("");
        wrapper
            .append_child(&root)
            .map_err(|_| GridError::Other("could not mount into wrapper".into()))?;

        Ok(Self {
            root,
            header,
            scroll,
            body,
            footer,
            freeze_overlay,
            toast,
            scope,
        })
    }

    /// Class that scopes this instance's stylesheet rules.
    pub(crate) fn scope(&self) -> &str {
        &self.scope
    }

    pub(crate) fn root(&self) -> Element {
        self.root.clone().into()
    }

    pub(crate) fn scroll_container(&self) -> HtmlElement {
        self.scroll.clone().into()
    }

    fn query(&self, selector: &str) -> Option<Element> {
        self.root.query_selector(selector).ok().flatten()
    }

    fn query_input(&self, selector: &str) -> Option<HtmlInputElement> {
        self.query(selector)
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
    }

    fn query_html(&self, selector: &str) -> Option<HtmlElement> {
        self.query(selector)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    }
}

fn set_class(element: &Element, class: &str, on: bool) {
    let list = element.class_list();
    let _ = if on { list.add_1(class) } else { list.remove_1(class) };
}

impl ViewSurface for DomSurface {
    fn set_header(&mut self, html: &str) {
        self.header.set_inner_html(html);
    }

    fn set_body(&mut self, html: &str, _rows: &[RowIndex]) {
        self.body.set_inner_html(html);
    }

    fn set_footer(&mut self, html: &str) {
        self.footer.set_inner_html(html);
    }

    fn set_filter_value(&mut self, col_index: usize, text: &str) {
        if let Some(input) = self.query_input(&format!(".dt-filter[data-col-index=\"{col_index}\"]")) {
            input.set_value(text);
        }
    }

    fn set_cell_html(&mut self, cell: CellRef, html: &str) {
        if let Some(td) = self.query(&cell_selector(cell)) {
            td.set_inner_html(html);
        }
    }

    fn set_row_class(&mut self, row: RowIndex, class: &str, on: bool) {
        if let Some(tr) = self.query(&row_selector(row)) {
            set_class(&tr, class, on);
        }
    }

    fn set_cell_class(&mut self, cell: CellRef, class: &str, on: bool) {
        if let Some(td) = self.query(&cell_selector(cell)) {
            set_class(&td, class, on);
        }
    }

    fn clear_cell_class(&mut self, class: &str) {
        let Ok(nodes) = self.body.query_selector_all(&format!(".{class}")) else {
            return;
        };
        for i in 0..nodes.length() {
            if let Some(el) = nodes.item(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                set_class(&el, class, false);
            }
        }
    }

    fn set_row_checked(&mut self, row: RowIndex, checked: bool) {
        if let Some(input) = self.query_input(&format!("{} .dt-row-check", row_selector(row))) {
            input.set_checked(checked);
        }
    }

    fn set_all_checked(&mut self, checked: bool) {
        if let Some(input) = self.query_input(".dt-check-all") {
            input.set_checked(checked);
        }
    }

    fn show_toast(&mut self, message: &str) {
        self.toast.set_text_content(Some(message));
        let _ = self.toast.style().set_property("display", "block");
    }

    fn clear_toast(&mut self) {
        self.toast.set_text_content(None);
        let _ = self.toast.style().set_property("display", "none");
    }

    fn freeze(&mut self, message: &str) {
        self.freeze_overlay.set_text_content(Some(message));
        let _ = self.freeze_overlay.style().set_property("display", "block");
    }

    fn unfreeze(&mut self) {
        let _ = self.freeze_overlay.style().set_property("display", "none");
    }

    fn copy_text(&mut self, text: &str) {
        let Some(window) = web_sys::window() else {
            return;
        };
        // Fire and forget: the Promise only reports permission failures.
        let _ = window.navigator().clipboard().write_text(text);
    }

    fn scroll_into_view(&mut self, cell: CellRef) {
        if let Some(td) = self.query_html(&cell_selector(cell)) {
            td.scroll_into_view_with_bool(false);
            let _ = td.focus();
        }
    }

    fn measure_column(&self, col_index: usize) -> Option<f32> {
        let th = self.query_html(&format!(".dt-cell--header.dt-cell--col-{col_index}"))?;
        let width = th.offset_width();
        (width > 0).then_some(width as f32)
    }

    fn container_width(&self) -> Option<f32> {
        let width = self.root.client_width();
        (width > 0).then_some(width as f32)
    }

    fn measure_row_height(&self) -> Option<f32> {
        let tr = self.query_html(".dt-body .dt-row[data-row-index]")?;
        let height = tr.offset_height();
        (height > 0).then_some(height as f32)
    }

    fn destroy(&mut self) {
        self.root.remove();
    }
}

/// Per-instance `<style>` element in the document head.
///
/// Rules are kept in a [`MemoryStyleSink`] and the element's text is
/// regenerated on every change, scoped to the instance class.
pub(crate) struct DomStyleSink {
    scope: String,
    rules: MemoryStyleSink,
    element: Option<HtmlStyleElement>,
}

impl DomStyleSink {
    pub(crate) fn new(scope: &str) -> Self {
        let element = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|document| {
                let style = document
                    .create_element("style")
                    .ok()?
                    .dyn_into::<HtmlStyleElement>()
                    .ok()?;
                style.set_attribute("data-datatable", scope).ok()?;
                document.head()?.append_child(&style).ok()?;
                Some(style)
            });
        if element.is_none() {
            log::warn!("no document head; column styles will not apply");
        }
        Self {
            scope: format!(".{scope}"),
            rules: MemoryStyleSink::new(),
            element,
        }
    }

    fn scoped(&self, selector: &str) -> String {
        format!("{} {selector}", self.scope)
    }

    fn flush(&self) {
        if let Some(element) = &self.element {
            element.set_text_content(Some(&self.rules.to_css()));
        }
    }
}

impl StyleSink for DomStyleSink {
    fn set_rule(&mut self, selector: &str, declarations: &[(&str, String)]) {
        let scoped = self.scoped(selector);
        self.rules.set_rule(&scoped, declarations);
        self.flush();
    }

    fn remove_rule(&mut self, selector: &str) {
        let scoped = self.scoped(selector);
        self.rules.remove_rule(&scoped);
        self.flush();
    }

    fn clear(&mut self) {
        self.rules.clear();
        if let Some(element) = self.element.take() {
            element.remove();
        }
    }
}

/// Cell and row identity of the element an event hit.
pub(crate) fn cell_at(target: &Element) -> Option<CellRef> {
    let td = target.closest("[data-row-index][data-col-index]").ok()??;
    let row = td.get_attribute("data-row-index")?.parse().ok()?;
    let col = td.get_attribute("data-col-index")?.parse().ok()?;
    Some(CellRef::new(row, col))
}

/// Column index of the header cell an event hit.
pub(crate) fn header_col_at(target: &Element) -> Option<usize> {
    target
        .closest(".dt-cell--header")
        .ok()??
        .get_attribute("data-col-index")?
        .parse()
        .ok()
}

/// Scroll offset of the body container.
pub(crate) fn scroll_top(container: &HtmlElement) -> f32 {
    container.scroll_top() as f32
}
