//! Callbacks supplied at construction that cannot travel through
//! [`crate::options::GridOptions`].

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::controller::{CellEditor, EditorChoice, TextEditor};
use crate::types::{Cell, CellValue, Column, Comparator, Formatter};

use super::events::GridEvents;

/// A custom header dropdown entry
#[derive(Clone)]
pub struct DropdownItem {
    pub label: String,
    pub action: Rc<dyn Fn(&Column)>,
}

impl DropdownItem {
    pub fn new(label: impl Into<String>, action: impl Fn(&Column) + 'static) -> Self {
        Self {
            label: label.into(),
            action: Rc::new(action),
        }
    }
}

type EditorFactory = Rc<dyn Fn(&Column, &Cell) -> EditorChoice>;

#[derive(Clone)]
pub struct GridHooks {
    /// Per-cell editor override (`getEditor`).
    pub get_editor: Option<EditorFactory>,
    /// Builds the built-in editor.
    pub default_editor: Rc<dyn Fn() -> Box<dyn CellEditor>>,
    pub header_dropdown: Vec<DropdownItem>,
    /// Display formatters by column id.
    pub formats: HashMap<String, Formatter>,
    /// Sort comparators by column id.
    pub comparators: HashMap<String, Comparator>,
    pub events: GridEvents,
}

impl Default for GridHooks {
    fn default() -> Self {
        Self {
            get_editor: None,
            default_editor: Rc::new(|| -> Box<dyn CellEditor> { Box::new(TextEditor::new()) }),
            header_dropdown: Vec::new(),
            formats: HashMap::new(),
            comparators: HashMap::new(),
            events: GridEvents::new(),
        }
    }
}

impl GridHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_editor(mut self, f: impl Fn(&Column, &Cell) -> EditorChoice + 'static) -> Self {
        self.get_editor = Some(Rc::new(f));
        self
    }

    pub fn with_default_editor(mut self, f: impl Fn() -> Box<dyn CellEditor> + 'static) -> Self {
        self.default_editor = Rc::new(f);
        self
    }

    pub fn with_dropdown_item(mut self, item: DropdownItem) -> Self {
        self.header_dropdown.push(item);
        self
    }

    pub fn with_format(
        mut self,
        column_id: impl Into<String>,
        f: impl Fn(&CellValue) -> String + 'static,
    ) -> Self {
        self.formats.insert(column_id.into(), Formatter::new(f));
        self
    }

    pub fn with_comparator(
        mut self,
        column_id: impl Into<String>,
        f: impl Fn(&CellValue, &CellValue) -> Ordering + 'static,
    ) -> Self {
        self.comparators
            .insert(column_id.into(), Comparator::new(f));
        self
    }

    pub fn with_events(mut self, events: GridEvents) -> Self {
        self.events = events;
        self
    }

    /// Resolve the editor for one cell; `None` when editing is suppressed.
    pub fn editor_for(&self, column: &Column, cell: &Cell) -> Option<Box<dyn CellEditor>> {
        let choice = match &self.get_editor {
            Some(factory) => factory(column, cell),
            None => EditorChoice::Default,
        };
        match choice {
            EditorChoice::Default => Some((self.default_editor)()),
            EditorChoice::Disabled => None,
            EditorChoice::Custom(editor) => Some(editor),
        }
    }

    pub fn dropdown_labels(&self) -> Vec<String> {
        self.header_dropdown.iter().map(|d| d.label.clone()).collect()
    }
}

impl fmt::Debug for GridHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridHooks")
            .field("get_editor", &self.get_editor.is_some())
            .field("header_dropdown", &self.dropdown_labels())
            .field("formats", &self.formats.keys().collect::<Vec<_>>())
            .field("comparators", &self.comparators.keys().collect::<Vec<_>>())
            .field("events", &self.events)
            .finish()
    }
}
