//! Inline cell editors.

use std::cell::RefCell;
use std::rc::Rc;

use futures::future::LocalBoxFuture;

use crate::types::{CellRef, CellValue};

/// Pending asynchronous save; `Err` rolls the cell back.
pub type CommitFuture = LocalBoxFuture<'static, std::result::Result<(), String>>;

/// An editor shown over a cell while it is being edited.
pub trait CellEditor {
    /// Show the editor for `cell`, loaded with `value`.
    fn init_value(&mut self, cell: CellRef, value: &CellValue);
    /// Current value in the editor.
    fn value(&self) -> CellValue;
    /// Save a committed value.
    ///
    /// Returning a future makes the save asynchronous: the grid keeps the
    /// new value optimistically and restores the old one if it fails.
    fn set_value(&mut self, cell: CellRef, value: &CellValue) -> Option<CommitFuture>;
    /// Hide the editor without saving.
    fn hide(&mut self) {}
}

/// Result of the `getEditor` hook for one cell
pub enum EditorChoice {
    /// Use the grid's built-in editor.
    Default,
    /// Editing is suppressed for this cell.
    Disabled,
    Custom(Box<dyn CellEditor>),
}

/// Typed text as cell content: plain numbers stay numeric.
pub fn parse_input(text: &str) -> CellValue {
    match text.trim().parse::<f64>() {
        Ok(n) if n.is_finite() && !text.trim().is_empty() => CellValue::Number(n),
        _ => CellValue::Text(text.to_string()),
    }
}

/// Plain text editor over a shared buffer.
///
/// Whoever holds a clone of the buffer plays the part of the input
/// element: writing to it is typing.
#[derive(Debug, Clone, Default)]
pub struct TextEditor {
    buffer: Rc<RefCell<String>>,
    editing: Option<CellRef>,
}

impl TextEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_buffer(buffer: Rc<RefCell<String>>) -> Self {
        Self {
            buffer,
            editing: None,
        }
    }

    pub fn editing(&self) -> Option<CellRef> {
        self.editing
    }
}

impl CellEditor for TextEditor {
    fn init_value(&mut self, cell: CellRef, value: &CellValue) {
        self.editing = Some(cell);
        *self.buffer.borrow_mut() = value.display();
    }

    fn value(&self) -> CellValue {
        parse_input(&self.buffer.borrow())
    }

    fn set_value(&mut self, _cell: CellRef, _value: &CellValue) -> Option<CommitFuture> {
        self.editing = None;
        None
    }

    fn hide(&mut self) {
        self.editing = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_editor_reads_shared_buffer() {
        let buffer = Rc::new(RefCell::new(String::new()));
        let mut editor = TextEditor::with_buffer(Rc::clone(&buffer));
        editor.init_value(CellRef::new(0, 1), &CellValue::from("Faris"));
        assert_eq!(*buffer.borrow(), "Faris");
        *buffer.borrow_mut() = "Airi".into();
        assert_eq!(editor.value(), CellValue::from("Airi"));
        *buffer.borrow_mut() = " 42 ".into();
        assert_eq!(editor.value(), CellValue::Number(42.0));
        assert!(editor.set_value(CellRef::new(0, 1), &editor.value()).is_none());
        assert_eq!(editor.editing(), None);
    }
}
