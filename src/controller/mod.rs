//! Interaction controllers.
//!
//! Each controller owns one slice of cross-cutting state (column widths and
//! filters, focus and selection, checked and collapsed rows) and mutates the
//! model only through its public operations.

pub mod cell;
pub mod column;
pub mod debounce;
pub mod editor;
pub mod keyboard;
pub mod row;

pub use cell::{CellController, CellState, CellView, Commit};
pub use column::{ColumnController, DropdownAction};
pub use debounce::Debouncer;
pub use editor::{parse_input, CellEditor, CommitFuture, EditorChoice, TextEditor};
pub use keyboard::{Direction, Key, KeyCommand, KeyInput, KeyboardDispatcher};
pub use row::RowController;
