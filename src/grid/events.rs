//! Lifecycle events.

use std::fmt;
use std::rc::Rc;

use crate::types::{Column, Row};

/// A completed state change, fired after its re-render
#[derive(Debug, Clone)]
pub enum GridEvent {
    SortColumn(Column),
    SwitchColumn(Column, Column),
    RemoveColumn(Column),
    CheckRow(Row),
}

impl GridEvent {
    /// The JS callback name this event maps to.
    pub fn name(&self) -> &'static str {
        match self {
            GridEvent::SortColumn(_) => "onSortColumn",
            GridEvent::SwitchColumn(..) => "onSwitchColumn",
            GridEvent::RemoveColumn(_) => "onRemoveColumn",
            GridEvent::CheckRow(_) => "onCheckRow",
        }
    }
}

type Listener = Rc<dyn Fn(&GridEvent)>;

/// Registered event listeners.
///
/// Listeners are invoked with no grid state borrowed, so they may call
/// back into the grid.
#[derive(Clone, Default)]
pub struct GridEvents {
    listeners: Vec<Listener>,
}

impl GridEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen to every event.
    pub fn on(mut self, listener: impl Fn(&GridEvent) + 'static) -> Self {
        self.listeners.push(Rc::new(listener));
        self
    }

    pub fn on_sort_column(self, f: impl Fn(&Column) + 'static) -> Self {
        self.on(move |event| {
            if let GridEvent::SortColumn(column) = event {
                f(column);
            }
        })
    }

    pub fn on_switch_column(self, f: impl Fn(&Column, &Column) + 'static) -> Self {
        self.on(move |event| {
            if let GridEvent::SwitchColumn(a, b) = event {
                f(a, b);
            }
        })
    }

    pub fn on_remove_column(self, f: impl Fn(&Column) + 'static) -> Self {
        self.on(move |event| {
            if let GridEvent::RemoveColumn(column) = event {
                f(column);
            }
        })
    }

    pub fn on_check_row(self, f: impl Fn(&Row) + 'static) -> Self {
        self.on(move |event| {
            if let GridEvent::CheckRow(row) = event {
                f(row);
            }
        })
    }

    pub fn fire(&self, event: &GridEvent) {
        log::trace!("event {}", event.name());
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl fmt::Debug for GridEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridEvents")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
