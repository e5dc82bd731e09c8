//! Interaction tests: checked rows across view changes, tree nodes,
//! operation queueing, editing, keyboard and clipboard.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{employee_grid, employee_options, grid_with_hooks, text};
use datagrid::controller::{
    CellEditor, CellState, CommitFuture, Direction, EditorChoice, Key, KeyInput, TextEditor,
};
use datagrid::{CellRef, CellValue, Dispatch, GridEvents, GridHooks, SortOrder};
use futures::executor::block_on;
use futures::FutureExt;
use serde_json::json;
use test_case::test_case;

const NAME: usize = 0;
const POSITION: usize = 1;
const OFFICE: usize = 2;
const EXTN: usize = 3;

// ============================================================================
// Checked rows
// ============================================================================

#[test]
fn test_checked_rows_survive_sort_and_filter() {
    let (grid, surface) = employee_grid(json!({"checkboxColumn": true, "serialNoColumn": false}));
    // checkbox column shifts user columns by one
    let office = OFFICE + 1;
    grid.check_row(4, true).unwrap();
    grid.check_row(9, true).unwrap();

    block_on(grid.sort_column(office, SortOrder::Desc)).unwrap();
    assert_eq!(grid.checked_rows(), vec![4, 9]);
    assert!(surface.row_has_class(4, "dt-row--highlight"));

    grid.set_filter(office, "=Tokyo").unwrap();
    block_on(grid.apply_filters()).unwrap();
    assert!(!grid.visible_rows().contains(&4));
    assert_eq!(grid.checked_rows(), vec![4, 9]);

    grid.set_filter(office, "").unwrap();
    block_on(grid.apply_filters()).unwrap();
    assert!(surface.row_has_class(9, "dt-row--highlight"));
    assert!(surface.state().checked.contains(&9));
}

#[test]
fn test_check_all_counts_every_row() {
    let (grid, surface) = employee_grid(json!({"checkboxColumn": true}));
    grid.check_all(true).unwrap();
    assert_eq!(grid.checked_rows().len(), grid.row_count());
    assert!(surface.state().all_checked);
    grid.check_all(false).unwrap();
    assert!(grid.checked_rows().is_empty());
    assert!(!surface.state().all_checked);
}

#[test]
fn test_check_row_event_fires_once_per_change() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let hooks = GridHooks::new().with_events(GridEvents::new().on_check_row(move |row| {
        sink.borrow_mut().push(row.row_index());
    }));
    let (grid, _) = grid_with_hooks(employee_options(json!({"checkboxColumn": true})), hooks);
    grid.check_row(1, true).unwrap();
    grid.check_row(1, true).unwrap();
    grid.check_row(1, false).unwrap();
    assert_eq!(*seen.borrow(), vec![1, 1]);
}

// ============================================================================
// Tree view
// ============================================================================

fn tree_grid() -> (datagrid::DataGrid, datagrid::MemorySurface) {
    //  0 Engineering
    //    1 Platform
    //      2 Faris
    //    3 Web
    //  4 Sales
    //    5 Airi Satou
    let data = json!([
        {"name": "Engineering", "indent": 0},
        {"name": "Platform", "indent": 1},
        {"name": "Faris", "indent": 2},
        {"name": "Web", "indent": 1},
        {"name": "Sales", "indent": 0},
        {"name": "Airi Satou", "indent": 1}
    ]);
    employee_grid(json!({
        "columns": ["Name"],
        "data": data,
        "treeView": true,
        "serialNoColumn": false
    }))
}

#[test]
fn test_collapse_and_expand_round_trip() {
    let (grid, _) = tree_grid();
    assert_eq!(grid.visible_rows(), vec![0, 1, 2, 3, 4, 5]);

    assert!(grid.toggle_tree_node(0));
    assert_eq!(grid.visible_rows(), vec![0, 4, 5]);

    // Platform stays collapsed until opened itself
    assert!(grid.toggle_tree_node(0));
    assert_eq!(grid.visible_rows(), vec![0, 1, 3, 4, 5]);

    assert!(grid.toggle_tree_node(1));
    assert_eq!(grid.visible_rows(), vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn test_collapse_all_then_depth() {
    let (grid, _) = tree_grid();
    grid.collapse_all_nodes();
    assert_eq!(grid.visible_rows(), vec![0, 4]);
    grid.set_tree_depth(1);
    assert_eq!(grid.visible_rows(), vec![0, 1, 3, 4, 5]);
    grid.expand_all_nodes();
    assert_eq!(grid.visible_rows().len(), 6);
}

#[test_case(0 ; "collapse grandparent")]
#[test_case(1 ; "collapse parent")]
fn test_collapsing_commits_edit_on_hidden_row(collapse: u32) {
    let buffer = Rc::new(RefCell::new(String::new()));
    let typed = Rc::clone(&buffer);
    let hooks = GridHooks::new().with_default_editor(move || -> Box<dyn CellEditor> {
        Box::new(TextEditor::with_buffer(Rc::clone(&typed)))
    });
    let options = employee_options(json!({
        "columns": ["Name"],
        "data": [
            {"name": "Engineering", "indent": 0},
            {"name": "Platform", "indent": 1},
            {"name": "Faris", "indent": 2}
        ],
        "treeView": true,
        "serialNoColumn": false
    }));
    let (grid, _) = grid_with_hooks(options, hooks);
    let cell = CellRef::new(2, NAME);

    assert!(grid.double_click_cell(cell));
    *buffer.borrow_mut() = "Faris S.".to_string();
    assert!(grid.toggle_tree_node(collapse));

    assert!(!grid.visible_rows().contains(&2));
    assert_eq!(grid.cell_state(), CellState::Idle);
    assert_eq!(text(&grid, NAME, 2), "Faris S.");
}

#[test]
fn test_collapse_all_while_editing_keeps_state_consistent() {
    let (grid, _) = tree_grid();
    assert!(grid.double_click_cell(CellRef::new(5, NAME)));
    grid.collapse_all_nodes();
    assert_eq!(grid.cell_state(), CellState::Idle);
    assert!(!grid.commit_edit());
}

#[test]
fn test_leaf_rows_do_not_toggle() {
    let (grid, _) = tree_grid();
    assert!(!grid.toggle_tree_node(2));
    assert_eq!(grid.visible_rows().len(), 6);
}

#[test]
fn test_sorting_is_skipped_in_tree_view() {
    let (grid, _) = tree_grid();
    let result = block_on(grid.sort_column(NAME, SortOrder::Asc)).unwrap();
    assert_eq!(result, Dispatch::Skipped);
    assert_eq!(grid.visible_rows(), vec![0, 1, 2, 3, 4, 5]);
}

// ============================================================================
// Structural operations
// ============================================================================

#[test]
fn test_second_operation_queues_behind_first() {
    let (grid, surface) = employee_grid(json!({"serialNoColumn": false}));
    block_on(async {
        let mut first = Box::pin(grid.sort_column(EXTN, SortOrder::Asc));
        assert!(futures::poll!(first.as_mut()).is_pending());
        assert!(grid.is_busy());
        assert!(surface.state().frozen);

        let mut second = Box::pin(grid.sort_column(OFFICE, SortOrder::Desc));
        assert!(futures::poll!(second.as_mut()).is_pending());
        assert!(futures::poll!(second.as_mut()).is_pending());
        assert_eq!(grid.get_column(2).unwrap().sort_order, SortOrder::None);

        assert_eq!(first.await.unwrap(), Dispatch::Completed);
        assert_eq!(grid.get_column(2).unwrap().sort_order, SortOrder::Desc);
        assert_eq!(second.await.unwrap(), Dispatch::Queued);
    });

    assert!(!grid.is_busy());
    assert!(!surface.state().frozen);
    assert_eq!(surface.state().freeze_log, vec![true, false, true, false]);
    assert_eq!(grid.get_column(3).unwrap().sort_order, SortOrder::None);
    assert_eq!(grid.get_column(2).unwrap().sort_order, SortOrder::Desc);
    assert_eq!(text(&grid, OFFICE, grid.visible_rows()[0]), "Tokyo");
}

#[test]
fn test_switch_column_swaps_positions() {
    let swapped = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&swapped);
    let hooks = GridHooks::new().with_events(GridEvents::new().on_switch_column(move |a, b| {
        *sink.borrow_mut() = Some((a.content.clone(), b.content.clone()));
    }));
    let (grid, _) = grid_with_hooks(employee_options(json!({"serialNoColumn": false})), hooks);

    block_on(grid.switch_column(NAME, OFFICE)).unwrap();

    assert_eq!(grid.get_column(0).unwrap().content, "Office");
    assert_eq!(grid.get_column(2).unwrap().content, "Name");
    assert_eq!(text(&grid, 0, 4), "Edinburgh");
    assert_eq!(text(&grid, 2, 4), "Airi Satou");
    assert_eq!(
        *swapped.borrow(),
        Some(("Name".to_string(), "Office".to_string()))
    );
}

#[test_case(7 ; "past the end")]
#[test_case(0 ; "serial column")]
fn test_invalid_removal_fails_without_freezing(col_index: usize) {
    let (grid, surface) = employee_grid(json!({}));
    assert!(block_on(grid.remove_column(col_index)).is_err());
    assert!(surface.state().freeze_log.is_empty());
    assert_eq!(grid.column_count(true), 7);
}

// ============================================================================
// Editing
// ============================================================================

/// Editor whose saves are always rejected by the "server".
struct RejectingEditor {
    buffer: Rc<RefCell<String>>,
}

impl CellEditor for RejectingEditor {
    fn init_value(&mut self, _cell: CellRef, value: &CellValue) {
        *self.buffer.borrow_mut() = value.display();
    }

    fn value(&self) -> CellValue {
        CellValue::from(self.buffer.borrow().as_str())
    }

    fn set_value(&mut self, _cell: CellRef, _value: &CellValue) -> Option<CommitFuture> {
        Some(async { Err("permission denied".to_string()) }.boxed_local())
    }
}

#[test]
fn test_rejected_save_rolls_back() {
    let buffer = Rc::new(RefCell::new(String::new()));
    let typed = Rc::clone(&buffer);
    let hooks = GridHooks::new().with_editor(move |_, _| {
        EditorChoice::Custom(Box::new(RejectingEditor {
            buffer: Rc::clone(&typed),
        }))
    });
    let (grid, _) = grid_with_hooks(employee_options(json!({"serialNoColumn": false})), hooks);
    let cell = CellRef::new(0, POSITION);

    assert!(grid.double_click_cell(cell));
    assert_eq!(*buffer.borrow(), "System Architect");
    *buffer.borrow_mut() = "Director".to_string();
    assert!(grid.commit_edit());
    assert_eq!(text(&grid, POSITION, 0), "Director");

    grid.run_until_stalled();
    assert_eq!(text(&grid, POSITION, 0), "System Architect");
}

#[test]
fn test_default_editor_commits_numbers() {
    let buffer = Rc::new(RefCell::new(String::new()));
    let typed = Rc::clone(&buffer);
    let hooks = GridHooks::new().with_default_editor(move || -> Box<dyn CellEditor> {
        Box::new(TextEditor::with_buffer(Rc::clone(&typed)))
    });
    let (grid, _) = grid_with_hooks(employee_options(json!({"serialNoColumn": false})), hooks);
    let cell = CellRef::new(1, EXTN);

    grid.click_cell(cell, false);
    assert!(grid.key_down(KeyInput::new(Key::Enter)));
    *buffer.borrow_mut() = "1234".to_string();
    assert!(grid.key_down(KeyInput::new(Key::Enter)));
    assert_eq!(grid.get_cell(EXTN, 1).unwrap().content, CellValue::Number(1234.0));
}

#[test]
fn test_disabled_editor_keeps_cell_focused() {
    let hooks = GridHooks::new().with_editor(|_, _| EditorChoice::Disabled);
    let (grid, _) = grid_with_hooks(employee_options(json!({"serialNoColumn": false})), hooks);
    let cell = CellRef::new(0, NAME);
    assert!(!grid.double_click_cell(cell));
    assert_eq!(text(&grid, NAME, 0), "Faris");
}

#[test]
fn test_escape_discards_edit() {
    let buffer = Rc::new(RefCell::new(String::new()));
    let typed = Rc::clone(&buffer);
    let hooks = GridHooks::new().with_default_editor(move || -> Box<dyn CellEditor> {
        Box::new(TextEditor::with_buffer(Rc::clone(&typed)))
    });
    let (grid, _) = grid_with_hooks(employee_options(json!({"serialNoColumn": false})), hooks);
    assert!(grid.double_click_cell(CellRef::new(0, NAME)));
    *buffer.borrow_mut() = "Nobody".to_string();
    assert!(grid.key_down(KeyInput::new(Key::Escape)));
    assert_eq!(text(&grid, NAME, 0), "Faris");
}

// ============================================================================
// Keyboard and clipboard
// ============================================================================

#[test]
fn test_arrow_keys_move_focus() {
    let (grid, surface) = employee_grid(json!({"serialNoColumn": false}));
    grid.click_cell(CellRef::new(0, 0), false);
    assert!(grid.key_down(KeyInput::new(Key::Arrow(Direction::Down))));
    assert!(grid.key_down(KeyInput::new(Key::Arrow(Direction::Right))));
    assert!(surface.cell_has_class(CellRef::new(1, 1), "dt-cell--focus"));
}

#[test]
fn test_detached_keyboard_ignores_keys() {
    let (grid, surface) = employee_grid(json!({"serialNoColumn": false}));
    grid.click_cell(CellRef::new(0, 0), false);
    grid.detach_keyboard();
    assert!(!grid.key_down(KeyInput::new(Key::Arrow(Direction::Down))));
    assert!(surface.cell_has_class(CellRef::new(0, 0), "dt-cell--focus"));

    grid.attach_keyboard();
    assert!(grid.key_down(KeyInput::new(Key::Arrow(Direction::Down))));
    assert!(surface.cell_has_class(CellRef::new(1, 0), "dt-cell--focus"));
}

#[test]
fn test_copy_range_as_tsv() {
    let (grid, surface) = employee_grid(json!({"serialNoColumn": false}));
    grid.click_cell(CellRef::new(0, NAME), false);
    grid.click_cell(CellRef::new(1, POSITION), true);
    assert!(grid.key_down(KeyInput::ctrl(Key::Char('c'))));
    assert_eq!(
        surface.clipboard().as_deref(),
        Some("Faris\tSystem Architect\nGarrett Winters\tAccountant")
    );
    assert_eq!(surface.toast().as_deref(), Some("4 cells copied"));
}

#[test]
fn test_copy_single_focused_cell() {
    let (grid, surface) = employee_grid(json!({"serialNoColumn": false}));
    grid.click_cell(CellRef::new(4, OFFICE), false);
    assert!(grid.key_down(KeyInput::ctrl(Key::Char('c'))));
    assert_eq!(surface.clipboard().as_deref(), Some("Edinburgh"));
    assert_eq!(surface.toast().as_deref(), Some("1 cell copied"));
}

// ============================================================================
// Debounced inline filters
// ============================================================================

#[test]
fn test_filter_keystrokes_are_debounced() {
    let (grid, _) = employee_grid(json!({"serialNoColumn": false, "inlineFilters": true}));
    let all = grid.visible_rows().len();

    let deadline = grid.filter_input(EXTN, "> 6", 0.0).unwrap();
    assert_eq!(deadline, 300.0);
    let deadline = grid.filter_input(EXTN, "> 6000", 200.0).unwrap();
    assert_eq!(deadline, 500.0);

    assert!(!grid.poll_filters(400.0));
    grid.run_until_stalled();
    assert_eq!(grid.visible_rows().len(), all);

    assert!(grid.poll_filters(500.0));
    grid.run_until_stalled();
    let visible = grid.visible_rows();
    assert!(visible.len() < all);
    for row in visible {
        assert!(grid.get_cell(EXTN, row).unwrap().content.as_number().unwrap() > 6000.0);
    }
    assert_eq!(grid.filter_deadline(), None);
}

#[test]
fn test_explicit_apply_consumes_pending_filter_input() {
    let (grid, _) = employee_grid(json!({"serialNoColumn": false, "inlineFilters": true}));
    assert_eq!(grid.filter_input(OFFICE, "=Tokyo", 0.0), Some(300.0));

    block_on(grid.apply_filters()).unwrap();
    assert_eq!(grid.filter_deadline(), None);
    assert!(!grid.poll_filters(1000.0));
    for row in grid.visible_rows() {
        assert_eq!(text(&grid, OFFICE, row), "Tokyo");
    }
}

#[test]
fn test_filter_input_on_serial_column_is_ignored() {
    let (grid, _) = employee_grid(json!({"inlineFilters": true}));
    assert_eq!(grid.filter_input(0, "1", 0.0), None);
}
