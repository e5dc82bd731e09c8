//! End-to-end grid scenarios over the employee table.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_possible_truncation
)]

mod common;

use common::{employee_grid, text, EMPLOYEES};
use datagrid::{CellRef, Dispatch, SortOrder};
use futures::executor::block_on;
use serde_json::json;
use test_case::test_case;

const NAME: usize = 0;
const OFFICE: usize = 2;
const EXTN: usize = 3;

#[test]
fn test_empty_data_shows_no_data_message() {
    let (grid, surface) = employee_grid(json!({"data": []}));
    assert_eq!(grid.row_count(), 0);
    assert!(grid.visible_rows().is_empty());
    assert!(surface.rendered_rows().is_empty());
    assert!(surface.body().contains("No Data"));
}

#[test]
fn test_custom_no_data_message() {
    let (_, surface) = employee_grid(json!({"data": [], "noDataMessage": "Nothing here"}));
    assert!(surface.body().contains("Nothing here"));
}

#[test]
fn test_first_cell_without_serial_column() {
    let (grid, _) = employee_grid(json!({"serialNoColumn": false}));
    assert_eq!(grid.get_column(0).unwrap().content, "Name");
    assert_eq!(text(&grid, NAME, 0), "Faris");
}

#[test]
fn test_serial_column_comes_first_by_default() {
    let (grid, _) = employee_grid(json!({}));
    assert!(grid.get_column(0).unwrap().is_standard());
    assert_eq!(text(&grid, 1, 0), "Faris");
    assert_eq!(grid.column_count(false), 6);
    assert_eq!(grid.column_count(true), 7);
}

#[test]
fn test_sort_office_ascending_puts_airi_first() {
    let (grid, _) = employee_grid(json!({"serialNoColumn": false}));
    let result = block_on(grid.sort_column(OFFICE, SortOrder::Asc)).unwrap();
    assert_eq!(result, Dispatch::Completed);
    let first = grid.visible_rows()[0];
    assert_eq!(text(&grid, NAME, first), "Airi Satou");
    assert_eq!(grid.get_column(2).unwrap().sort_order, SortOrder::Asc);
}

#[test]
fn test_full_employee_table_is_loaded() {
    let (grid, surface) = employee_grid(json!({"serialNoColumn": false}));
    assert_eq!(EMPLOYEES.len(), 56);
    assert_eq!(grid.row_count(), 56);
    assert_eq!(surface.rendered_rows().len(), 56);
    assert_eq!(text(&grid, NAME, 55), "Michael Bruce");
}

#[test_case(SortOrder::Asc ; "ascending")]
#[test_case(SortOrder::Desc ; "descending")]
fn test_numeric_sort_is_monotonic(order: SortOrder) {
    let (grid, _) = employee_grid(json!({"serialNoColumn": false}));
    block_on(grid.sort_column(EXTN, order)).unwrap();
    let values: Vec<f64> = grid
        .visible_rows()
        .iter()
        .map(|r| grid.get_cell(EXTN, *r).unwrap().content.as_number().unwrap())
        .collect();
    assert_eq!(values.len(), EMPLOYEES.len());
    for pair in values.windows(2) {
        match order {
            SortOrder::Desc => assert!(pair[0] >= pair[1]),
            _ => assert!(pair[0] <= pair[1]),
        }
    }
}

#[test]
fn test_sort_none_restores_storage_order() {
    let (grid, _) = employee_grid(json!({"serialNoColumn": false}));
    block_on(grid.sort_column(OFFICE, SortOrder::Desc)).unwrap();
    block_on(grid.sort_column(OFFICE, SortOrder::None)).unwrap();
    let expected: Vec<u32> = (0..EMPLOYEES.len() as u32).collect();
    assert_eq!(grid.visible_rows(), expected);
}

#[test]
fn test_remove_column_keeps_indices_contiguous() {
    let (grid, _) = employee_grid(json!({"checkboxColumn": true}));
    assert_eq!(grid.column_count(true), 8);
    let removed = grid.get_column(5).unwrap();
    assert_eq!(removed.content, "Extn.");

    block_on(grid.remove_column(5)).unwrap();

    let columns = grid.get_columns(true);
    assert_eq!(columns.len(), 7);
    for (i, column) in columns.iter().enumerate() {
        assert_eq!(column.col_index, i);
    }
    assert_eq!(columns[5].content, "Start Date");
    let row = grid.get_row(0).unwrap();
    for (i, cell) in row.cells.iter().enumerate() {
        assert_eq!(cell.col_index, i);
    }
    assert!(grid.get_cell(7, 0).is_none());
}

#[test]
fn test_greater_than_filter_on_numeric_column() {
    let (grid, _) = employee_grid(json!({"serialNoColumn": false, "inlineFilters": true}));
    grid.set_filter(EXTN, "> 6000").unwrap();
    block_on(grid.apply_filters()).unwrap();

    let expected = EMPLOYEES.iter().filter(|e| e.3 > 6000).count();
    let visible = grid.visible_rows();
    assert_eq!(visible.len(), expected);
    for row in visible {
        let extn = grid.get_cell(EXTN, row).unwrap().content.as_number().unwrap();
        assert!(extn > 6000.0);
    }
}

#[test]
fn test_checking_a_row_highlights_and_reports() {
    let (grid, surface) = employee_grid(json!({"checkboxColumn": true}));
    assert!(grid.check_row(0, true).unwrap());
    assert!(surface.row_has_class(0, "dt-row--highlight"));
    assert_eq!(surface.toast().as_deref(), Some("1 row selected"));
    assert_eq!(grid.checked_rows(), vec![0]);

    grid.check_row(3, true).unwrap();
    assert_eq!(surface.toast().as_deref(), Some("2 rows selected"));
}

#[test]
fn test_clicking_checkbox_cell_toggles_row() {
    let (grid, surface) = employee_grid(json!({"checkboxColumn": true}));
    grid.click_cell(CellRef::new(2, 0), false);
    assert_eq!(grid.checked_rows(), vec![2]);
    assert!(surface.row_has_class(2, "dt-row--highlight"));
    grid.click_cell(CellRef::new(2, 0), false);
    assert!(grid.checked_rows().is_empty());
    assert_eq!(surface.toast(), None);
}

#[test]
fn test_total_row_follows_filters() {
    let (grid, surface) = employee_grid(json!({"serialNoColumn": false, "showTotalRow": true}));
    let all: u32 = EMPLOYEES.iter().map(|e| e.3).sum();
    assert!(surface.state().footer.contains(&format!(">{all}<")));

    grid.set_filter(OFFICE, "=Tokyo").unwrap();
    block_on(grid.apply_filters()).unwrap();
    let tokyo: u32 = EMPLOYEES
        .iter()
        .filter(|e| e.2 == "Tokyo")
        .map(|e| e.3)
        .sum();
    assert!(surface.state().footer.contains(&format!(">{tokyo}<")));
}

#[test]
fn test_dropdown_sort_descending() {
    let (grid, _) = employee_grid(json!({"serialNoColumn": false}));
    assert_eq!(
        grid.dropdown_items(),
        vec!["Sort Ascending", "Sort Descending", "Reset sorting", "Remove column"]
    );
    grid.dropdown_select(OFFICE, 1).unwrap();
    grid.run_until_stalled();
    assert_eq!(grid.get_column(2).unwrap().sort_order, SortOrder::Desc);
    assert_eq!(text(&grid, OFFICE, grid.visible_rows()[0]), "Tokyo");
}
