//! Shared fixtures for the grid integration tests.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use datagrid::{DataGrid, GridHooks, GridOptions, MemoryStyleSink, MemorySurface};
use serde_json::{json, Value};

/// The 56 employee records: Name, Position, Office, Extn., Start Date,
/// Salary.
///
/// Airi Satou (row 4) is the first Edinburgh entry in storage order.
pub const EMPLOYEES: &[(&str, &str, &str, u32, &str, u32)] = &[
    ("Faris", "System Architect", "Tokyo", 5421, "2011/04/25", 320_800),
    ("Garrett Winters", "Accountant", "Tokyo", 8422, "2011/07/25", 170_750),
    ("Ashton Cox", "Junior Technical Author", "San Francisco", 1562, "2009/01/12", 86_000),
    ("Cedric Kelly", "Senior Javascript Developer", "London", 6224, "2012/03/29", 433_060),
    ("Airi Satou", "Accountant", "Edinburgh", 5407, "2008/11/28", 162_700),
    ("Brielle Williamson", "Integration Specialist", "New York", 4804, "2012/12/02", 372_000),
    ("Herrod Chandler", "Sales Assistant", "San Francisco", 9608, "2012/08/06", 137_500),
    ("Rhona Davidson", "Integration Specialist", "Tokyo", 6200, "2010/10/14", 327_900),
    ("Colleen Hurst", "Javascript Developer", "San Francisco", 2360, "2009/09/15", 205_500),
    ("Sonya Frost", "Software Engineer", "Edinburgh", 1667, "2008/12/13", 103_600),
    ("Jena Gaines", "Office Manager", "London", 3814, "2008/12/19", 90_560),
    ("Quinn Flynn", "Support Lead", "Edinburgh", 9497, "2013/03/03", 342_000),
    ("Charde Marshall", "Regional Director", "San Francisco", 6741, "2008/10/16", 470_600),
    ("Haley Kennedy", "Senior Marketing Designer", "London", 3597, "2012/12/18", 313_500),
    ("Tatyana Fitzpatrick", "Regional Director", "London", 1965, "2010/03/17", 385_750),
    ("Michael Silva", "Marketing Designer", "London", 1581, "2012/11/27", 198_500),
    ("Paul Byrd", "Chief Financial Officer", "New York", 3059, "2010/06/09", 725_000),
    ("Gloria Little", "Systems Administrator", "New York", 1721, "2009/04/10", 237_500),
    ("Bradley Greer", "Software Engineer", "London", 2558, "2012/10/13", 132_000),
    ("Dai Rios", "Personnel Lead", "Edinburgh", 2290, "2012/09/26", 217_500),
    ("Jenette Caldwell", "Development Lead", "New York", 1937, "2011/09/03", 345_000),
    ("Yuri Berry", "Chief Marketing Officer", "New York", 6154, "2009/06/25", 675_000),
    ("Caesar Vance", "Pre-Sales Support", "New York", 8330, "2011/12/12", 106_450),
    ("Doris Wilder", "Sales Assistant", "Sydney", 3023, "2010/09/20", 85_600),
    ("Angelica Ramos", "Chief Executive Officer (CEO)", "London", 5797, "2009/10/09", 1_200_000),
    ("Gavin Joyce", "Developer", "Edinburgh", 8822, "2010/12/22", 92_575),
    ("Jennifer Chang", "Regional Director", "Singapore", 9239, "2010/11/14", 357_650),
    ("Brenden Wagner", "Software Engineer", "San Francisco", 1314, "2011/06/07", 206_850),
    ("Fiona Green", "Chief Operating Officer (COO)", "San Francisco", 2947, "2010/03/11", 850_000),
    ("Shou Itou", "Regional Marketing", "Tokyo", 8899, "2011/08/14", 163_000),
    ("Michelle House", "Integration Specialist", "Sydney", 2769, "2011/06/02", 95_400),
    ("Suki Burks", "Developer", "London", 6832, "2009/10/22", 114_500),
    ("Prescott Bartlett", "Technical Author", "London", 3606, "2011/05/07", 145_000),
    ("Gavin Cortez", "Team Leader", "San Francisco", 2860, "2008/10/26", 235_500),
    ("Martena Mccray", "Post-Sales support", "Edinburgh", 8240, "2011/03/09", 324_050),
    ("Unity Butler", "Marketing Designer", "San Francisco", 5384, "2009/12/09", 85_675),
    ("Howard Hatfield", "Office Manager", "San Francisco", 7031, "2008/12/16", 164_500),
    ("Hope Fuentes", "Secretary", "San Francisco", 6318, "2010/02/12", 109_850),
    ("Vivian Harrell", "Financial Controller", "San Francisco", 9422, "2009/02/14", 452_500),
    ("Timothy Mooney", "Office Manager", "London", 7580, "2008/12/11", 136_200),
    ("Jackson Bradshaw", "Director", "New York", 1042, "2008/09/26", 645_750),
    ("Olivia Liang", "Support Engineer", "Singapore", 2120, "2011/02/03", 234_500),
    ("Bruno Nash", "Software Engineer", "London", 6222, "2011/05/03", 163_500),
    ("Sakura Yamamoto", "Support Engineer", "Tokyo", 9383, "2009/08/19", 139_575),
    ("Thor Walton", "Developer", "New York", 8327, "2013/08/11", 98_540),
    ("Finn Camacho", "Support Engineer", "San Francisco", 2927, "2009/07/07", 87_500),
    ("Serge Baldwin", "Data Coordinator", "Singapore", 8352, "2012/04/09", 138_575),
    ("Zenaida Frank", "Software Engineer", "New York", 7439, "2010/01/04", 125_250),
    ("Zorita Serrano", "Software Engineer", "San Francisco", 4389, "2012/06/01", 115_000),
    ("Jennifer Acosta", "Junior Javascript Developer", "Edinburgh", 3431, "2013/02/01", 75_650),
    ("Cara Stevens", "Sales Assistant", "New York", 3990, "2011/12/06", 145_600),
    ("Hermione Butler", "Regional Director", "London", 1016, "2011/03/21", 356_250),
    ("Lael Greer", "Systems Administrator", "London", 6733, "2009/02/27", 103_500),
    ("Jonas Alexander", "Developer", "San Francisco", 8196, "2010/07/14", 86_500),
    ("Shad Decker", "Regional Director", "Edinburgh", 6373, "2008/11/13", 183_000),
    ("Michael Bruce", "Javascript Developer", "Singapore", 5384, "2011/06/27", 183_000),
];

pub fn employee_columns() -> Value {
    json!([
        "Name",
        "Position",
        "Office",
        {"name": "Extn.", "kind": "number"},
        "Start Date",
        {"name": "Salary", "kind": "number"}
    ])
}

pub fn employee_data() -> Value {
    Value::Array(
        EMPLOYEES
            .iter()
            .map(|(name, position, office, extn, start, salary)| {
                json!([name, position, office, extn, start, salary])
            })
            .collect(),
    )
}

/// Options over the employee table merged with `extra`.
pub fn employee_options(extra: Value) -> GridOptions {
    let mut options = json!({
        "columns": employee_columns(),
        "data": employee_data(),
        "clusterize": false
    });
    if let (Some(base), Some(extra)) = (options.as_object_mut(), extra.as_object()) {
        base.extend(extra.clone());
    }
    GridOptions::from_value(options).unwrap()
}

pub fn grid_with_hooks(options: GridOptions, hooks: GridHooks) -> (DataGrid, MemorySurface) {
    let surface = MemorySurface::with_container_width(1200.0);
    let grid = DataGrid::new(options, surface.clone(), MemoryStyleSink::new(), hooks).unwrap();
    (grid, surface)
}

pub fn employee_grid(extra: Value) -> (DataGrid, MemorySurface) {
    grid_with_hooks(employee_options(extra), GridHooks::new())
}

/// Display text of a cell.
pub fn text(grid: &DataGrid, col_index: usize, row: u32) -> String {
    grid.get_cell(col_index, row).unwrap().content.display()
}
