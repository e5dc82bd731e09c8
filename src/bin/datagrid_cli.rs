//! CLI tool for datagrid - applies sort and filters to a JSON table and
//! prints the resulting view
//!
//! Usage:
//!   datagrid_cli <grid.json>                          # Body HTML to stdout
//!   datagrid_cli <grid.json> --sort office:asc        # Sorted
//!   datagrid_cli <grid.json> --filter salary='>5000'  # Filtered (repeatable)
//!   datagrid_cli <grid.json> --tsv                    # Tab-separated view
//!
//! `COL` is a column index, id or display name.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;

use datagrid::model::{FilterRule, ModelConfig, TabularModel};
use datagrid::render::{markup, RowDecor};
use datagrid::{CellRef, GridOptions, SortOrder};

const USAGE: &str =
    "Usage: datagrid_cli <grid.json> [--sort COL:asc|desc] [--filter COL=EXPR]... [--tsv]";

struct Args {
    input: String,
    sort: Option<(String, SortOrder)>,
    filters: Vec<(String, String)>,
    tsv: bool,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut input = None;
    let mut sort = None;
    let mut filters = Vec::new();
    let mut tsv = false;
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--tsv" => tsv = true,
            "--sort" => {
                let spec = iter.next().ok_or("--sort needs COL:asc|desc")?;
                let (col, order) = spec.rsplit_once(':').ok_or("--sort needs COL:asc|desc")?;
                let order =
                    SortOrder::parse(order).ok_or_else(|| format!("unknown sort order {order:?}"))?;
                sort = Some((col.to_string(), order));
            }
            "--filter" => {
                let spec = iter.next().ok_or("--filter needs COL=EXPR")?;
                let (col, expr) = spec.split_once('=').ok_or("--filter needs COL=EXPR")?;
                filters.push((col.to_string(), expr.to_string()));
            }
            other if other.starts_with("--") => return Err(format!("unknown flag {other}")),
            other => input = Some(other.to_string()),
        }
    }
    Ok(Args {
        input: input.ok_or(USAGE)?,
        sort,
        filters,
        tsv,
    })
}

/// Resolve a column by index, id or (case-insensitive) display name.
fn resolve_column(model: &TabularModel, name: &str) -> Result<usize, String> {
    if let Ok(index) = name.parse::<usize>() {
        return model
            .column(index)
            .map(|c| c.col_index)
            .ok_or_else(|| format!("no column {index}"));
    }
    model
        .column_by_id(name)
        .or_else(|| {
            model
                .columns()
                .iter()
                .find(|c| c.content.eq_ignore_ascii_case(name))
        })
        .map(|c| c.col_index)
        .ok_or_else(|| format!("no column named {name:?}"))
}

fn run(args: &Args) -> Result<String, String> {
    let text = fs::read_to_string(&args.input)
        .map_err(|e| format!("Error reading {}: {e}", args.input))?;
    let options = GridOptions::from_json(&text).map_err(|e| e.to_string())?;
    let mut model = TabularModel::new(ModelConfig {
        checkbox_column: false,
        serial_no_column: options.serial_no_column,
    });
    model
        .init(&options.columns, &options.data)
        .map_err(|e| e.to_string())?;

    if let Some((col, order)) = &args.sort {
        let index = resolve_column(&model, col)?;
        model.sort_rows(index, *order).map_err(|e| e.to_string())?;
    }
    let mut rules = Vec::new();
    for (col, expr) in &args.filters {
        let index = resolve_column(&model, col)?;
        if let Some(rule) = FilterRule::parse(expr) {
            rules.push((index, rule));
        }
    }
    if !rules.is_empty() {
        model.filter_rows(&rules);
    }

    let visible: Vec<_> = model
        .view_row_indices()
        .into_iter()
        .filter(|r| model.is_shown(*r))
        .collect();
    eprintln!("{} of {} rows", visible.len(), model.row_count());

    let mut out = String::new();
    if args.tsv {
        let header: Vec<&str> = model.columns().iter().map(|c| c.content.as_str()).collect();
        out.push_str(&header.join("\t"));
        out.push('\n');
        for row in &visible {
            let cells: Vec<String> = model
                .columns()
                .iter()
                .map(|c| {
                    model
                        .cell_text(CellRef::new(*row, c.col_index))
                        .unwrap_or_default()
                })
                .collect();
            out.push_str(&cells.join("\t"));
            out.push('\n');
        }
    } else {
        out.push_str("<tbody>\n");
        for row in visible.iter().filter_map(|r| model.get_row(*r)) {
            out.push_str(&markup::row_html(&model, row, RowDecor::default()));
            out.push('\n');
        }
        out.push_str("</tbody>\n");
    }
    Ok(out)
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let args = match parse_args(&args) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };
    match run(&args) {
        Ok(output) => {
            if let Err(e) = io::stdout().write_all(output.as_bytes()) {
                eprintln!("Error writing output: {e}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
