//! HTML markup for header, body rows, cells and footer.
//!
//! Every function here is pure: given the same model state it produces the
//! same string, so the virtualizer can ask for any row at any time.

use std::collections::HashSet;
use std::fmt::Write as _;

use crate::model::{display_text, TabularModel};
use crate::types::{Cell, Column, Row, RowIndex, SortOrder, Synthetic};

/// Per-render decoration that lives outside the model
#[derive(Debug, Clone, Copy, Default)]
pub struct RowDecor<'a> {
    pub tree_view: bool,
    pub collapsed: Option<&'a HashSet<RowIndex>>,
}

impl RowDecor<'_> {
    fn is_collapsed(&self, row: RowIndex) -> bool {
        self.collapsed.is_some_and(|set| set.contains(&row))
    }
}

/// Header decoration
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderDecor {
    pub inline_filters: bool,
    pub all_checked: bool,
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn sort_indicator(order: SortOrder) -> &'static str {
    match order {
        SortOrder::None => "",
        SortOrder::Asc => "&#9650;",
        SortOrder::Desc => "&#9660;",
    }
}

/// Header row, plus the filter row when inline filters are on.
pub fn header_html(columns: &[Column], decor: HeaderDecor) -> String {
    let mut html = String::from("<thead><tr class=\"dt-row dt-row-header\">");
    for column in columns {
        let _ = write!(
            html,
            "<td class=\"dt-cell dt-cell--header dt-cell--col-{i}\" data-col-index=\"{i}\" \
             data-sort-order=\"{order}\" data-is-resizable=\"{resizable}\" draggable=\"{draggable}\">",
            i = column.col_index,
            draggable = !column.is_standard(),
            order = match column.sort_order {
                SortOrder::None => "none",
                SortOrder::Asc => "asc",
                SortOrder::Desc => "desc",
            },
            resizable = column.resizable,
        );
        html.push_str("<div class=\"dt-cell__content\">");
        if column.synthetic == Some(Synthetic::Checkbox) {
            let checked = if decor.all_checked { " checked" } else { "" };
            let _ = write!(html, "<input type=\"checkbox\" class=\"dt-check-all\"{checked}>");
        } else {
            html.push_str(&escape_html(&column.content));
        }
        let _ = write!(
            html,
            "<span class=\"dt-sort-indicator\">{}</span></div>",
            sort_indicator(column.sort_order)
        );
        if column.dropdown {
            html.push_str("<div class=\"dt-dropdown__toggle\"></div>");
        }
        if column.resizable {
            html.push_str("<div class=\"dt-cell__resize-handle\"></div>");
        }
        html.push_str("</td>");
    }
    html.push_str("</tr>");

    if decor.inline_filters {
        html.push_str("<tr class=\"dt-row dt-row-filter\">");
        for column in columns {
            let _ = write!(
                html,
                "<td class=\"dt-cell dt-cell--filter dt-cell--col-{}\">",
                column.col_index
            );
            if !column.is_standard() {
                let _ = write!(
                    html,
                    "<input type=\"text\" class=\"dt-filter dt-input\" data-col-index=\"{}\">",
                    column.col_index
                );
            }
            html.push_str("</td>");
        }
        html.push_str("</tr>");
    }
    html.push_str("</thead>");
    html
}

pub fn cell_html(model: &TabularModel, column: &Column, cell: &Cell, decor: RowDecor<'_>) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<td class=\"dt-cell dt-cell--col-{col} dt-cell--{col}-{row}\" \
         data-col-index=\"{col}\" data-row-index=\"{row}\">",
        col = cell.col_index,
        row = cell.row_index,
    );
    html.push_str(&cell_content_html(model, column, cell, decor));
    html.push_str("</td>");
    html
}

/// Inner markup of a cell, used alone when a single cell is refreshed.
pub fn cell_content_html(
    model: &TabularModel,
    column: &Column,
    cell: &Cell,
    decor: RowDecor<'_>,
) -> String {
    let mut html = format!(
        "<div class=\"dt-cell__content dt-cell__content--col-{}\">",
        cell.col_index
    );
    if column.synthetic == Some(Synthetic::Checkbox) {
        html.push_str("<input type=\"checkbox\" class=\"dt-row-check\">");
    } else {
        if decor.tree_view && is_first_user_column(model, column) {
            let depth = model.get_row(cell.row_index).map_or(0, Row::depth);
            let _ = write!(
                html,
                "<span class=\"dt-tree-node\" style=\"padding-left: {}em\">",
                depth
            );
            if !model.is_leaf(cell.row_index) {
                let state = if decor.is_collapsed(cell.row_index) {
                    "collapsed"
                } else {
                    "expanded"
                };
                let _ = write!(
                    html,
                    "<span class=\"dt-tree-node__toggle dt-tree-node__toggle--{state}\"></span>"
                );
            }
            html.push_str("</span>");
        }
        html.push_str(&escape_html(&display_text(column, cell)));
    }
    html.push_str("</div>");
    html
}

fn is_first_user_column(model: &TabularModel, column: &Column) -> bool {
    column.col_index == model.first_column_index()
}

pub fn row_html(model: &TabularModel, row: &Row, decor: RowDecor<'_>) -> String {
    let mut html = format!(
        "<tr class=\"dt-row dt-row-{r}\" data-row-index=\"{r}\"",
        r = row.row_index()
    );
    if let Some(indent) = row.meta.indent {
        let _ = write!(html, " data-indent=\"{indent}\"");
    }
    html.push('>');
    for (column, cell) in model.columns().iter().zip(&row.cells) {
        html.push_str(&cell_html(model, column, cell, decor));
    }
    html.push_str("</tr>");
    html
}

/// Placeholder row spanning every column.
pub fn no_data_html(message: &str, colspan: usize) -> String {
    format!(
        "<tr class=\"dt-row dt-row--no-data\"><td class=\"dt-cell dt-cell--no-data\" \
         colspan=\"{colspan}\"><div class=\"dt-cell__content\">{}</div></td></tr>",
        escape_html(message)
    )
}

/// Empty spacer row standing in for rows outside the rendered window.
pub fn spacer_html(height: f32, colspan: usize) -> String {
    format!(
        "<tr class=\"dt-row dt-row--spacer\" style=\"height: {height}px\">\
         <td colspan=\"{colspan}\"></td></tr>"
    )
}

/// Footer row with per-column totals over the shown rows.
pub fn total_row_html(model: &TabularModel, totals: &[Option<f64>]) -> String {
    let mut html = String::from("<tfoot><tr class=\"dt-row dt-row--total\">");
    for (column, total) in model.columns().iter().zip(totals) {
        let text = total
            .map(|t| column.format_value(&t.into()))
            .unwrap_or_default();
        let _ = write!(
            html,
            "<td class=\"dt-cell dt-cell--col-{}\"><div class=\"dt-cell__content\">{}</div></td>",
            column.col_index,
            escape_html(&text)
        );
    }
    html.push_str("</tr></tfoot>");
    html
}

/// Sum numeric content of `rows` per column.
///
/// A column totals only when every shown value is numeric or empty;
/// synthetic columns never total.
pub fn column_totals(model: &TabularModel, rows: &[RowIndex]) -> Vec<Option<f64>> {
    model
        .columns()
        .iter()
        .map(|column| {
            if column.is_standard() {
                return None;
            }
            rows.iter().try_fold(0.0, |sum, row| {
                let cell = model.get_cell(column.col_index, *row)?;
                if cell.content.is_empty() {
                    Some(sum)
                } else {
                    cell.content.as_number().map(|n| sum + n)
                }
            })
        })
        .collect()
}
