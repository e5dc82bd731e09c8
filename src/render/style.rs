//! Stylesheet sink and column width layout.
//!
//! Widths, alignment and row height are never written onto individual
//! elements; they go out as selector rules so recycled rows pick them up
//! without being touched.

use std::collections::BTreeMap;

use crate::options::Layout;
use crate::types::Column;

/// Width the checkbox column always gets.
pub const CHECKBOX_WIDTH: f32 = 32.0;
/// Floor for any computed column width.
pub const MIN_COLUMN_WIDTH: f32 = 30.0;
const CHAR_WIDTH: f32 = 8.0;
const CELL_PADDING: f32 = 16.0;

/// Accepts selector + declaration pairs
pub trait StyleSink {
    /// Merge `declarations` into the rule for `selector`.
    fn set_rule(&mut self, selector: &str, declarations: &[(&str, String)]);
    fn remove_rule(&mut self, selector: &str);
    /// Drop every rule (teardown).
    fn clear(&mut self);
}

/// In-memory rule table
#[derive(Debug, Clone, Default)]
pub struct MemoryStyleSink {
    rules: BTreeMap<String, BTreeMap<String, String>>,
}

impl MemoryStyleSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, selector: &str, property: &str) -> Option<&str> {
        self.rules
            .get(selector)
            .and_then(|rule| rule.get(property))
            .map(String::as_str)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Render the rules as CSS text.
    pub fn to_css(&self) -> String {
        self.rules
            .iter()
            .map(|(selector, decls)| {
                let body: Vec<String> = decls.iter().map(|(k, v)| format!("{k}: {v};")).collect();
                format!("{selector} {{ {} }}", body.join(" "))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl StyleSink for MemoryStyleSink {
    fn set_rule(&mut self, selector: &str, declarations: &[(&str, String)]) {
        let rule = self.rules.entry(selector.to_string()).or_default();
        for (property, value) in declarations {
            rule.insert((*property).to_string(), value.clone());
        }
    }

    fn remove_rule(&mut self, selector: &str) {
        self.rules.remove(selector);
    }

    fn clear(&mut self) {
        self.rules.clear();
    }
}

pub fn column_selector(col_index: usize) -> String {
    format!(".dt-cell--col-{col_index}")
}

fn content_selector(col_index: usize) -> String {
    format!(".dt-cell__content--col-{col_index}")
}

pub fn apply_column_width(sink: &mut dyn StyleSink, col_index: usize, width: f32) {
    let value = format!("{width}px");
    sink.set_rule(&column_selector(col_index), &[("width", value.clone())]);
    sink.set_rule(&content_selector(col_index), &[("width", value)]);
}

pub fn apply_alignments(sink: &mut dyn StyleSink, columns: &[Column]) {
    for column in columns {
        sink.set_rule(
            &content_selector(column.col_index),
            &[("text-align", column.align.as_css().to_string())],
        );
    }
}

pub fn apply_row_height(sink: &mut dyn StyleSink, height: f32) {
    sink.set_rule(".dt-row", &[("height", format!("{height}px"))]);
    sink.set_rule(
        ".dt-cell__content",
        &[("line-height", format!("{}px", (height - 1.0).max(1.0)))],
    );
}

/// Drop per-column rules for indices `from..to` (after a removal).
pub fn remove_column_rules(sink: &mut dyn StyleSink, from: usize, to: usize) {
    for col_index in from..to {
        sink.remove_rule(&column_selector(col_index));
        sink.remove_rule(&content_selector(col_index));
    }
}

/// Approximate rendered width of one line of text.
pub fn text_width(text: &str) -> f32 {
    (text.chars().count() as f32 * CHAR_WIDTH + CELL_PADDING).max(MIN_COLUMN_WIDTH)
}

/// Width a column needs for its header and the given sample texts.
pub fn estimate_width(column: &Column, samples: &[String]) -> f32 {
    if column.synthetic == Some(crate::types::Synthetic::Checkbox) {
        return CHECKBOX_WIDTH;
    }
    samples
        .iter()
        .map(|s| text_width(s))
        .fold(text_width(&column.content), f32::max)
}

/// Final pixel widths for every column under `layout`.
///
/// `natural` holds each column's natural width (declared or measured).
/// `fixed` uses those as is; `fluid` spreads leftover container space
/// evenly over user columns; `ratio` splits the space left after synthetic
/// columns in proportion to each user column's declared width (weight 1
/// when undeclared).
pub fn compute_widths(
    columns: &[Column],
    natural: &[f32],
    layout: Layout,
    container_width: Option<f32>,
) -> Vec<f32> {
    let natural_of = |i: usize| natural.get(i).copied().unwrap_or(MIN_COLUMN_WIDTH);
    let fixed: Vec<f32> = (0..columns.len()).map(natural_of).collect();
    let Some(container) = container_width else {
        return fixed;
    };
    let user_count = columns.iter().filter(|c| !c.is_standard()).count();
    if user_count == 0 {
        return fixed;
    }

    match layout {
        Layout::Fixed => fixed,
        Layout::Fluid => {
            let total: f32 = fixed.iter().sum();
            let extra = (container - total).max(0.0) / user_count as f32;
            columns
                .iter()
                .zip(fixed)
                .map(|(c, w)| if c.is_standard() { w } else { w + extra })
                .collect()
        }
        Layout::Ratio => {
            let pinned: f32 = columns
                .iter()
                .zip(&fixed)
                .filter(|(c, _)| c.is_standard())
                .map(|(_, w)| *w)
                .sum();
            let weight = |c: &Column| c.width.filter(|w| *w > 0.0).unwrap_or(1.0);
            let total_weight: f32 = columns
                .iter()
                .filter(|c| !c.is_standard())
                .map(weight)
                .sum();
            let available = (container - pinned).max(0.0);
            columns
                .iter()
                .zip(fixed)
                .map(|(c, w)| {
                    if c.is_standard() {
                        w
                    } else {
                        (available * weight(c) / total_weight).max(MIN_COLUMN_WIDTH)
                    }
                })
                .collect()
        }
    }
}
