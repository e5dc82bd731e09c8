//! Column interactions: resize, drag reorder, sort trigger, header
//! dropdown and inline filters.

use std::collections::{BTreeMap, HashMap};

use crate::model::{FilterRule, TabularModel};
use crate::options::Layout;
use crate::render::style::{self, StyleSink};
use crate::surface::ViewSurface;
use crate::types::{Column, SortOrder};

use super::debounce::Debouncer;

/// Labels of the built-in header dropdown entries, in order.
pub const BUILTIN_DROPDOWN: [&str; 4] = [
    "Sort Ascending",
    "Sort Descending",
    "Reset sorting",
    "Remove column",
];

/// A header dropdown entry resolved from its position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropdownAction {
    Sort(SortOrder),
    Remove,
    /// Index into the custom `headerDropdown` entries.
    Custom(usize),
}

impl DropdownAction {
    pub fn from_index(index: usize, custom_count: usize) -> Option<Self> {
        let action = match index {
            0 => DropdownAction::Sort(SortOrder::Asc),
            1 => DropdownAction::Sort(SortOrder::Desc),
            2 => DropdownAction::Sort(SortOrder::None),
            3 => DropdownAction::Remove,
            n if n - BUILTIN_DROPDOWN.len() < custom_count => {
                DropdownAction::Custom(n - BUILTIN_DROPDOWN.len())
            }
            _ => return None,
        };
        Some(action)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ResizeGesture {
    col_index: usize,
    start_x: f32,
    start_width: f32,
    min_width: f32,
    current: f32,
}

#[derive(Debug, Clone)]
pub struct ColumnController {
    /// Current pixel width per column index.
    widths: Vec<f32>,
    /// Natural minimum per column id, captured once.
    min_widths: HashMap<String, f32>,
    resize: Option<ResizeGesture>,
    drag_source: Option<usize>,
    /// Inline filter text per column id.
    filters: BTreeMap<String, String>,
    debounce: Debouncer<()>,
}

impl ColumnController {
    pub fn new(filter_debounce_ms: f64) -> Self {
        Self {
            widths: Vec::new(),
            min_widths: HashMap::new(),
            resize: None,
            drag_source: None,
            filters: BTreeMap::new(),
            debounce: Debouncer::new(filter_debounce_ms),
        }
    }

    pub fn width(&self, col_index: usize) -> Option<f32> {
        self.widths.get(col_index).copied()
    }

    pub fn widths(&self) -> &[f32] {
        &self.widths
    }

    // ------------------------------------------------------------------
    // Layout
    // ------------------------------------------------------------------

    /// Compute and publish widths for every column.
    ///
    /// Natural widths come from a declared width (except under `ratio`,
    /// where it is a weight), then a surface measurement, then a text
    /// estimate over the header and `first_row` texts. The natural minimum
    /// is captured from the first row the first time a column is seen.
    pub fn layout(
        &mut self,
        model: &TabularModel,
        first_row: &[String],
        layout: Layout,
        surface: &dyn ViewSurface,
        sink: &mut dyn StyleSink,
    ) {
        let columns = model.columns();
        let natural: Vec<f32> = columns
            .iter()
            .map(|column| {
                let declared = column.width.filter(|_| layout != Layout::Ratio);
                let sample = first_row.get(column.col_index).cloned();
                declared
                    .or_else(|| surface.measure_column(column.col_index))
                    .unwrap_or_else(|| {
                        style::estimate_width(column, sample.as_slice())
                    })
            })
            .collect();
        for column in columns {
            let first = first_row.get(column.col_index).map(String::as_str);
            self.remember_min_width(column, first);
        }
        self.widths = style::compute_widths(columns, &natural, layout, surface.container_width());
        for (col_index, width) in self.widths.iter().enumerate() {
            style::apply_column_width(sink, col_index, *width);
        }
        style::apply_alignments(sink, columns);
    }

    fn remember_min_width(&mut self, column: &Column, first_row_text: Option<&str>) {
        if self.min_widths.contains_key(&column.id) {
            return;
        }
        let natural = match column.synthetic {
            Some(crate::types::Synthetic::Checkbox) => style::CHECKBOX_WIDTH,
            _ => first_row_text.map_or(style::MIN_COLUMN_WIDTH, style::text_width),
        };
        let min = column.min_width.unwrap_or(natural);
        self.min_widths.insert(column.id.clone(), min);
    }

    pub fn min_width(&self, column: &Column) -> f32 {
        self.min_widths
            .get(&column.id)
            .copied()
            .or(column.min_width)
            .unwrap_or(style::MIN_COLUMN_WIDTH)
    }

    // ------------------------------------------------------------------
    // Resize
    // ------------------------------------------------------------------

    /// Pointer-down on a resize handle; refused for non-resizable columns.
    pub fn start_resize(&mut self, model: &TabularModel, col_index: usize, x: f32) -> bool {
        let Some(column) = model.column(col_index).filter(|c| c.resizable) else {
            log::debug!("resize refused for column {col_index}");
            return false;
        };
        let start_width = self.width(col_index).unwrap_or(style::MIN_COLUMN_WIDTH);
        self.resize = Some(ResizeGesture {
            col_index,
            start_x: x,
            start_width,
            min_width: self.min_width(column),
            current: start_width,
        });
        true
    }

    /// Pointer-move during a resize; returns the clamped new width.
    pub fn resize_to(&mut self, x: f32, sink: &mut dyn StyleSink) -> Option<(usize, f32)> {
        let gesture = self.resize.as_mut()?;
        let width = (gesture.start_width + (x - gesture.start_x)).max(gesture.min_width);
        gesture.current = width;
        let col_index = gesture.col_index;
        if let Some(slot) = self.widths.get_mut(col_index) {
            *slot = width;
        }
        style::apply_column_width(sink, col_index, width);
        Some((col_index, width))
    }

    /// Pointer-up: the final width, to be committed into the model.
    pub fn end_resize(&mut self) -> Option<(usize, f32)> {
        self.resize.take().map(|g| (g.col_index, g.current))
    }

    pub fn is_resizing(&self) -> bool {
        self.resize.is_some()
    }

    // ------------------------------------------------------------------
    // Sort and reorder
    // ------------------------------------------------------------------

    /// Next order for a header click; `None` for non-sortable columns.
    pub fn next_sort(&self, model: &TabularModel, col_index: usize) -> Option<SortOrder> {
        model
            .column(col_index)
            .filter(|c| c.sortable && !c.is_standard())
            .map(|c| c.sort_order.next())
    }

    pub fn drag_start(&mut self, model: &TabularModel, col_index: usize) -> bool {
        if model.column(col_index).map_or(true, Column::is_standard) {
            return false;
        }
        self.drag_source = Some(col_index);
        true
    }

    /// Drop onto `target`; the pair to swap, or `None` for a pinned,
    /// missing or identical target.
    pub fn drop_on(&mut self, model: &TabularModel, target: usize) -> Option<(usize, usize)> {
        let source = self.drag_source.take()?;
        let pinned = |i: usize| model.column(i).map_or(true, Column::is_standard);
        if source == target || pinned(source) || pinned(target) {
            return None;
        }
        Some((source, target))
    }

    /// Keep width and alignment rules in step with `model` after
    /// `switch_column(a, b)`.
    pub fn on_switch(&mut self, model: &TabularModel, a: usize, b: usize, sink: &mut dyn StyleSink) {
        if a < self.widths.len() && b < self.widths.len() {
            self.widths.swap(a, b);
        }
        for col_index in [a, b] {
            if let Some(width) = self.width(col_index) {
                style::apply_column_width(sink, col_index, width);
            }
        }
        style::apply_alignments(sink, model.columns());
    }

    /// Keep width and alignment rules in step with `model` after
    /// `remove_column(col)`.
    pub fn on_remove(&mut self, model: &TabularModel, removed: &Column, sink: &mut dyn StyleSink) {
        let old_len = self.widths.len().max(model.columns().len() + 1);
        if removed.col_index < self.widths.len() {
            self.widths.remove(removed.col_index);
        }
        self.min_widths.remove(&removed.id);
        self.filters.remove(&removed.id);
        style::remove_column_rules(sink, removed.col_index, old_len);
        for (col_index, width) in self.widths.iter().enumerate().skip(removed.col_index) {
            style::apply_column_width(sink, col_index, *width);
        }
        style::apply_alignments(sink, model.columns());
    }

    // ------------------------------------------------------------------
    // Header dropdown
    // ------------------------------------------------------------------

    pub fn dropdown_items(&self, custom: &[String]) -> Vec<String> {
        BUILTIN_DROPDOWN
            .iter()
            .map(|s| (*s).to_string())
            .chain(custom.iter().cloned())
            .collect()
    }

    // ------------------------------------------------------------------
    // Inline filters
    // ------------------------------------------------------------------

    /// A keystroke in a filter input; returns the debounce deadline.
    pub fn on_filter_input(&mut self, column: &Column, text: &str, now_ms: f64) -> f64 {
        if text.trim().is_empty() {
            self.filters.remove(&column.id);
        } else {
            self.filters.insert(column.id.clone(), text.to_string());
        }
        self.debounce.push((), now_ms)
    }

    /// True once the quiet period after the last keystroke has passed.
    pub fn poll_filters(&mut self, now_ms: f64) -> bool {
        self.debounce.poll(now_ms).is_some()
    }

    /// Consume pending filter input; returns `true` if some was waiting.
    pub fn settle_filters(&mut self) -> bool {
        self.debounce.flush().is_some()
    }

    pub fn filter_deadline(&self) -> Option<f64> {
        self.debounce.deadline()
    }

    /// Set a column's filter text directly, without debouncing.
    pub fn set_filter(&mut self, column: &Column, text: &str) {
        if text.trim().is_empty() {
            self.filters.remove(&column.id);
        } else {
            self.filters.insert(column.id.clone(), text.to_string());
        }
    }

    pub fn filter_text(&self, column: &Column) -> Option<&str> {
        self.filters.get(&column.id).map(String::as_str)
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.debounce.cancel();
    }

    /// Active rules resolved to current column positions.
    pub fn active_rules(&self, model: &TabularModel) -> Vec<(usize, FilterRule)> {
        self.filters
            .iter()
            .filter_map(|(id, text)| {
                let column = model.column_by_id(id)?;
                Some((column.col_index, FilterRule::parse(text)?))
            })
            .collect()
    }
}
