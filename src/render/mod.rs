//! Body rendering with pluggable strategies.
//!
//! This module provides:
//! - Pure markup generation for header, rows, cells and footer
//! - Full materialization and cluster-windowed (virtualized) bodies
//! - The stylesheet sink and column width layout

pub mod cluster;
pub mod markup;
pub mod style;

use std::ops::Range;

pub use cluster::{ClusterConfig, ClusterWindow, Clusterizer};
pub use markup::{escape_html, HeaderDecor, RowDecor};
pub use style::{compute_widths, MemoryStyleSink, StyleSink};

use crate::model::TabularModel;
use crate::options::GridOptions;
use crate::surface::ViewSurface;
use crate::types::{CellRef, RowIndex};

/// Default row height when none is configured or measured.
pub const DEFAULT_ROW_HEIGHT: f32 = 33.0;

/// How the body is materialized
#[derive(Debug, Clone)]
pub enum RenderStrategy {
    /// Every row in one pass.
    Full,
    /// Only the current cluster plus spacer rows.
    Clustered(Clusterizer),
}

impl RenderStrategy {
    /// View positions to materialize for a view of `total` rows.
    fn window(&mut self, total: usize) -> ClusterWindow {
        match self {
            Self::Full => ClusterWindow {
                cluster: 0,
                start: 0,
                end: total,
                top_offset: 0.0,
                bottom_offset: 0.0,
            },
            Self::Clustered(c) => c.render(total),
        }
    }
}

/// Turns windows of view-ordered rows into body markup
#[derive(Debug, Clone)]
pub struct RenderEngine {
    strategy: RenderStrategy,
    no_data_message: String,
    row_height: f32,
    rendered: Range<usize>,
}

impl RenderEngine {
    pub fn new(options: &GridOptions) -> Self {
        let row_height = options.cell_height.unwrap_or(DEFAULT_ROW_HEIGHT);
        let strategy = if options.clusterize {
            RenderStrategy::Clustered(Clusterizer::new(ClusterConfig {
                rows_in_block: options.rows_in_block.max(1),
                row_height,
                ..ClusterConfig::default()
            }))
        } else {
            RenderStrategy::Full
        };
        Self {
            strategy,
            no_data_message: options.no_data_message.clone(),
            row_height,
            rendered: 0..0,
        }
    }

    pub fn strategy(&self) -> &RenderStrategy {
        &self.strategy
    }

    pub fn row_height(&self) -> f32 {
        self.row_height
    }

    pub fn set_row_height(&mut self, height: f32) {
        self.row_height = height;
        if let RenderStrategy::Clustered(c) = &mut self.strategy {
            c.set_row_height(height);
        }
    }

    /// View positions currently in the body.
    pub fn rendered_range(&self) -> Range<usize> {
        self.rendered.clone()
    }

    /// Identities of the rendered rows, given the current visible list.
    pub fn rendered_rows<'a>(&self, rows: &'a [RowIndex]) -> &'a [RowIndex] {
        rows.get(self.rendered.clone()).unwrap_or_default()
    }

    /// Markup for the row at view position `position`.
    ///
    /// Pure: the virtualizer may call it for any index.
    pub fn row_markup(
        model: &TabularModel,
        rows: &[RowIndex],
        decor: RowDecor<'_>,
        position: usize,
    ) -> Option<String> {
        let row = model.get_row(*rows.get(position)?)?;
        Some(markup::row_html(model, row, decor))
    }

    pub fn render_header(
        &self,
        model: &TabularModel,
        decor: HeaderDecor,
        surface: &mut dyn ViewSurface,
    ) {
        surface.set_header(&markup::header_html(model.columns(), decor));
    }

    /// Re-render the body for `rows` (the visible, view-ordered identities).
    ///
    /// Callers must re-apply cross-cutting state afterwards: the surface
    /// drops all row and cell decoration on replacement.
    pub fn render_body(
        &mut self,
        model: &TabularModel,
        rows: &[RowIndex],
        decor: RowDecor<'_>,
        surface: &mut dyn ViewSurface,
    ) -> Range<usize> {
        let window = self.strategy.window(rows.len());
        self.materialize(model, rows, decor, window, surface);
        self.rendered.clone()
    }

    /// Scroll handler; re-renders only when the cluster changes.
    pub fn on_scroll(
        &mut self,
        scroll_top: f32,
        model: &TabularModel,
        rows: &[RowIndex],
        decor: RowDecor<'_>,
        surface: &mut dyn ViewSurface,
    ) -> bool {
        let RenderStrategy::Clustered(c) = &mut self.strategy else {
            return false;
        };
        match c.scroll(scroll_top, rows.len()) {
            Some(window) => {
                self.materialize(model, rows, decor, window, surface);
                true
            }
            None => false,
        }
    }

    /// Make sure view position `position` is materialized.
    pub fn reveal(
        &mut self,
        position: usize,
        model: &TabularModel,
        rows: &[RowIndex],
        decor: RowDecor<'_>,
        surface: &mut dyn ViewSurface,
    ) -> bool {
        let RenderStrategy::Clustered(c) = &mut self.strategy else {
            return false;
        };
        match c.reveal(position, rows.len()) {
            Some(window) => {
                self.materialize(model, rows, decor, window, surface);
                true
            }
            None => false,
        }
    }

    fn materialize(
        &mut self,
        model: &TabularModel,
        rows: &[RowIndex],
        decor: RowDecor<'_>,
        window: ClusterWindow,
        surface: &mut dyn ViewSurface,
    ) {
        let colspan = model.columns().len().max(1);
        if rows.is_empty() {
            self.rendered = 0..0;
            surface.set_body(&markup::no_data_html(&self.no_data_message, colspan), &[]);
            return;
        }

        let mut html = String::from("<tbody>");
        if window.top_offset > 0.0 {
            html.push_str(&markup::spacer_html(window.top_offset, colspan));
        }
        for position in window.start..window.end {
            if let Some(row) = Self::row_markup(model, rows, decor, position) {
                html.push_str(&row);
            }
        }
        if window.bottom_offset > 0.0 {
            html.push_str(&markup::spacer_html(window.bottom_offset, colspan));
        }
        html.push_str("</tbody>");

        self.rendered = window.start..window.end;
        let rendered = rows.get(self.rendered.clone()).unwrap_or_default();
        log::trace!(
            "body rendered: rows {}..{} of {}",
            window.start,
            window.end,
            rows.len()
        );
        surface.set_body(&html, rendered);
    }

    /// Re-render just one cell's content.
    pub fn render_cell(
        &self,
        model: &TabularModel,
        cell: CellRef,
        decor: RowDecor<'_>,
        surface: &mut dyn ViewSurface,
    ) {
        let (Some(column), Some(data)) = (
            model.column(cell.col_index),
            model.get_cell(cell.col_index, cell.row_index),
        ) else {
            return;
        };
        surface.set_cell_html(cell, &markup::cell_content_html(model, column, data, decor));
    }

    pub fn render_footer(
        &self,
        model: &TabularModel,
        rows: &[RowIndex],
        surface: &mut dyn ViewSurface,
    ) {
        let totals = markup::column_totals(model, rows);
        surface.set_footer(&markup::total_row_html(model, &totals));
    }

    pub fn reset(&mut self) {
        self.rendered = 0..0;
        if let RenderStrategy::Clustered(c) = &mut self.strategy {
            c.reset();
        }
    }
}
