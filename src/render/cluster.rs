//! Cluster windowing for the virtualized body.
//!
//! Rows are grouped into blocks; a cluster is `blocks_in_cluster` blocks.
//! Consecutive clusters overlap by one block so scrolling across a cluster
//! boundary never shows a gap. Only the current cluster is in the DOM, with
//! spacer rows standing in for everything above and below it.

/// Sizing of the virtualized body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterConfig {
    pub rows_in_block: usize,
    pub blocks_in_cluster: usize,
    /// Row height in CSS pixels.
    pub row_height: f32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            rows_in_block: 50,
            blocks_in_cluster: 4,
            row_height: 33.0,
        }
    }
}

impl ClusterConfig {
    pub fn rows_in_cluster(&self) -> usize {
        self.rows_in_block * self.blocks_in_cluster
    }

    fn block_height(&self) -> f32 {
        self.row_height * self.rows_in_block as f32
    }

    fn cluster_height(&self) -> f32 {
        self.block_height() * self.blocks_in_cluster as f32
    }

    /// Which cluster a scroll offset falls in.
    pub fn cluster_at(&self, scroll_top: f32) -> usize {
        let stride = self.cluster_height() - self.block_height();
        if stride <= 0.0 || scroll_top <= 0.0 {
            return 0;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let cluster = (scroll_top / stride).floor() as usize;
        cluster
    }

    /// Rows of cluster `cluster` for a view of `total` rows.
    pub fn window(&self, total: usize, cluster: usize) -> ClusterWindow {
        let rows_in_cluster = self.rows_in_cluster();
        if total <= rows_in_cluster {
            return ClusterWindow {
                cluster: 0,
                start: 0,
                end: total,
                top_offset: 0.0,
                bottom_offset: 0.0,
            };
        }
        let stride = rows_in_cluster.saturating_sub(self.rows_in_block).max(1);
        let last_start = total.saturating_sub(rows_in_cluster);
        let start = (stride * cluster).min(last_start);
        let end = (start + rows_in_cluster).min(total);
        ClusterWindow {
            cluster,
            start,
            end,
            top_offset: start as f32 * self.row_height,
            bottom_offset: (total - end) as f32 * self.row_height,
        }
    }
}

/// View positions `start..end` currently materialized
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterWindow {
    pub cluster: usize,
    pub start: usize,
    pub end: usize,
    pub top_offset: f32,
    pub bottom_offset: f32,
}

impl ClusterWindow {
    pub fn contains(&self, position: usize) -> bool {
        (self.start..self.end).contains(&position)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Scroll-driven cluster tracker
#[derive(Debug, Clone, Default)]
pub struct Clusterizer {
    config: ClusterConfig,
    current: Option<usize>,
}

impl Clusterizer {
    pub fn new(config: ClusterConfig) -> Self {
        Self {
            config,
            current: None,
        }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn set_row_height(&mut self, height: f32) {
        self.config.row_height = height;
    }

    /// Window for the current cluster; remembers it as rendered.
    pub fn render(&mut self, total: usize) -> ClusterWindow {
        let window = self.config.window(total, self.current.unwrap_or(0));
        self.current = Some(window.cluster);
        window
    }

    /// New window if scrolling moved into another cluster.
    pub fn scroll(&mut self, scroll_top: f32, total: usize) -> Option<ClusterWindow> {
        let cluster = self.config.cluster_at(scroll_top);
        if self.current == Some(cluster) {
            return None;
        }
        let window = self.config.window(total, cluster);
        self.current = Some(window.cluster);
        Some(window)
    }

    /// Jump to the cluster holding view position `position`.
    pub fn reveal(&mut self, position: usize, total: usize) -> Option<ClusterWindow> {
        let current = self.config.window(total, self.current.unwrap_or(0));
        if current.contains(position) {
            return None;
        }
        let stride = self
            .config
            .rows_in_cluster()
            .saturating_sub(self.config.rows_in_block)
            .max(1);
        let cluster = position / stride;
        let window = self.config.window(total, cluster);
        self.current = Some(window.cluster);
        Some(window)
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn config() -> ClusterConfig {
        ClusterConfig {
            rows_in_block: 10,
            blocks_in_cluster: 4,
            row_height: 20.0,
        }
    }

    #[test_case(0.0, 0 ; "top")]
    #[test_case(599.0, 0 ; "inside first cluster")]
    #[test_case(600.0, 1 ; "second cluster")]
    #[test_case(1250.0, 2 ; "third cluster")]
    fn test_cluster_at(scroll_top: f32, expected: usize) {
        assert_eq!(config().cluster_at(scroll_top), expected);
    }

    #[test]
    fn test_small_view_renders_everything() {
        let w = config().window(25, 3);
        assert_eq!((w.start, w.end), (0, 25));
        assert_eq!(w.top_offset, 0.0);
    }

    #[test]
    fn test_windows_overlap_by_one_block() {
        let cfg = config();
        let first = cfg.window(1000, 0);
        let second = cfg.window(1000, 1);
        assert_eq!((first.start, first.end), (0, 40));
        assert_eq!((second.start, second.end), (30, 70));
        assert_eq!(second.top_offset, 600.0);
        assert_eq!(second.bottom_offset, 930.0 * 20.0);
    }

    #[test]
    fn test_last_window_is_clamped() {
        let w = config().window(100, 50);
        assert_eq!((w.start, w.end), (60, 100));
        assert_eq!(w.bottom_offset, 0.0);
    }

    #[test]
    fn test_scroll_only_reports_cluster_changes() {
        let mut c = Clusterizer::new(config());
        c.render(1000);
        assert!(c.scroll(100.0, 1000).is_none());
        let w = c.scroll(700.0, 1000);
        assert_eq!(w.map(|w| w.start), Some(30));
        assert!(c.reveal(45, 1000).is_none());
        assert_eq!(c.reveal(500, 1000).map(|w| w.contains(500)), Some(true));
    }
}
