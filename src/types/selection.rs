use serde::Serialize;

/// Rectangular selection in view coordinates.
///
/// Rows are positions in the current view order (not row identities), columns
/// are column indices. Corners may be given in any order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

impl Selection {
    pub fn new(start_row: usize, start_col: usize, end_row: usize, end_col: usize) -> Self {
        Self {
            start_row,
            start_col,
            end_row,
            end_col,
        }
    }

    /// Get normalized bounds `(min_row, min_col, max_row, max_col)`
    pub fn bounds(&self) -> (usize, usize, usize, usize) {
        (
            self.start_row.min(self.end_row),
            self.start_col.min(self.end_col),
            self.start_row.max(self.end_row),
            self.start_col.max(self.end_col),
        )
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        let (min_row, min_col, max_row, max_col) = self.bounds();
        (min_row..=max_row).contains(&row) && (min_col..=max_col).contains(&col)
    }

    pub fn cell_count(&self) -> usize {
        let (min_row, min_col, max_row, max_col) = self.bounds();
        (max_row - min_row + 1) * (max_col - min_col + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_normalize_corners() {
        let sel = Selection::new(4, 3, 1, 2);
        assert_eq!(sel.bounds(), (1, 2, 4, 3));
        assert!(sel.contains(2, 2));
        assert!(!sel.contains(0, 2));
        assert_eq!(sel.cell_count(), 8);
    }
}
