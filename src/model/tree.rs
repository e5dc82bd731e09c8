//! Positional tree queries.
//!
//! Parent/child relations are inferred from storage order and indent: a
//! row's descendants are the contiguous run of following rows that are
//! strictly deeper. Sorting breaks that contiguity, which is why tree view
//! refuses to sort.

use crate::types::{Row, RowIndex};

/// All descendants of `parent` (transitively), in storage order.
pub fn children(rows: &[Row], parent: RowIndex) -> Vec<RowIndex> {
    descendant_run(rows, parent)
        .map(|run| run.iter().map(Row::row_index).collect())
        .unwrap_or_default()
}

/// Direct children of `parent`: rows of the run not nested under an earlier
/// row of the same run.
pub fn immediate_children(rows: &[Row], parent: RowIndex) -> Vec<RowIndex> {
    let Some(run) = descendant_run(rows, parent) else {
        return Vec::new();
    };
    let Some(first_depth) = run.first().map(Row::depth) else {
        return Vec::new();
    };
    run.iter()
        .filter(|row| row.depth() <= first_depth)
        .map(Row::row_index)
        .collect()
}

/// Leaf flag for the row at `position`: no following row is deeper.
pub fn is_leaf_at(rows: &[Row], position: usize) -> bool {
    let Some(row) = rows.get(position) else {
        return true;
    };
    rows.get(position + 1)
        .map_or(true, |next| next.depth() <= row.depth())
}

/// Recompute `is_leaf` for every stored row.
pub fn mark_leaves(rows: &mut [Row]) {
    let leaves: Vec<bool> = (0..rows.len()).map(|p| is_leaf_at(rows, p)).collect();
    for (row, leaf) in rows.iter_mut().zip(leaves) {
        row.meta.is_leaf = Some(leaf);
    }
}

fn descendant_run(rows: &[Row], parent: RowIndex) -> Option<&[Row]> {
    let start = usize::try_from(parent).ok()?;
    let parent_depth = rows.get(start)?.depth();
    let after = rows.get(start + 1..)?;
    let len = after
        .iter()
        .position(|row| row.depth() <= parent_depth)
        .unwrap_or(after.len());
    after.get(..len)
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::types::RowMeta;

    fn tree(depths: &[u32]) -> Vec<Row> {
        depths
            .iter()
            .enumerate()
            .map(|(i, d)| Row {
                cells: Vec::new(),
                meta: RowMeta {
                    row_index: u32::try_from(i).unwrap_or(u32::MAX),
                    indent: Some(*d),
                    is_leaf: None,
                },
            })
            .collect()
    }

    #[test]
    fn test_children_stop_at_sibling() {
        //  0
        //    1
        //      2
        //    3
        //  4
        let rows = tree(&[0, 1, 2, 1, 0]);
        assert_eq!(children(&rows, 0), vec![1, 2, 3]);
        assert_eq!(immediate_children(&rows, 0), vec![1, 3]);
        assert_eq!(children(&rows, 1), vec![2]);
        assert!(children(&rows, 4).is_empty());
        assert!(children(&rows, 99).is_empty());
    }

    #[test]
    fn test_leaves() {
        let mut rows = tree(&[0, 1, 2, 1, 0]);
        mark_leaves(&mut rows);
        let leaves: Vec<bool> = rows.iter().map(|r| r.meta.is_leaf == Some(true)).collect();
        assert_eq!(leaves, vec![false, false, true, true, true]);
        assert!(!is_leaf_at(&rows, 1));
    }
}
