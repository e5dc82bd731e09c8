use std::cmp::Ordering;

use crate::types::RowIndex;

/// Permutation of row identities defining render order.
///
/// Always holds every stored row exactly once; filtering is applied on top
/// of it, never by removing entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewOrder {
    order: Vec<RowIndex>,
}

impl ViewOrder {
    /// Original insertion order for `count` rows.
    #[cfg(test)]
    pub fn identity(count: u32) -> Self {
        Self {
            order: (0..count).collect(),
        }
    }

    pub fn as_slice(&self) -> &[RowIndex] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = RowIndex> + '_ {
        self.order.iter().copied()
    }

    pub fn position_of(&self, row: RowIndex) -> Option<usize> {
        self.order.iter().position(|r| *r == row)
    }

    pub(crate) fn push(&mut self, row: RowIndex) {
        self.order.push(row);
    }

    pub(crate) fn reverse(&mut self) {
        self.order.reverse();
    }

    /// Restore storage order (rowIndex ascending).
    pub(crate) fn reset(&mut self) {
        self.order.sort_unstable();
    }

    /// Stable sort; ties keep their current relative order.
    pub(crate) fn sort_by(&mut self, compare: impl FnMut(&RowIndex, &RowIndex) -> Ordering) {
        self.order.sort_by(compare);
    }
}
