//! Permutation editor behind the rearrange dialog.

/// Thumbnails per row in the picker grids.
pub const GRID_COLUMNS: usize = 4;

/// Row and column of grid slot `index`.
pub fn grid_cell(index: usize) -> (usize, usize) {
    (index / GRID_COLUMNS, index % GRID_COLUMNS)
}

/// Number of grid rows needed for `len` slots.
pub fn grid_rows(len: usize) -> usize {
    len.div_ceil(GRID_COLUMNS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderEvent {
    /// The thumbnail in slot `from` was dropped onto slot `to`.
    Drop { from: usize, to: usize },
}

/// Sequence of original page indices, always a permutation of `0..len`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOrder {
    order: Vec<u32>,
}

impl PageOrder {
    pub fn identity(page_count: u32) -> Self {
        Self { order: (0..page_count).collect() }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Original page index shown in slot `slot`.
    pub fn page_at(&self, slot: usize) -> Option<u32> {
        self.order.get(slot).copied()
    }

    /// Removes the entry at `from` and reinserts it at `to`.
    ///
    /// Returns `false` without changing anything when `from == to` or either
    /// slot is out of range.
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        if from == to || from >= self.order.len() || to >= self.order.len() {
            return false;
        }
        let page = self.order.remove(from);
        self.order.insert(to, page);
        true
    }

    pub fn apply(&mut self, event: ReorderEvent) -> bool {
        match event {
            ReorderEvent::Drop { from, to } => self.move_item(from, to),
        }
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.order
    }

    pub fn into_vec(self) -> Vec<u32> {
        self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_permutation(order: &PageOrder, n: u32) -> bool {
        let mut sorted = order.as_slice().to_vec();
        sorted.sort_unstable();
        sorted == (0..n).collect::<Vec<_>>()
    }

    #[test]
    fn test_identity_order() {
        assert_eq!(PageOrder::identity(4).as_slice(), &[0, 1, 2, 3]);
        assert!(PageOrder::identity(0).is_empty());
    }

    #[test]
    fn test_move_forward_and_backward() {
        let mut order = PageOrder::identity(5);
        assert!(order.move_item(0, 2));
        assert_eq!(order.as_slice(), &[1, 2, 0, 3, 4]);

        assert!(order.move_item(4, 0));
        assert_eq!(order.as_slice(), &[4, 1, 2, 0, 3]);
        assert!(is_permutation(&order, 5));
    }

    #[test]
    fn test_noop_moves() {
        let mut order = PageOrder::identity(3);
        assert!(!order.move_item(1, 1));
        assert!(!order.move_item(3, 0));
        assert!(!order.move_item(0, 3));
        assert_eq!(order, PageOrder::identity(3));
    }

    #[test]
    fn test_drop_sequence_builds_expected_permutation() {
        let mut order = PageOrder::identity(5);
        order.apply(ReorderEvent::Drop { from: 4, to: 0 });
        order.apply(ReorderEvent::Drop { from: 4, to: 3 });

        assert_eq!(order.into_vec(), vec![4, 0, 1, 3, 2]);
    }

    #[test]
    fn test_grid_layout() {
        assert_eq!(grid_cell(0), (0, 0));
        assert_eq!(grid_cell(3), (0, 3));
        assert_eq!(grid_cell(4), (1, 0));
        assert_eq!(grid_cell(9), (2, 1));
        assert_eq!(grid_rows(0), 0);
        assert_eq!(grid_rows(8), 2);
        assert_eq!(grid_rows(9), 3);
    }
}
