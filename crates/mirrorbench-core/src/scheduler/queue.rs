//! Heap entry keyed on a candidate's upper bound at insertion time.

use std::cmp::Ordering;

/// A candidate index and the upper bound it was queued with.
///
/// The key is a snapshot: the candidate must be popped before its stats
/// change and pushed again afterwards, never mutated while queued.
#[derive(Debug, Clone, Copy)]
pub(super) struct QueueEntry {
    pub upper: f64,
    pub index: usize,
}

impl Ord for QueueEntry {
    /// Highest upper bound first; ties go to the lower index.
    fn cmp(&self, other: &Self) -> Ordering {
        self.upper
            .total_cmp(&other.upper)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    #[test]
    fn heap_pops_highest_then_lowest_index() {
        let mut heap = BinaryHeap::new();
        for (index, upper) in [(0, 1.0), (1, f64::INFINITY), (2, 5.0), (3, 5.0), (4, 0.0)] {
            heap.push(QueueEntry { upper, index });
        }
        let order: Vec<usize> = std::iter::from_fn(|| heap.pop().map(|e| e.index)).collect();
        assert_eq!(order, vec![1, 2, 3, 0, 4]);
    }
}
