//! Min-priority merge queue.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use proofread_core::NodeId;

/// A candidate merge. Lower priority merges first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QueueItem {
    /// Lower merges first.
    pub priority: f64,
    pub n1: NodeId,
    pub n2: NodeId,
}

impl Eq for QueueItem {}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed so BinaryHeap pops the smallest priority
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| (other.n1, other.n2).cmp(&(self.n1, self.n2)))
    }
}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Heap of candidate merges. Entries are never updated in place; the graph
/// discards stale ones when they surface.
#[derive(Clone, Debug, Default)]
pub struct MergeQueue {
    heap: BinaryHeap<QueueItem>,
}

impl MergeQueue {
    /// Queue a candidate.
    pub fn push(&mut self, item: QueueItem) {
        self.heap.push(item);
    }

    /// Remove the lowest-priority item.
    pub fn pop(&mut self) -> Option<QueueItem> {
        self.heap.pop()
    }

    /// Lowest-priority item, if any.
    pub fn peek(&self) -> Option<&QueueItem> {
        self.heap.peek()
    }

    /// Queued items, stale ones included.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether there is nothing in it.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drop every item.
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(priority: f64, n1: NodeId, n2: NodeId) -> QueueItem {
        QueueItem { priority, n1, n2 }
    }

    #[test]
    fn pops_lowest_priority_first() {
        let mut queue = MergeQueue::default();
        queue.push(item(0.9, 1, 2));
        queue.push(item(0.1, 3, 4));
        queue.push(item(0.5, 5, 6));
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop().map(|i| i.n1), Some(3));
        assert_eq!(queue.pop().map(|i| i.n1), Some(5));
        assert_eq!(queue.pop().map(|i| i.n1), Some(1));
        assert!(queue.is_empty());
    }

    #[test]
    fn ties_break_on_ids() {
        let mut queue = MergeQueue::default();
        queue.push(item(0.2, 7, 8));
        queue.push(item(0.2, 1, 9));
        assert_eq!(queue.peek().map(|i| (i.n1, i.n2)), Some((1, 9)));
    }

    #[test]
    fn nan_sorts_last() {
        let mut queue = MergeQueue::default();
        queue.push(item(f64::NAN, 1, 2));
        queue.push(item(f64::INFINITY, 3, 4));
        assert_eq!(queue.pop().map(|i| i.n1), Some(3));
        queue.clear();
        assert!(queue.pop().is_none());
    }
}
