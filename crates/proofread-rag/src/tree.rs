//! Merge lineage.

use std::collections::{BTreeMap, BTreeSet};

use proofread_core::NodeId;

#[derive(Clone, Copy, Debug, PartialEq)]
struct MergeRecord {
    children: (NodeId, NodeId),
    weight: f64,
}

/// Binary merge tree over the original fragments.
///
/// Every merge creates a new node whose children are the two merged nodes
/// and whose weight is the priority it was merged at.
#[derive(Clone, Debug, Default)]
pub struct MergeTree {
    parent: BTreeMap<NodeId, NodeId>,
    merges: BTreeMap<NodeId, MergeRecord>,
    leaves: BTreeSet<NodeId>,
}

impl MergeTree {
    /// Tree of unmerged `leaves`.
    pub fn new(leaves: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            leaves: leaves.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Record that `a` and `b` were merged into `merged` at `weight`.
    pub fn record_merge(&mut self, a: NodeId, b: NodeId, merged: NodeId, weight: f64) {
        let _ = self.parent.insert(a, merged);
        let _ = self.parent.insert(b, merged);
        let _ = self.merges.insert(
            merged,
            MergeRecord {
                children: (a, b),
                weight,
            },
        );
    }

    /// Root of the lineage containing `node`. Unknown ids map to themselves.
    pub fn highest_ancestor(&self, node: NodeId) -> NodeId {
        let mut current = node;
        while let Some(&parent) = self.parent.get(&current) {
            current = parent;
        }
        current
    }

    /// Node `node` was merged into.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.parent.get(&node).copied()
    }

    /// The two nodes merged to form `node`.
    pub fn children(&self, node: NodeId) -> Option<(NodeId, NodeId)> {
        self.merges.get(&node).map(|m| m.children)
    }

    /// Priority at which `node` was formed.
    pub fn weight(&self, node: NodeId) -> Option<f64> {
        self.merges.get(&node).map(|m| m.weight)
    }

    /// Whether `node` is an original fragment.
    pub fn is_leaf(&self, node: NodeId) -> bool {
        self.leaves.contains(&node)
    }

    /// Original fragments, ascending.
    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.leaves.iter().copied()
    }

    /// Number of merges recorded.
    pub fn merge_count(&self) -> usize {
        self.merges.len()
    }

    /// Map every leaf to the highest ancestor reachable through merges
    /// whose weight is below `threshold`.
    pub fn get_map(&self, threshold: f64) -> BTreeMap<NodeId, NodeId> {
        self.leaves
            .iter()
            .map(|&leaf| {
                let mut current = leaf;
                while let Some(&parent) = self.parent.get(&current) {
                    match self.weight(parent) {
                        Some(w) if w < threshold => current = parent,
                        _ => break,
                    }
                }
                (leaf, current)
            })
            .collect()
    }
}
