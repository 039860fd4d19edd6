//! Read-only graph view consumed by feature managers.

use std::fmt;

use ndarray::{Array1, ArrayD, ArrayView2};
use proofread_core::NodeId;

/// Additive per-edge statistics. The layout is owned by the manager that
/// created it.
pub type EdgeCache = ArrayD<f64>;

/// Feature vector handed to the classifier.
pub type FeatureVector = Array1<f64>;

/// Which probability map a manager reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProbabilityKind {
    /// Per-voxel boundary probabilities, one column per channel.
    NonOriented,
    /// Orientation-resolved probabilities, one column per orientation.
    Oriented,
}

impl fmt::Display for ProbabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonOriented => f.write_str("non-oriented"),
            Self::Oriented => f.write_str("oriented"),
        }
    }
}

/// One end of a cached edge, in the order the cache was created with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeEnd {
    /// `n1` of `create_edge_cache`.
    First,
    /// `n2` of `create_edge_cache`.
    Second,
}

/// What a feature manager may ask of a graph.
///
/// Voxel indices are flat, C-order positions into the label volume.
pub trait EdgeGraph {
    /// Voxel count of a node.
    fn size(&self, node: NodeId) -> Option<usize>;

    /// Voxel indices covered by a node.
    fn extent(&self, node: NodeId) -> Option<Vec<usize>>;

    /// Voxels on the contact surface between two adjacent nodes.
    fn boundary(&self, n1: NodeId, n2: NodeId) -> Option<&[usize]>;

    /// Original fragments merged into a node.
    fn fragments(&self, node: NodeId) -> Option<Vec<NodeId>>;

    /// Probability map as a `(voxels, channels)` matrix.
    fn probabilities(&self, kind: ProbabilityKind) -> Option<ArrayView2<'_, f64>>;

    /// Stored cache of an edge, only when it was built with `n1` first.
    fn edge_cache(&self, n1: NodeId, n2: NodeId) -> Option<&EdgeCache>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Hand-assembled graphs for manager tests.

    use std::collections::{BTreeMap, BTreeSet};

    use ndarray::{Array2, ArrayView2};
    use proofread_core::NodeId;

    use super::{EdgeCache, EdgeGraph, ProbabilityKind};

    #[derive(Default)]
    pub struct MapGraph {
        pub extents: BTreeMap<NodeId, Vec<usize>>,
        pub fragments: BTreeMap<NodeId, Vec<NodeId>>,
        pub boundaries: BTreeMap<(NodeId, NodeId), Vec<usize>>,
        pub probabilities: Option<Array2<f64>>,
        pub oriented: Option<Array2<f64>>,
        pub caches: BTreeMap<(NodeId, NodeId), EdgeCache>,
    }

    impl MapGraph {
        /// Derive nodes, extents and face boundaries from a 2-d label grid.
        pub fn from_grid(rows: &[&[NodeId]]) -> Self {
            let width = rows[0].len();
            let flat: Vec<NodeId> = rows.iter().flat_map(|r| r.iter().copied()).collect();
            let mut graph = Self::default();
            for (i, &label) in flat.iter().enumerate() {
                graph.extents.entry(label).or_default().push(i);
                let _ = graph.fragments.insert(label, vec![label]);
            }
            let mut surfaces: BTreeMap<(NodeId, NodeId), BTreeSet<usize>> = BTreeMap::new();
            for (i, &label) in flat.iter().enumerate() {
                let mut neighbours = Vec::new();
                if i % width + 1 < width {
                    neighbours.push(i + 1);
                }
                if i + width < flat.len() {
                    neighbours.push(i + width);
                }
                for j in neighbours {
                    let other = flat[j];
                    if other != label {
                        let key = (label.min(other), label.max(other));
                        let surface = surfaces.entry(key).or_default();
                        let _ = surface.insert(i);
                        let _ = surface.insert(j);
                    }
                }
            }
            graph.boundaries = surfaces
                .into_iter()
                .map(|(k, v)| (k, v.into_iter().collect()))
                .collect();
            graph
        }

        pub fn with_probabilities(mut self, values: &[f64]) -> Self {
            let column = Array2::from_shape_vec((values.len(), 1), values.to_vec()).unwrap();
            self.probabilities = Some(column);
            self
        }
    }

    impl EdgeGraph for MapGraph {
        fn size(&self, node: NodeId) -> Option<usize> {
            self.extents.get(&node).map(Vec::len)
        }

        fn extent(&self, node: NodeId) -> Option<Vec<usize>> {
            self.extents.get(&node).cloned()
        }

        fn boundary(&self, n1: NodeId, n2: NodeId) -> Option<&[usize]> {
            self.boundaries
                .get(&(n1.min(n2), n1.max(n2)))
                .map(Vec::as_slice)
        }

        fn fragments(&self, node: NodeId) -> Option<Vec<NodeId>> {
            self.fragments.get(&node).cloned()
        }

        fn probabilities(&self, kind: ProbabilityKind) -> Option<ArrayView2<'_, f64>> {
            match kind {
                ProbabilityKind::NonOriented => self.probabilities.as_ref().map(Array2::view),
                ProbabilityKind::Oriented => self.oriented.as_ref().map(Array2::view),
            }
        }

        fn edge_cache(&self, n1: NodeId, n2: NodeId) -> Option<&EdgeCache> {
            self.caches.get(&(n1, n2))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MapGraph;
    use super::*;

    #[test]
    fn grid_boundaries_cover_both_sides() {
        let g = MapGraph::from_grid(&[&[1, 1, 2], &[1, 1, 2]]);
        assert_eq!(g.boundary(2, 1), Some(&[1, 2, 4, 5][..]));
        assert_eq!(g.size(1), Some(4));
        assert!(g.boundary(1, 3).is_none());
    }

    #[test]
    fn kind_display() {
        assert_eq!(ProbabilityKind::NonOriented.to_string(), "non-oriented");
    }
}
