//! Face adjacency of an n-dimensional label volume.

use std::collections::{BTreeMap, BTreeSet};

use ndarray::ArrayViewD;
use proofread_core::NodeId;

/// Contact surfaces between labels and the volume border.
///
/// Positions are flat C-order voxel indices.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Adjacency {
    /// For each unordered label pair `(low, high)`, the voxels of either
    /// label that touch the other through a face. Sorted.
    pub surfaces: BTreeMap<(NodeId, NodeId), Vec<usize>>,
    /// For each label, its voxels lying on the outer face of the volume.
    pub border: BTreeMap<NodeId, Vec<usize>>,
}

impl Adjacency {
    /// Neighbour sets of every label, ignoring the volume border.
    pub fn neighbors(&self) -> BTreeMap<NodeId, BTreeSet<NodeId>> {
        let mut neighbors: BTreeMap<NodeId, BTreeSet<NodeId>> = BTreeMap::new();
        for &(a, b) in self.surfaces.keys() {
            let _ = neighbors.entry(a).or_default().insert(b);
            let _ = neighbors.entry(b).or_default().insert(a);
        }
        neighbors
    }
}

/// Scan every face of the volume once.
pub fn face_adjacency(labels: &ArrayViewD<'_, NodeId>) -> Adjacency {
    let shape = labels.shape();
    let flat: Vec<NodeId> = labels.iter().copied().collect();
    let mut strides = vec![1usize; shape.len()];
    for d in (0..shape.len().saturating_sub(1)).rev() {
        strides[d] = strides[d + 1] * shape[d + 1];
    }

    let mut surfaces: BTreeMap<(NodeId, NodeId), BTreeSet<usize>> = BTreeMap::new();
    let mut border: BTreeMap<NodeId, BTreeSet<usize>> = BTreeMap::new();
    for (i, &label) in flat.iter().enumerate() {
        for (&extent, &stride) in shape.iter().zip(&strides) {
            let coord = (i / stride) % extent;
            if coord == 0 || coord + 1 == extent {
                let _ = border.entry(label).or_default().insert(i);
            }
            if coord + 1 < extent {
                let j = i + stride;
                let other = flat[j];
                if other != label {
                    let surface = surfaces.entry((label.min(other), label.max(other))).or_default();
                    let _ = surface.insert(i);
                    let _ = surface.insert(j);
                }
            }
        }
    }

    Adjacency {
        surfaces: surfaces
            .into_iter()
            .map(|(k, v)| (k, v.into_iter().collect()))
            .collect(),
        border: border
            .into_iter()
            .map(|(k, v)| (k, v.into_iter().collect()))
            .collect(),
    }
}
