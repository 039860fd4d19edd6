//! Feature computation errors.

use proofread_core::NodeId;
use thiserror::Error;

use crate::graph::ProbabilityKind;

/// Errors from creating, updating or evaluating edge features.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// The graph has no node with this id.
    #[error("node {0} is not in the graph")]
    MissingNode(NodeId),

    /// The two nodes are not adjacent.
    #[error("nodes {0} and {1} are not adjacent")]
    MissingEdge(NodeId, NodeId),

    /// The graph was built without the probability map this manager reads.
    #[error("graph has no {0} probability map")]
    MissingProbabilities(ProbabilityKind),

    /// A cache does not have the layout this manager produces.
    #[error("edge cache has shape {actual:?}, expected {expected}")]
    CacheShape {
        /// Human-readable description of the expected layout.
        expected: &'static str,
        /// Shape actually found.
        actual: Vec<usize>,
    },

    /// Two caches cannot be combined because their shapes differ.
    #[error("cannot combine caches of shape {dst:?} and {src:?}")]
    ShapeMismatch {
        /// Shape of the destination cache.
        dst: Vec<usize>,
        /// Shape of the source cache.
        src: Vec<usize>,
    },

    /// Parallel label inputs have different lengths.
    #[error("label inputs differ in length: {fragments} fragments vs {truth} truth voxels")]
    LengthMismatch {
        /// Voxel count of the fragment labeling.
        fragments: usize,
        /// Voxel count of the reference labeling.
        truth: usize,
    },
}

/// Result alias for feature operations.
pub type Result<T> = std::result::Result<T, FeatureError>;
