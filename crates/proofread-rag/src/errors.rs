//! RAG error types.

use proofread_core::{IdRange, NodeId};
use proofread_features::FeatureError;
use thiserror::Error;

/// Errors from building or editing a region adjacency graph.
#[derive(Debug, Error)]
pub enum RagError {
    /// A probability map does not have one row per voxel.
    #[error("{map} probability map has {rows} rows, label volume has {voxels} voxels")]
    ProbabilityShape {
        /// Which map was rejected.
        map: &'static str,
        /// Rows supplied.
        rows: usize,
        /// Voxels in the label volume.
        voxels: usize,
    },

    /// Labels and explicit positions differ in length.
    #[error("{labels} labels but {indices} input indices")]
    LengthMismatch {
        /// Number of labels.
        labels: usize,
        /// Number of positions.
        indices: usize,
    },

    /// The node is not (or no longer) in the graph.
    #[error("node {0} is not in the graph")]
    UnknownNode(NodeId),

    /// The id was never a fragment of this graph.
    #[error("fragment {0} is not in the graph")]
    UnknownFragment(NodeId),

    /// Both fragments already belong to the same segment.
    #[error("fragments {f0} and {f1} are both in segment {segment}")]
    SameSegment {
        /// First fragment.
        f0: NodeId,
        /// Second fragment.
        f1: NodeId,
        /// Segment containing both.
        segment: NodeId,
    },

    /// The boundary sentinel cannot be merged.
    #[error("node {0} is the boundary sentinel")]
    BoundaryNode(NodeId),

    /// A node cannot be merged with itself.
    #[error("cannot merge node {0} with itself")]
    SelfMerge(NodeId),

    /// Only nodes sharing an edge can merge.
    #[error("nodes {0} and {1} do not share an edge")]
    NotAdjacent(NodeId, NodeId),

    /// No feature manager is installed.
    #[error("graph has no feature manager")]
    NoFeatureManager,

    /// The reserved id block is used up.
    #[error("reserved ids exhausted at {0}")]
    IdsExhausted(NodeId),

    /// A reserved id block overlaps the label space.
    #[error("id range {range} overlaps labels up to boundary {boundary}")]
    IdRangeOverlap {
        /// Range offered.
        range: IdRange,
        /// Boundary sentinel id.
        boundary: NodeId,
    },

    /// Feature manager failure.
    #[error(transparent)]
    Feature(#[from] FeatureError),
}

/// Result alias for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
