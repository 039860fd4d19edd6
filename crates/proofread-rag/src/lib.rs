//! # proofread-rag
//!
//! Region adjacency graph (RAG) over an n-dimensional label volume.
//!
//! - [`extents`]: compressed label → voxel index
//! - [`Rag`]: nodes, face-adjacency edges with feature caches, the
//!   boundary sentinel, exclusion tokens, and merge/separate operations
//! - [`MergeTree`]: merge lineage and the fragment → segment map
//! - [`MergeQueue`] / [`MergePriority`]: priority-ordered agglomeration

#![deny(unsafe_code)]

pub mod adjacency;
pub mod errors;
pub mod extents;
pub mod priority;
pub mod queue;
pub mod rag;
pub mod tree;

pub use adjacency::{face_adjacency, Adjacency};
pub use errors::{RagError, Result};
pub use extents::{extents, SparseLol};
pub use priority::{BoundaryMean, MergePriority};
pub use queue::{MergeQueue, QueueItem};
pub use rag::{Rag, RagBuilder};
pub use tree::MergeTree;
