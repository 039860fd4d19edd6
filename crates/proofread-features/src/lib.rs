//! # proofread-features
//!
//! Feature managers turn an edge of a region adjacency graph into a
//! fixed-length vector for the merge classifier.
//!
//! - [`FeatureManager`]: the edge feature contract (create, update, merge, compute)
//! - [`EdgeGraph`]: the read-only view of a graph that managers work against
//! - [`ContactManager`]: contact-area ratios over dark boundary voxels
//! - [`GroundTruthManager`]: overlap similarity against a reference labeling

#![deny(unsafe_code)]

pub mod contact;
pub mod errors;
pub mod graph;
pub mod ground_truth;
pub mod manager;

pub use contact::ContactManager;
pub use errors::{FeatureError, Result};
pub use graph::{EdgeCache, EdgeEnd, EdgeGraph, FeatureVector, ProbabilityKind};
pub use ground_truth::GroundTruthManager;
pub use manager::FeatureManager;
