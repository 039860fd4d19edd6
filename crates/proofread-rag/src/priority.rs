//! Merge priority functions.

use std::fmt::Debug;

use proofread_core::NodeId;
use proofread_features::{EdgeGraph, ProbabilityKind};

use crate::rag::Rag;

/// Scores a candidate merge; lower values merge first.
pub trait MergePriority: Send + Sync + Debug {
    fn priority(&self, g: &Rag, n1: NodeId, n2: NodeId) -> f64;
}

/// Mean boundary probability of the first non-oriented channel.
///
/// Edges without a probability map or boundary score `+inf` and never merge.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoundaryMean;

impl MergePriority for BoundaryMean {
    fn priority(&self, g: &Rag, n1: NodeId, n2: NodeId) -> f64 {
        let (Some(boundary), Some(probs)) = (
            g.boundary(n1, n2),
            g.probabilities(ProbabilityKind::NonOriented),
        ) else {
            return f64::INFINITY;
        };
        if boundary.is_empty() || probs.ncols() == 0 {
            return f64::INFINITY;
        }
        let total: f64 = boundary.iter().map(|&v| probs[[v, 0]]).sum();
        total / boundary.len() as f64
    }
}
