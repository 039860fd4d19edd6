//! A simulated proofreader.
//!
//! Given fragments and a ground-truth labeling, the driver tells a solver
//! which fragments belong together (one `merge` per true segment) and which
//! neighbouring fragments must stay apart, then asks for the resulting
//! lookup table.

use std::collections::BTreeSet;

use ndarray::ArrayViewD;
use proofread_core::NodeId;
use proofread_rag::face_adjacency;
use proofread_rpc::{ClientEndpoint, ClientMessage, RequestKind, SolverMessage};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::errors::{Result, SolverError};
use crate::evaluate::best_overlap;

/// How a simulated proofreading pass runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofreadOptions {
    /// Number of true segments to proofread; all of them when `None`.
    pub num_operations: Option<usize>,
    /// Send `stop` after receiving the lookup table.
    pub stop_when_finished: bool,
    /// Seed for the order in which true segments are visited.
    pub seed: u64,
}

impl Default for ProofreadOptions {
    fn default() -> Self {
        Self {
            num_operations: None,
            stop_when_finished: false,
            seed: 0,
        }
    }
}

/// Proofread `fragments` against `truth` through `endpoint` and return the
/// solver's lookup table as `(fragments, segments)`.
pub async fn proofread(
    fragments: ArrayViewD<'_, NodeId>,
    truth: ArrayViewD<'_, NodeId>,
    endpoint: &mut ClientEndpoint,
    options: &ProofreadOptions,
) -> Result<(Vec<NodeId>, Vec<NodeId>)> {
    if fragments.shape() != truth.shape() {
        return Err(SolverError::ShapeMismatch {
            fragments: fragments.shape().to_vec(),
            truth: truth.shape().to_vec(),
        });
    }
    let flat: Vec<NodeId> = fragments.iter().copied().collect();
    let gt: Vec<NodeId> = truth.iter().copied().collect();
    let best = best_overlap(&flat, &gt);
    let neighbors = face_adjacency(&fragments).neighbors();

    let mut labels: Vec<NodeId> = best.values().copied().collect::<BTreeSet<_>>().into_iter().collect();
    labels.shuffle(&mut StdRng::seed_from_u64(options.seed));
    let operations = options.num_operations.unwrap_or(labels.len());

    for &label in labels.iter().take(operations) {
        let components: Vec<NodeId> = best
            .iter()
            .filter(|&(_, &l)| l == label)
            .map(|(&f, _)| f)
            .collect();
        debug!(label, ?components, "proofreading segment");
        endpoint
            .send(&ClientMessage::Merge {
                segments: components.clone(),
            })
            .await?;
        for &fragment in &components {
            let others: Vec<NodeId> = neighbors
                .get(&fragment)
                .into_iter()
                .flatten()
                .copied()
                .filter(|n| !components.contains(n))
                .collect();
            if others.is_empty() {
                continue;
            }
            endpoint
                .send(&ClientMessage::Separate {
                    fragment,
                    from: others,
                })
                .await?;
        }
    }

    endpoint
        .send(&ClientMessage::Request {
            what: RequestKind::FragmentSegmentLut,
        })
        .await?;
    let SolverMessage::FragmentSegmentLut {
        fragments: src,
        segments: dst,
    } = endpoint.recv().await?;
    info!(
        operations = operations.min(labels.len()),
        fragments = src.len(),
        "proofreading pass finished"
    );
    if options.stop_when_finished {
        endpoint.send(&ClientMessage::Stop {}).await?;
    }
    Ok((src, dst))
}
