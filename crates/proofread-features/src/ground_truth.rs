//! Ground-truth overlap features, used to simulate a perfect proofreader.

use std::collections::BTreeMap;

use ndarray::{arr1, ArrayD, IxDyn};
use proofread_core::NodeId;

use crate::errors::{FeatureError, Result};
use crate::graph::{EdgeCache, EdgeGraph, FeatureVector};
use crate::manager::FeatureManager;

/// Scores an edge by how similarly its two sides overlap a reference
/// labeling: the single feature is the cosine similarity of the nodes'
/// overlap histograms (1 for the same true segment, 0 for disjoint ones).
#[derive(Clone, Debug, Default)]
pub struct GroundTruthManager {
    overlaps: BTreeMap<NodeId, BTreeMap<NodeId, usize>>,
}

impl GroundTruthManager {
    /// Tabulate the overlap of every fragment with the reference labels.
    pub fn new(fragments: &[NodeId], truth: &[NodeId]) -> Result<Self> {
        if fragments.len() != truth.len() {
            return Err(FeatureError::LengthMismatch {
                fragments: fragments.len(),
                truth: truth.len(),
            });
        }
        let mut overlaps: BTreeMap<NodeId, BTreeMap<NodeId, usize>> = BTreeMap::new();
        for (&fragment, &label) in fragments.iter().zip(truth) {
            *overlaps.entry(fragment).or_default().entry(label).or_default() += 1;
        }
        Ok(Self { overlaps })
    }

    fn histogram(&self, g: &dyn EdgeGraph, node: NodeId) -> Result<BTreeMap<NodeId, f64>> {
        let fragments = g.fragments(node).ok_or(FeatureError::MissingNode(node))?;
        let mut histogram = BTreeMap::new();
        for fragment in fragments {
            for (&label, &count) in self.overlaps.get(&fragment).into_iter().flatten() {
                *histogram.entry(label).or_insert(0.0) += count as f64;
            }
        }
        Ok(histogram)
    }
}

fn cosine(a: &BTreeMap<NodeId, f64>, b: &BTreeMap<NodeId, f64>) -> f64 {
    let dot: f64 = a
        .iter()
        .filter_map(|(k, x)| b.get(k).map(|y| x * y))
        .sum();
    let norm_a = a.values().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.values().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

impl FeatureManager for GroundTruthManager {
    fn name(&self) -> &'static str {
        "ground-truth"
    }

    fn create_edge_cache(&self, g: &dyn EdgeGraph, n1: NodeId, n2: NodeId) -> Result<EdgeCache> {
        let _ = g.boundary(n1, n2).ok_or(FeatureError::MissingEdge(n1, n2))?;
        Ok(ArrayD::zeros(IxDyn(&[0])))
    }

    fn update_edge_cache(&self, _dst: &mut EdgeCache, _src: &EdgeCache) -> Result<()> {
        Ok(())
    }

    fn compute_edge_features(
        &self,
        g: &dyn EdgeGraph,
        n1: NodeId,
        n2: NodeId,
        _cache: Option<&EdgeCache>,
    ) -> Result<FeatureVector> {
        let _ = g.boundary(n1, n2).ok_or(FeatureError::MissingEdge(n1, n2))?;
        let h1 = self.histogram(g, n1)?;
        let h2 = self.histogram(g, n2)?;
        Ok(arr1(&[cosine(&h1, &h2)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::testing::MapGraph;
    use assert_matches::assert_matches;

    fn graph_and_manager() -> (MapGraph, GroundTruthManager) {
        let rows: [&[NodeId]; 2] = [&[1, 2, 3], &[1, 2, 3]];
        let g = MapGraph::from_grid(&rows);
        let fragments = [1, 2, 3, 1, 2, 3];
        let truth = [7, 7, 8, 7, 7, 8];
        (g, GroundTruthManager::new(&fragments, &truth).unwrap())
    }

    #[test]
    fn same_true_segment_scores_one() {
        let (g, manager) = graph_and_manager();
        let features = manager.compute_edge_features(&g, 1, 2, None).unwrap();
        assert_eq!(features.len(), 1);
        assert!((features[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn different_true_segments_score_zero() {
        let (g, manager) = graph_and_manager();
        let features = manager.compute_edge_features(&g, 2, 3, None).unwrap();
        assert!(features[0].abs() < 1e-12);
    }

    #[test]
    fn merged_nodes_pool_their_fragments() {
        let (mut g, manager) = graph_and_manager();
        let _ = g.fragments.insert(1, vec![1, 3]);
        let features = manager.compute_edge_features(&g, 1, 2, None).unwrap();
        // [7: 2, 8: 2] against [7: 2]
        let expected = 1.0 / 2.0_f64.sqrt();
        assert!((features[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn non_adjacent_nodes_fail() {
        let (g, manager) = graph_and_manager();
        assert_matches!(
            manager.compute_edge_features(&g, 1, 3, None),
            Err(FeatureError::MissingEdge(1, 3))
        );
        assert_matches!(
            manager.create_edge_cache(&g, 1, 3),
            Err(FeatureError::MissingEdge(1, 3))
        );
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let err = GroundTruthManager::new(&[1, 2], &[1]).unwrap_err();
        assert_matches!(err, FeatureError::LengthMismatch { fragments: 2, truth: 1 });
    }
}
