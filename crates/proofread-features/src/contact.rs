//! Contact-area features.
//!
//! For each side of an edge this measures how much of the segment's dark
//! voxels (probability below a threshold) lie on the contact surface, and
//! that fraction normalised by the share of the segment's voxels the
//! surface represents. On membrane-probability inputs this approximates how
//! much of a cell's membrane touches the other cell.
//!
//! Cache layout is `(channels, thresholds, 3)` holding dark-voxel counts
//! for the boundary, `n1` and `n2` in that order.

use ndarray::{Array1, Array3, Axis, Ix3};
use proofread_core::constants::DEFAULT_CONTACT_THRESHOLDS;
use proofread_core::NodeId;

use crate::errors::{FeatureError, Result};
use crate::graph::{EdgeCache, EdgeEnd, EdgeGraph, FeatureVector, ProbabilityKind};
use crate::manager::FeatureManager;

const CACHE_LAYOUT: &str = "(channels, thresholds, 3)";

/// Contact-area feature manager.
#[derive(Clone, Debug, PartialEq)]
pub struct ContactManager {
    thresholds: Vec<f64>,
    oriented: bool,
}

impl Default for ContactManager {
    fn default() -> Self {
        Self::new(DEFAULT_CONTACT_THRESHOLDS.to_vec(), false)
    }
}

impl ContactManager {
    /// Manager counting voxels strictly below each of `thresholds`.
    pub fn new(thresholds: Vec<f64>, oriented: bool) -> Self {
        Self {
            thresholds,
            oriented,
        }
    }

    /// Darkness thresholds, one cache row each.
    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    /// Whether the oriented probability map is read.
    pub fn oriented(&self) -> bool {
        self.oriented
    }

    fn kind(&self) -> ProbabilityKind {
        if self.oriented {
            ProbabilityKind::Oriented
        } else {
            ProbabilityKind::NonOriented
        }
    }

    /// Length of the vector produced for a map with `channels` columns.
    pub fn feature_len(&self, channels: usize) -> usize {
        2 * channels * self.thresholds.len() * 4 + 4
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

impl FeatureManager for ContactManager {
    fn name(&self) -> &'static str {
        "contact"
    }

    fn create_edge_cache(&self, g: &dyn EdgeGraph, n1: NodeId, n2: NodeId) -> Result<EdgeCache> {
        let boundary = g.boundary(n1, n2).ok_or(FeatureError::MissingEdge(n1, n2))?;
        let ext1 = g.extent(n1).ok_or(FeatureError::MissingNode(n1))?;
        let ext2 = g.extent(n2).ok_or(FeatureError::MissingNode(n2))?;
        let kind = self.kind();
        let probs = g
            .probabilities(kind)
            .ok_or(FeatureError::MissingProbabilities(kind))?;

        let mut totals = Array3::<f64>::zeros((probs.ncols(), self.thresholds.len(), 3));
        for (c, channel) in probs.columns().into_iter().enumerate() {
            for (t, &threshold) in self.thresholds.iter().enumerate() {
                for (slot, voxels) in [boundary, ext1.as_slice(), ext2.as_slice()]
                    .into_iter()
                    .enumerate()
                {
                    let dark = voxels.iter().filter(|&&v| channel[v] < threshold).count();
                    totals[[c, t, slot]] = dark as f64;
                }
            }
        }
        Ok(totals.into_dyn())
    }

    fn update_edge_cache(&self, dst: &mut EdgeCache, src: &EdgeCache) -> Result<()> {
        if dst.shape() != src.shape() {
            return Err(FeatureError::ShapeMismatch {
                dst: dst.shape().to_vec(),
                src: src.shape().to_vec(),
            });
        }
        *dst += src;
        Ok(())
    }

    fn merge_edge_caches(&self, dst: &mut EdgeCache, src: &EdgeCache, shared: EdgeEnd) -> Result<()> {
        if dst.ndim() != 3 || dst.shape()[2] != 3 {
            return Err(FeatureError::CacheShape {
                expected: CACHE_LAYOUT,
                actual: dst.shape().to_vec(),
            });
        }
        // Both caches counted the neighbour's voxels; keep one copy.
        let slot = match shared {
            EdgeEnd::First => 1,
            EdgeEnd::Second => 2,
        };
        let neighbour = dst.index_axis(Axis(2), slot).to_owned();
        self.update_edge_cache(dst, src)?;
        dst.index_axis_mut(Axis(2), slot).assign(&neighbour);
        Ok(())
    }

    fn compute_edge_features(
        &self,
        g: &dyn EdgeGraph,
        n1: NodeId,
        n2: NodeId,
        cache: Option<&EdgeCache>,
    ) -> Result<FeatureVector> {
        let boundlen = g.boundary(n1, n2).ok_or(FeatureError::MissingEdge(n1, n2))?.len() as f64;
        let size1 = g.size(n1).ok_or(FeatureError::MissingNode(n1))? as f64;
        let size2 = g.size(n2).ok_or(FeatureError::MissingNode(n2))? as f64;
        let volume_ratio_1 = boundlen / size1;
        let volume_ratio_2 = boundlen / size2;

        let created;
        let cache = match cache.or_else(|| g.edge_cache(n1, n2)) {
            Some(cache) => cache,
            None => {
                created = self.create_edge_cache(g, n1, n2)?;
                &created
            }
        };
        let counts = cache
            .view()
            .into_dimensionality::<Ix3>()
            .ok()
            .filter(|c| c.dim().2 == 3)
            .ok_or_else(|| FeatureError::CacheShape {
                expected: CACHE_LAYOUT,
                actual: cache.shape().to_vec(),
            })?;

        let (channels, thresholds, _) = counts.dim();
        let mut contact = Array3::<f64>::zeros((channels, thresholds, 4));
        for c in 0..channels {
            for t in 0..thresholds {
                let edge = counts[[c, t, 0]];
                let r1 = ratio(edge, counts[[c, t, 1]]);
                let r2 = ratio(edge, counts[[c, t, 2]]);
                contact[[c, t, 0]] = r1;
                contact[[c, t, 1]] = r2;
                contact[[c, t, 2]] = ratio(r1, volume_ratio_1);
                contact[[c, t, 3]] = ratio(r2, volume_ratio_2);
            }
        }

        let raw: Vec<f64> = contact.iter().copied().collect();
        let mut features = Vec::with_capacity(raw.len() * 2 + 4);
        features.extend_from_slice(&raw);
        features.extend(raw.iter().map(|r| r.ln()));
        features.push(volume_ratio_1.ln());
        features.push(volume_ratio_2.ln());
        features.push(volume_ratio_1);
        features.push(volume_ratio_2);
        Ok(Array1::from(features))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::testing::MapGraph;
    use assert_matches::assert_matches;
    use ndarray::{ArrayD, IxDyn};

    // a a c
    // b b c
    fn split_graph() -> MapGraph {
        MapGraph::from_grid(&[&[1, 1, 3], &[2, 2, 3]])
            .with_probabilities(&[0.05, 0.3, 0.95, 0.6, 0.2, 0.95])
    }

    fn merged_graph() -> MapGraph {
        let mut g = MapGraph::from_grid(&[&[4, 4, 3], &[4, 4, 3]])
            .with_probabilities(&[0.05, 0.3, 0.95, 0.6, 0.2, 0.95]);
        let _ = g.fragments.insert(4, vec![1, 2]);
        g
    }

    #[test]
    fn cache_counts_dark_voxels() {
        let g = split_graph();
        let manager = ContactManager::default();
        let cache = manager.create_edge_cache(&g, 1, 3).unwrap();
        assert_eq!(cache.shape(), &[1, 3, 3]);
        // boundary of (1, 3) is voxels 1 (0.3) and 2 (0.95)
        assert_eq!(cache[[0, 0, 0].as_slice()], 0.0);
        assert_eq!(cache[[0, 1, 0].as_slice()], 1.0);
        assert_eq!(cache[[0, 2, 0].as_slice()], 1.0);
        // node 1 holds 0.05 and 0.3
        assert_eq!(cache[[0, 0, 1].as_slice()], 1.0);
        assert_eq!(cache[[0, 1, 1].as_slice()], 2.0);
        // node 3 is never dark
        assert_eq!(cache[[0, 2, 2].as_slice()], 0.0);
    }

    #[test]
    fn feature_vector_layout() {
        let g = split_graph();
        let manager = ContactManager::default();
        let features = manager.compute_edge_features(&g, 1, 3, None).unwrap();
        assert_eq!(features.len(), manager.feature_len(1));
        assert_eq!(features.len(), 28);

        // boundary 2 voxels, node sizes 2 and 2
        assert!((features[26] - 1.0).abs() < 1e-12);
        assert!((features[27] - 1.0).abs() < 1e-12);
        assert!((features[24] - 0.0).abs() < 1e-12);

        // threshold 0.5: edge 1, n1 2, n2 0
        assert!((features[4] - 0.5).abs() < 1e-12);
        assert_eq!(features[5], 0.0);
        // zero ratios pass through as -inf logarithms
        assert_eq!(features[12 + 5], f64::NEG_INFINITY);
    }

    #[test]
    fn stored_cache_is_used_when_present() {
        let mut g = split_graph();
        let manager = ContactManager::default();
        let mut cache = manager.create_edge_cache(&g, 1, 3).unwrap();
        cache.fill(1.0);
        let _ = g.caches.insert((1, 3), cache);
        let features = manager.compute_edge_features(&g, 1, 3, None).unwrap();
        assert!((features[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn merged_caches_match_fresh_cache() {
        let manager = ContactManager::default();
        let split = split_graph();
        let mut combined = manager.create_edge_cache(&split, 1, 3).unwrap();
        let other = manager.create_edge_cache(&split, 2, 3).unwrap();
        manager.update_edge_cache(&mut combined, &other).unwrap();

        let merged = merged_graph();
        let fresh = manager.create_edge_cache(&merged, 4, 3).unwrap();
        assert_eq!(combined, fresh);

        let from_combined = manager
            .compute_edge_features(&merged, 4, 3, Some(&combined))
            .unwrap();
        let from_raw = manager.compute_edge_features(&merged, 4, 3, None).unwrap();
        assert_eq!(from_combined.len(), from_raw.len());
        for (a, b) in from_combined.iter().zip(from_raw.iter()) {
            assert!(a == b || (a - b).abs() < 1e-12, "{a} != {b}");
        }
    }

    #[test]
    fn merging_counts_shared_neighbour_once() {
        // node 3 has a dark voxel, so summing both caches would count it twice
        let probs = [0.05, 0.3, 0.05, 0.6, 0.2, 0.05];
        let split = MapGraph::from_grid(&[&[1, 1, 3], &[2, 2, 3]]).with_probabilities(&probs);
        let mut merged =
            MapGraph::from_grid(&[&[4, 4, 3], &[4, 4, 3]]).with_probabilities(&probs);
        let _ = merged.fragments.insert(4, vec![1, 2]);
        let manager = ContactManager::default();

        let mut combined = manager.create_edge_cache(&split, 1, 3).unwrap();
        let other = manager.create_edge_cache(&split, 2, 3).unwrap();
        manager
            .merge_edge_caches(&mut combined, &other, EdgeEnd::Second)
            .unwrap();
        assert_eq!(combined, manager.create_edge_cache(&merged, 4, 3).unwrap());

        let mut combined = manager.create_edge_cache(&split, 3, 1).unwrap();
        let other = manager.create_edge_cache(&split, 3, 2).unwrap();
        manager
            .merge_edge_caches(&mut combined, &other, EdgeEnd::First)
            .unwrap();
        assert_eq!(combined, manager.create_edge_cache(&merged, 3, 4).unwrap());
    }

    #[test]
    fn merge_rejects_foreign_layout() {
        let manager = ContactManager::default();
        let mut dst = ArrayD::<f64>::zeros(IxDyn(&[4]));
        let src = ArrayD::<f64>::zeros(IxDyn(&[4]));
        let err = manager
            .merge_edge_caches(&mut dst, &src, EdgeEnd::First)
            .unwrap_err();
        assert_matches!(err, FeatureError::CacheShape { .. });
    }

    #[test]
    fn update_rejects_shape_mismatch() {
        let manager = ContactManager::default();
        let mut dst = ArrayD::<f64>::zeros(IxDyn(&[1, 3, 3]));
        let src = ArrayD::<f64>::zeros(IxDyn(&[2, 3, 3]));
        let err = manager.update_edge_cache(&mut dst, &src).unwrap_err();
        assert_matches!(err, FeatureError::ShapeMismatch { .. });
    }

    #[test]
    fn foreign_cache_layout_is_rejected() {
        let g = split_graph();
        let manager = ContactManager::default();
        let bogus = ArrayD::<f64>::zeros(IxDyn(&[0]));
        let err = manager
            .compute_edge_features(&g, 1, 3, Some(&bogus))
            .unwrap_err();
        assert_matches!(err, FeatureError::CacheShape { .. });
    }

    #[test]
    fn non_adjacent_nodes_fail() {
        let g = MapGraph::from_grid(&[&[1, 2, 3]]).with_probabilities(&[0.1, 0.1, 0.1]);
        let manager = ContactManager::default();
        let err = manager.compute_edge_features(&g, 1, 3, None).unwrap_err();
        assert_matches!(err, FeatureError::MissingEdge(1, 3));
    }

    #[test]
    fn oriented_manager_needs_oriented_map() {
        let g = split_graph();
        let manager = ContactManager::new(vec![0.5], true);
        let err = manager.create_edge_cache(&g, 1, 3).unwrap_err();
        assert_matches!(err, FeatureError::MissingProbabilities(ProbabilityKind::Oriented));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn cache() -> impl Strategy<Value = EdgeCache> {
            proptest::collection::vec(0u16..500, 12).prop_map(|v| {
                let values = v.into_iter().map(f64::from).collect();
                ArrayD::from_shape_vec(IxDyn(&[2, 2, 3]), values).unwrap()
            })
        }

        proptest! {
            #[test]
            fn update_is_commutative(a in cache(), b in cache()) {
                let manager = ContactManager::default();
                let mut ab = a.clone();
                manager.update_edge_cache(&mut ab, &b).unwrap();
                let mut ba = b.clone();
                manager.update_edge_cache(&mut ba, &a).unwrap();
                prop_assert_eq!(ab, ba);
            }

            #[test]
            fn update_is_associative(a in cache(), b in cache(), c in cache()) {
                let manager = ContactManager::default();
                let mut left = a.clone();
                manager.update_edge_cache(&mut left, &b).unwrap();
                manager.update_edge_cache(&mut left, &c).unwrap();

                let mut bc = b.clone();
                manager.update_edge_cache(&mut bc, &c).unwrap();
                let mut right = a.clone();
                manager.update_edge_cache(&mut right, &bc).unwrap();
                prop_assert_eq!(left, right);
            }
        }
    }
}
