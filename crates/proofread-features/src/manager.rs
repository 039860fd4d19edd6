//! The feature manager contract.

use std::fmt::Debug;

use proofread_core::NodeId;

use crate::errors::Result;
use crate::graph::{EdgeCache, EdgeEnd, EdgeGraph, FeatureVector};

/// Computes edge feature vectors, backed by an additive per-edge cache.
///
/// The graph calls [`create_edge_cache`](Self::create_edge_cache) once per
/// edge at build time and [`merge_edge_caches`](Self::merge_edge_caches)
/// when two edges collapse into one after a merge. `update_edge_cache` must
/// be associative and commutative so the order of merges never matters.
pub trait FeatureManager: Send + Sync + Debug {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Build the cache for edge `(n1, n2)` from raw graph data.
    fn create_edge_cache(&self, g: &dyn EdgeGraph, n1: NodeId, n2: NodeId) -> Result<EdgeCache>;

    /// Fold `src` into `dst` in place.
    fn update_edge_cache(&self, dst: &mut EdgeCache, src: &EdgeCache) -> Result<()>;

    /// Collapse the caches of `(a, nb)` and `(b, nb)` into the cache of
    /// `(a ∪ b, nb)`. Both caches hold the common neighbour `nb` at the
    /// `shared` end.
    ///
    /// Managers whose caches carry per-endpoint statistics override this so
    /// the neighbour is counted once; the default is
    /// [`update_edge_cache`](Self::update_edge_cache).
    fn merge_edge_caches(&self, dst: &mut EdgeCache, src: &EdgeCache, shared: EdgeEnd) -> Result<()> {
        let _ = shared;
        self.update_edge_cache(dst, src)
    }

    /// Feature vector for edge `(n1, n2)`.
    ///
    /// `cache` overrides the graph's stored cache; when both are absent the
    /// cache is created on the fly.
    fn compute_edge_features(
        &self,
        g: &dyn EdgeGraph,
        n1: NodeId,
        n2: NodeId,
        cache: Option<&EdgeCache>,
    ) -> Result<FeatureVector>;
}
