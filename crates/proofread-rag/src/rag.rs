//! The region adjacency graph.
//!
//! Nodes are label values of the input volume plus one boundary sentinel
//! (`max label + 1`) standing for everything outside the volume. Edges join
//! face-adjacent labels and carry their contact voxels and, when a feature
//! manager is installed, an additive feature cache. Merges create fresh
//! node ids and are recorded in a [`MergeTree`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use ndarray::{Array2, ArrayView2, ArrayViewD};
use proofread_core::constants::EXPLICIT_MERGE_WEIGHT;
use proofread_core::{IdRange, NodeId};
use proofread_features::{
    EdgeCache, EdgeEnd, EdgeGraph, FeatureManager, FeatureVector, ProbabilityKind,
};
use tracing::{debug, info, trace, warn};

use crate::adjacency::face_adjacency;
use crate::errors::{RagError, Result};
use crate::extents::{extents, SparseLol};
use crate::priority::{BoundaryMean, MergePriority};
use crate::queue::{MergeQueue, QueueItem};
use crate::tree::MergeTree;

#[derive(Clone, Debug, Default)]
struct NodeData {
    size: usize,
    fragments: BTreeSet<NodeId>,
    exclusions: BTreeSet<usize>,
}

#[derive(Clone, Debug)]
struct EdgeData {
    boundary: Vec<usize>,
    /// Node the cache was built from (`n1` of `create_edge_cache`).
    anchor: NodeId,
    cache: Option<EdgeCache>,
}

fn edge_key(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    (a.min(b), a.max(b))
}

/// Configures and builds a [`Rag`].
pub struct RagBuilder<'a> {
    labels: ArrayViewD<'a, NodeId>,
    probabilities: Option<Array2<f64>>,
    oriented: Option<Array2<f64>>,
    normalize: bool,
    feature_manager: Option<Arc<dyn FeatureManager>>,
    merge_priority: Option<Arc<dyn MergePriority>>,
}

impl RagBuilder<'_> {
    /// Non-oriented probability map, `(voxels, channels)` in C order.
    pub fn probabilities(mut self, probabilities: Array2<f64>) -> Self {
        self.probabilities = Some(probabilities);
        self
    }

    /// Oriented probability map, `(voxels, orientations)` in C order.
    pub fn oriented_probabilities(mut self, probabilities: Array2<f64>) -> Self {
        self.oriented = Some(probabilities);
        self
    }

    /// Divide each map by its maximum.
    pub fn normalize_probabilities(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Manager whose edge caches the graph maintains.
    pub fn feature_manager(mut self, manager: Arc<dyn FeatureManager>) -> Self {
        self.feature_manager = Some(manager);
        self
    }

    /// Initial merge priority; [`BoundaryMean`] when unset.
    pub fn merge_priority(mut self, priority: Arc<dyn MergePriority>) -> Self {
        self.merge_priority = Some(priority);
        self
    }

    /// Scan the volume, add the boundary sentinel and fill the merge queue.
    pub fn build(self) -> Result<Rag> {
        let flat: Vec<NodeId> = self.labels.iter().copied().collect();
        let voxels = flat.len();
        let probabilities = prepare("non-oriented", self.probabilities, voxels, self.normalize)?;
        let oriented = prepare("oriented", self.oriented, voxels, self.normalize)?;

        let index = extents(&flat, None)?;
        let adjacency = face_adjacency(&self.labels);
        let boundary_body = flat.iter().max().map_or(0, |&max| max + 1);
        let labels: BTreeSet<NodeId> = flat.iter().copied().collect();

        let mut nodes: BTreeMap<NodeId, NodeData> = labels
            .iter()
            .map(|&label| {
                let data = NodeData {
                    size: index.get(label).len(),
                    fragments: BTreeSet::from([label]),
                    exclusions: BTreeSet::new(),
                };
                (label, data)
            })
            .collect();
        let _ = nodes.insert(boundary_body, NodeData::default());

        let mut neighbors: BTreeMap<NodeId, BTreeSet<NodeId>> =
            nodes.keys().map(|&n| (n, BTreeSet::new())).collect();
        let mut edges = BTreeMap::new();
        let border = adjacency
            .border
            .into_iter()
            .map(|(node, voxels)| ((node, boundary_body), voxels));
        for ((a, b), boundary) in adjacency.surfaces.into_iter().chain(border) {
            let _ = neighbors.entry(a).or_default().insert(b);
            let _ = neighbors.entry(b).or_default().insert(a);
            let edge = EdgeData {
                boundary,
                anchor: a,
                cache: None,
            };
            let _ = edges.insert((a, b), edge);
        }

        let mut rag = Rag {
            shape: self.labels.shape().to_vec(),
            extents: Arc::new(index),
            probabilities: probabilities.map(Arc::new),
            oriented: oriented.map(Arc::new),
            nodes,
            adjacency: neighbors,
            edges,
            boundary_body,
            next_id: boundary_body + 1,
            id_limit: None,
            tree: MergeTree::new(labels),
            queue: MergeQueue::default(),
            feature_manager: self.feature_manager,
            merge_priority: self
                .merge_priority
                .unwrap_or_else(|| Arc::new(BoundaryMean) as Arc<dyn MergePriority>),
        };
        rag.build_edge_caches()?;
        rag.rebuild_merge_queue();
        debug!(
            nodes = rag.node_count(),
            edges = rag.edges.len(),
            boundary_body,
            "built region adjacency graph"
        );
        Ok(rag)
    }
}

fn prepare(
    map: &'static str,
    probabilities: Option<Array2<f64>>,
    voxels: usize,
    normalize: bool,
) -> Result<Option<Array2<f64>>> {
    let Some(mut probs) = probabilities else {
        return Ok(None);
    };
    if probs.nrows() != voxels {
        return Err(RagError::ProbabilityShape {
            map,
            rows: probs.nrows(),
            voxels,
        });
    }
    if normalize {
        let max = probs
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(0.0_f64, f64::max);
        if max > 0.0 {
            probs.mapv_inplace(|v| v / max);
        }
    }
    Ok(Some(probs))
}

/// Region adjacency graph with a merge tree and a priority queue.
///
/// Cloning is cheap for the voxel-level data (shared behind `Arc`) and
/// copies the graph structure, so a pristine graph can be kept as a
/// snapshot and cloned to restart from it.
#[derive(Clone)]
pub struct Rag {
    shape: Vec<usize>,
    extents: Arc<SparseLol>,
    probabilities: Option<Arc<Array2<f64>>>,
    oriented: Option<Arc<Array2<f64>>>,
    nodes: BTreeMap<NodeId, NodeData>,
    adjacency: BTreeMap<NodeId, BTreeSet<NodeId>>,
    edges: BTreeMap<(NodeId, NodeId), EdgeData>,
    boundary_body: NodeId,
    next_id: NodeId,
    id_limit: Option<NodeId>,
    tree: MergeTree,
    queue: MergeQueue,
    feature_manager: Option<Arc<dyn FeatureManager>>,
    merge_priority: Arc<dyn MergePriority>,
}

impl fmt::Debug for Rag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rag")
            .field("shape", &self.shape)
            .field("nodes", &self.node_count())
            .field("edges", &self.edges.len())
            .field("boundary_body", &self.boundary_body)
            .field("next_id", &self.next_id)
            .field("queue", &self.queue.len())
            .finish_non_exhaustive()
    }
}

impl Rag {
    /// Start building a graph from a label volume.
    pub fn builder(labels: ArrayViewD<'_, NodeId>) -> RagBuilder<'_> {
        RagBuilder {
            labels,
            probabilities: None,
            oriented: None,
            normalize: false,
            feature_manager: None,
            merge_priority: None,
        }
    }

    // ── Structure ───────────────────────────────────────────────────

    /// Shape of the label volume.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Id of the "outside the volume" sentinel.
    pub fn boundary_body(&self) -> NodeId {
        self.boundary_body
    }

    /// Whether `node` is currently in the graph (the sentinel included).
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Current nodes, ascending, without the sentinel.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .keys()
            .copied()
            .filter(move |&n| n != self.boundary_body)
    }

    /// Current segments, without the sentinel.
    pub fn node_count(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    /// Original fragment ids, ascending. Never includes the sentinel.
    pub fn fragments(&self) -> Vec<NodeId> {
        self.tree.leaves().collect()
    }

    /// Number of original fragments.
    pub fn fragment_count(&self) -> usize {
        self.tree.leaves().count()
    }

    /// Whether `id` was a label of the input volume.
    pub fn is_fragment(&self, id: NodeId) -> bool {
        self.tree.is_leaf(id)
    }

    /// Neighbours of a node, ascending (the sentinel sorts last).
    pub fn neighbors(&self, node: NodeId) -> Vec<NodeId> {
        self.adjacency
            .get(&node)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Whether `a` and `b` currently touch.
    pub fn has_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.edges.contains_key(&edge_key(a, b))
    }

    /// Fragments merged into `node`.
    pub fn fragments_of(&self, node: NodeId) -> Option<&BTreeSet<NodeId>> {
        self.nodes.get(&node).map(|d| &d.fragments)
    }

    /// Current segment containing `node`.
    pub fn highest_ancestor(&self, node: NodeId) -> NodeId {
        self.tree.highest_ancestor(node)
    }

    /// Every merge so far.
    pub fn tree(&self) -> &MergeTree {
        &self.tree
    }

    /// Queued merge candidates, stale entries included.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// The manager the graph was built with.
    pub fn installed_feature_manager(&self) -> Option<&Arc<dyn FeatureManager>> {
        self.feature_manager.as_ref()
    }

    // ── Exclusions ──────────────────────────────────────────────────

    /// Exclusion tokens carried by `node`.
    pub fn exclusions(&self, node: NodeId) -> Option<&BTreeSet<usize>> {
        self.nodes.get(&node).map(|d| &d.exclusions)
    }

    /// Tag `node` with exclusion `token`. Nodes sharing a token are never
    /// merged by [`agglomerate`](Self::agglomerate).
    pub fn add_exclusion(&mut self, node: NodeId, token: usize) -> Result<()> {
        let data = self.nodes.get_mut(&node).ok_or(RagError::UnknownNode(node))?;
        let _ = data.exclusions.insert(token);
        Ok(())
    }

    fn shares_exclusion(&self, a: NodeId, b: NodeId) -> bool {
        match (self.exclusions(a), self.exclusions(b)) {
            (Some(x), Some(y)) => !x.is_disjoint(y),
            _ => false,
        }
    }

    // ── Ids ─────────────────────────────────────────────────────────

    /// Issue all further merge ids from `range`.
    pub fn reserve_ids(&mut self, range: IdRange) -> Result<()> {
        if range.begin <= self.boundary_body {
            return Err(RagError::IdRangeOverlap {
                range,
                boundary: self.boundary_body,
            });
        }
        debug!(%range, "merge ids reserved");
        self.next_id = range.begin;
        self.id_limit = Some(range.end);
        Ok(())
    }

    fn allocate_id(&mut self) -> Result<NodeId> {
        if let Some(limit) = self.id_limit {
            if self.next_id >= limit {
                return Err(RagError::IdsExhausted(limit));
            }
        }
        let id = self.next_id;
        self.next_id += 1;
        Ok(id)
    }

    // ── Merging ─────────────────────────────────────────────────────

    /// Merge two adjacent nodes into a fresh node and return its id.
    pub fn merge_nodes(&mut self, n1: NodeId, n2: NodeId) -> Result<NodeId> {
        self.merge_with_weight(n1, n2, EXPLICIT_MERGE_WEIGHT)
    }

    fn merge_with_weight(&mut self, n1: NodeId, n2: NodeId, weight: f64) -> Result<NodeId> {
        for n in [n1, n2] {
            if n == self.boundary_body {
                return Err(RagError::BoundaryNode(n));
            }
            if !self.contains(n) {
                return Err(RagError::UnknownNode(n));
            }
        }
        if n1 == n2 {
            return Err(RagError::SelfMerge(n1));
        }
        if !self.has_edge(n1, n2) {
            return Err(RagError::NotAdjacent(n1, n2));
        }
        let merged = self.allocate_id()?;

        let d1 = self.nodes.remove(&n1).unwrap_or_default();
        let d2 = self.nodes.remove(&n2).unwrap_or_default();
        let data = NodeData {
            size: d1.size + d2.size,
            fragments: d1.fragments.union(&d2.fragments).copied().collect(),
            exclusions: d1.exclusions.union(&d2.exclusions).copied().collect(),
        };
        let nb1 = self.adjacency.remove(&n1).unwrap_or_default();
        let nb2 = self.adjacency.remove(&n2).unwrap_or_default();
        let _ = self.edges.remove(&edge_key(n1, n2));

        let around: BTreeSet<NodeId> = nb1
            .union(&nb2)
            .copied()
            .filter(|&n| n != n1 && n != n2)
            .collect();
        let mut rebuild = Vec::new();
        for &nb in &around {
            if let Some(set) = self.adjacency.get_mut(&nb) {
                let _ = set.remove(&n1);
                let _ = set.remove(&n2);
                let _ = set.insert(merged);
            }
            let e1 = self.edges.remove(&edge_key(n1, nb));
            let e2 = self.edges.remove(&edge_key(n2, nb));
            let edge = match (e1, e2) {
                (Some(mut e), None) | (None, Some(mut e)) => {
                    // counts for the merged side cover one half only
                    e.anchor = merged;
                    e.cache = None;
                    e
                }
                (Some(a), Some(b)) => self.combine_edges(a, b, nb, merged),
                (None, None) => continue,
            };
            if edge.cache.is_none() && nb != self.boundary_body && self.feature_manager.is_some() {
                rebuild.push(nb);
            }
            let _ = self.edges.insert(edge_key(merged, nb), edge);
        }

        let _ = self.nodes.insert(merged, data);
        let _ = self.adjacency.insert(merged, around.clone());
        self.tree.record_merge(n1, n2, merged, weight);
        trace!(n1, n2, merged, weight, "merged nodes");

        if let Some(manager) = self.feature_manager.clone() {
            for nb in rebuild {
                let cache = manager.create_edge_cache(&*self, merged, nb)?;
                if let Some(edge) = self.edges.get_mut(&edge_key(merged, nb)) {
                    edge.anchor = merged;
                    edge.cache = Some(cache);
                }
            }
        }

        let policy = Arc::clone(&self.merge_priority);
        let items: Vec<QueueItem> = around
            .iter()
            .filter(|&&nb| nb != self.boundary_body)
            .map(|&nb| {
                let (a, b) = self.oriented(merged, nb);
                QueueItem {
                    priority: policy.priority(self, a, b),
                    n1: a,
                    n2: b,
                }
            })
            .collect();
        for item in items {
            self.queue.push(item);
        }
        Ok(merged)
    }

    /// Collapse the edges `(n1, nb)` and `(n2, nb)` into one edge of `merged`.
    ///
    /// The caches are merged when both were built from the same side and
    /// the two contact surfaces are disjoint; otherwise the edge is left
    /// without a cache and rebuilt from raw data.
    fn combine_edges(&self, a: EdgeData, b: EdgeData, nb: NodeId, merged: NodeId) -> EdgeData {
        let overlapping = a.boundary.iter().any(|v| b.boundary.binary_search(v).is_ok());
        let mut boundary = a.boundary;
        boundary.extend(b.boundary);
        boundary.sort_unstable();
        boundary.dedup();

        let a_outer = a.anchor == nb;
        let same_side = a_outer == (b.anchor == nb);
        let shared = if a_outer { EdgeEnd::First } else { EdgeEnd::Second };
        let cache = match (a.cache, b.cache, &self.feature_manager) {
            (Some(mut dst), Some(src), Some(manager)) if same_side && !overlapping => {
                match manager.merge_edge_caches(&mut dst, &src, shared) {
                    Ok(()) => Some(dst),
                    Err(e) => {
                        warn!(nb, merged, error = %e, "edge cache update failed, rebuilding");
                        None
                    }
                }
            }
            _ => None,
        };
        let anchor = if cache.is_some() && a_outer { nb } else { merged };
        EdgeData {
            boundary,
            anchor,
            cache,
        }
    }

    fn build_edge_caches(&mut self) -> Result<()> {
        let Some(manager) = self.feature_manager.clone() else {
            return Ok(());
        };
        let keys: Vec<(NodeId, NodeId)> = self
            .edges
            .keys()
            .copied()
            .filter(|&(_, b)| b != self.boundary_body)
            .collect();
        for (a, b) in keys {
            let cache = manager.create_edge_cache(&*self, a, b)?;
            if let Some(edge) = self.edges.get_mut(&(a, b)) {
                edge.cache = Some(cache);
            }
        }
        Ok(())
    }

    /// Edge endpoints in cache orientation.
    fn oriented(&self, a: NodeId, b: NodeId) -> (NodeId, NodeId) {
        match self.edges.get(&edge_key(a, b)) {
            Some(edge) if edge.anchor == b => (b, a),
            Some(edge) if edge.anchor == a => (a, b),
            _ => edge_key(a, b),
        }
    }

    // ── Separation ──────────────────────────────────────────────────

    /// Resolve two fragments to their current segments, refusing when they
    /// are already in the same one.
    pub fn separate_fragments(&self, f0: NodeId, f1: NodeId) -> Result<(NodeId, NodeId)> {
        for f in [f0, f1] {
            if !self.is_fragment(f) {
                return Err(RagError::UnknownFragment(f));
            }
        }
        let s0 = self.highest_ancestor(f0);
        let s1 = self.highest_ancestor(f1);
        if s0 == s1 {
            return Err(RagError::SameSegment {
                f0,
                f1,
                segment: s0,
            });
        }
        Ok((s0, s1))
    }

    // ── Features ────────────────────────────────────────────────────

    /// Features of `(n1, n2)` under any manager. Stored caches are used only
    /// when `manager` is the instance this graph was built with.
    pub fn features_with(
        &self,
        manager: &dyn FeatureManager,
        n1: NodeId,
        n2: NodeId,
    ) -> proofread_features::Result<FeatureVector> {
        let installed = self
            .feature_manager
            .as_ref()
            .is_some_and(|m| std::ptr::addr_eq(Arc::as_ptr(m), std::ptr::from_ref(manager)));
        if installed {
            manager.compute_edge_features(self, n1, n2, None)
        } else {
            manager.compute_edge_features(&Uncached(self), n1, n2, None)
        }
    }

    /// Features of `(n1, n2)` under the installed manager.
    pub fn edge_features(&self, n1: NodeId, n2: NodeId) -> Result<FeatureVector> {
        let manager = self
            .feature_manager
            .as_ref()
            .ok_or(RagError::NoFeatureManager)?;
        Ok(manager.compute_edge_features(self, n1, n2, None)?)
    }

    // ── Agglomeration ───────────────────────────────────────────────

    /// Replace the priority function. Queued scores are kept until
    /// [`rebuild_merge_queue`](Self::rebuild_merge_queue).
    pub fn set_merge_priority_function(&mut self, priority: Arc<dyn MergePriority>) {
        self.merge_priority = priority;
    }

    /// Re-score every edge under the current priority function.
    pub fn rebuild_merge_queue(&mut self) {
        self.queue.clear();
        let policy = Arc::clone(&self.merge_priority);
        let items: Vec<QueueItem> = self
            .edges
            .iter()
            .filter(|((_, b), _)| *b != self.boundary_body)
            .map(|(&(a, b), edge)| {
                let (n1, n2) = if edge.anchor == b { (b, a) } else { (a, b) };
                QueueItem {
                    priority: policy.priority(self, n1, n2),
                    n1,
                    n2,
                }
            })
            .collect();
        for item in items {
            self.queue.push(item);
        }
        debug!(candidates = self.queue.len(), "merge queue rebuilt");
    }

    /// Depth-first preorder of `nodes` over the subgraph they induce,
    /// starting at the first one and visiting neighbours in ascending order.
    ///
    /// Every node after the first is adjacent to one before it, so merging
    /// along the order only ever joins adjacent nodes. Nodes not reachable
    /// from the first are left out.
    pub fn merge_order(&self, nodes: &[NodeId]) -> Vec<NodeId> {
        let Some(&start) = nodes.first() else {
            return Vec::new();
        };
        let members: BTreeSet<NodeId> = nodes.iter().copied().collect();
        let mut visited = BTreeSet::new();
        let mut order = Vec::with_capacity(members.len());
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            order.push(node);
            for neighbor in self.neighbors(node).into_iter().rev() {
                if members.contains(&neighbor) && !visited.contains(&neighbor) {
                    stack.push(neighbor);
                }
            }
        }
        if order.len() < members.len() {
            let unreachable: Vec<NodeId> = members.difference(&visited).copied().collect();
            debug!(?unreachable, start, "nodes not connected to the merge; skipped");
        }
        order
    }

    /// Re-apply recorded merges. Each entry lists nodes (typically original
    /// fragments) that belong in one segment; they are resolved to their
    /// current ancestors and joined along [`merge_order`](Self::merge_order).
    /// Returns the number of merges performed.
    pub fn replay_merge_history(&mut self, history: &[Vec<NodeId>]) -> Result<usize> {
        let mut replayed = 0;
        for group in history {
            let mut segments: Vec<NodeId> = Vec::with_capacity(group.len());
            for &node in group {
                let segment = self.highest_ancestor(node);
                if !segments.contains(&segment) {
                    segments.push(segment);
                }
            }
            let mut walk = self.merge_order(&segments).into_iter();
            let Some(mut merged) = walk.next() else {
                continue;
            };
            if segments.len() == 1 {
                debug!(segment = merged, "history entry already merged");
            }
            for next in walk {
                if self.shares_exclusion(merged, next) {
                    warn!(s0 = merged, s1 = next, "replaying merge across a separation constraint");
                }
                merged = self.merge_nodes(merged, next)?;
                replayed += 1;
            }
        }
        Ok(replayed)
    }

    fn is_live(&self, item: &QueueItem) -> bool {
        self.contains(item.n1) && self.contains(item.n2) && self.has_edge(item.n1, item.n2)
    }

    /// Merge queued edges while their priority is below `threshold`.
    /// Returns the number of merges.
    pub fn agglomerate(&mut self, threshold: f64) -> Result<usize> {
        let mut merges = 0;
        while let Some(item) = self.queue.pop() {
            if item.priority.is_nan() || item.priority >= threshold {
                self.queue.push(item);
                break;
            }
            if !self.is_live(&item) {
                continue;
            }
            if self.shares_exclusion(item.n1, item.n2) {
                trace!(n1 = item.n1, n2 = item.n2, "merge blocked by exclusion");
                continue;
            }
            let _ = self.merge_with_weight(item.n1, item.n2, item.priority)?;
            merges += 1;
        }
        info!(merges, threshold, segments = self.node_count(), "agglomeration finished");
        Ok(merges)
    }

    /// Parallel fragment and segment lists for merges below `threshold`.
    pub fn fragment_segment_lut(&self, threshold: f64) -> (Vec<NodeId>, Vec<NodeId>) {
        self.tree.get_map(threshold).into_iter().unzip()
    }
}

impl EdgeGraph for Rag {
    fn size(&self, node: NodeId) -> Option<usize> {
        self.nodes.get(&node).map(|d| d.size)
    }

    fn extent(&self, node: NodeId) -> Option<Vec<usize>> {
        let data = self.nodes.get(&node)?;
        let mut voxels: Vec<usize> = data
            .fragments
            .iter()
            .flat_map(|&f| self.extents.get(f).iter().copied())
            .collect();
        voxels.sort_unstable();
        Some(voxels)
    }

    fn boundary(&self, n1: NodeId, n2: NodeId) -> Option<&[usize]> {
        self.edges
            .get(&edge_key(n1, n2))
            .map(|e| e.boundary.as_slice())
    }

    fn fragments(&self, node: NodeId) -> Option<Vec<NodeId>> {
        self.fragments_of(node).map(|f| f.iter().copied().collect())
    }

    fn probabilities(&self, kind: ProbabilityKind) -> Option<ArrayView2<'_, f64>> {
        let map = match kind {
            ProbabilityKind::NonOriented => self.probabilities.as_deref(),
            ProbabilityKind::Oriented => self.oriented.as_deref(),
        };
        map.map(Array2::view)
    }

    fn edge_cache(&self, n1: NodeId, n2: NodeId) -> Option<&EdgeCache> {
        self.edges
            .get(&edge_key(n1, n2))
            .filter(|e| e.anchor == n1)
            .and_then(|e| e.cache.as_ref())
    }
}

/// View of a graph that hides stored caches, for managers other than the
/// installed one.
struct Uncached<'a>(&'a Rag);

impl EdgeGraph for Uncached<'_> {
    fn size(&self, node: NodeId) -> Option<usize> {
        self.0.size(node)
    }

    fn extent(&self, node: NodeId) -> Option<Vec<usize>> {
        self.0.extent(node)
    }

    fn boundary(&self, n1: NodeId, n2: NodeId) -> Option<&[usize]> {
        self.0.boundary(n1, n2)
    }

    fn fragments(&self, node: NodeId) -> Option<Vec<NodeId>> {
        EdgeGraph::fragments(self.0, node)
    }

    fn probabilities(&self, kind: ProbabilityKind) -> Option<ArrayView2<'_, f64>> {
        self.0.probabilities(kind)
    }

    fn edge_cache(&self, _n1: NodeId, _n2: NodeId) -> Option<&EdgeCache> {
        None
    }
}
