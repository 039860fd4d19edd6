//! The solver session.
//!
//! A session owns two graphs: the pristine graph built at startup and a
//! working copy that proofreading edits. Every `merge` and `separate`
//! message becomes a labelled training example. A lookup-table request
//! rebuilds the working copy from the pristine one: fit a classifier on all
//! examples so far, use it as the merge priority, place one exclusion token
//! per separation, replay the explicit merges, then agglomerate.

use std::fmt;
use std::sync::Arc;

use proofread_core::constants::AGGLOMERATION_THRESHOLD;
use proofread_core::NodeId;
use proofread_features::FeatureManager;
use proofread_learn::{
    logistic_factory, stack_features, ClassifierFactory, ClassifierProbability, LogisticConfig,
};
use proofread_rag::{Rag, RagError};
use proofread_rpc::{
    ClientMessage, HttpIdService, IdService, RequestKind, SolverEndpoint, SolverMessage,
    TransportError,
};
use proofread_settings::ProofreadSettings;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::history::{MergeEvent, TrainingLog};

/// What the session is doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the next message.
    Idle,
    /// Applying an explicit merge.
    Merging,
    /// Recording separation constraints.
    Separating,
    /// Relearning and sending a lookup table.
    Responding,
    /// The listen loop has ended.
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Merging => "merging",
            Self::Separating => "separating",
            Self::Responding => "responding",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Interactive proofreading session over one region adjacency graph.
pub struct Solver {
    original: Rag,
    rag: Rag,
    feature_manager: Arc<dyn FeatureManager>,
    classifier_factory: ClassifierFactory,
    log: TrainingLog,
    state: SessionState,
}

impl fmt::Debug for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solver")
            .field("rag", &self.rag)
            .field("feature_manager", &self.feature_manager.name())
            .field("examples", &self.log.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Solver {
    /// Start a session on `rag`, which must have a feature manager
    /// installed. The graph is snapshotted as the replay base.
    pub fn new(rag: Rag, classifier_factory: ClassifierFactory) -> Result<Self> {
        let feature_manager = Arc::clone(
            rag.installed_feature_manager()
                .ok_or(RagError::NoFeatureManager)?,
        );
        info!(
            fragments = rag.fragment_count(),
            boundary_body = rag.boundary_body(),
            features = feature_manager.name(),
            "solver session created"
        );
        Ok(Self {
            original: rag.clone(),
            rag,
            feature_manager,
            classifier_factory,
            log: TrainingLog::new(),
            state: SessionState::Idle,
        })
    }

    /// Like [`new`](Self::new), but first reserve one id per fragment from
    /// `service` so that every segment id this session issues is globally
    /// unique.
    pub async fn with_id_service(
        mut rag: Rag,
        classifier_factory: ClassifierFactory,
        service: &dyn IdService,
    ) -> Result<Self> {
        let count = rag.fragment_count() as u64;
        let range = service.reserve(count).await?;
        rag.reserve_ids(range)?;
        info!(%range, "segment ids reserved");
        Self::new(rag, classifier_factory)
    }

    /// Configure a session from settings: logistic regression with the
    /// configured hyper-parameters, plus id reservation when an id service
    /// is configured.
    pub async fn from_settings(rag: Rag, settings: &ProofreadSettings) -> Result<Self> {
        settings.validate()?;
        let factory = logistic_factory(LogisticConfig {
            learning_rate: settings.classifier.learning_rate,
            epochs: settings.classifier.epochs,
            l2_penalty: settings.classifier.l2_penalty,
        });
        match &settings.id_service_url {
            Some(url) => {
                let service = HttpIdService::new(url.clone());
                Self::with_id_service(rag, factory, &service).await
            }
            None => Self::new(rag, factory),
        }
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// The working graph.
    pub fn rag(&self) -> &Rag {
        &self.rag
    }

    /// The graph as it was when the session started.
    pub fn original_rag(&self) -> &Rag {
        &self.original
    }

    /// Training examples gathered so far.
    pub fn log(&self) -> &TrainingLog {
        &self.log
    }

    /// What the session is doing.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Manager used for training features.
    pub fn feature_manager(&self) -> &Arc<dyn FeatureManager> {
        &self.feature_manager
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, "session state");
            self.state = next;
        }
    }

    // ── Learning ────────────────────────────────────────────────────

    /// Learn that `segments` belong together.
    ///
    /// Ids are resolved to their current segments and merged one edge at a
    /// time along a depth-first walk of the segments' adjacency, recording
    /// the features of each merged edge as a merge example. Segments not
    /// reachable from the first one are left alone.
    pub fn learn_merge(&mut self, segments: &[NodeId]) -> Result<()> {
        let boundary = self.rag.boundary_body();
        let mut resolved: Vec<NodeId> = Vec::with_capacity(segments.len());
        for &id in segments {
            let segment = self.rag.highest_ancestor(id);
            if segment == boundary {
                debug!(segment, "merge names the boundary; ignored");
                return Ok(());
            }
            if !self.rag.contains(segment) {
                warn!(id, "merge names an unknown segment; dropped");
                continue;
            }
            if !resolved.contains(&segment) {
                resolved.push(segment);
            }
        }
        let mut walk = self.rag.merge_order(&resolved).into_iter();
        let Some(mut s0) = walk.next() else {
            return Ok(());
        };
        let fragments = |rag: &Rag, node| -> Result<Vec<NodeId>> {
            let set = rag.fragments_of(node).ok_or(RagError::UnknownNode(node))?;
            Ok(set.iter().copied().collect())
        };
        for s1 in walk {
            let features = self.rag.features_with(&*self.feature_manager, s0, s1)?;
            let event = MergeEvent {
                segments: (s0, s1),
                fragments: (fragments(&self.rag, s0)?, fragments(&self.rag, s1)?),
            };
            let merged = self.rag.merge_nodes(s0, s1)?;
            self.log.record_merge(event, features);
            debug!(s0, s1, merged, "explicit merge");
            s0 = merged;
        }
        Ok(())
    }

    /// Learn that `fragment` must never share a segment with any of
    /// `separate_from` (all of its original neighbours when empty).
    ///
    /// Stops at the first pair naming the boundary, at the first pair whose
    /// fragments already share a segment, and at the first pair whose
    /// segments are not adjacent. Pairs before the stop are kept.
    pub fn learn_separation(&mut self, fragment: NodeId, separate_from: &[NodeId]) -> Result<()> {
        let candidates = if separate_from.is_empty() {
            self.original.neighbors(fragment)
        } else {
            separate_from.to_vec()
        };
        let boundary = self.rag.boundary_body();
        for other in candidates {
            if fragment == boundary || other == boundary {
                debug!(fragment, other, "separation names the boundary; stopping");
                return Ok(());
            }
            let (s0, s1) = match self.rag.separate_fragments(fragment, other) {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(fragment, other, error = %e, "cannot separate fragments");
                    return Ok(());
                }
            };
            let features = match self.rag.features_with(&*self.feature_manager, s0, s1) {
                Ok(features) => features,
                Err(e) => {
                    warn!(
                        fragment,
                        other,
                        segment = s0,
                        other_segment = s1,
                        error = %e,
                        "failed to split segments"
                    );
                    return Ok(());
                }
            };
            self.log.record_separation((fragment, other), features);
            debug!(fragment, other, s0, s1, "separation recorded");
        }
        Ok(())
    }

    /// Rebuild the working graph from the snapshot under a freshly trained
    /// merge policy, with every recorded separation and merge re-applied.
    pub fn relearn(&mut self) -> Result<()> {
        let mut classifier = (self.classifier_factory)();
        let examples = stack_features(self.log.features())?;
        classifier.fit(examples.view(), self.log.targets())?;
        let policy = ClassifierProbability::new(
            Arc::clone(&self.feature_manager),
            Arc::from(classifier),
        );

        let mut rag = self.original.clone();
        rag.set_merge_priority_function(Arc::new(policy));
        rag.rebuild_merge_queue();
        for (token, &(f0, f1)) in self.log.separate().iter().enumerate() {
            rag.add_exclusion(f0, token)?;
            rag.add_exclusion(f1, token)?;
        }
        let replayed = rag.replay_merge_history(&self.log.replay_groups())?;
        self.rag = rag;
        info!(
            examples = self.log.len(),
            separations = self.log.separate().len(),
            replayed,
            "merge policy relearned"
        );
        Ok(())
    }

    /// Relearn, agglomerate and return the resulting lookup table.
    pub fn segmentation(&mut self) -> Result<SolverMessage> {
        self.segmentation_with_merges().map(|(lut, _)| lut)
    }

    fn segmentation_with_merges(&mut self) -> Result<(SolverMessage, usize)> {
        self.relearn()?;
        let merges = self.rag.agglomerate(AGGLOMERATION_THRESHOLD)?;
        let (fragments, segments) = self.rag.fragment_segment_lut(AGGLOMERATION_THRESHOLD);
        let lut = SolverMessage::FragmentSegmentLut {
            fragments,
            segments,
        };
        Ok((lut, merges))
    }

    /// Relearn, agglomerate and send the lookup table to the client.
    pub async fn send_segmentation(&mut self, endpoint: &mut SolverEndpoint) -> Result<()> {
        let (lut, merges) = self.segmentation_with_merges()?;
        endpoint.send(&lut).await?;
        debug!(merges, segments = self.rag.node_count(), "lookup table sent");
        Ok(())
    }

    // ── Protocol ────────────────────────────────────────────────────

    /// Serve one client until it sends `stop` or an unrecognised message.
    pub async fn listen(&mut self, endpoint: &mut SolverEndpoint) -> Result<()> {
        info!("solver listening");
        loop {
            self.transition(SessionState::Idle);
            let message = match endpoint.recv().await {
                Ok(message) => message,
                Err(TransportError::Decode { frame, source }) => {
                    warn!(%frame, error = %source, "message not recognized; stopping");
                    self.transition(SessionState::Stopped);
                    return Ok(());
                }
                Err(e) => {
                    self.transition(SessionState::Stopped);
                    return Err(e.into());
                }
            };
            debug!(kind = message.kind(), "message received");
            match message {
                ClientMessage::Merge { segments } => {
                    self.transition(SessionState::Merging);
                    self.learn_merge(&segments)?;
                }
                ClientMessage::Separate { fragment, from } => {
                    self.transition(SessionState::Separating);
                    self.learn_separation(fragment, &from)?;
                }
                ClientMessage::Request {
                    what: RequestKind::FragmentSegmentLut,
                } => {
                    self.transition(SessionState::Responding);
                    self.send_segmentation(endpoint).await?;
                }
                ClientMessage::Stop {} => {
                    self.transition(SessionState::Stopped);
                    info!(examples = self.log.len(), "solver stopped");
                    return Ok(());
                }
            }
        }
    }
}
