//! Accumulated proofreading evidence.

use proofread_core::{Label, NodeId};
use proofread_features::FeatureVector;

/// One explicit merge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeEvent {
    /// Segment ids as they were when the merge was recorded.
    pub segments: (NodeId, NodeId),
    /// Every original fragment of each side, ascending. Segment ids change
    /// from one rebuild to the next; fragments do not.
    pub fragments: (Vec<NodeId>, Vec<NodeId>),
}

impl MergeEvent {
    /// Fragments of both sides, which must end up in one segment.
    pub fn joined_fragments(&self) -> Vec<NodeId> {
        let (a, b) = &self.fragments;
        a.iter().chain(b).copied().collect()
    }
}

/// Merge history, separation constraints and the labelled feature vectors
/// they produced. Grows monotonically for the life of a session.
#[derive(Clone, Debug, Default)]
pub struct TrainingLog {
    history: Vec<MergeEvent>,
    separate: Vec<(NodeId, NodeId)>,
    features: Vec<FeatureVector>,
    targets: Vec<Label>,
}

impl TrainingLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a merge and its example.
    pub fn record_merge(&mut self, event: MergeEvent, features: FeatureVector) {
        self.history.push(event);
        self.features.push(features);
        self.targets.push(Label::Merge);
    }

    /// Append a separation and its example.
    pub fn record_separation(&mut self, fragments: (NodeId, NodeId), features: FeatureVector) {
        self.separate.push(fragments);
        self.features.push(features);
        self.targets.push(Label::Separate);
    }

    /// Explicit merges, in order.
    pub fn history(&self) -> &[MergeEvent] {
        &self.history
    }

    /// Separated fragment pairs; the index is the exclusion token.
    pub fn separate(&self) -> &[(NodeId, NodeId)] {
        &self.separate
    }

    /// Feature vectors, one per example.
    pub fn features(&self) -> &[FeatureVector] {
        &self.features
    }

    /// Labels parallel to [`features`](Self::features).
    pub fn targets(&self) -> &[Label] {
        &self.targets
    }

    /// Number of training examples.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether there is nothing in it.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// History as fragment groups, for replay on a fresh graph.
    pub fn replay_groups(&self) -> Vec<Vec<NodeId>> {
        self.history.iter().map(MergeEvent::joined_fragments).collect()
    }

    /// Every example is accounted for by exactly one merge or separation.
    pub fn is_consistent(&self) -> bool {
        let merges = self.targets.iter().filter(|t| t.is_merge()).count();
        self.features.len() == self.targets.len()
            && merges == self.history.len()
            && self.targets.len() - merges == self.separate.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn records_stay_parallel() {
        let mut log = TrainingLog::new();
        assert!(log.is_empty());
        log.record_merge(
            MergeEvent {
                segments: (4, 7),
                fragments: (vec![1], vec![3]),
            },
            arr1(&[1.0]),
        );
        log.record_separation((2, 5), arr1(&[0.0]));
        log.record_separation((2, 6), arr1(&[0.0]));

        assert_eq!(log.len(), 3);
        assert_eq!(log.targets(), &[Label::Merge, Label::Separate, Label::Separate]);
        assert_eq!(log.separate(), &[(2, 5), (2, 6)]);
        assert!(log.is_consistent());
    }

    #[test]
    fn replay_uses_every_fragment() {
        let mut log = TrainingLog::new();
        log.record_merge(
            MergeEvent {
                segments: (20, 21),
                fragments: (vec![1, 2, 5], vec![9]),
            },
            arr1(&[1.0]),
        );
        assert_eq!(log.replay_groups(), vec![vec![1, 2, 5, 9]]);
        assert_eq!(log.history()[0].segments, (20, 21));
    }
}
