//! Classifier-backed merge priority.

use std::fmt;
use std::sync::Arc;

use proofread_core::NodeId;
use proofread_features::FeatureManager;
use proofread_rag::{MergePriority, Rag};
use tracing::warn;

use crate::classifier::Classifier;

/// Merge priority equal to the classifier's probability that an edge should
/// stay separated. Edges that cannot be scored get `+inf` and never merge.
#[derive(Clone)]
pub struct ClassifierProbability {
    manager: Arc<dyn FeatureManager>,
    classifier: Arc<dyn Classifier>,
}

impl ClassifierProbability {
    /// Score edges with `classifier` over features from `manager`.
    pub fn new(manager: Arc<dyn FeatureManager>, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            manager,
            classifier,
        }
    }
}

impl fmt::Debug for ClassifierProbability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierProbability")
            .field("manager", &self.manager.name())
            .field("classifier", &self.classifier)
            .finish()
    }
}

impl MergePriority for ClassifierProbability {
    fn priority(&self, g: &Rag, n1: NodeId, n2: NodeId) -> f64 {
        let features = match g.features_with(&*self.manager, n1, n2) {
            Ok(features) => features,
            Err(e) => {
                warn!(n1, n2, error = %e, "cannot compute edge features");
                return f64::INFINITY;
            }
        };
        match self.classifier.predict_separate_probability(features.view()) {
            Ok(p) => p,
            Err(e) => {
                warn!(n1, n2, error = %e, "cannot score edge");
                f64::INFINITY
            }
        }
    }
}
