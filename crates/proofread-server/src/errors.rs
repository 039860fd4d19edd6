//! Solver error types.

use proofread_features::FeatureError;
use proofread_learn::LearnError;
use proofread_rag::RagError;
use proofread_rpc::{IdServiceError, TransportError};
use proofread_settings::SettingsError;
use thiserror::Error;

/// Errors surfaced by a solver session or the proofreading driver.
#[derive(Debug, Error)]
pub enum SolverError {
    /// Graph invariant violated.
    #[error("rag: {0}")]
    Rag(#[from] RagError),

    /// Feature computation failed outside the recoverable paths.
    #[error("features: {0}")]
    Feature(#[from] FeatureError),

    /// Classifier training or scoring failed.
    #[error("classifier: {0}")]
    Learn(#[from] LearnError),

    /// Message channel failure.
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    /// Id reservation failed.
    #[error("id service: {0}")]
    IdService(#[from] IdServiceError),

    /// Invalid configuration.
    #[error("settings: {0}")]
    Settings(#[from] SettingsError),

    /// Fragment and ground-truth volumes disagree in shape.
    #[error("fragment volume has shape {fragments:?}, ground truth has {truth:?}")]
    ShapeMismatch {
        /// Fragment volume shape.
        fragments: Vec<usize>,
        /// Ground-truth volume shape.
        truth: Vec<usize>,
    },
}

/// Result alias for solver operations.
pub type Result<T> = std::result::Result<T, SolverError>;
