//! Learning error types.

use thiserror::Error;

/// Errors from fitting or querying a classifier.
#[derive(Debug, Error)]
pub enum LearnError {
    /// Feature rows and labels differ in count.
    #[error("{rows} feature rows but {labels} labels")]
    LengthMismatch {
        /// Number of feature rows.
        rows: usize,
        /// Number of labels.
        labels: usize,
    },

    /// Training vectors differ in length.
    #[error("feature vector {index} has length {actual}, expected {expected}")]
    RaggedFeatures {
        /// Position of the offending vector.
        index: usize,
        /// Length of the first vector.
        expected: usize,
        /// Length found.
        actual: usize,
    },

    /// A query vector does not match the fitted dimension.
    #[error("model was fitted on {expected} features, got {actual}")]
    DimensionMismatch {
        /// Fitted dimension.
        expected: usize,
        /// Query dimension.
        actual: usize,
    },
}

/// Result alias for learning operations.
pub type Result<T> = std::result::Result<T, LearnError>;
