//! The classifier contract.

use std::fmt::Debug;
use std::sync::Arc;

use ndarray::{Array2, ArrayView1, ArrayView2};
use proofread_core::Label;
use proofread_features::FeatureVector;

use crate::errors::{LearnError, Result};

/// Binary classifier over edge feature vectors.
///
/// Inputs may contain non-finite values (logarithms of zero ratios);
/// implementations must tolerate them.
pub trait Classifier: Send + Sync + Debug {
    /// Fit from scratch on `features` (one row per example).
    fn fit(&mut self, features: ArrayView2<'_, f64>, labels: &[Label]) -> Result<()>;

    /// Probability that the edge described by `features` is a
    /// [`Label::Separate`] edge.
    fn predict_separate_probability(&self, features: ArrayView1<'_, f64>) -> Result<f64>;
}

/// Produces an untrained classifier for every relearn.
pub type ClassifierFactory = Arc<dyn Fn() -> Box<dyn Classifier> + Send + Sync>;

/// Stack feature vectors into a `(examples, features)` matrix.
pub fn stack_features(vectors: &[FeatureVector]) -> Result<Array2<f64>> {
    let width = vectors.first().map_or(0, FeatureVector::len);
    if let Some((index, vector)) = vectors.iter().enumerate().find(|(_, v)| v.len() != width) {
        return Err(LearnError::RaggedFeatures {
            index,
            expected: width,
            actual: vector.len(),
        });
    }
    Ok(Array2::from_shape_fn((vectors.len(), width), |(i, j)| {
        vectors[i][j]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use ndarray::arr1;

    #[test]
    fn stacks_rows() {
        let matrix = stack_features(&[arr1(&[1.0, 2.0]), arr1(&[3.0, 4.0])]).unwrap();
        assert_eq!(matrix.dim(), (2, 2));
        assert!((matrix[[1, 0]] - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_input_is_empty_matrix() {
        let matrix = stack_features(&[]).unwrap();
        assert_eq!(matrix.dim(), (0, 0));
    }

    #[test]
    fn ragged_rows_rejected() {
        let err = stack_features(&[arr1(&[1.0, 2.0]), arr1(&[3.0])]).unwrap_err();
        assert_matches!(
            err,
            LearnError::RaggedFeatures {
                index: 1,
                expected: 2,
                actual: 1
            }
        );
    }
}
