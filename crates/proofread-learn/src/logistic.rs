//! L2-regularised logistic regression.
//!
//! Features are standardised with the mean and standard deviation of their
//! finite training values; after scaling, values are clamped to ±8 so that
//! infinite inputs saturate instead of poisoning the fit, and NaN maps to
//! the column mean.

use std::sync::Arc;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use proofread_core::Label;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classifier::{Classifier, ClassifierFactory};
use crate::errors::{LearnError, Result};

const CLAMP: f64 = 8.0;

/// Training hyper-parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogisticConfig {
    /// Gradient descent step size.
    pub learning_rate: f64,
    /// Full passes over the training set.
    pub epochs: usize,
    pub l2_penalty: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.5,
            epochs: 500,
            l2_penalty: 1e-3,
        }
    }
}

#[derive(Clone, Debug)]
struct Fitted {
    mean: Array1<f64>,
    scale: Array1<f64>,
    weights: Array1<f64>,
    bias: f64,
}

impl Fitted {
    fn standardize(&self, value: f64, column: usize) -> f64 {
        let z = (value - self.mean[column]) / self.scale[column];
        if z.is_nan() {
            0.0
        } else {
            z.clamp(-CLAMP, CLAMP)
        }
    }
}

/// Logistic regression trained by full-batch gradient descent.
#[derive(Clone, Debug, Default)]
pub struct LogisticRegression {
    config: LogisticConfig,
    model: Option<Fitted>,
}

impl LogisticRegression {
    /// Unfitted model; predicts 0.5 until [`fit`](Classifier::fit).
    pub fn new(config: LogisticConfig) -> Self {
        Self {
            config,
            model: None,
        }
    }

    /// Whether [`fit`](Classifier::fit) has seen examples.
    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }
}

/// Factory producing fresh [`LogisticRegression`] models.
pub fn logistic_factory(config: LogisticConfig) -> ClassifierFactory {
    Arc::new(move || Box::new(LogisticRegression::new(config)) as Box<dyn Classifier>)
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn column_stats(column: ArrayView1<'_, f64>) -> (f64, f64) {
    let finite: Vec<f64> = column.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return (0.0, 1.0);
    }
    let n = finite.len() as f64;
    let mean = finite.iter().sum::<f64>() / n;
    let var = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = var.sqrt();
    (mean, if std > 0.0 { std } else { 1.0 })
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, features: ArrayView2<'_, f64>, labels: &[Label]) -> Result<()> {
        let (rows, cols) = features.dim();
        if rows != labels.len() {
            return Err(LearnError::LengthMismatch {
                rows,
                labels: labels.len(),
            });
        }
        if rows == 0 {
            self.model = None;
            return Ok(());
        }

        let (mean, scale): (Vec<f64>, Vec<f64>) =
            features.axis_iter(Axis(1)).map(column_stats).unzip();
        let mut model = Fitted {
            mean: Array1::from(mean),
            scale: Array1::from(scale),
            weights: Array1::zeros(cols),
            bias: 0.0,
        };
        let x = Array2::from_shape_fn((rows, cols), |(i, j)| {
            model.standardize(features[[i, j]], j)
        });
        let y: Array1<f64> = labels.iter().map(|l| l.as_f64()).collect();

        let n = rows as f64;
        let LogisticConfig {
            learning_rate,
            epochs,
            l2_penalty,
        } = self.config;
        for _ in 0..epochs {
            let predictions = (x.dot(&model.weights) + model.bias).mapv(sigmoid);
            let residual = &predictions - &y;
            let grad_w = x.t().dot(&residual) / n + &model.weights * l2_penalty;
            let grad_b = residual.sum() / n;
            model.weights.scaled_add(-learning_rate, &grad_w);
            model.bias -= learning_rate * grad_b;
        }

        debug!(examples = rows, features = cols, bias = model.bias, "logistic regression fitted");
        self.model = Some(model);
        Ok(())
    }

    fn predict_separate_probability(&self, features: ArrayView1<'_, f64>) -> Result<f64> {
        let Some(model) = &self.model else {
            return Ok(0.5);
        };
        if features.len() != model.weights.len() {
            return Err(LearnError::DimensionMismatch {
                expected: model.weights.len(),
                actual: features.len(),
            });
        }
        let z: f64 = features
            .iter()
            .enumerate()
            .map(|(j, &v)| model.standardize(v, j) * model.weights[j])
            .sum::<f64>()
            + model.bias;
        Ok(sigmoid(z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use ndarray::{arr1, arr2};

    fn separable() -> (Array2<f64>, Vec<Label>) {
        let x = arr2(&[[1.0], [0.95], [0.9], [0.0], [0.05], [0.1]]);
        let y = vec![
            Label::Merge,
            Label::Merge,
            Label::Merge,
            Label::Separate,
            Label::Separate,
            Label::Separate,
        ];
        (x, y)
    }

    #[test]
    fn learns_separable_problem() {
        let (x, y) = separable();
        let mut model = LogisticRegression::default();
        model.fit(x.view(), &y).unwrap();
        assert!(model.is_fitted());
        let merge = model.predict_separate_probability(arr1(&[1.0]).view()).unwrap();
        let separate = model.predict_separate_probability(arr1(&[0.0]).view()).unwrap();
        assert!(merge < 0.2, "merge edge scored {merge}");
        assert!(separate > 0.8, "separate edge scored {separate}");
    }

    #[test]
    fn unfitted_model_is_undecided() {
        let model = LogisticRegression::default();
        let p = model.predict_separate_probability(arr1(&[3.0]).view()).unwrap();
        assert!((p - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_training_set_is_undecided() {
        let mut model = LogisticRegression::default();
        model.fit(Array2::zeros((0, 4)).view(), &[]).unwrap();
        assert!(!model.is_fitted());
    }

    #[test]
    fn non_finite_inputs_stay_finite() {
        let x = arr2(&[
            [f64::NEG_INFINITY, 1.0],
            [0.5, f64::NAN],
            [f64::INFINITY, 0.0],
            [0.2, 0.3],
        ]);
        let y = [Label::Separate, Label::Merge, Label::Merge, Label::Separate];
        let mut model = LogisticRegression::default();
        model.fit(x.view(), &y).unwrap();
        for query in [
            arr1(&[f64::NEG_INFINITY, f64::NAN]),
            arr1(&[f64::INFINITY, f64::INFINITY]),
        ] {
            let p = model.predict_separate_probability(query.view()).unwrap();
            assert!(p.is_finite() && (0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn single_class_training_leans_to_that_class() {
        let x = arr2(&[[0.3], [0.6]]);
        let mut model = LogisticRegression::default();
        model.fit(x.view(), &[Label::Separate, Label::Separate]).unwrap();
        let p = model.predict_separate_probability(arr1(&[0.4]).view()).unwrap();
        assert!(p > 0.5);
    }

    #[test]
    fn dimension_and_length_checks() {
        let (x, y) = separable();
        let mut model = LogisticRegression::default();
        assert_matches!(
            model.fit(x.view(), &y[..2]),
            Err(LearnError::LengthMismatch { rows: 6, labels: 2 })
        );
        model.fit(x.view(), &y).unwrap();
        assert_matches!(
            model.predict_separate_probability(arr1(&[1.0, 2.0]).view()),
            Err(LearnError::DimensionMismatch { expected: 1, actual: 2 })
        );
    }

    #[test]
    fn factory_builds_unfitted_models() {
        let factory = logistic_factory(LogisticConfig::default());
        let model = factory();
        let p = model.predict_separate_probability(arr1(&[0.0]).view()).unwrap();
        assert!((p - 0.5).abs() < f64::EPSILON);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn predictions_are_probabilities(
                values in proptest::collection::vec(-1e6f64..1e6, 8),
                query in -1e9f64..1e9,
            ) {
                let x = Array2::from_shape_vec((8, 1), values).unwrap();
                let y: Vec<Label> = (0..8)
                    .map(|i| if i % 2 == 0 { Label::Merge } else { Label::Separate })
                    .collect();
                let mut model = LogisticRegression::new(LogisticConfig { epochs: 20, ..LogisticConfig::default() });
                model.fit(x.view(), &y).unwrap();
                let p = model.predict_separate_probability(arr1(&[query]).view()).unwrap();
                prop_assert!((0.0..=1.0).contains(&p));
            }
        }
    }
}
