//! # proofread-learn
//!
//! Online learning for merge decisions.
//!
//! - [`Classifier`]: fit on (features, label) pairs, predict the probability
//!   that an edge should stay separated
//! - [`LogisticRegression`]: the default backend
//! - [`ClassifierProbability`]: a [`MergePriority`](proofread_rag::MergePriority)
//!   that scores edges with a fitted classifier

#![deny(unsafe_code)]

pub mod classifier;
pub mod errors;
pub mod logistic;
pub mod policy;

pub use classifier::{stack_features, Classifier, ClassifierFactory};
pub use errors::{LearnError, Result};
pub use logistic::{logistic_factory, LogisticConfig, LogisticRegression};
pub use policy::ClassifierProbability;
