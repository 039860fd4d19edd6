//! # proofread-server
//!
//! The proofreading solver: a session that turns client corrections into
//! training examples, relearns a merge policy from them and answers with a
//! fragment → segment lookup table.
//!
//! - [`Solver`]: session state machine and the `listen` loop
//! - [`TrainingLog`]: merge history, separations and labelled features
//! - [`driver`]: a simulated proofreader driven by ground truth
//! - [`evaluate`]: contingency tables and variation of information

#![deny(unsafe_code)]

pub mod driver;
pub mod errors;
pub mod evaluate;
pub mod history;
pub mod solver;

pub use driver::{proofread, ProofreadOptions};
pub use errors::{Result, SolverError};
pub use history::{MergeEvent, TrainingLog};
pub use solver::{SessionState, Solver};
