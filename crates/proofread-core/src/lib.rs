//! # proofread-core
//!
//! Foundation types shared by every proofreading crate.
//!
//! - [`NodeId`] — fragment and segment identifiers
//! - [`Label`] — training targets (`MERGE = 0`, `SEPARATE = 1`)
//! - [`IdRange`] — a contiguous block of fresh identifiers issued by an ID service
//! - [`constants`] — fixed thresholds shared by the session and the RAG

#![deny(unsafe_code)]

pub mod constants;
pub mod ids;
pub mod labels;

pub use ids::{IdRange, IdRangeError, NodeId};
pub use labels::Label;
