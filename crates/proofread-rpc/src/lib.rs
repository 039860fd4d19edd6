//! # proofread-rpc
//!
//! Wire protocol between a proofreading client and the solver.
//!
//! - [`messages`]: tagged JSON messages (`{"type": .., "data": ..}`)
//! - [`Endpoint`]: typed, owned duplex channel over any [`FrameTransport`]
//! - [`memory`] / [`websocket`]: transports
//! - [`id_service`]: block reservation of globally unique segment ids

#![deny(unsafe_code)]

pub mod errors;
pub mod id_service;
pub mod memory;
pub mod messages;
pub mod transport;
pub mod websocket;

pub use errors::{IdServiceError, TransportError};
pub use id_service::{HttpIdService, IdService};
pub use messages::{ClientMessage, RequestKind, SolverMessage};
pub use transport::{ClientEndpoint, Endpoint, FrameTransport, SolverEndpoint};
