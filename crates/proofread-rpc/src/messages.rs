//! Protocol messages.
//!
//! Every frame is a JSON object `{"type": <kind>, "data": {..}}`:
//!
//! | direction | type | data |
//! |---|---|---|
//! | client → solver | `merge` | `segments: [int]` |
//! | client → solver | `separate` | `fragment: int, from: [int]` |
//! | client → solver | `request` | `what: "fragment-segment-lut"` |
//! | client → solver | `stop` | `{}` |
//! | solver → client | `fragment-segment-lut` | `fragments: [int], segments: [int]` |

use proofread_core::NodeId;
use serde::{Deserialize, Serialize};

/// Messages sent by a proofreading client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// These segments belong together.
    Merge { segments: Vec<NodeId> },
    /// `fragment` must never share a segment with any of `from`; an empty
    /// list means "all of its original neighbours".
    Separate {
        fragment: NodeId,
        #[serde(default)]
        from: Vec<NodeId>,
    },
    /// Ask the solver for data.
    Request { what: RequestKind },
    /// End the session.
    Stop {},
}

/// What a `request` message asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestKind {
    /// The current fragment → segment lookup table.
    FragmentSegmentLut,
}

/// Messages sent by the solver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum SolverMessage {
    /// Parallel lists: `fragments[i]` belongs to `segments[i]`.
    FragmentSegmentLut {
        fragments: Vec<NodeId>,
        segments: Vec<NodeId>,
    },
}

impl ClientMessage {
    /// Message type name as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Merge { .. } => "merge",
            Self::Separate { .. } => "separate",
            Self::Request { .. } => "request",
            Self::Stop {} => "stop",
        }
    }
}
