//! Transport and ID-service errors.

use proofread_core::IdRangeError;
use thiserror::Error;

/// Errors moving messages between client and solver.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The peer closed the channel.
    #[error("connection closed by peer")]
    Closed,

    /// A frame did not decode as a known message.
    #[error("undecodable frame: {source}")]
    Decode {
        /// Frame text, for diagnostics.
        frame: String,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },

    /// A message could not be encoded.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    /// A binary frame was not UTF-8.
    #[error("binary frame is not UTF-8")]
    NotUtf8,

    /// WebSocket protocol or socket failure.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Socket-level I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reserving ids.
#[derive(Debug, Error)]
pub enum IdServiceError {
    /// HTTP request or response decoding failed.
    #[error("id service request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with an unusable range.
    #[error("id service returned an invalid range: {0}")]
    InvalidRange(#[from] IdRangeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_display() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = TransportError::Decode {
            frame: "{".into(),
            source,
        };
        assert!(err.to_string().starts_with("undecodable frame"));
    }

    #[test]
    fn invalid_range_display() {
        let err = IdServiceError::from(IdRangeError::WrongLength {
            expected: 4,
            actual: 2,
        });
        assert_eq!(
            err.to_string(),
            "id service returned an invalid range: id range holds 2 ids, expected 4"
        );
    }
}
