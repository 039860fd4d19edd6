use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a RAG node: an original fragment, the boundary sentinel,
/// or a segment created by a merge.
pub type NodeId = u64;

/// A contiguous block of fresh identifiers, `begin..end` (exclusive end).
///
/// Matches the ID-service wire format `{"begin": .., "end": ..}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdRange {
    /// First id of the range.
    pub begin: NodeId,
    /// One past the last id.
    pub end: NodeId,
}

/// Rejected [`IdRange`] construction.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IdRangeError {
    #[error("id range end {end} precedes begin {begin}")]
    Inverted { begin: NodeId, end: NodeId },
    #[error("id range holds {actual} ids, expected {expected}")]
    WrongLength { expected: u64, actual: u64 },
}

impl IdRange {
    /// Range `[begin, end)`; `end` must not precede `begin`.
    pub fn new(begin: NodeId, end: NodeId) -> Result<Self, IdRangeError> {
        if end < begin {
            return Err(IdRangeError::Inverted { begin, end });
        }
        Ok(Self { begin, end })
    }

    /// Validate that the range holds exactly `count` ids.
    pub fn expect_len(self, count: u64) -> Result<Self, IdRangeError> {
        let range = Self::new(self.begin, self.end)?;
        if range.len() != count {
            return Err(IdRangeError::WrongLength {
                expected: count,
                actual: range.len(),
            });
        }
        Ok(range)
    }

    /// Number of ids in the range.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.begin)
    }

    /// Whether there is nothing in it.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `id` lies in the range.
    pub fn contains(&self, id: NodeId) -> bool {
        (self.begin..self.end).contains(&id)
    }
}

impl fmt::Display for IdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.begin, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_length_and_membership() {
        let range = IdRange::new(10, 14).unwrap();
        assert_eq!(range.len(), 4);
        assert!(range.contains(10));
        assert!(range.contains(13));
        assert!(!range.contains(14));
        assert!(!range.is_empty());
    }

    #[test]
    fn inverted_range_rejected() {
        let err = IdRange::new(5, 3).unwrap_err();
        assert_eq!(err, IdRangeError::Inverted { begin: 5, end: 3 });
    }

    #[test]
    fn expect_len_checks_count() {
        let range = IdRange { begin: 100, end: 103 };
        assert!(range.expect_len(3).is_ok());
        assert_eq!(
            range.expect_len(4).unwrap_err(),
            IdRangeError::WrongLength { expected: 4, actual: 3 }
        );
    }

    #[test]
    fn wire_format() {
        let range: IdRange = serde_json::from_str(r#"{"begin": 23461, "end": 23477}"#).unwrap();
        assert_eq!(range.len(), 16);
        assert_eq!(range.to_string(), "[23461, 23477)");
    }
}
