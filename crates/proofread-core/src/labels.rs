//! Training labels recorded for every proofreading decision.

use serde::{Deserialize, Serialize};

/// Target of a training example. The numeric values are part of the
/// classifier contract: predictions are probabilities of [`Label::Separate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum Label {
    Merge = 0,
    Separate = 1,
}

impl Label {
    /// Numeric target used when fitting a classifier.
    pub const fn as_f64(self) -> f64 {
        match self {
            Self::Merge => 0.0,
            Self::Separate => 1.0,
        }
    }

    /// Whether this labels a merge.
    pub const fn is_merge(self) -> bool {
        matches!(self, Self::Merge)
    }
}

impl From<Label> for u8 {
    fn from(label: Label) -> Self {
        label as u8
    }
}

impl TryFrom<u8> for Label {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Merge),
            1 => Ok(Self::Separate),
            other => Err(format!("invalid training label {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_values() {
        assert_eq!(u8::from(Label::Merge), 0);
        assert_eq!(u8::from(Label::Separate), 1);
        assert!((Label::Separate.as_f64() - 1.0).abs() < f64::EPSILON);
        assert!(Label::Merge.is_merge());
    }

    #[test]
    fn serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Label::Separate).unwrap(), "1");
        let back: Label = serde_json::from_str("0").unwrap();
        assert_eq!(back, Label::Merge);
        assert!(serde_json::from_str::<Label>("2").is_err());
    }
}
