//! Shared constants.

/// Separation probability below which automatic agglomeration keeps merging,
/// and at which the fragment→segment table is cut from the merge tree.
pub const AGGLOMERATION_THRESHOLD: f64 = 0.5;

/// Default darkness thresholds of the contact-area feature manager.
pub const DEFAULT_CONTACT_THRESHOLDS: [f64; 3] = [0.1, 0.5, 0.9];

/// Merge weight recorded for merges the proofreader asked for explicitly.
pub const EXPLICIT_MERGE_WEIGHT: f64 = 0.0;

/// Wire name of the fragment→segment lookup table request and response.
pub const FRAGMENT_SEGMENT_LUT: &str = "fragment-segment-lut";
