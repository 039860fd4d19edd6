//! JSON volume files.
//!
//! ```json
//! {
//!   "shape": [16, 16],
//!   "labels": [1, 1, 2, ...],
//!   "probabilities": [[0.1], [0.9], ...],
//!   "truth": [1, 1, 1, ...]
//! }
//! ```
//!
//! `labels` and `truth` are in row-major order. `probabilities` (and
//! `oriented_probabilities`) hold one row of channels per voxel.

use std::path::Path;

use anyhow::{bail, Context, Result};
use ndarray::{Array2, ArrayD, IxDyn};
use proofread_core::NodeId;
use serde::Deserialize;

/// A label volume with optional probability maps and ground truth.
#[derive(Clone, Debug, Deserialize)]
pub struct Volume {
    pub shape: Vec<usize>,
    pub labels: Vec<NodeId>,
    #[serde(default)]
    pub probabilities: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    pub oriented_probabilities: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    pub truth: Option<Vec<NodeId>>,
}

impl Volume {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read volume: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse volume: {}", path.display()))
    }

    pub fn labels(&self) -> Result<ArrayD<NodeId>> {
        ArrayD::from_shape_vec(IxDyn(&self.shape), self.labels.clone())
            .context("labels do not match shape")
    }

    pub fn truth(&self) -> Result<ArrayD<NodeId>> {
        let Some(truth) = &self.truth else {
            bail!("volume has no ground truth");
        };
        ArrayD::from_shape_vec(IxDyn(&self.shape), truth.clone())
            .context("ground truth does not match shape")
    }

    pub fn probabilities(&self) -> Result<Option<Array2<f64>>> {
        self.probabilities.as_deref().map(matrix).transpose()
    }

    pub fn oriented_probabilities(&self) -> Result<Option<Array2<f64>>> {
        self.oriented_probabilities.as_deref().map(matrix).transpose()
    }
}

fn matrix(rows: &[Vec<f64>]) -> Result<Array2<f64>> {
    let width = rows.first().map_or(0, Vec::len);
    if let Some(i) = rows.iter().position(|r| r.len() != width) {
        bail!("probability row {i} has {} channels, expected {width}", rows[i].len());
    }
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((rows.len(), width), flat).context("probability map is not rectangular")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_labels_and_probabilities() {
        let file = write(
            r#"{"shape": [1, 3], "labels": [1, 2, 2], "probabilities": [[0.1], [0.5], [0.9]]}"#,
        );
        let volume = Volume::load(file.path()).unwrap();
        assert_eq!(volume.labels().unwrap().shape(), &[1, 3]);
        let probs = volume.probabilities().unwrap().unwrap();
        assert_eq!(probs.dim(), (3, 1));
        assert!(volume.oriented_probabilities().unwrap().is_none());
        assert!(volume.truth().is_err());
    }

    #[test]
    fn shape_mismatch_is_reported() {
        let file = write(r#"{"shape": [2, 2], "labels": [1, 2, 3]}"#);
        let volume = Volume::load(file.path()).unwrap();
        assert!(volume.labels().is_err());
    }

    #[test]
    fn ragged_probabilities_are_rejected() {
        let file = write(r#"{"shape": [2], "labels": [1, 2], "probabilities": [[0.1, 0.2], [0.3]]}"#);
        let volume = Volume::load(file.path()).unwrap();
        let err = volume.probabilities().unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = Volume::load(Path::new("/nonexistent/volume.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/volume.json"));
    }
}
