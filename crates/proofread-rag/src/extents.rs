//! Sparse extent index: label value → voxel positions.

use std::ops::Index;

use proofread_core::NodeId;

use crate::errors::{RagError, Result};

/// Compressed list-of-lists. Row `i` holds the positions carrying label `i`.
///
/// Lookups take a single label and return a slice; labels beyond the index
/// yield an empty slice. There is no range or fancy indexing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SparseLol {
    indptr: Vec<usize>,
    indices: Vec<usize>,
}

impl SparseLol {
    /// Positions of `label`, in input order.
    pub fn get(&self, label: NodeId) -> &[usize] {
        let Ok(row) = usize::try_from(label) else {
            return &[];
        };
        let next = row.checked_add(1).and_then(|r| self.indptr.get(r));
        match (self.indptr.get(row), next) {
            (Some(&start), Some(&stop)) => &self.indices[start..stop],
            _ => &[],
        }
    }

    /// Number of rows (`max label + 1`, or 0 when empty).
    pub fn rows(&self) -> usize {
        self.indptr.len().saturating_sub(1)
    }

    /// Row offsets into [`indices`](Self::indices).
    pub fn indptr(&self) -> &[usize] {
        &self.indptr
    }

    /// Voxel positions, grouped by label.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }
}

impl Index<NodeId> for SparseLol {
    type Output = [usize];

    fn index(&self, label: NodeId) -> &[usize] {
        self.get(label)
    }
}

/// Compute the extent of every label value.
///
/// `input_indices` gives the position reported for each label; `None`
/// means `0..labels.len()`.
pub fn extents(labels: &[NodeId], input_indices: Option<&[usize]>) -> Result<SparseLol> {
    if let Some(indices) = input_indices {
        if indices.len() != labels.len() {
            return Err(RagError::LengthMismatch {
                labels: labels.len(),
                indices: indices.len(),
            });
        }
    }

    let rows = labels
        .iter()
        .max()
        .map_or(0, |&max| row(max) + 1);
    let mut indptr = vec![0usize; rows + 1];
    for &label in labels {
        indptr[row(label) + 1] += 1;
    }
    for i in 0..rows {
        indptr[i + 1] += indptr[i];
    }

    let mut cursor = indptr.clone();
    let mut indices = vec![0usize; labels.len()];
    for (i, &label) in labels.iter().enumerate() {
        let slot = &mut cursor[row(label)];
        indices[*slot] = input_indices.map_or(i, |idx| idx[i]);
        *slot += 1;
    }

    Ok(SparseLol { indptr, indices })
}

#[allow(clippy::cast_possible_truncation)]
fn row(label: NodeId) -> usize {
    label as usize
}
