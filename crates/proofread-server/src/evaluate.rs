//! Segmentation comparison.

use std::collections::BTreeMap;

use proofread_core::NodeId;

/// Voxel counts of every `(x, y)` label pair.
pub fn contingency_table(x: &[NodeId], y: &[NodeId]) -> BTreeMap<(NodeId, NodeId), usize> {
    let mut table = BTreeMap::new();
    for (&a, &b) in x.iter().zip(y) {
        *table.entry((a, b)).or_insert(0) += 1;
    }
    table
}

/// For every `fragments` label, the `truth` label it overlaps most (the
/// smallest such label on ties).
pub fn best_overlap(fragments: &[NodeId], truth: &[NodeId]) -> BTreeMap<NodeId, NodeId> {
    let mut best: BTreeMap<NodeId, (NodeId, usize)> = BTreeMap::new();
    for ((fragment, label), count) in contingency_table(fragments, truth) {
        let entry = best.entry(fragment).or_insert((label, count));
        if count > entry.1 {
            *entry = (label, count);
        }
    }
    best.into_iter().map(|(f, (label, _))| (f, label)).collect()
}

/// Conditional entropies `(H(x|y), H(y|x))` in bits.
pub fn split_vi(x: &[NodeId], y: &[NodeId]) -> (f64, f64) {
    let table = contingency_table(x, y);
    let n: usize = table.values().sum();
    if n == 0 {
        return (0.0, 0.0);
    }
    let n = n as f64;
    let mut px: BTreeMap<NodeId, f64> = BTreeMap::new();
    let mut py: BTreeMap<NodeId, f64> = BTreeMap::new();
    for (&(a, b), &c) in &table {
        *px.entry(a).or_insert(0.0) += c as f64 / n;
        *py.entry(b).or_insert(0.0) += c as f64 / n;
    }
    let (mut h_x_given_y, mut h_y_given_x) = (0.0, 0.0);
    for (&(a, b), &c) in &table {
        let pxy = c as f64 / n;
        h_x_given_y -= pxy * (pxy / py[&b]).log2();
        h_y_given_x -= pxy * (pxy / px[&a]).log2();
    }
    (h_x_given_y, h_y_given_x)
}

/// Variation of information between two labelings, in bits.
pub fn vi(x: &[NodeId], y: &[NodeId]) -> f64 {
    let (a, b) = split_vi(x, y);
    a + b
}

/// Relabel `fragments` through a lookup table. Labels missing from the
/// table keep their value.
pub fn apply_lut(fragments: &[NodeId], lut_fragments: &[NodeId], lut_segments: &[NodeId]) -> Vec<NodeId> {
    let lut: BTreeMap<NodeId, NodeId> = lut_fragments
        .iter()
        .copied()
        .zip(lut_segments.iter().copied())
        .collect();
    fragments
        .iter()
        .map(|f| lut.get(f).copied().unwrap_or(*f))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_counts_pairs() {
        let table = contingency_table(&[1, 1, 2, 2], &[5, 5, 5, 6]);
        assert_eq!(table[&(1, 5)], 2);
        assert_eq!(table[&(2, 5)], 1);
        assert_eq!(table[&(2, 6)], 1);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn best_overlap_prefers_majority_then_smallest() {
        let best = best_overlap(&[1, 1, 1, 2, 2], &[7, 8, 8, 4, 3]);
        assert_eq!(best[&1], 8);
        assert_eq!(best[&2], 3);
    }

    #[test]
    fn identical_labelings_have_zero_vi() {
        let x = [1, 1, 2, 3];
        assert!(vi(&x, &[9, 9, 4, 5]).abs() < 1e-12);
    }

    #[test]
    fn oversegmentation_costs_false_splits_only() {
        // Two equal fragments of one segment: one bit of H(x|y).
        let (splits, merges) = split_vi(&[1, 1, 2, 2], &[7, 7, 7, 7]);
        assert!((splits - 1.0).abs() < 1e-12);
        assert!(merges.abs() < 1e-12);
    }

    #[test]
    fn lut_relabels_known_fragments() {
        assert_eq!(apply_lut(&[1, 2, 3, 9], &[1, 2, 3], &[5, 5, 6]), vec![5, 5, 6, 9]);
    }
}
