//! Percentile-rank distance
//!
//! Every feature is mapped to its percentile rank in the indexed population
//! before comparison, so features with different units and ranges contribute
//! on the same [0, 1] ordinal scale and outliers only count by their rank.

use rankx_core::RankIndex;

/// Absolute percentile-rank gap of two values on one feature, in rank units
#[inline]
pub fn rank_gap(index: &RankIndex, feature: usize, a: f64, b: f64) -> usize {
    index
        .percentile_rank(feature, a)
        .abs_diff(index.percentile_rank(feature, b))
}

/// Sum of rank gaps over `features`, ignoring indices the index does not know.
///
/// Values absent from a shorter vector are treated as 0. Returns the sum
/// and the number of features that took part.
pub fn total_rank_gap(index: &RankIndex, a: &[f64], b: &[f64], features: &[usize]) -> (u64, usize) {
    let mut total = 0u64;
    let mut used = 0usize;
    for &feature in features {
        if feature >= index.feature_count() {
            continue;
        }
        let va = a.get(feature).copied().unwrap_or(0.0);
        let vb = b.get(feature).copied().unwrap_or(0.0);
        total += rank_gap(index, feature, va, vb) as u64;
        used += 1;
    }
    (total, used)
}

/// Turn a summed rank gap into the mean percentile gap in `[0, 1]`
#[inline]
pub fn normalize_gap(total: u64, features: usize, n: usize) -> f64 {
    if features == 0 || n == 0 {
        return 0.0;
    }
    total as f64 / (features as f64 * n as f64)
}

/// Mean absolute percentile gap between two vectors over `features`.
///
/// An empty feature subset gives distance 0. The result is symmetric,
/// reflexive and bounded in `[0, 1]`.
pub fn percentile_distance(index: &RankIndex, a: &[f64], b: &[f64], features: &[usize]) -> f64 {
    let (total, used) = total_rank_gap(index, a, b, features);
    normalize_gap(total, used, index.len())
}
