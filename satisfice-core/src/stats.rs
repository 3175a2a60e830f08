//! Descriptive statistics over candidate scores.
//!
//! Pure functions: slices in, scalars out. Sorting uses `f64::total_cmp`, so
//! NaN inputs order deterministically instead of panicking.

/// Quantile of an unsorted slice using linear interpolation between order
/// statistics (`h = (m - 1) * q`).
///
/// Returns `None` for an empty slice. `q` is clamped to `[0, 1]`.
pub fn quantile_linear(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Some(quantile_sorted(&sorted, q))
}

/// Quantile of an ascending-sorted, non-empty slice using linear interpolation.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let q = q.clamp(0.0, 1.0);
    let rank = q * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}

/// Maximum of a slice, `None` when empty.
pub fn max_score(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Descending rank of `x` within `values`: `1 + count(values > x)`.
///
/// Ties share the best rank.
pub fn descending_rank(values: &[f64], x: f64) -> usize {
    1 + values.iter().filter(|&&v| v > x).count()
}

/// Score at 1-indexed rank `k_count` of the pool sorted descending.
///
/// `k_count` is clamped into `[1, pool.len()]`. Returns `None` for an empty pool.
pub fn true_k_threshold(pool: &[f64], k_count: usize) -> Option<f64> {
    if pool.is_empty() {
        return None;
    }
    let mut sorted = pool.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    let idx = k_count.clamp(1, sorted.len()) - 1;
    Some(sorted[idx])
}

/// Arithmetic mean; `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
