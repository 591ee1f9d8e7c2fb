//! Order-statistic selection for rank-based drop thresholds

use std::cmp::Ordering;

/// k-th largest magnitude in `values` (1-based `k`, `1 <= k <= values.len()`).
///
/// Runs in expected linear time. `values` is used as scratch and is left
/// partially reordered; the values themselves are not changed.
pub fn kth_largest_magnitude(values: &mut [f64], k: usize) -> f64 {
    debug_assert!(
        k >= 1 && k <= values.len(),
        "k = {} outside 1..={}",
        k,
        values.len()
    );
    let idx = k - 1;
    let (_, kth, _) = values.select_nth_unstable_by(idx, descending_magnitude);
    kth.abs()
}

fn descending_magnitude(a: &f64, b: &f64) -> Ordering {
    b.abs().total_cmp(&a.abs())
}
