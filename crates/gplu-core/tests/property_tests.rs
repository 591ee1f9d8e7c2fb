//! Property-based tests for the factorization
//!
//! Random column diagonally dominant matrices are factored under the
//! different pivoting modes and checked against dense baselines.

use gplu_core::{CscMatrix, FactorOptions, Factorization, PivotMode};
use proptest::prelude::*;

// ============================================================================
// Test Utilities
// ============================================================================

/// Random n x n matrix with off-diagonal entries in (-1, 1) and a diagonal
/// that dominates its column.
fn dominant_matrix(max_n: usize) -> impl Strategy<Value = CscMatrix> {
    (1..=max_n)
        .prop_flat_map(|n| {
            (
                Just(n),
                prop::collection::vec((0..n, 0..n, -1.0..1.0f64), 0..=3 * n),
                prop::bool::ANY,
            )
        })
        .prop_map(|(n, entries, negative_diagonal)| {
            let mut col_sums = vec![0.0; n];
            let mut triplets = Vec::with_capacity(entries.len() + n);
            for (row, col, value) in entries {
                if row != col {
                    col_sums[col] += value.abs();
                    triplets.push((row, col, value));
                }
            }
            let sign = if negative_diagonal { -1.0 } else { 1.0 };
            for (col, sum) in col_sums.into_iter().enumerate() {
                triplets.push((col, col, sign * (sum + 1.0)));
            }
            CscMatrix::from_triplets(n, n, &triplets).unwrap()
        })
}

fn matrix_and_order(max_n: usize) -> impl Strategy<Value = (CscMatrix, Vec<usize>)> {
    dominant_matrix(max_n).prop_flat_map(|a| {
        let order: Vec<usize> = (1..=a.ncols()).collect();
        (Just(a), Just(order).prop_shuffle())
    })
}

fn multiply(a: &CscMatrix, x: &[f64]) -> Vec<f64> {
    let mut y = vec![0.0; a.nrows()];
    for col in 0..a.ncols() {
        for idx in a.col_ptr()[col]..a.col_ptr()[col + 1] {
            y[a.row_idx()[idx]] += a.values()[idx] * x[col];
        }
    }
    y
}

/// Largest |(P·A·Q - L·U)(r, c)|
fn factor_error(a: &CscMatrix, lu: &Factorization) -> f64 {
    let n = a.ncols();
    let dense_a = a.to_dense();
    let (l, u) = lu.triangular_factors().unwrap();
    let (l, u) = (l.to_dense(), u.to_dense());
    let mut worst = 0.0f64;
    for r in 0..n {
        for c in 0..n {
            let lu_rc: f64 = (0..n).map(|k| l[r][k] * u[k][c]).sum();
            let paq = dense_a[lu.row_pivots()[r] - 1][lu.permutations().column_at(c + 1) - 1];
            worst = worst.max((lu_rc - paq).abs());
        }
    }
    worst
}

fn is_permutation(v: &[usize]) -> bool {
    let mut sorted = v.to_vec();
    sorted.sort_unstable();
    sorted.iter().copied().eq(1..=v.len())
}

// ============================================================================
// Factorization Properties
// ============================================================================

proptest! {
    /// Property: partial pivoting solves A·x = b
    #[test]
    fn prop_partial_pivoting_solves(
        a in dominant_matrix(12),
        seed in prop::collection::vec(-10.0..10.0f64, 12)
    ) {
        let n = a.ncols();
        let x_true = &seed[..n];
        let b = multiply(&a, x_true);

        let lu = Factorization::factor(&a.view(), &FactorOptions::default()).unwrap();
        let mut x = b.clone();
        lu.solve(&mut x).unwrap();

        let residual = multiply(&a, &x);
        for row in 0..n {
            prop_assert!((residual[row] - b[row]).abs() < 1e-9);
        }
    }

    /// Property: P·A·Q = L·U for any column order
    #[test]
    fn prop_factors_reproduce_matrix((a, order) in matrix_and_order(10)) {
        let lu = Factorization::factor_ordered(&a.view(), order, &FactorOptions::default()).unwrap();
        prop_assert!(factor_error(&a, &lu) < 1e-10);
        prop_assert!(is_permutation(lu.row_pivots()));
        prop_assert!(is_permutation(lu.row_ranks()));
        prop_assert_eq!(lu.stats().columns, a.ncols());
    }

    /// Property: partial pivoting keeps every multiplier at most 1 in magnitude
    #[test]
    fn prop_partial_multipliers_bounded((a, order) in matrix_and_order(10)) {
        let lu = Factorization::factor_ordered(&a.view(), order, &FactorOptions::default()).unwrap();
        for j in 1..=a.ncols() {
            for &l in lu.storage().l_values(j) {
                prop_assert!(l.abs() <= 1.0);
            }
            let u_rows = lu.storage().u_rows(j);
            prop_assert_eq!(u_rows[u_rows.len() - 1], lu.row_pivots()[j - 1]);
        }
    }

    /// Property: diagonally dominant columns keep their diagonal under threshold pivoting
    #[test]
    fn prop_threshold_picks_diagonal(a in dominant_matrix(10), threshold in 0.05..1.0f64) {
        let lu = Factorization::factor(&a.view(), &FactorOptions::threshold(threshold)).unwrap();
        prop_assert_eq!(lu.stats().off_diagonal_pivots, 0);
        prop_assert!(factor_error(&a, &lu) < 1e-10);
    }

    /// Property: incomplete factorization on A's own pattern without pivoting
    /// stores nothing outside that pattern
    #[test]
    fn prop_incomplete_respects_pattern(a in dominant_matrix(10)) {
        let opts = FactorOptions::default().with_pivot_mode(PivotMode::Diagonal);
        let lu = Factorization::factor_incomplete(&a.view(), &a.view(), None, &opts).unwrap();

        let dense_a = a.to_dense();
        let (l, u) = lu.triangular_factors().unwrap();
        for factor in [&l, &u] {
            for col in 0..a.ncols() {
                for idx in factor.col_ptr()[col]..factor.col_ptr()[col + 1] {
                    let row = factor.row_idx()[idx];
                    prop_assert!(dense_a[row][col] != 0.0);
                }
            }
        }
        prop_assert_eq!(lu.stats().nnz_l + lu.stats().nnz_u, l.nnz() - a.ncols() + u.nnz());
    }

    /// Property: the incomplete driver with nothing to drop equals the complete one
    #[test]
    fn prop_incomplete_without_dropping_is_exact(a in dominant_matrix(10)) {
        let complete = Factorization::factor(&a.view(), &FactorOptions::default()).unwrap();
        let incomplete =
            Factorization::factor_incomplete(&a.view(), &a.view(), None, &FactorOptions::default())
                .unwrap();
        prop_assert_eq!(complete.row_pivots(), incomplete.row_pivots());
        prop_assert_eq!(complete.stats(), incomplete.stats());
    }
}
