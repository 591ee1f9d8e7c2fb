//! Column-by-column LU driver
//!
//! Runs the Gilbert-Peierls major step for every column in order:
//!
//! ```text
//! For each column j = 1, 2, ..., n:
//!     1. symbolic_dfs      scatter A(:, cperm[j]), find U pattern in reverse topological order
//!     2. numeric_update    dense -= L(:, k) * U(k, j) for U rows in topological order
//!     3. finalize_column   compact, pivot, drop, divide L by the pivot
//! ```
//!
//! The result satisfies P·A·Q = L·U, with Q given by the column order and P
//! by the pivots chosen along the way. With a pattern (incomplete mode) the
//! factors are approximate and `solve` applies the preconditioner.
//!
//! # References
//!
//! - Gilbert, J.R., Peierls, T. "Sparse partial pivoting in time proportional to
//!   arithmetic operations" SIAM J. Sci. Stat. Comput., 1988.

use crate::csc::{CscMatrix, CscView};
use crate::dfs::symbolic_dfs;
use crate::error::{LuError, LuResult};
use crate::finalize::finalize_column;
use crate::options::{FactorOptions, PivotMode};
use crate::storage::{FactorStorage, PatternMark, Permutations, Workspace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Statistics from one factorization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FactorStats {
    pub columns: usize,
    /// Entries of L, unit diagonal excluded
    pub nnz_l: usize,
    /// Entries of U, diagonal included
    pub nnz_u: usize,
    /// L rows created by the numeric update
    pub fill_in: usize,
    pub dropped: usize,
    /// Columns whose pivot row differs from the column identity
    pub off_diagonal_pivots: usize,
    pub storage_growths: usize,
    /// Two per multiply-subtract in the update, one per division by the pivot
    pub flops: u64,
}

/// Work done by [`numeric_update`] for one column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnUpdate {
    /// Rows appended to the L part
    pub fill: usize,
    pub multiply_adds: usize,
}

/// Subtract the contributions of earlier L columns from the dense column `j`.
///
/// U rows are visited from the last emitted to the first, which is a
/// topological order of the DFS forest. Unpivoted rows reached for the first
/// time are appended to the L part; `ucolst[j + 1]` is updated to match.
pub fn numeric_update(
    j: usize,
    storage: &mut FactorStorage,
    perm: &Permutations,
    ws: &mut Workspace,
) -> ColumnUpdate {
    let mut update = ColumnUpdate::default();
    let u_start = storage.u_start(j);
    let u_end = storage.l_start(j);

    for ptr in (u_start..u_end).rev() {
        let row = storage.lurow[ptr];
        let x = ws.dense[row - 1];
        if x == 0.0 {
            continue;
        }
        let k = perm.rperm[row - 1];
        for q in storage.l_start(k)..storage.col_end(k) {
            let target = storage.lurow[q];
            if ws.found[target - 1] != j {
                ws.found[target - 1] = j;
                storage.push_row(target);
                update.fill += 1;
            }
            ws.dense[target - 1] -= storage.lu[q] * x;
            update.multiply_adds += 1;
        }
    }

    storage.ucolst[j] = storage.last_lu;
    update
}

/// Completed (or incomplete) factorization P·A·Q = L·U
#[derive(Debug, Clone)]
pub struct Factorization {
    n: usize,
    options: FactorOptions,
    storage: FactorStorage,
    perm: Permutations,
    /// pivot_rows[j - 1] = row identity pivoted at step j
    pivot_rows: Vec<usize>,
    stats: FactorStats,
}

impl Factorization {
    /// Factor with the natural column order.
    pub fn factor(a: &CscView<'_>, options: &FactorOptions) -> LuResult<Self> {
        Self::run(a, Permutations::natural(a.ncols()), None, options)
    }

    /// Factor processing columns in `column_order` (1-based column identities).
    pub fn factor_ordered(
        a: &CscView<'_>,
        column_order: Vec<usize>,
        options: &FactorOptions,
    ) -> LuResult<Self> {
        Self::run(a, Permutations::with_column_order(column_order)?, None, options)
    }

    /// Incomplete factorization restricted to `pattern`.
    ///
    /// For column `j` the rows of pattern column `cperm[j]` are expected and
    /// always kept, row `cperm[j]` is the designated diagonal, and every other
    /// entry is subject to the drop rules in `options`.
    pub fn factor_incomplete(
        a: &CscView<'_>,
        pattern: &CscView<'_>,
        column_order: Option<Vec<usize>>,
        options: &FactorOptions,
    ) -> LuResult<Self> {
        let perm = match column_order {
            Some(order) => Permutations::with_column_order(order)?,
            None => Permutations::natural(a.ncols()),
        };
        Self::run(a, perm, Some(pattern), options)
    }

    fn run(
        a: &CscView<'_>,
        mut perm: Permutations,
        pattern: Option<&CscView<'_>>,
        options: &FactorOptions,
    ) -> LuResult<Self> {
        let n = a.ncols();
        check_inputs(a, &perm, pattern, options)?;

        let mut storage = FactorStorage::new(n, options.initial_storage(a.nnz(), n));
        let mut ws = Workspace::new(n);
        let mut marks = pattern.map(|_| vec![PatternMark::Outside; n]);
        let mut pivot_rows = vec![0usize; n];
        let mut stats = FactorStats::default();

        for j in 1..=n {
            symbolic_dfs(j, a, &mut storage, &perm, &mut ws)?;
            let update = numeric_update(j, &mut storage, &perm, &mut ws);

            let col = perm.column_at(j);
            if let (Some(p), Some(m)) = (pattern, marks.as_mut()) {
                mark_column(p, col, m, PatternMark::Expected);
                m[col - 1] = PatternMark::Diagonal;
            }
            let finalized = finalize_column(j, options, &mut storage, &mut perm, &mut ws, marks.as_deref());
            if let (Some(p), Some(m)) = (pattern, marks.as_mut()) {
                mark_column(p, col, m, PatternMark::Outside);
                m[col - 1] = PatternMark::Outside;
            }
            let finalized = finalized?;

            let pivot_row = finalized
                .pivot_row
                .ok_or(LuError::NoPivotFound { column: j })?;
            pivot_rows[j - 1] = pivot_row;

            let l_len = storage.l_rows(j).len();
            stats.columns += 1;
            stats.nnz_l += l_len;
            stats.nnz_u += storage.u_rows(j).len();
            stats.fill_in += update.fill;
            stats.dropped += finalized.dropped;
            if pivot_row != col {
                stats.off_diagonal_pivots += 1;
            }
            stats.flops += 2 * update.multiply_adds as u64 + l_len as u64;
        }

        stats.storage_growths = storage.growths();
        if stats.storage_growths > 0 {
            log::warn!(
                "factor storage grew {} time(s) beyond the fill estimate ({} entries used)",
                stats.storage_growths,
                storage.last_lu()
            );
        }
        log::debug!(
            "factored {}x{}: nnz(A)={} nnz(L)={} nnz(U)={} fill={} dropped={} off-diagonal pivots={}",
            n,
            n,
            a.nnz(),
            stats.nnz_l,
            stats.nnz_u,
            stats.fill_in,
            stats.dropped,
            stats.off_diagonal_pivots
        );

        Ok(Self {
            n,
            options: options.clone(),
            storage,
            perm,
            pivot_rows,
            stats,
        })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn options(&self) -> &FactorOptions {
        &self.options
    }

    pub fn stats(&self) -> &FactorStats {
        &self.stats
    }

    /// Raw factor storage (rows numbered as in A)
    pub fn storage(&self) -> &FactorStorage {
        &self.storage
    }

    pub fn permutations(&self) -> &Permutations {
        &self.perm
    }

    /// Row identity pivoted at each step
    pub fn row_pivots(&self) -> &[usize] {
        &self.pivot_rows
    }

    /// Pivot rank of each row (`rperm`)
    pub fn row_ranks(&self) -> &[usize] {
        self.perm.rperm()
    }

    /// Solve A·x = b in place.
    pub fn solve(&self, rhs: &mut [f64]) -> LuResult<()> {
        let n = self.n;
        if rhs.len() != n {
            return Err(LuError::DimensionMismatch {
                expected: n,
                got: rhs.len(),
            });
        }

        // Forward solve: L * y = P * b, rows kept in A's numbering
        let mut work = rhs.to_vec();
        for j in 1..=n {
            let y_j = work[self.pivot_rows[j - 1] - 1];
            if y_j == 0.0 {
                continue;
            }
            let rows = self.storage.l_rows(j);
            let values = self.storage.l_values(j);
            for (&row, &l) in rows.iter().zip(values) {
                work[row - 1] -= l * y_j;
            }
        }

        // Backward solve: U * z = y, pivot is the last entry of each U column
        let mut z = vec![0.0; n];
        for j in (1..=n).rev() {
            let z_j = work[self.pivot_rows[j - 1] - 1] / self.storage.pivot_value(j);
            z[j - 1] = z_j;
            let rows = self.storage.u_rows(j);
            let values = self.storage.u_values(j);
            let above = rows.len() - 1;
            for (&row, &u) in rows[..above].iter().zip(&values[..above]) {
                work[row - 1] -= u * z_j;
            }
        }

        // Undo the column order: x = Q * z
        for (j, &z_j) in z.iter().enumerate() {
            rhs[self.perm.column_at(j + 1) - 1] = z_j;
        }

        Ok(())
    }

    /// L (unit diagonal stored) and U with rows renumbered by pivot rank,
    /// so that P·A·Q = L·U.
    pub fn triangular_factors(&self) -> LuResult<(CscMatrix, CscMatrix)> {
        let n = self.n;
        let mut l = Vec::with_capacity(self.stats.nnz_l + n);
        let mut u = Vec::with_capacity(self.stats.nnz_u);

        for j in 1..=n {
            l.push((j - 1, j - 1, 1.0));
            for (&row, &value) in self.storage.l_rows(j).iter().zip(self.storage.l_values(j)) {
                l.push((self.perm.rperm[row - 1] - 1, j - 1, value));
            }
            for (&row, &value) in self.storage.u_rows(j).iter().zip(self.storage.u_values(j)) {
                u.push((self.perm.rperm[row - 1] - 1, j - 1, value));
            }
        }

        Ok((
            CscMatrix::from_triplets(n, n, &l)?,
            CscMatrix::from_triplets(n, n, &u)?,
        ))
    }
}

fn check_inputs(
    a: &CscView<'_>,
    perm: &Permutations,
    pattern: Option<&CscView<'_>>,
    options: &FactorOptions,
) -> LuResult<()> {
    if a.nrows() != a.ncols() {
        return Err(LuError::invalid_matrix(format!(
            "matrix must be square, got {}x{}",
            a.nrows(),
            a.ncols()
        )));
    }
    a.validate()?;
    if perm.n() != a.ncols() {
        return Err(LuError::DimensionMismatch {
            expected: a.ncols(),
            got: perm.n(),
        });
    }
    if let Some(p) = pattern {
        if p.nrows() != a.nrows() || p.ncols() != a.ncols() {
            return Err(LuError::invalid_matrix(format!(
                "pattern is {}x{}, matrix is {}x{}",
                p.nrows(),
                p.ncols(),
                a.nrows(),
                a.ncols()
            )));
        }
        p.validate()?;
    }
    options.validate()?;
    if options.pivot_mode == PivotMode::Structural {
        return Err(LuError::invalid_options(
            "structural passes record no pivot and cannot drive a full factorization",
        ));
    }
    Ok(())
}

/// Set the mark of every row in pattern column `col`.
fn mark_column(pattern: &CscView<'_>, col: usize, marks: &mut [PatternMark], mark: PatternMark) {
    let (start, end) = pattern.column_range(col);
    for &idx in &pattern.row_idx()[start..end] {
        marks[idx] = mark;
    }
}
