//! Factor storage, permutations and per-column workspace
//!
//! # Identities and indexing
//!
//! Row and column identities are 1-based; 0 means "unassigned". Per-row and
//! per-column containers are 0-based, so row `r` lives at index `r - 1`.
//! Positions in `lu`/`lurow` are plain 0-based offsets.
//!
//! # Memory Layout
//!
//! The factors are kept as one compressed-column structure Pᵗ(L − I + U).
//! Rows are numbered as in A, not PA. For column `j`:
//!
//! ```text
//! ucolst[j-1] .. lcolst[j-1]   U part, pivot U(j,j) last once the column is closed
//! lcolst[j-1] .. ucolst[j]     L part (multipliers, unit diagonal implied)
//! ```
//!
//! `last_lu` is one past the last used slot. Columns are appended in order and
//! storage is never compacted across columns.

use crate::error::{LuError, LuResult};

/// Growing compressed-column store for Pᵗ(L − I + U)
#[derive(Debug, Clone)]
pub struct FactorStorage {
    n: usize,
    pub(crate) lu: Vec<f64>,
    pub(crate) lurow: Vec<usize>,
    pub(crate) lcolst: Vec<usize>,
    pub(crate) ucolst: Vec<usize>,
    pub(crate) last_lu: usize,
    growths: usize,
}

impl FactorStorage {
    /// Allocate storage for an `n × n` factorization with room for `capacity` entries.
    pub fn new(n: usize, capacity: usize) -> Self {
        let capacity = capacity.max(n);
        Self {
            n,
            lu: vec![0.0; capacity],
            lurow: vec![0; capacity],
            lcolst: vec![0; n],
            ucolst: vec![0; n + 1],
            last_lu: 0,
            growths: 0,
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// One past the last used slot
    pub fn last_lu(&self) -> usize {
        self.last_lu
    }

    /// Allocated slots
    pub fn capacity(&self) -> usize {
        self.lurow.len()
    }

    /// Number of times storage had to grow beyond its initial size
    pub fn growths(&self) -> usize {
        self.growths
    }

    /// First position of column `j`'s U part
    #[inline]
    pub fn u_start(&self, j: usize) -> usize {
        self.ucolst[j - 1]
    }

    /// First position of column `j`'s L part
    #[inline]
    pub fn l_start(&self, j: usize) -> usize {
        self.lcolst[j - 1]
    }

    /// One past the last position of column `j`
    #[inline]
    pub fn col_end(&self, j: usize) -> usize {
        self.ucolst[j]
    }

    /// Row identities of column `j`'s U part
    pub fn u_rows(&self, j: usize) -> &[usize] {
        &self.lurow[self.u_start(j)..self.l_start(j)]
    }

    pub fn u_values(&self, j: usize) -> &[f64] {
        &self.lu[self.u_start(j)..self.l_start(j)]
    }

    /// Row identities of column `j`'s L part
    pub fn l_rows(&self, j: usize) -> &[usize] {
        &self.lurow[self.l_start(j)..self.col_end(j)]
    }

    pub fn l_values(&self, j: usize) -> &[f64] {
        &self.lu[self.l_start(j)..self.col_end(j)]
    }

    /// Rows allocated so far for the column currently being built
    pub fn open_rows(&self, j: usize) -> &[usize] {
        &self.lurow[self.u_start(j)..self.last_lu]
    }

    /// Pivot value U(j,j) of a closed column
    pub fn pivot_value(&self, j: usize) -> f64 {
        self.lu[self.l_start(j) - 1]
    }

    /// Start column `j` at the current high-water mark, making sure a full
    /// column (`n` rows) fits.
    pub(crate) fn open_column(&mut self, j: usize) {
        let needed = self.last_lu + self.n;
        if needed > self.lurow.len() {
            let new_len = needed.max(2 * self.lurow.len());
            log::trace!(
                "column {}: growing factor storage {} -> {}",
                j,
                self.lurow.len(),
                new_len
            );
            self.lurow.resize(new_len, 0);
            self.lu.resize(new_len, 0.0);
            self.growths += 1;
        }
        self.ucolst[j - 1] = self.last_lu;
        self.lcolst[j - 1] = self.last_lu;
        self.ucolst[j] = self.last_lu;
    }

    /// Allocate the next slot for row identity `row`.
    #[inline]
    pub(crate) fn push_row(&mut self, row: usize) {
        self.lurow[self.last_lu] = row;
        self.lu[self.last_lu] = 0.0;
        self.last_lu += 1;
    }

    /// Forget all columns, keeping the allocation.
    pub fn clear(&mut self) {
        self.last_lu = 0;
        self.lcolst.fill(0);
        self.ucolst.fill(0);
        self.growths = 0;
    }
}

/// Row and column permutations
///
/// `rperm[row - 1]` is the pivot rank of `row`, or 0 while it is unpivoted.
/// `cperm[j - 1]` is the original column processed at step `j`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permutations {
    pub(crate) rperm: Vec<usize>,
    pub(crate) cperm: Vec<usize>,
}

impl Permutations {
    /// Identity column order for an `n × n` matrix
    pub fn natural(n: usize) -> Self {
        Self {
            rperm: vec![0; n],
            cperm: (1..=n).collect(),
        }
    }

    /// Use `cperm` (1-based column identities) as the column order.
    pub fn with_column_order(cperm: Vec<usize>) -> LuResult<Self> {
        let n = cperm.len();
        let mut seen = vec![false; n];
        for (step, &col) in cperm.iter().enumerate() {
            if col == 0 || col > n {
                return Err(LuError::invalid_matrix(format!(
                    "column order entry {} at step {} is not in 1..={}",
                    col,
                    step + 1,
                    n
                )));
            }
            if std::mem::replace(&mut seen[col - 1], true) {
                return Err(LuError::invalid_matrix(format!(
                    "column {} appears twice in the column order",
                    col
                )));
            }
        }
        Ok(Self {
            rperm: vec![0; n],
            cperm,
        })
    }

    pub fn n(&self) -> usize {
        self.cperm.len()
    }

    /// Pivot rank of `row`, `None` while unpivoted
    #[inline]
    pub fn rank_of(&self, row: usize) -> Option<usize> {
        match self.rperm[row - 1] {
            0 => None,
            rank => Some(rank),
        }
    }

    /// Original column identity processed at step `j`
    #[inline]
    pub fn column_at(&self, j: usize) -> usize {
        self.cperm[j - 1]
    }

    pub fn rperm(&self) -> &[usize] {
        &self.rperm
    }

    pub fn cperm(&self) -> &[usize] {
        &self.cperm
    }

    /// Forget all pivots.
    pub fn clear_pivots(&mut self) {
        self.rperm.fill(0);
    }
}

/// Per-row marker for incomplete (pattern-restricted) factorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum PatternMark {
    /// Not expected in this column, subject to dropping
    #[default]
    Outside = 0,
    /// Expected nonzero, always retained
    Expected = 1,
    /// Designated structural diagonal
    Diagonal = 2,
}

/// Scratch arrays reused by every column
///
/// `dense` must be all zero between columns. `found` is tagged with the
/// column number instead of being cleared.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub(crate) dense: Vec<f64>,
    pub(crate) found: Vec<usize>,
    pub(crate) parent: Vec<usize>,
    pub(crate) child: Vec<usize>,
    pub(crate) twork: Vec<f64>,
}

impl Workspace {
    pub fn new(n: usize) -> Self {
        Self {
            dense: vec![0.0; n],
            found: vec![0; n],
            parent: vec![0; n],
            child: vec![0; n],
            twork: vec![0.0; n],
        }
    }

    pub fn n(&self) -> usize {
        self.dense.len()
    }

    /// Dense working column, indexed by `row - 1`
    pub fn dense(&self) -> &[f64] {
        &self.dense
    }

    /// Mutable dense column, for drivers that apply their own update
    pub fn dense_mut(&mut self) -> &mut [f64] {
        &mut self.dense
    }

    /// Column tag of each row, indexed by `row - 1`
    pub fn found(&self) -> &[usize] {
        &self.found
    }

    /// True when the dense column has been fully drained
    pub fn is_clean(&self) -> bool {
        self.dense.iter().all(|&v| v == 0.0)
    }

    /// Reset markers before reusing the workspace for a new factorization.
    pub fn reset(&mut self) {
        self.dense.fill(0.0);
        self.found.fill(0);
        self.parent.fill(0);
        self.child.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_order_validation() {
        assert!(Permutations::with_column_order(vec![2, 3, 1]).is_ok());
        assert!(Permutations::with_column_order(vec![1, 1, 2]).is_err());
        assert!(Permutations::with_column_order(vec![0, 1, 2]).is_err());
        assert!(Permutations::with_column_order(vec![1, 2, 4]).is_err());
    }

    #[test]
    fn test_rank_sentinel() {
        let mut perm = Permutations::natural(3);
        assert_eq!(perm.rank_of(2), None);
        perm.rperm[1] = 1;
        assert_eq!(perm.rank_of(2), Some(1));
        perm.clear_pivots();
        assert_eq!(perm.rank_of(2), None);
    }

    #[test]
    fn test_open_column_grows_storage() {
        let mut storage = FactorStorage::new(4, 4);
        storage.open_column(1);
        assert_eq!(storage.growths(), 0);
        for row in 1..=3 {
            storage.push_row(row);
        }
        storage.open_column(2);
        assert_eq!(storage.growths(), 1);
        assert!(storage.capacity() >= 7);
        assert_eq!(storage.u_start(2), 3);
        assert_eq!(storage.col_end(2), 3);
    }

    #[test]
    fn test_workspace_clean() {
        let mut ws = Workspace::new(3);
        assert!(ws.is_clean());
        ws.dense_mut()[1] = 2.0;
        assert!(!ws.is_clean());
        ws.reset();
        assert!(ws.is_clean());
    }
}
