//! Compressed sparse column matrices
//!
//! `CscView` is the read-only view of the input matrix A consumed by the
//! symbolic DFS. Row indices are stored 0-based in the usual CSC way; the
//! kernels turn index `r` into row identity `r + 1`.
//!
//! Column ranges are *not* checked when a view is built. The DFS reports
//! `MalformedInput` for a column when
//!
//! - its range runs backwards or ends past the stored entries;
//! - one of its row indices lies outside the matrix.
//!
//! Call [`CscView::validate`] to reject such input up front.

use crate::error::{LuError, LuResult};

/// Borrowed compressed-column matrix
#[derive(Debug, Clone, Copy)]
pub struct CscView<'a> {
    nrows: usize,
    ncols: usize,
    col_ptr: &'a [usize],
    row_idx: &'a [usize],
    values: &'a [f64],
}

impl<'a> CscView<'a> {
    /// Build a view, checking only the array lengths.
    pub fn new(
        nrows: usize,
        ncols: usize,
        col_ptr: &'a [usize],
        row_idx: &'a [usize],
        values: &'a [f64],
    ) -> LuResult<Self> {
        if col_ptr.len() != ncols + 1 {
            return Err(LuError::invalid_matrix(format!(
                "column pointer length {} != expected {}",
                col_ptr.len(),
                ncols + 1
            )));
        }
        if row_idx.len() != values.len() {
            return Err(LuError::invalid_matrix(format!(
                "{} row indices vs {} values",
                row_idx.len(),
                values.len()
            )));
        }
        Ok(Self {
            nrows,
            ncols,
            col_ptr,
            row_idx,
            values,
        })
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn col_ptr(&self) -> &'a [usize] {
        self.col_ptr
    }

    pub fn row_idx(&self) -> &'a [usize] {
        self.row_idx
    }

    pub fn values(&self) -> &'a [f64] {
        self.values
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Raw `(start, end)` range of column identity `col` (1-based).
    ///
    /// The range may run backwards on malformed input.
    #[inline]
    pub fn column_range(&self, col: usize) -> (usize, usize) {
        (self.col_ptr[col - 1], self.col_ptr[col])
    }

    /// Check monotone column pointers, in-bounds ranges and row indices.
    pub fn validate(&self) -> LuResult<()> {
        if self.col_ptr[0] != 0 {
            return Err(LuError::invalid_matrix(format!(
                "first column pointer is {}, expected 0",
                self.col_ptr[0]
            )));
        }
        for col in 0..self.ncols {
            let (start, end) = (self.col_ptr[col], self.col_ptr[col + 1]);
            if end < start {
                return Err(LuError::MalformedInput {
                    column: col + 1,
                    start,
                    end,
                });
            }
        }
        if self.col_ptr[self.ncols] != self.row_idx.len() {
            return Err(LuError::invalid_matrix(format!(
                "last column pointer {} != nnz {}",
                self.col_ptr[self.ncols],
                self.row_idx.len()
            )));
        }
        if let Some(pos) = self.row_idx.iter().position(|&r| r >= self.nrows) {
            return Err(LuError::invalid_matrix(format!(
                "row index {} at position {} out of bounds for {} rows",
                self.row_idx[pos], pos, self.nrows
            )));
        }
        Ok(())
    }

    /// Copy into an owned matrix
    pub fn to_matrix(&self) -> CscMatrix {
        CscMatrix {
            nrows: self.nrows,
            ncols: self.ncols,
            col_ptr: self.col_ptr.to_vec(),
            row_idx: self.row_idx.to_vec(),
            values: self.values.to_vec(),
        }
    }

    /// Value at `(row, col)` (0-based), summing duplicates
    pub fn get(&self, row: usize, col: usize) -> f64 {
        let (start, end) = (self.col_ptr[col], self.col_ptr[col + 1]);
        (start..end)
            .filter(|&idx| self.row_idx[idx] == row)
            .map(|idx| self.values[idx])
            .sum()
    }
}

/// Owned compressed-column matrix
#[derive(Debug, Clone, PartialEq)]
pub struct CscMatrix {
    nrows: usize,
    ncols: usize,
    col_ptr: Vec<usize>,
    row_idx: Vec<usize>,
    values: Vec<f64>,
}

impl CscMatrix {
    /// Build and fully validate a matrix.
    pub fn new(
        nrows: usize,
        ncols: usize,
        col_ptr: Vec<usize>,
        row_idx: Vec<usize>,
        values: Vec<f64>,
    ) -> LuResult<Self> {
        CscView::new(nrows, ncols, &col_ptr, &row_idx, &values)?.validate()?;
        Ok(Self {
            nrows,
            ncols,
            col_ptr,
            row_idx,
            values,
        })
    }

    /// Convert the `i64` column pointer / row index arrays used by `LinearSolver`.
    pub fn from_raw_parts(n: usize, ap: &[i64], ai: &[i64], ax: &[f64]) -> LuResult<Self> {
        let to_index = |v: i64, what: &str| {
            usize::try_from(v)
                .map_err(|_| LuError::invalid_matrix(format!("negative {} entry {}", what, v)))
        };
        let col_ptr = ap
            .iter()
            .map(|&p| to_index(p, "column pointer"))
            .collect::<LuResult<Vec<_>>>()?;
        let row_idx = ai
            .iter()
            .map(|&r| to_index(r, "row index"))
            .collect::<LuResult<Vec<_>>>()?;
        Self::new(n, n, col_ptr, row_idx, ax.to_vec())
    }

    /// Build from `(row, col, value)` triplets (0-based), keeping duplicates.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        triplets: &[(usize, usize, f64)],
    ) -> LuResult<Self> {
        let mut counts = vec![0usize; ncols + 1];
        for &(row, col, _) in triplets {
            if row >= nrows || col >= ncols {
                return Err(LuError::invalid_matrix(format!(
                    "triplet ({}, {}) out of bounds for {}x{}",
                    row, col, nrows, ncols
                )));
            }
            counts[col + 1] += 1;
        }
        for col in 0..ncols {
            counts[col + 1] += counts[col];
        }

        let mut next = counts.clone();
        let mut row_idx = vec![0usize; triplets.len()];
        let mut values = vec![0.0f64; triplets.len()];
        for &(row, col, val) in triplets {
            let pos = next[col];
            row_idx[pos] = row;
            values[pos] = val;
            next[col] += 1;
        }

        Self::new(nrows, ncols, counts, row_idx, values)
    }

    pub fn view(&self) -> CscView<'_> {
        CscView {
            nrows: self.nrows,
            ncols: self.ncols,
            col_ptr: &self.col_ptr,
            row_idx: &self.row_idx,
            values: &self.values,
        }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn col_ptr(&self) -> &[usize] {
        &self.col_ptr
    }

    pub fn row_idx(&self) -> &[usize] {
        &self.row_idx
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Dense copy indexed `[row][col]`, for tests and small diagnostics
    pub fn to_dense(&self) -> Vec<Vec<f64>> {
        let mut dense = vec![vec![0.0; self.ncols]; self.nrows];
        for col in 0..self.ncols {
            for idx in self.col_ptr[col]..self.col_ptr[col + 1] {
                dense[self.row_idx[idx]][col] += self.values[idx];
            }
        }
        dense
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triplets_to_csc() {
        // [ 4  0  1 ]
        // [ 0  3  0 ]
        // [ 2  0  5 ]
        let m = CscMatrix::from_triplets(
            3,
            3,
            &[(0, 0, 4.0), (2, 0, 2.0), (1, 1, 3.0), (0, 2, 1.0), (2, 2, 5.0)],
        )
        .unwrap();
        assert_eq!(m.col_ptr(), &[0, 2, 3, 5]);
        assert_eq!(m.row_idx(), &[0, 2, 1, 0, 2]);
        assert_eq!(m.view().get(2, 0), 2.0);
        assert_eq!(m.view().get(1, 0), 0.0);
    }

    #[test]
    fn test_view_allows_backwards_range_until_validated() {
        let col_ptr = [0usize, 2, 1, 3];
        let row_idx = [0usize, 1, 2];
        let values = [1.0, 2.0, 3.0];
        let view = CscView::new(3, 3, &col_ptr, &row_idx, &values).unwrap();
        assert_eq!(view.column_range(2), (2, 1));
        assert!(matches!(
            view.validate(),
            Err(LuError::MalformedInput { column: 2, .. })
        ));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err = CscView::new(2, 2, &[0, 1], &[0], &[1.0]).unwrap_err();
        assert!(matches!(err, LuError::InvalidMatrix { .. }));
    }

    #[test]
    fn test_from_raw_parts_rejects_negative() {
        let err = CscMatrix::from_raw_parts(2, &[0, 1, 2], &[0, -1], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, LuError::InvalidMatrix { .. }));
    }
}
