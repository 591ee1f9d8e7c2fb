//! Column finalization: compaction, pivoting, dropping and scaling
//!
//! After the symbolic DFS (and the numeric update) column `j` sits in the
//! dense vector, with its rows listed in `lurow[ucolst[j]..ucolst[j+1]]`.
//! Finalization copies the values back into sparse storage, throwing out
//! entries the drop rules reject, picks the pivot among the L rows, moves it
//! to the end of U and divides what is left of L by it.
//!
//! # Drop rules
//!
//! Entries marked expected (or diagonal) in the pattern are always kept, as is
//! the chosen pivot. In the pivoting modes any other entry survives only if
//! its magnitude reaches the threshold of its half-column:
//!
//! ```text
//! keep_count == 0            tol × max|half|
//! keep_count <  candidates   keep_count-th largest |half|
//! otherwise                  0
//! ```
//!
//! U and L get separate thresholds. The rank rule compares with `>=`, so
//! entries tied with the keep_count-th largest magnitude all survive and a
//! half-column can keep more than `keep_count` out-of-pattern entries.

use crate::error::{LuError, LuResult};
use crate::options::{FactorOptions, PivotMode};
use crate::select::kth_largest_magnitude;
use crate::storage::{FactorStorage, PatternMark, Permutations, Workspace};

/// Outcome of finalizing one column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalizedColumn {
    /// Row identity chosen as pivot, `None` for a structural pass
    pub pivot_row: Option<usize>,
    /// Entries kept in U and L, pivot included
    pub retained: usize,
    /// Entries thrown out
    pub dropped: usize,
}

/// Pattern as seen from column `j`. Without explicit marks every row is
/// expected and row `cperm[j]` is the designated diagonal.
#[derive(Clone, Copy)]
struct ColumnPattern<'a> {
    marks: Option<&'a [PatternMark]>,
    diagonal: usize,
}

impl ColumnPattern<'_> {
    #[inline]
    fn mark(&self, row: usize) -> PatternMark {
        match self.marks {
            Some(marks) => marks[row - 1],
            None if row == self.diagonal => PatternMark::Diagonal,
            None => PatternMark::Expected,
        }
    }

    #[inline]
    fn expected(&self, row: usize) -> bool {
        self.mark(row) != PatternMark::Outside
    }
}

/// Copy column `j` from the dense vector to sparse storage, pivot and divide.
///
/// `pattern`, when given, is indexed by `row - 1` and describes column `j`.
/// On success `dense` is zero, `rperm[pivot - 1] == j`, and the pivot is the
/// last entry of U. A `Structural` pass stops after compaction and records
/// no pivot.
pub fn finalize_column(
    j: usize,
    options: &FactorOptions,
    storage: &mut FactorStorage,
    perm: &mut Permutations,
    ws: &mut Workspace,
    pattern: Option<&[PatternMark]>,
) -> LuResult<FinalizedColumn> {
    let u_start = storage.u_start(j);
    let l_start = storage.l_start(j);
    let end = storage.col_end(j);
    let candidates = end - u_start;
    let pattern = ColumnPattern {
        marks: pattern,
        diagonal: perm.column_at(j),
    };

    let (u_end, l_end, pivot_pos) = if options.pivot_mode.pivots() {
        if end <= l_start {
            discard(storage, ws, u_start, end);
            return Err(LuError::EmptyColumn { column: j });
        }
        compact_pivoting(j, options, storage, ws, pattern, (u_start, l_start, end))
    } else {
        if end <= u_start {
            return Err(LuError::EmptyColumn { column: j });
        }
        compact_fixed(storage, ws, pattern, (u_start, l_start, end))
    };

    storage.lcolst[j - 1] = u_end;
    storage.ucolst[j] = l_end;
    storage.last_lu = l_end;

    let retained = l_end - u_start;
    let dropped = candidates - retained;

    if options.pivot_mode == PivotMode::Structural {
        return Ok(FinalizedColumn {
            pivot_row: None,
            retained,
            dropped,
        });
    }

    let pivot_pos = pivot_pos.ok_or(LuError::NoPivotFound { column: j })?;
    let pivot_row = storage.lurow[pivot_pos];
    let ujj = storage.lu[pivot_pos];
    if ujj == 0.0 {
        return Err(LuError::NumericallySingular { column: j });
    }

    // Swap U(j,j) from L into the closing slot of U.
    storage.lurow.swap(pivot_pos, u_end);
    storage.lu.swap(pivot_pos, u_end);
    storage.lcolst[j - 1] = u_end + 1;

    perm.rperm[pivot_row - 1] = j;

    for value in &mut storage.lu[u_end + 1..l_end] {
        *value /= ujj;
    }

    Ok(FinalizedColumn {
        pivot_row: Some(pivot_row),
        retained,
        dropped,
    })
}

/// Partial and threshold pivoting. Returns `(u_end, l_end, pivot position)`.
fn compact_pivoting(
    j: usize,
    options: &FactorOptions,
    storage: &mut FactorStorage,
    ws: &mut Workspace,
    pattern: ColumnPattern<'_>,
    (u_start, l_start, end): (usize, usize, usize),
) -> (usize, usize, Option<usize>) {
    let u_thresh = drop_threshold(
        &storage.lurow[u_start..l_start],
        &ws.dense,
        &mut ws.twork,
        options,
    );
    let l_thresh = drop_threshold(
        &storage.lurow[l_start..end],
        &ws.dense,
        &mut ws.twork,
        options,
    );

    let mut copy = u_start;
    for ptr in u_start..l_start {
        let row = storage.lurow[ptr];
        let value = std::mem::take(&mut ws.dense[row - 1]);
        if pattern.expected(row) || value.abs() >= u_thresh {
            storage.lurow[copy] = row;
            storage.lu[copy] = value;
            copy += 1;
        }
    }
    let u_end = copy;

    let pivot_row = choose_pivot(j, &storage.lurow[l_start..end], &ws.dense, pattern, options);

    let mut pivot_pos = None;
    for ptr in l_start..end {
        let row = storage.lurow[ptr];
        let value = std::mem::take(&mut ws.dense[row - 1]);
        let is_pivot = pivot_row == Some(row);
        if pattern.expected(row) || is_pivot || value.abs() >= l_thresh {
            if is_pivot {
                pivot_pos = Some(copy);
            }
            storage.lurow[copy] = row;
            storage.lu[copy] = value;
            copy += 1;
        }
    }

    (u_end, copy, pivot_pos)
}

/// No pivoting: keep pattern rows, the pivot is the designated diagonal.
fn compact_fixed(
    storage: &mut FactorStorage,
    ws: &mut Workspace,
    pattern: ColumnPattern<'_>,
    (u_start, l_start, end): (usize, usize, usize),
) -> (usize, usize, Option<usize>) {
    let mut copy = u_start;
    for ptr in u_start..l_start {
        let row = storage.lurow[ptr];
        let value = std::mem::take(&mut ws.dense[row - 1]);
        if pattern.expected(row) || row == pattern.diagonal {
            storage.lurow[copy] = row;
            storage.lu[copy] = value;
            copy += 1;
        }
    }
    let u_end = copy;

    let mut pivot_pos = None;
    for ptr in l_start..end {
        let row = storage.lurow[ptr];
        let value = std::mem::take(&mut ws.dense[row - 1]);
        let mark = pattern.mark(row);
        if mark == PatternMark::Diagonal {
            pivot_pos = Some(copy);
        }
        if mark != PatternMark::Outside {
            storage.lurow[copy] = row;
            storage.lu[copy] = value;
            copy += 1;
        }
    }

    (u_end, copy, pivot_pos)
}

/// Largest-magnitude L row, or the designated diagonal when threshold
/// pivoting accepts it.
fn choose_pivot(
    j: usize,
    rows: &[usize],
    dense: &[f64],
    pattern: ColumnPattern<'_>,
    options: &FactorOptions,
) -> Option<usize> {
    let mut max_row = None;
    let mut max_mag = -1.0f64;
    let mut diagonal = None;

    for &row in rows {
        let mag = dense[row - 1].abs();
        if pattern.mark(row) == PatternMark::Diagonal {
            diagonal = Some((row, mag));
        }
        if mag > max_mag {
            max_row = Some(row);
            max_mag = mag;
        }
    }

    if options.pivot_mode == PivotMode::Threshold {
        if let Some((row, mag)) = diagonal {
            if mag >= options.pivot_threshold * max_mag {
                return Some(row);
            }
            log::trace!(
                "column {}: diagonal row {} (|{:.3e}|) below threshold, pivoting on row {:?}",
                j,
                row,
                mag,
                max_row
            );
        }
    }

    max_row
}

fn drop_threshold(rows: &[usize], dense: &[f64], twork: &mut [f64], options: &FactorOptions) -> f64 {
    if options.keep_count == 0 {
        let max = rows
            .iter()
            .map(|&row| dense[row - 1].abs())
            .fold(0.0, f64::max);
        options.drop_tolerance * max
    } else if rows.len() > options.keep_count {
        let scratch = &mut twork[..rows.len()];
        for (slot, &row) in scratch.iter_mut().zip(rows) {
            *slot = dense[row - 1].abs();
        }
        kth_largest_magnitude(scratch, options.keep_count)
    } else {
        0.0
    }
}

/// Zero the dense entries of an abandoned column range.
fn discard(storage: &FactorStorage, ws: &mut Workspace, from: usize, to: usize) {
    for &row in &storage.lurow[from..to] {
        ws.dense[row - 1] = 0.0;
    }
}
