//! Factorization options
//!
//! Options are fixed for a whole factorization and passed by reference to
//! every column.
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `pivot_mode` | `Partial` | How the diagonal of each column is chosen |
//! | `pivot_threshold` | 1.0 | Fraction of the column maximum the designated diagonal must reach (`Threshold` only) |
//! | `drop_tolerance` | 0.0 | Out-of-pattern entries below `tol × max` of their half-column are dropped |
//! | `keep_count` | 0 | Keep at most this many largest entries per half-column (0 = unlimited) |
//! | `fill_estimate` | 0 | Initial factor storage in entries (0 = four times nnz(A)) |

use crate::error::{LuError, LuResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pivot selection policy for each column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PivotMode {
    /// Compact the column and stop, recording no pivot (code −1)
    Structural,
    /// Pivot fixed to the designated diagonal row (code 0)
    Diagonal,
    /// Largest magnitude in the L part (code 1)
    #[default]
    Partial,
    /// Designated diagonal unless it is below `pivot_threshold × max` (code 2)
    Threshold,
}

impl PivotMode {
    /// Map an integer code: −1 structural, 1 partial, 2 threshold, anything
    /// else at or below zero means no pivoting.
    pub fn from_code(code: i32) -> LuResult<Self> {
        match code {
            -1 => Ok(PivotMode::Structural),
            c if c <= 0 => Ok(PivotMode::Diagonal),
            1 => Ok(PivotMode::Partial),
            2 => Ok(PivotMode::Threshold),
            c => Err(LuError::invalid_options(format!("unknown pivot mode {}", c))),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            PivotMode::Structural => -1,
            PivotMode::Diagonal => 0,
            PivotMode::Partial => 1,
            PivotMode::Threshold => 2,
        }
    }

    /// Modes that search the L part for a pivot (and apply drop thresholds)
    pub fn pivots(self) -> bool {
        matches!(self, PivotMode::Partial | PivotMode::Threshold)
    }
}

/// Options for one factorization
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FactorOptions {
    pub pivot_mode: PivotMode,
    /// In (0, 1]; only read in `Threshold` mode.
    pub pivot_threshold: f64,
    /// Relative drop tolerance, >= 0.
    pub drop_tolerance: f64,
    /// Rank limit per half-column, 0 = unlimited.
    pub keep_count: usize,
    /// Initial storage for the factors, 0 = derive from nnz(A).
    pub fill_estimate: usize,
}

impl Default for FactorOptions {
    fn default() -> Self {
        Self {
            pivot_mode: PivotMode::Partial,
            pivot_threshold: 1.0,
            drop_tolerance: 0.0,
            keep_count: 0,
            fill_estimate: 0,
        }
    }
}

impl FactorOptions {
    /// Threshold pivoting that prefers the designated diagonal.
    pub fn threshold(pivot_threshold: f64) -> Self {
        Self {
            pivot_mode: PivotMode::Threshold,
            pivot_threshold,
            ..Self::default()
        }
    }

    pub fn with_pivot_mode(mut self, mode: PivotMode) -> Self {
        self.pivot_mode = mode;
        self
    }

    pub fn with_pivot_threshold(mut self, threshold: f64) -> Self {
        self.pivot_threshold = threshold;
        self
    }

    pub fn with_drop_tolerance(mut self, tol: f64) -> Self {
        self.drop_tolerance = tol;
        self
    }

    pub fn with_keep_count(mut self, keep: usize) -> Self {
        self.keep_count = keep;
        self
    }

    pub fn with_fill_estimate(mut self, entries: usize) -> Self {
        self.fill_estimate = entries;
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> LuResult<()> {
        if self.pivot_mode == PivotMode::Threshold
            && !(self.pivot_threshold > 0.0 && self.pivot_threshold <= 1.0)
        {
            return Err(LuError::invalid_options(format!(
                "pivot threshold {} outside (0, 1]",
                self.pivot_threshold
            )));
        }
        if !self.drop_tolerance.is_finite() || self.drop_tolerance < 0.0 {
            return Err(LuError::invalid_options(format!(
                "drop tolerance {} must be finite and >= 0",
                self.drop_tolerance
            )));
        }
        Ok(())
    }

    /// Initial factor storage for a matrix with `nnz` entries and dimension `n`
    pub(crate) fn initial_storage(&self, nnz: usize, n: usize) -> usize {
        let estimate = if self.fill_estimate > 0 {
            self.fill_estimate
        } else {
            4 * nnz
        };
        estimate.max(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pivot_mode_codes() {
        assert_eq!(PivotMode::from_code(-1).unwrap(), PivotMode::Structural);
        assert_eq!(PivotMode::from_code(0).unwrap(), PivotMode::Diagonal);
        assert_eq!(PivotMode::from_code(-5).unwrap(), PivotMode::Diagonal);
        assert_eq!(PivotMode::from_code(1).unwrap(), PivotMode::Partial);
        assert_eq!(PivotMode::from_code(2).unwrap(), PivotMode::Threshold);
        assert!(PivotMode::from_code(3).is_err());

        for mode in [
            PivotMode::Structural,
            PivotMode::Diagonal,
            PivotMode::Partial,
            PivotMode::Threshold,
        ] {
            assert_eq!(PivotMode::from_code(mode.code()).unwrap(), mode);
        }
    }

    #[test]
    fn test_validate_ranges() {
        assert!(FactorOptions::default().validate().is_ok());
        assert!(FactorOptions::threshold(0.1).validate().is_ok());
        assert!(FactorOptions::threshold(0.0).validate().is_err());
        assert!(FactorOptions::threshold(1.5).validate().is_err());
        assert!(FactorOptions::default()
            .with_drop_tolerance(-1e-3)
            .validate()
            .is_err());
        assert!(FactorOptions::default()
            .with_drop_tolerance(f64::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn test_threshold_only_checked_in_threshold_mode() {
        let opts = FactorOptions::default().with_pivot_threshold(0.0);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_initial_storage() {
        let opts = FactorOptions::default();
        assert_eq!(opts.initial_storage(10, 5), 40);
        assert_eq!(opts.initial_storage(0, 5), 5);
        assert_eq!(opts.with_fill_estimate(100).initial_storage(10, 5), 100);
    }
}
