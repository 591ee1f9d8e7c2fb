//! Error types for the factorization kernels and the column driver
//!
//! The four kernel errors abort the column that raised them and always carry
//! the 1-based pivot column. None of them is retried inside the crate; the
//! caller decides whether to halt, change the pivoting strategy, or relax the
//! drop settings and start over.

use thiserror::Error;

/// Errors raised by the symbolic DFS, the column finalization and the driver
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LuError {
    /// Column range of A runs backwards (`col_ptr[c + 1] < col_ptr[c]`)
    #[error("malformed input at column {column}: column range {start}..{end} has negative length")]
    MalformedInput {
        column: usize,
        start: usize,
        end: usize,
    },

    /// The pivot column has no candidate entries at all
    #[error("empty column {column}: no candidate entries (matrix is structurally singular)")]
    EmptyColumn { column: usize },

    /// Compaction left no identifiable pivot candidate
    #[error("no pivot found in column {column}")]
    NoPivotFound { column: usize },

    /// The selected pivot is exactly zero
    #[error("numerically zero pivot at column {column}")]
    NumericallySingular { column: usize },

    /// Invalid matrix dimensions or structure, detected before factoring
    #[error("invalid matrix: {reason}")]
    InvalidMatrix { reason: String },

    /// Option values outside their documented ranges
    #[error("invalid options: {reason}")]
    InvalidOptions { reason: String },

    /// Vector length does not match the matrix dimension
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Solve requested before a successful factorization
    #[error("matrix has not been factored")]
    NotFactored,
}

/// Result alias used throughout the crate
pub type LuResult<T> = Result<T, LuError>;

impl LuError {
    /// Pivot column that raised a kernel error, `None` for driver errors
    pub fn column(&self) -> Option<usize> {
        match self {
            LuError::MalformedInput { column, .. }
            | LuError::EmptyColumn { column }
            | LuError::NoPivotFound { column }
            | LuError::NumericallySingular { column } => Some(*column),
            _ => None,
        }
    }

    /// True for failures that say the matrix (or its current submatrix) is singular
    pub fn is_singular(&self) -> bool {
        matches!(
            self,
            LuError::EmptyColumn { .. }
                | LuError::NoPivotFound { .. }
                | LuError::NumericallySingular { .. }
        )
    }

    pub(crate) fn invalid_matrix(reason: impl Into<String>) -> Self {
        LuError::InvalidMatrix {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_options(reason: impl Into<String>) -> Self {
        LuError::InvalidOptions {
            reason: reason.into(),
        }
    }
}
