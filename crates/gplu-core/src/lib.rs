//! Gilbert-Peierls sparse LU factorization
//!
//! Left-looking, column-at-a-time LU of a square sparse matrix in
//! compressed-column form. Each column goes through three steps:
//!
//! 1. [`symbolic_dfs`] finds the nonzero structure of the new U column by a
//!    depth-first search over the columns of L already computed.
//! 2. [`numeric_update`] applies those columns to the dense working column.
//! 3. [`finalize_column`] picks the pivot, drops small entries and scales L.
//!
//! [`Factorization`] drives the three steps over every column and solves with
//! the result; [`GpLuSolver`] exposes it through the [`LinearSolver`] trait.
//! Incomplete factorizations restricted to a sparsity pattern (for use as a
//! preconditioner) go through [`Factorization::factor_incomplete`].

pub mod csc;
pub mod dfs;
pub mod error;
pub mod factor;
pub mod finalize;
pub mod options;
pub mod select;
pub mod solver;
pub mod storage;

pub use csc::{CscMatrix, CscView};
pub use dfs::symbolic_dfs;
pub use error::{LuError, LuResult};
pub use factor::{numeric_update, ColumnUpdate, FactorStats, Factorization};
pub use finalize::{finalize_column, FinalizedColumn};
pub use options::{FactorOptions, PivotMode};
pub use select::kth_largest_magnitude;
pub use solver::{GpLuSolver, LinearSolver};
pub use storage::{FactorStorage, PatternMark, Permutations, Workspace};
