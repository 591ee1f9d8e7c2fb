//! Linear solver interface
//!
//! [`GpLuSolver`] wraps [`Factorization`] behind the prepare / analyze /
//! factor / solve cycle used by simulators that rebuild a matrix with a fixed
//! sparsity pattern many times.
//!
//! # Usage
//!
//! ```
//! use gplu_core::{GpLuSolver, LinearSolver};
//!
//! // [ 4 1 ]
//! // [ 1 3 ]
//! let ap = [0i64, 2, 4];
//! let ai = [0i64, 1, 0, 1];
//! let ax = [4.0, 1.0, 1.0, 3.0];
//!
//! let mut solver = GpLuSolver::new(2);
//! solver.analyze(&ap, &ai)?;
//! solver.factor(&ap, &ai, &ax)?;
//!
//! let mut rhs = [5.0, 4.0];
//! solver.solve(&mut rhs)?;
//! assert!((rhs[0] - 1.0).abs() < 1e-12);
//! assert!((rhs[1] - 1.0).abs() < 1e-12);
//! # Ok::<(), gplu_core::LuError>(())
//! ```

use crate::csc::CscMatrix;
use crate::error::{LuError, LuResult};
use crate::factor::{FactorStats, Factorization};
use crate::options::FactorOptions;
use crate::storage::Permutations;

/// Common interface for sparse direct solvers
pub trait LinearSolver: Send {
    /// Prepare the solver for a matrix of size n
    fn prepare(&mut self, n: usize);

    /// Analyze the sparsity pattern (can be cached)
    fn analyze(&mut self, ap: &[i64], ai: &[i64]) -> LuResult<()>;

    /// Factorize the matrix
    fn factor(&mut self, ap: &[i64], ai: &[i64], ax: &[f64]) -> LuResult<()>;

    /// Solve Ax = b, result overwrites rhs
    fn solve(&mut self, rhs: &mut [f64]) -> LuResult<()>;

    /// Reset cached pattern (call when matrix structure changes)
    fn reset_pattern(&mut self);

    /// Get the solver name for diagnostics
    fn name(&self) -> &'static str {
        "Unknown"
    }
}

/// Gilbert-Peierls LU with partial or threshold pivoting
#[derive(Debug, Clone)]
pub struct GpLuSolver {
    n: usize,
    options: FactorOptions,
    column_order: Option<Vec<usize>>,
    last_ap: Vec<i64>,
    last_ai: Vec<i64>,
    factors: Option<Factorization>,
    /// Whether the current pattern has been validated
    pub analyzed: bool,
    /// Number of numeric factorizations performed
    pub factor_count: usize,
}

impl GpLuSolver {
    pub fn new(n: usize) -> Self {
        Self::with_options(n, FactorOptions::default())
    }

    pub fn with_options(n: usize, options: FactorOptions) -> Self {
        Self {
            n,
            options,
            column_order: None,
            last_ap: Vec::new(),
            last_ai: Vec::new(),
            factors: None,
            analyzed: false,
            factor_count: 0,
        }
    }

    pub fn options(&self) -> &FactorOptions {
        &self.options
    }

    /// Change the options used by the next `factor` call.
    pub fn set_options(&mut self, options: FactorOptions) {
        self.options = options;
        self.factors = None;
    }

    /// Process columns in `order` (1-based column identities) instead of the
    /// natural order.
    pub fn set_column_order(&mut self, order: Vec<usize>) -> LuResult<()> {
        let perm = Permutations::with_column_order(order)?;
        if perm.n() != self.n {
            return Err(LuError::DimensionMismatch {
                expected: self.n,
                got: perm.n(),
            });
        }
        self.column_order = Some(perm.cperm().to_vec());
        self.factors = None;
        Ok(())
    }

    /// Latest factorization, if any
    pub fn factorization(&self) -> Option<&Factorization> {
        self.factors.as_ref()
    }

    pub fn stats(&self) -> Option<&FactorStats> {
        self.factors.as_ref().map(Factorization::stats)
    }

    fn pattern_matches(&self, ap: &[i64], ai: &[i64]) -> bool {
        self.last_ap == ap && self.last_ai == ai
    }
}

impl LinearSolver for GpLuSolver {
    fn prepare(&mut self, n: usize) {
        if n != self.n {
            self.reset_pattern();
            self.n = n;
            self.column_order = None;
        }
    }

    fn analyze(&mut self, ap: &[i64], ai: &[i64]) -> LuResult<()> {
        if self.analyzed && self.pattern_matches(ap, ai) {
            return Ok(());
        }

        if ap.len() != self.n + 1 {
            return Err(LuError::invalid_matrix(format!(
                "column pointer length {} != expected {}",
                ap.len(),
                self.n + 1
            )));
        }

        self.analyzed = false;
        self.factors = None;

        // Structure only; values are checked again at factor time.
        let zeros = vec![0.0; ai.len()];
        CscMatrix::from_raw_parts(self.n, ap, ai, &zeros)?;

        self.last_ap = ap.to_vec();
        self.last_ai = ai.to_vec();
        self.analyzed = true;
        log::trace!("{}: analyzed pattern n={} nnz={}", self.name(), self.n, ai.len());

        Ok(())
    }

    fn factor(&mut self, ap: &[i64], ai: &[i64], ax: &[f64]) -> LuResult<()> {
        if !self.analyzed || !self.pattern_matches(ap, ai) {
            self.analyze(ap, ai)?;
        }

        self.factors = None;
        let a = CscMatrix::from_raw_parts(self.n, ap, ai, ax)?;
        let factors = match &self.column_order {
            Some(order) => Factorization::factor_ordered(&a.view(), order.clone(), &self.options)?,
            None => Factorization::factor(&a.view(), &self.options)?,
        };

        self.factors = Some(factors);
        self.factor_count += 1;
        Ok(())
    }

    fn solve(&mut self, rhs: &mut [f64]) -> LuResult<()> {
        self.factors
            .as_ref()
            .ok_or(LuError::NotFactored)?
            .solve(rhs)
    }

    fn reset_pattern(&mut self) {
        self.analyzed = false;
        self.factors = None;
        self.last_ap.clear();
        self.last_ai.clear();
    }

    fn name(&self) -> &'static str {
        "GpLU"
    }
}
