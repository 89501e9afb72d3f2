//! Candidate solutions and run results.

use std::time::Duration;

use rand::Rng;

use crate::error::{QapError, QapResult};
use crate::matrix::SquareMatrix;

/// A relaxed solution: an `n×n` real matrix that, once projected, lies in
/// the Birkhoff polytope (non-negative, rows and columns summing to 1).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContinuousSolution {
    matrix: SquareMatrix,
}

impl ContinuousSolution {
    /// The barycenter of the polytope: every entry `1/n`.
    pub fn uniform(n: usize) -> Self {
        Self {
            matrix: SquareMatrix::filled(n, 1.0 / n as f64),
        }
    }

    pub fn from_matrix(matrix: SquareMatrix) -> Self {
        Self { matrix }
    }

    pub fn size(&self) -> usize {
        self.matrix.size()
    }

    pub fn matrix(&self) -> &SquareMatrix {
        &self.matrix
    }

    pub fn matrix_mut(&mut self) -> &mut SquareMatrix {
        &mut self.matrix
    }

    pub fn into_matrix(self) -> SquareMatrix {
        self.matrix
    }

    /// Largest deviation of any row or column sum from 1.
    pub fn marginal_error(&self) -> f64 {
        crate::projection::marginal_error(&self.matrix)
    }

    pub fn is_doubly_stochastic(&self, eps: f64) -> bool {
        crate::projection::is_doubly_stochastic(&self.matrix, eps)
    }
}

/// A discrete assignment: facility `i` is placed at location `perm[i]`.
///
/// Always a bijection on `0..n`; every constructor checks it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Permutation(Vec<usize>);

impl Permutation {
    /// Validates that `perm` is a bijection on `0..perm.len()`.
    pub fn new(perm: Vec<usize>) -> QapResult<Self> {
        let n = perm.len();
        let mut seen = vec![false; n];
        for &p in &perm {
            if p >= n || seen[p] {
                return Err(QapError::InvalidProblem(format!(
                    "not a permutation of 0..{n}: {perm:?}"
                )));
            }
            seen[p] = true;
        }
        Ok(Self(perm))
    }

    pub(crate) fn from_vec_unchecked(perm: Vec<usize>) -> Self {
        debug_assert!(Permutation::new(perm.clone()).is_ok());
        Self(perm)
    }

    pub fn identity(n: usize) -> Self {
        Self((0..n).collect())
    }

    /// Uniformly random permutation.
    pub fn random<R: Rng>(n: usize, rng: &mut R) -> Self {
        let mut perm: Vec<usize> = (0..n).collect();
        crate::random::shuffle(&mut perm, rng);
        Self(perm)
    }

    /// Reads an exact 0/1 permutation matrix.
    pub fn from_matrix(m: &SquareMatrix) -> QapResult<Self> {
        if !crate::projection::is_permutation_matrix(m) {
            return Err(QapError::InvalidProblem(
                "matrix is not a 0/1 permutation matrix".into(),
            ));
        }
        let perm = (0..m.size())
            .map(|i| m.row(i).iter().position(|&v| v == 1.0).unwrap_or(0))
            .collect();
        Ok(Self(perm))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<usize> {
        self.0
    }

    /// Exchanges the locations of facilities `i` and `j`.
    #[inline]
    pub fn swap(&mut self, i: usize, j: usize) {
        self.0.swap(i, j);
    }

    /// The inverse assignment: location `l` holds facility `inverse[l]`.
    pub fn inverse(&self) -> Self {
        let mut inv = vec![0; self.0.len()];
        for (i, &p) in self.0.iter().enumerate() {
            inv[p] = i;
        }
        Self(inv)
    }

    /// The 0/1 matrix `X` with `X[i][perm[i]] = 1`.
    pub fn to_matrix(&self) -> SquareMatrix {
        let n = self.0.len();
        let mut m = SquareMatrix::zeros(n);
        for (i, &p) in self.0.iter().enumerate() {
            m[(i, p)] = 1.0;
        }
        m
    }
}

/// One entry of a run's trace.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TracePoint {
    pub iteration: usize,
    /// Objective of the current iterate (relaxed value for continuous methods).
    pub objective: f64,
    /// Best discrete objective found up to this iteration.
    pub best_objective: f64,
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StopReason {
    /// Improvement fell below the tolerance over the convergence window.
    Converged,
    /// Iteration budget exhausted.
    MaxIterations,
    /// Wall-clock deadline reached.
    TimeLimit,
    /// Projection diverged twice in a row.
    ProjectionFailure,
    /// The method returned an unrecoverable error mid-run.
    Aborted,
}

impl StopReason {
    pub fn is_converged(self) -> bool {
        matches!(self, StopReason::Converged)
    }
}

/// Outcome of one solver run.
///
/// Always produced, even when the run did not converge; `solution` is the
/// best assignment seen during the run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptimizationResult {
    pub method: String,
    pub solution: Permutation,
    pub objective_value: f64,
    pub iterations: usize,
    pub elapsed: Duration,
    pub converged: bool,
    pub stop_reason: StopReason,
    pub trace: Vec<TracePoint>,
    /// Number of NaN/Inf recoveries performed.
    pub recoveries: usize,
}

impl OptimizationResult {
    /// Best-objective-so-far series from the trace.
    pub fn best_history(&self) -> Vec<f64> {
        self.trace.iter().map(|t| t.best_objective).collect()
    }
}
