//! Birkhoff polytope projection by Sinkhorn–Knopp iteration.
//!
//! Negative entries are clamped to zero, then rows and columns are
//! normalised alternately until every marginal is within the tolerance.
//!
//! # Reference
//!
//! Sinkhorn & Knopp (1967), "Concerning nonnegative matrices and doubly
//! stochastic matrices", *Pacific J. Math.* 21(2), 343-348.

use super::validate::marginal_error;
use crate::error::{QapError, QapResult};
use crate::matrix::SquareMatrix;

/// Sums below this cannot be normalised.
const MIN_MARGINAL: f64 = 1e-300;

/// Outcome of a successful projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SinkhornOutcome {
    /// Row+column sweeps performed (0 if the input was already feasible).
    pub iterations: usize,
    /// Final maximum marginal error.
    pub residual: f64,
}

/// Sinkhorn–Knopp projector.
#[derive(Debug, Clone, Copy)]
pub struct SinkhornProjector {
    /// Stop when every row and column sum is within this of 1.
    pub tolerance: f64,
    /// Maximum number of row+column sweeps.
    pub max_iterations: usize,
}

impl Default for SinkhornProjector {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 1000,
        }
    }
}

impl SinkhornProjector {
    pub fn new(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

    /// Projects `m` in place onto the doubly-stochastic matrices.
    ///
    /// A matrix that is already feasible is returned unchanged. Fails with
    /// [`QapError::ProjectionDivergence`] if a row or column has no
    /// positive mass, or the tolerance is not met within `max_iterations`.
    pub fn project(&self, m: &mut SquareMatrix) -> QapResult<SinkhornOutcome> {
        if !m.is_finite() {
            return Err(QapError::NumericalInstability(
                "cannot project a matrix with NaN or infinite entries".into(),
            ));
        }
        m.map_inplace(|v| v.max(0.0));

        let initial = marginal_error(m);
        if initial <= self.tolerance {
            return Ok(SinkhornOutcome {
                iterations: 0,
                residual: initial,
            });
        }

        let n = m.size();
        for iter in 0..self.max_iterations {
            for i in 0..n {
                let mut row = m.row_mut(i);
                let s = row.sum();
                if s < MIN_MARGINAL {
                    return Err(QapError::ProjectionDivergence {
                        iterations: iter,
                        residual: f64::INFINITY,
                    });
                }
                let inv = 1.0 / s;
                row.iter_mut().for_each(|x| *x *= inv);
            }

            // Rows are exact here; stop once the columns agree.
            let cols = m.col_sums();
            let col_err = cols.iter().fold(0.0f64, |e, s| e.max((s - 1.0).abs()));
            if col_err <= self.tolerance {
                return Ok(SinkhornOutcome {
                    iterations: iter + 1,
                    residual: marginal_error(m),
                });
            }

            if cols.iter().any(|&s| s < MIN_MARGINAL) {
                return Err(QapError::ProjectionDivergence {
                    iterations: iter + 1,
                    residual: f64::INFINITY,
                });
            }
            for i in 0..n {
                for (x, &s) in m.row_mut(i).iter_mut().zip(&cols) {
                    *x /= s;
                }
            }
        }

        let residual = marginal_error(m);
        if residual <= self.tolerance {
            Ok(SinkhornOutcome {
                iterations: self.max_iterations,
                residual,
            })
        } else {
            Err(QapError::ProjectionDivergence {
                iterations: self.max_iterations,
                residual,
            })
        }
    }

    /// Blends `m` with the uniform matrix, `(1-λ)·m + λ/n`, then projects.
    ///
    /// The blend gives every entry positive mass, which guarantees
    /// Sinkhorn convergence for `λ > 0`.
    pub fn project_damped(&self, m: &mut SquareMatrix, damping: f64) -> QapResult<SinkhornOutcome> {
        let n = m.size() as f64;
        let lambda = damping.clamp(0.0, 1.0);
        m.map_inplace(|v| (1.0 - lambda) * v.max(0.0) + lambda / n);
        self.project(m)
    }
}
