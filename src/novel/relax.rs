//! Shared machinery for the relaxed methods: normalised gradients, the
//! tangent space of the polytope, perturbation, and in-place projection.

use rand::Rng;
use rand_distr::StandardNormal;

use crate::error::{QapError, QapResult};
use crate::matrix::SquareMatrix;
use crate::problem::Problem;
use crate::projection::ProjectionConfig;

/// Objective gradient scaled so its largest entry has magnitude 1.
///
/// A zero gradient is returned as is.
pub(crate) fn normalized_gradient(problem: &Problem, x: &SquareMatrix) -> QapResult<SquareMatrix> {
    let mut g = problem.gradient(x);
    if !g.is_finite() {
        return Err(QapError::NumericalInstability(
            "objective gradient is not finite".into(),
        ));
    }
    let peak = g.max_abs();
    if peak > 0.0 {
        g.scale(1.0 / peak);
    }
    Ok(g)
}

/// Removes row and column means, leaving a direction with zero row and
/// column sums (parallel to the affine hull of the polytope).
pub(crate) fn tangent_projection(g: &mut SquareMatrix) {
    let n = g.size();
    let inv = 1.0 / n as f64;
    let rows: Vec<f64> = g.row_sums().into_iter().map(|s| s * inv).collect();
    let cols: Vec<f64> = g.col_sums().into_iter().map(|s| s * inv).collect();
    let mean = rows.iter().sum::<f64>() * inv;
    for (i, &r) in rows.iter().enumerate() {
        for (v, &c) in g.row_mut(i).iter_mut().zip(&cols) {
            *v -= r + c - mean;
        }
    }
}

/// Step length for a unit-normalised direction.
///
/// Entries of a doubly-stochastic matrix are `O(1/n)`, so the step scales
/// the same way.
pub(crate) fn step_length(learning_rate: f64, n: usize, step_scale: f64) -> f64 {
    learning_rate / n as f64 * step_scale
}

/// Multiplies every entry by `exp(magnitude · z)`, `z ~ N(0, 1)`.
///
/// Keeps positive entries positive; callers re-project afterwards.
pub(crate) fn perturb<R: Rng>(x: &mut SquareMatrix, magnitude: f64, rng: &mut R) {
    let floor = 1e-3 / x.size() as f64;
    for v in x.iter_mut() {
        *v = v.max(floor) * (magnitude * rng.sample::<f64, _>(StandardNormal)).exp();
    }
}

/// Projects `m` onto the polytope, retrying once with damping.
///
/// Used for iterates the orchestrator does not see (populations, inner
/// mirror steps).
pub(crate) fn project(m: &mut SquareMatrix, config: &ProjectionConfig) -> QapResult<()> {
    let projector = config.projector();
    match projector.project(m) {
        Ok(_) => Ok(()),
        Err(QapError::ProjectionDivergence { .. }) => {
            projector.project_damped(m, config.damping).map(|_| ())
        }
        Err(err) => Err(err),
    }
}
