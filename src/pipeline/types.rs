//! The solver capability and the per-run state it advances.

use rand::rngs::StdRng;

use crate::error::{QapError, QapResult};
use crate::problem::Problem;
use crate::projection::ProjectionConfig;
use crate::solution::{ContinuousSolution, Permutation};

/// The current iterate of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum Iterate {
    /// Relaxed iterate in (or near) the Birkhoff polytope.
    Continuous(ContinuousSolution),
    /// Discrete assignment.
    Discrete(Permutation),
}

impl Iterate {
    /// False if a continuous iterate holds NaN or infinite entries.
    pub fn is_finite(&self) -> bool {
        match self {
            Iterate::Continuous(x) => x.matrix().is_finite(),
            Iterate::Discrete(_) => true,
        }
    }
}

/// Mutable state of one run, advanced by [`SolverMethod::step`].
#[derive(Debug, Clone)]
pub struct SolverState {
    /// The iterate the orchestrator projects, scores, and records.
    pub iterate: Iterate,

    /// Objective of `iterate` as last evaluated by the orchestrator.
    pub objective: f64,

    /// Multiplier on step sizes; halved after each NaN/Inf recovery.
    pub step_scale: f64,
}

impl SolverState {
    pub fn new(iterate: Iterate, objective: f64) -> Self {
        Self {
            iterate,
            objective,
            step_scale: 1.0,
        }
    }

    /// The continuous iterate, or `InvalidConfig` for a discrete run.
    pub fn continuous_mut(&mut self) -> QapResult<&mut ContinuousSolution> {
        match &mut self.iterate {
            Iterate::Continuous(x) => Ok(x),
            Iterate::Discrete(_) => Err(QapError::InvalidConfig(
                "continuous solver received a discrete iterate".into(),
            )),
        }
    }

    /// The discrete iterate, or `InvalidConfig` for a continuous run.
    pub fn permutation_mut(&mut self) -> QapResult<&mut Permutation> {
        match &mut self.iterate {
            Iterate::Discrete(p) => Ok(p),
            Iterate::Continuous(_) => Err(QapError::InvalidConfig(
                "permutation solver received a continuous iterate".into(),
            )),
        }
    }
}

/// Read-only run context plus the run's random generator.
pub struct StepContext<'a> {
    pub problem: &'a Problem,
    /// The run's only source of randomness.
    pub rng: &'a mut StdRng,
    pub projection: &'a ProjectionConfig,
    /// 1-based index of the step being taken (0 during initialization).
    pub iteration: usize,
    /// Best discrete objective recorded so far.
    pub best_objective: f64,
}

/// A solver method: a single-step update driven by the orchestrator.
///
/// Novel methods update a continuous iterate and leave re-projection to
/// the orchestrator; baseline methods keep the iterate a valid
/// permutation. Implementations own all their per-run state (populations,
/// tabu lists, temperatures), so a fresh instance is built for every run.
pub trait SolverMethod: Send {
    /// Called once with the seeded state before the first step.
    fn initialize(&mut self, _ctx: &mut StepContext<'_>, _state: &mut SolverState) -> QapResult<()> {
        Ok(())
    }

    /// Advances the iterate by one step.
    ///
    /// Returning [`QapError::NumericalInstability`] (or leaving NaN/Inf in
    /// the iterate) triggers recovery from the last valid iterate with a
    /// damped step scale.
    fn step(&mut self, ctx: &mut StepContext<'_>, state: &mut SolverState) -> QapResult<()>;
}
