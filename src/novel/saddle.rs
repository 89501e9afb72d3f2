//! Reverse-time saddle escape.
//!
//! Projected gradient descent on the relaxation that detects stalls
//! (vanishing tangent gradient, or no objective improvement over a window)
//! and escapes them by perturbing the iterate and running the gradient
//! flow backwards for a few steps before resuming descent.
//!
//! The QAP relaxation is indefinite, so descent frequently slows near
//! saddle points of the polytope interior; reversing the flow pushes the
//! iterate off the stable manifold of the saddle.
//!
//! # References
//!
//! - Ge, Huang, Jin & Yuan (2015), "Escaping From Saddle Points: Online
//!   Stochastic Gradient for Tensor Decomposition"
//! - Jin, Ge, Netrapalli, Kakade & Jordan (2017), "How to Escape Saddle
//!   Points Efficiently"

use crate::error::{QapError, QapResult};
use crate::matrix::SquareMatrix;
use crate::novel::relax::{normalized_gradient, perturb, step_length, tangent_projection};
use crate::pipeline::{SolverMethod, SolverState, StepContext};
use crate::registry::{Family, MethodSpec, ParamSchema, ParamSpec, Params};

/// Configuration for [`ReverseTimeSaddle`].
#[derive(Debug, Clone)]
pub struct SaddleConfig {
    /// Step size before the `1/n` entry scaling.
    pub learning_rate: f64,

    /// Steps without improvement that count as a stall.
    pub stall_window: usize,

    /// Tangent-gradient norm below which the iterate counts as stalled;
    /// also the relative improvement that resets the stall counter.
    pub stall_threshold: f64,

    /// Sign-flipped steps taken per escape.
    pub reverse_steps: usize,

    /// Log-normal perturbation magnitude applied at the start of an escape.
    pub perturbation: f64,

    /// Escape budget for the whole run.
    pub max_escapes: usize,
}

impl Default for SaddleConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.5,
            stall_window: 10,
            stall_threshold: 1e-4,
            reverse_steps: 5,
            perturbation: 0.1,
            max_escapes: 10,
        }
    }
}

impl SaddleConfig {
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_stall_window(mut self, window: usize) -> Self {
        self.stall_window = window;
        self
    }

    pub fn with_stall_threshold(mut self, threshold: f64) -> Self {
        self.stall_threshold = threshold;
        self
    }

    pub fn with_reverse_steps(mut self, steps: usize) -> Self {
        self.reverse_steps = steps;
        self
    }

    pub fn with_perturbation(mut self, magnitude: f64) -> Self {
        self.perturbation = magnitude;
        self
    }

    pub fn with_max_escapes(mut self, n: usize) -> Self {
        self.max_escapes = n;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.learning_rate > 0.0) {
            return Err("learning_rate must be positive".into());
        }
        if self.stall_window == 0 {
            return Err("stall_window must be at least 1".into());
        }
        if !(self.stall_threshold >= 0.0) {
            return Err("stall_threshold must be non-negative".into());
        }
        if !(self.perturbation >= 0.0) {
            return Err("perturbation must be non-negative".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Descend { reference: f64, stalled_for: usize },
    Reverse { remaining: usize },
}

/// Projected gradient descent with perturbed reverse-time escapes.
#[derive(Debug)]
pub struct ReverseTimeSaddle {
    config: SaddleConfig,
    phase: Phase,
    escapes: usize,
}

impl ReverseTimeSaddle {
    pub fn new(config: SaddleConfig) -> Self {
        Self {
            config,
            phase: Phase::Descend {
                reference: f64::INFINITY,
                stalled_for: 0,
            },
            escapes: 0,
        }
    }

    /// Escapes performed so far.
    pub fn escapes(&self) -> usize {
        self.escapes
    }

    fn direction(ctx: &StepContext<'_>, x: &SquareMatrix) -> QapResult<SquareMatrix> {
        let mut g = normalized_gradient(ctx.problem, x)?;
        tangent_projection(&mut g);
        Ok(g)
    }

    /// Updates the stall counter from the last evaluated objective and
    /// reports whether descent has stalled.
    fn stalled(&mut self, objective: f64, grad_norm: f64) -> bool {
        let Phase::Descend {
            reference,
            stalled_for,
        } = &mut self.phase
        else {
            return false;
        };
        let improved = !reference.is_finite()
            || objective < *reference - self.config.stall_threshold * reference.abs().max(1.0);
        if improved {
            *reference = objective;
            *stalled_for = 0;
        } else {
            *stalled_for += 1;
        }
        grad_norm < self.config.stall_threshold || *stalled_for >= self.config.stall_window
    }
}

impl SolverMethod for ReverseTimeSaddle {
    fn step(&mut self, ctx: &mut StepContext<'_>, state: &mut SolverState) -> QapResult<()> {
        let n = ctx.problem.size();
        let eta = step_length(self.config.learning_rate, n, state.step_scale);
        let objective = state.objective;
        let x = state.continuous_mut()?;
        let g = Self::direction(ctx, x.matrix())?;

        match self.phase {
            Phase::Descend { .. } => {
                let grad_norm = g.frobenius_norm() / n as f64;
                if self.stalled(objective, grad_norm) && self.escapes < self.config.max_escapes {
                    self.escapes += 1;
                    log::debug!(
                        "saddle escape {}/{} at step {} (objective {objective:.4}, |g| {grad_norm:.2e})",
                        self.escapes,
                        self.config.max_escapes,
                        ctx.iteration
                    );
                    perturb(x.matrix_mut(), self.config.perturbation, ctx.rng);
                    self.phase = Phase::Reverse {
                        remaining: self.config.reverse_steps,
                    };
                    // A zero-length reverse phase is a pure perturbation restart.
                    if self.config.reverse_steps == 0 {
                        self.phase = Phase::Descend {
                            reference: f64::INFINITY,
                            stalled_for: 0,
                        };
                    }
                } else {
                    x.matrix_mut().add_scaled(-eta, &g);
                }
            }
            Phase::Reverse { remaining } => {
                x.matrix_mut().add_scaled(eta, &g);
                self.phase = if remaining > 1 {
                    Phase::Reverse {
                        remaining: remaining - 1,
                    }
                } else {
                    Phase::Descend {
                        reference: f64::INFINITY,
                        stalled_for: 0,
                    }
                };
            }
        }

        if !x.matrix().is_finite() {
            return Err(QapError::NumericalInstability(
                "saddle step produced a non-finite iterate".into(),
            ));
        }
        Ok(())
    }
}

impl MethodSpec for ReverseTimeSaddle {
    const NAME: &'static str = "reverse_time_saddle";
    const FAMILY: Family = Family::Novel;

    fn schema() -> ParamSchema {
        let d = SaddleConfig::default();
        ParamSchema::new()
            .with(ParamSpec::float("learning_rate", d.learning_rate, "step size").range(1e-9, 1e3))
            .with(
                ParamSpec::int("stall_window", d.stall_window as i64, "steps without improvement before escaping")
                    .at_least(1.0),
            )
            .with(
                ParamSpec::float("stall_threshold", d.stall_threshold, "gradient norm / relative improvement floor")
                    .at_least(0.0),
            )
            .with(ParamSpec::int("reverse_steps", d.reverse_steps as i64, "ascent steps per escape").at_least(0.0))
            .with(ParamSpec::float("perturbation", d.perturbation, "escape noise magnitude").at_least(0.0))
            .with(ParamSpec::int("max_escapes", d.max_escapes as i64, "escape budget").at_least(0.0))
    }

    fn from_params(params: &Params) -> QapResult<Self> {
        let config = SaddleConfig {
            learning_rate: params.float("learning_rate")?,
            stall_window: params.usize("stall_window")?,
            stall_threshold: params.float("stall_threshold")?,
            reverse_steps: params.usize("reverse_steps")?,
            perturbation: params.float("perturbation")?,
            max_escapes: params.usize("max_escapes")?,
        };
        config.validate().map_err(QapError::InvalidConfig)?;
        Ok(Self::new(config))
    }
}
