//! Homotopy continuation toward polytope vertices.
//!
//! Minimises `f(X) − μ_t · n · ‖X‖²_F` by projected gradient descent while
//! the concavity weight `μ_t` grows geometrically. At `μ = 0` the method
//! follows the plain relaxation; as `μ` grows the penalty rewards mass
//! concentration and pulls the iterate toward a vertex, so the final
//! rounding loses little.
//!
//! # References
//!
//! - Zaslavskiy, Bach & Vert (2009), "A path following algorithm for the
//!   graph matching problem", *IEEE TPAMI* 31(12)
//! - Xia (2010), "An efficient continuation method for quadratic assignment
//!   problems", *Computers & Operations Research* 37(6)

use crate::error::{QapError, QapResult};
use crate::novel::relax::{normalized_gradient, step_length, tangent_projection};
use crate::pipeline::{SolverMethod, SolverState, StepContext};
use crate::registry::{Family, MethodSpec, ParamSchema, ParamSpec, Params};

/// Configuration for [`HomotopyContinuation`].
#[derive(Debug, Clone)]
pub struct HomotopyConfig {
    /// Step size before the `1/n` entry scaling.
    pub learning_rate: f64,

    /// Concavity weight at the first step.
    pub mu_initial: f64,

    /// Per-step multiplier on the weight (> 1).
    pub mu_growth: f64,

    /// Upper bound on the weight.
    pub mu_max: f64,
}

impl Default for HomotopyConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.5,
            mu_initial: 0.01,
            mu_growth: 1.05,
            mu_max: 5.0,
        }
    }
}

impl HomotopyConfig {
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_mu_initial(mut self, mu: f64) -> Self {
        self.mu_initial = mu;
        self
    }

    pub fn with_mu_growth(mut self, growth: f64) -> Self {
        self.mu_growth = growth;
        self
    }

    pub fn with_mu_max(mut self, mu: f64) -> Self {
        self.mu_max = mu;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.learning_rate > 0.0) {
            return Err("learning_rate must be positive".into());
        }
        if !(self.mu_initial >= 0.0) {
            return Err("mu_initial must be non-negative".into());
        }
        if !(self.mu_growth >= 1.0) {
            return Err(format!("mu_growth must be at least 1, got {}", self.mu_growth));
        }
        if !(self.mu_max >= self.mu_initial) {
            return Err("mu_max must be at least mu_initial".into());
        }
        Ok(())
    }
}

/// Projected descent along a concave homotopy path.
#[derive(Debug)]
pub struct HomotopyContinuation {
    config: HomotopyConfig,
    mu: f64,
}

impl HomotopyContinuation {
    pub fn new(config: HomotopyConfig) -> Self {
        let mu = config.mu_initial;
        Self { config, mu }
    }

    /// Current concavity weight.
    pub fn mu(&self) -> f64 {
        self.mu
    }
}

impl SolverMethod for HomotopyContinuation {
    fn step(&mut self, ctx: &mut StepContext<'_>, state: &mut SolverState) -> QapResult<()> {
        let n = ctx.problem.size();
        let eta = step_length(self.config.learning_rate, n, state.step_scale);
        let x = state.continuous_mut()?;

        // d/dX of −μ·n·‖X‖² is −2μ·n·X; entries of n·X are O(1) like the
        // normalised objective gradient.
        let mut d = normalized_gradient(ctx.problem, x.matrix())?;
        d.add_scaled(-2.0 * self.mu * n as f64, x.matrix());
        tangent_projection(&mut d);
        x.matrix_mut().add_scaled(-eta, &d);
        if !x.matrix().is_finite() {
            return Err(QapError::NumericalInstability(
                "homotopy step produced a non-finite iterate".into(),
            ));
        }

        self.mu = (self.mu * self.config.mu_growth).min(self.config.mu_max);
        Ok(())
    }
}

impl MethodSpec for HomotopyContinuation {
    const NAME: &'static str = "homotopy_continuation";
    const FAMILY: Family = Family::Novel;

    fn schema() -> ParamSchema {
        let d = HomotopyConfig::default();
        ParamSchema::new()
            .with(ParamSpec::float("learning_rate", d.learning_rate, "step size").range(1e-9, 1e3))
            .with(ParamSpec::float("mu_initial", d.mu_initial, "initial concavity weight").at_least(0.0))
            .with(ParamSpec::float("mu_growth", d.mu_growth, "per-step weight multiplier").range(1.0, 10.0))
            .with(ParamSpec::float("mu_max", d.mu_max, "weight cap").at_least(0.0))
    }

    fn from_params(params: &Params) -> QapResult<Self> {
        let config = HomotopyConfig {
            learning_rate: params.float("learning_rate")?,
            mu_initial: params.float("mu_initial")?,
            mu_growth: params.float("mu_growth")?,
            mu_max: params.float("mu_max")?,
        };
        config.validate().map_err(QapError::InvalidConfig)?;
        Ok(Self::new(config))
    }
}
