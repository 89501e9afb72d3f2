//! Entropic mirror descent.
//!
//! Exponentiated-gradient steps `X ← X ⊙ exp(−η·G)` followed by Sinkhorn
//! scaling. This is mirror descent on the Birkhoff polytope under the
//! entropy mirror map: iterates stay strictly positive, so projection
//! never meets a zero row or column.
//!
//! # References
//!
//! - Beck & Teboulle (2003), "Mirror descent and nonlinear projected
//!   subgradient methods for convex optimization"
//! - Cuturi (2013), "Sinkhorn Distances: Lightspeed Computation of Optimal
//!   Transport"

use crate::error::{QapError, QapResult};
use crate::novel::relax::{normalized_gradient, project};
use crate::pipeline::{SolverMethod, SolverState, StepContext};
use crate::registry::{Family, MethodSpec, ParamSchema, ParamSpec, Params};

/// Smallest entry kept after a multiplicative update.
const ENTRY_FLOOR: f64 = 1e-300;

/// Configuration for [`EntropicMirror`].
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Exponent scale η applied to the unit-normalised gradient.
    pub learning_rate: f64,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self { learning_rate: 1.0 }
    }
}

impl MirrorConfig {
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.learning_rate > 0.0) {
            return Err("learning_rate must be positive".into());
        }
        Ok(())
    }
}

/// Multiplicative-weights descent with Sinkhorn normalisation.
#[derive(Debug)]
pub struct EntropicMirror {
    config: MirrorConfig,
}

impl EntropicMirror {
    pub fn new(config: MirrorConfig) -> Self {
        Self { config }
    }
}

impl SolverMethod for EntropicMirror {
    fn step(&mut self, ctx: &mut StepContext<'_>, state: &mut SolverState) -> QapResult<()> {
        let eta = self.config.learning_rate * state.step_scale;
        let x = state.continuous_mut()?;
        let g = normalized_gradient(ctx.problem, x.matrix())?;
        let m = x.matrix_mut();
        for (v, &d) in m.iter_mut().zip(g.iter()) {
            *v = (*v * (-eta * d).exp()).max(ENTRY_FLOOR);
        }
        if !m.is_finite() {
            return Err(QapError::NumericalInstability(
                "mirror update overflowed".into(),
            ));
        }
        project(m, ctx.projection)
    }
}

impl MethodSpec for EntropicMirror {
    const NAME: &'static str = "entropic_mirror";
    const FAMILY: Family = Family::Novel;

    fn schema() -> ParamSchema {
        ParamSchema::new().with(
            ParamSpec::float("learning_rate", MirrorConfig::default().learning_rate, "exponent scale")
                .range(1e-9, 50.0),
        )
    }

    fn from_params(params: &Params) -> QapResult<Self> {
        let config = MirrorConfig {
            learning_rate: params.float("learning_rate")?,
        };
        config.validate().map_err(QapError::InvalidConfig)?;
        Ok(Self::new(config))
    }
}
