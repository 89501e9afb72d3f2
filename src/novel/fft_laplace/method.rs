//! Laplace descent step.

use super::config::LaplaceConfig;
use super::preconditioner::LaplacePreconditioner;
use crate::error::{QapError, QapResult};
use crate::matrix::SquareMatrix;
use crate::novel::relax::{normalized_gradient, step_length, tangent_projection};
use crate::pipeline::{SolverMethod, SolverState, StepContext};
use crate::registry::{Family, MethodSpec, ParamSchema, Params};

/// FFT-preconditioned projected gradient descent with momentum.
///
/// Each step:
///
/// 1. `G ← ∇f(X) / max|∇f(X)|`, projected onto the tangent space
/// 2. `D ← (I + τL)⁻¹ G` via 2-D FFT
/// 3. `V ← μV − η·D`, `X ← X + V`
///
/// The orchestrator re-projects `X` afterwards. After a NaN recovery the
/// orchestrator halves `step_scale`; the velocity is reset at that point.
#[derive(Debug)]
pub struct FftLaplace {
    config: LaplaceConfig,
    preconditioner: Option<LaplacePreconditioner>,
    velocity: Option<SquareMatrix>,
    last_scale: f64,
}

impl FftLaplace {
    pub fn new(config: LaplaceConfig) -> Self {
        Self {
            config,
            preconditioner: None,
            velocity: None,
            last_scale: 1.0,
        }
    }

    pub fn config(&self) -> &LaplaceConfig {
        &self.config
    }
}

impl SolverMethod for FftLaplace {
    fn initialize(&mut self, ctx: &mut StepContext<'_>, _state: &mut SolverState) -> QapResult<()> {
        let n = ctx.problem.size();
        self.preconditioner = Some(LaplacePreconditioner::new(n, self.config.tau));
        self.velocity = Some(SquareMatrix::zeros(n));
        Ok(())
    }

    fn step(&mut self, ctx: &mut StepContext<'_>, state: &mut SolverState) -> QapResult<()> {
        let n = ctx.problem.size();
        if state.step_scale < self.last_scale {
            self.velocity = None;
        }
        self.last_scale = state.step_scale;

        let x = state.continuous_mut()?;
        let mut d = normalized_gradient(ctx.problem, x.matrix())?;
        tangent_projection(&mut d);
        let tau = self.config.tau;
        self.preconditioner
            .get_or_insert_with(|| LaplacePreconditioner::new(n, tau))
            .apply(&mut d);

        let eta = step_length(self.config.learning_rate, n, state.step_scale);
        let velocity = self.velocity.get_or_insert_with(|| SquareMatrix::zeros(n));
        velocity.scale(self.config.momentum);
        velocity.add_scaled(-eta, &d);
        if !velocity.is_finite() {
            return Err(QapError::NumericalInstability(
                "laplace velocity is not finite".into(),
            ));
        }

        let x = state.continuous_mut()?;
        x.matrix_mut().add_scaled(1.0, velocity);
        Ok(())
    }
}

impl MethodSpec for FftLaplace {
    const NAME: &'static str = "fft_laplace";
    const FAMILY: Family = Family::Novel;

    fn schema() -> ParamSchema {
        LaplaceConfig::schema()
    }

    fn from_params(params: &Params) -> QapResult<Self> {
        LaplaceConfig::from_params(params).map(Self::new)
    }
}
