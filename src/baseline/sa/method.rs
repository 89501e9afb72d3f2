//! SA step.

use rand::Rng;

use super::config::SaConfig;
use crate::error::QapResult;
use crate::pipeline::{SolverMethod, SolverState, StepContext};
use crate::problem::Problem;
use crate::random::distinct_pair;
use crate::registry::{Family, MethodSpec, ParamSchema, Params};

/// Simulated annealing on permutations with Metropolis acceptance.
#[derive(Debug)]
pub struct SimulatedAnnealing {
    config: SaConfig,
    temperature: f64,
    initial_temperature: f64,
    cooling_step: usize,
    accepted: usize,
    proposed: usize,
}

impl SimulatedAnnealing {
    pub fn new(config: SaConfig) -> Self {
        let t0 = config.initial_temperature.unwrap_or(1.0);
        Self {
            config,
            temperature: t0,
            initial_temperature: t0,
            cooling_step: 0,
            accepted: 0,
            proposed: 0,
        }
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Fraction of proposals accepted so far.
    pub fn acceptance_rate(&self) -> f64 {
        if self.proposed == 0 {
            0.0
        } else {
            self.accepted as f64 / self.proposed as f64
        }
    }
}

/// Temperature at which an average worsening swap is accepted with
/// probability 1/2.
fn calibrate<R: Rng>(problem: &Problem, perm: &[usize], samples: usize, rng: &mut R) -> f64 {
    let n = perm.len();
    let (sum, count) = (0..samples).fold((0.0, 0usize), |(sum, count), _| {
        let (r, s) = distinct_pair(n, rng);
        let d = problem.swap_delta(perm, r, s);
        if d > 0.0 {
            (sum + d, count + 1)
        } else {
            (sum, count)
        }
    });
    if count == 0 {
        1.0
    } else {
        (sum / count as f64) / std::f64::consts::LN_2
    }
}

impl SolverMethod for SimulatedAnnealing {
    fn initialize(&mut self, ctx: &mut StepContext<'_>, state: &mut SolverState) -> QapResult<()> {
        if self.config.initial_temperature.is_none() {
            let perm = state.permutation_mut()?;
            let t0 = calibrate(ctx.problem, perm.as_slice(), self.config.calibration_samples, ctx.rng);
            self.initial_temperature = t0.max(self.config.min_temperature * 10.0);
            self.temperature = self.initial_temperature;
            log::debug!("sa: calibrated initial temperature {:.4}", self.initial_temperature);
        }
        Ok(())
    }

    fn step(&mut self, ctx: &mut StepContext<'_>, state: &mut SolverState) -> QapResult<()> {
        let problem = ctx.problem;
        let n = problem.size();
        let mut current = state.objective;
        let perm = state.permutation_mut()?;

        for _ in 0..self.config.moves_per_step {
            let (r, s) = distinct_pair(n, ctx.rng);
            let delta = problem.swap_delta(perm.as_slice(), r, s);
            self.proposed += 1;
            let accept = delta <= 0.0
                || ctx.rng.random_range(0.0..1.0) < (-delta / self.temperature).exp();
            if accept {
                perm.swap(r, s);
                current += delta;
                self.accepted += 1;
            }
        }

        self.temperature = self.config.cooling.next(
            self.temperature,
            self.cooling_step,
            self.initial_temperature,
            self.config.min_temperature,
        );
        self.cooling_step += 1;
        state.objective = current;
        Ok(())
    }
}

impl MethodSpec for SimulatedAnnealing {
    const NAME: &'static str = "simulated_annealing";
    const FAMILY: Family = Family::Baseline;

    fn schema() -> ParamSchema {
        SaConfig::schema()
    }

    fn from_params(params: &Params) -> QapResult<Self> {
        SaConfig::from_params(params).map(Self::new)
    }
}
