//! Iterated Local Search.
//!
//! One step perturbs the current local optimum with a few random swaps,
//! descends from there, and accepts the new local optimum if it is no
//! worse (or, with a small probability, even if it is). The best
//! assignment is tracked by the orchestrator.
//!
//! # Reference
//!
//! Lourenço, H. R., Martin, O. C. & Stützle, T. (2003). "Iterated local
//! search", *Handbook of Metaheuristics*, 320-353.

use rand::Rng;

use crate::baseline::local_search::first_improvement;
use crate::baseline::operators::random_swaps;
use crate::baseline::publish;
use crate::error::{QapError, QapResult};
use crate::pipeline::{SolverMethod, SolverState, StepContext};
use crate::registry::{Family, MethodSpec, ParamSchema, ParamSpec, Params};

/// Configuration for [`IteratedLocalSearch`].
#[derive(Debug, Clone)]
pub struct IlsConfig {
    /// Random swaps per perturbation.
    pub perturbation_strength: usize,
    /// Probability of accepting a worse local optimum.
    pub worse_acceptance: f64,
    /// Pass limit for each descent.
    pub local_search_passes: usize,
}

impl Default for IlsConfig {
    fn default() -> Self {
        Self {
            perturbation_strength: 3,
            worse_acceptance: 0.05,
            local_search_passes: 50,
        }
    }
}

impl IlsConfig {
    pub fn with_perturbation_strength(mut self, swaps: usize) -> Self {
        self.perturbation_strength = swaps;
        self
    }

    pub fn with_worse_acceptance(mut self, p: f64) -> Self {
        self.worse_acceptance = p;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.perturbation_strength == 0 {
            return Err("perturbation_strength must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&self.worse_acceptance) {
            return Err(format!(
                "worse_acceptance must be in [0, 1], got {}",
                self.worse_acceptance
            ));
        }
        if self.local_search_passes == 0 {
            return Err("local_search_passes must be at least 1".into());
        }
        Ok(())
    }
}

/// ILS with swap perturbation and first-improvement descent.
#[derive(Debug)]
pub struct IteratedLocalSearch {
    config: IlsConfig,
}

impl IteratedLocalSearch {
    pub fn new(config: IlsConfig) -> Self {
        Self { config }
    }
}

impl SolverMethod for IteratedLocalSearch {
    fn initialize(&mut self, ctx: &mut StepContext<'_>, state: &mut SolverState) -> QapResult<()> {
        let mut perm = state.permutation_mut()?.as_slice().to_vec();
        let mut cost = ctx.problem.permutation_cost(&perm);
        first_improvement(ctx.problem, &mut perm, &mut cost, self.config.local_search_passes);
        publish(state, &perm, cost);
        Ok(())
    }

    fn step(&mut self, ctx: &mut StepContext<'_>, state: &mut SolverState) -> QapResult<()> {
        let current = state.objective;
        let mut candidate = state.permutation_mut()?.as_slice().to_vec();
        random_swaps(&mut candidate, self.config.perturbation_strength, ctx.rng);
        let mut cost = ctx.problem.permutation_cost(&candidate);
        first_improvement(ctx.problem, &mut candidate, &mut cost, self.config.local_search_passes);

        let accept = cost <= current || ctx.rng.random_range(0.0..1.0) < self.config.worse_acceptance;
        if accept {
            publish(state, &candidate, cost);
        }
        Ok(())
    }
}

impl MethodSpec for IteratedLocalSearch {
    const NAME: &'static str = "iterated_local_search";
    const FAMILY: Family = Family::Baseline;

    fn schema() -> ParamSchema {
        let d = IlsConfig::default();
        ParamSchema::new()
            .with(
                ParamSpec::int("perturbation_strength", d.perturbation_strength as i64, "swaps per kick")
                    .at_least(1.0),
            )
            .with(
                ParamSpec::float("worse_acceptance", d.worse_acceptance, "chance to accept a worse optimum")
                    .range(0.0, 1.0),
            )
            .with(
                ParamSpec::int("local_search_passes", d.local_search_passes as i64, "descent pass limit")
                    .at_least(1.0),
            )
    }

    fn from_params(params: &Params) -> QapResult<Self> {
        let config = IlsConfig {
            perturbation_strength: params.usize("perturbation_strength")?,
            worse_acceptance: params.float("worse_acceptance")?,
            local_search_passes: params.usize("local_search_passes")?,
        };
        config.validate().map_err(QapError::InvalidConfig)?;
        Ok(Self::new(config))
    }
}
