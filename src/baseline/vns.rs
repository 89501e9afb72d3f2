//! Basic Variable Neighborhood Search.
//!
//! # Algorithm
//!
//! Neighbourhood `N_k` is "k random swaps". One step:
//!
//! 1. **Shaking**: apply `k` random swaps to a copy of the current assignment
//! 2. **Local search**: swap descent on the shaken copy
//! 3. **Move or not**: if the result beats the current assignment, move
//!    there and reset `k = 1`; otherwise `k = k + 1`, wrapping past `k_max`
//!
//! # Reference
//!
//! Mladenović, N. & Hansen, P. (1997). "Variable neighborhood search",
//! *Computers & Operations Research* 24(11), 1097-1100.

use crate::baseline::local_search::swap_descent;
use crate::baseline::operators::random_swaps;
use crate::baseline::publish;
use crate::error::{QapError, QapResult};
use crate::pipeline::{SolverMethod, SolverState, StepContext};
use crate::registry::{Family, MethodSpec, ParamSchema, ParamSpec, Params};

/// Configuration for [`VariableNeighborhood`].
#[derive(Debug, Clone)]
pub struct VnsConfig {
    /// Largest shaking neighbourhood, in swaps.
    pub k_max: usize,
    /// Pass limit for the local search after shaking.
    pub local_search_passes: usize,
}

impl Default for VnsConfig {
    fn default() -> Self {
        Self {
            k_max: 3,
            local_search_passes: 50,
        }
    }
}

impl VnsConfig {
    pub fn with_k_max(mut self, k_max: usize) -> Self {
        self.k_max = k_max;
        self
    }

    pub fn with_local_search_passes(mut self, passes: usize) -> Self {
        self.local_search_passes = passes;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.k_max == 0 {
            return Err("k_max must be at least 1".into());
        }
        if self.local_search_passes == 0 {
            return Err("local_search_passes must be at least 1".into());
        }
        Ok(())
    }
}

/// Basic VNS with swap shaking and best-improvement descent.
#[derive(Debug)]
pub struct VariableNeighborhood {
    config: VnsConfig,
    k: usize,
}

impl VariableNeighborhood {
    pub fn new(config: VnsConfig) -> Self {
        Self { config, k: 1 }
    }

    /// Neighbourhood that the next step shakes in.
    pub fn neighborhood(&self) -> usize {
        self.k
    }
}

impl SolverMethod for VariableNeighborhood {
    fn initialize(&mut self, ctx: &mut StepContext<'_>, state: &mut SolverState) -> QapResult<()> {
        let mut perm = state.permutation_mut()?.as_slice().to_vec();
        let mut cost = ctx.problem.permutation_cost(&perm);
        swap_descent(ctx.problem, &mut perm, &mut cost, self.config.local_search_passes);
        publish(state, &perm, cost);
        self.k = 1;
        Ok(())
    }

    fn step(&mut self, ctx: &mut StepContext<'_>, state: &mut SolverState) -> QapResult<()> {
        let current = state.objective;
        let mut candidate = state.permutation_mut()?.as_slice().to_vec();
        random_swaps(&mut candidate, self.k, ctx.rng);
        let mut cost = ctx.problem.permutation_cost(&candidate);
        swap_descent(ctx.problem, &mut candidate, &mut cost, self.config.local_search_passes);

        if cost < current - 1e-9 {
            publish(state, &candidate, cost);
            self.k = 1;
        } else {
            self.k = if self.k >= self.config.k_max { 1 } else { self.k + 1 };
        }
        Ok(())
    }
}

impl MethodSpec for VariableNeighborhood {
    const NAME: &'static str = "variable_neighborhood";
    const FAMILY: Family = Family::Baseline;

    fn schema() -> ParamSchema {
        let d = VnsConfig::default();
        ParamSchema::new()
            .with(ParamSpec::int("k_max", d.k_max as i64, "largest shaking neighbourhood").at_least(1.0))
            .with(
                ParamSpec::int("local_search_passes", d.local_search_passes as i64, "descent pass limit")
                    .at_least(1.0),
            )
    }

    fn from_params(params: &Params) -> QapResult<Self> {
        let config = VnsConfig {
            k_max: params.usize("k_max")?,
            local_search_passes: params.usize("local_search_passes")?,
        };
        config.validate().map_err(QapError::InvalidConfig)?;
        Ok(Self::new(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{solve, Iterate, SolveConfig};
    use crate::problem::generate;
    use crate::projection::ProjectionConfig;
    use crate::random::create_rng;
    use crate::registry::MethodRegistry;
    use crate::solution::Permutation;

    #[test]
    fn test_validate() {
        assert!(VnsConfig::default().validate().is_ok());
        assert!(VnsConfig::default().with_k_max(0).validate().is_err());
        assert!(VnsConfig::default().with_local_search_passes(0).validate().is_err());
    }

    #[test]
    fn test_neighborhood_cycles() {
        let p = generate::random_uniform(8, 10, 5).unwrap();
        let projection = ProjectionConfig::default();
        let mut rng = create_rng(4);
        let start = Permutation::random(8, &mut rng);
        let mut state = SolverState::new(Iterate::Discrete(start), 0.0);
        let mut vns = VariableNeighborhood::new(VnsConfig::default().with_k_max(2));
        for iteration in 0..20 {
            let mut ctx = StepContext {
                problem: &p,
                rng: &mut rng,
                projection: &projection,
                iteration,
                best_objective: f64::INFINITY,
            };
            let before = state.objective;
            if iteration == 0 {
                vns.initialize(&mut ctx, &mut state).unwrap();
            } else {
                vns.step(&mut ctx, &mut state).unwrap();
                assert!(state.objective <= before + 1e-9);
            }
            assert!((1..=2).contains(&vns.neighborhood()));
        }
    }

    #[test]
    fn test_solve_reports_consistent_cost() {
        let mut r = MethodRegistry::new();
        r.register_method::<VariableNeighborhood>();
        let p = generate::random_uniform(10, 20, 2).unwrap();
        let config = SolveConfig::default().with_max_iterations(30).with_param("k_max", 4);
        let result = solve(&r, &p, "variable_neighborhood", &config).unwrap();
        let perm = result.solution.as_slice();
        assert!((result.objective_value - p.permutation_cost(perm)).abs() < 1e-6);
    }
}
