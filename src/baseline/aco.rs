//! MAX–MIN Ant System for the QAP.
//!
//! Pheromone `τ[i][l]` is the learned desirability of placing facility `i`
//! at location `l`. Each ant assigns facilities in random order, choosing a
//! free location with probability proportional to `τ[i][l]^alpha`. After
//! an iteration, pheromone evaporates by `rho` and the iteration-best ant
//! (optionally improved by swap descent) deposits `1 / cost` on its
//! assignment. Trails are kept inside `[τ_min, τ_max]` with
//! `τ_max = 1 / (rho · best)` and `τ_min = τ_max / (2n)`.
//!
//! # Reference
//!
//! Stützle, T. & Hoos, H. H. (2000). "MAX–MIN Ant System",
//! *Future Generation Computer Systems* 16(8), 889-914.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::baseline::local_search::swap_descent;
use crate::baseline::{evaluate_all, publish};
use crate::error::{QapError, QapResult};
use crate::matrix::SquareMatrix;
use crate::pipeline::{SolverMethod, SolverState, StepContext};
use crate::registry::{Family, MethodSpec, ParamSchema, ParamSpec, Params};

/// Configuration for [`AntColony`].
#[derive(Debug, Clone)]
pub struct AcoConfig {
    /// Ants per iteration.
    pub ants: usize,
    /// Evaporation rate in `(0, 1)`.
    pub evaporation: f64,
    /// Pheromone exponent.
    pub alpha: f64,
    /// Swap descent on the iteration-best ant before it deposits.
    pub local_search: bool,
    /// Pass limit for that descent.
    pub local_search_passes: usize,
}

impl Default for AcoConfig {
    fn default() -> Self {
        Self {
            ants: 10,
            evaporation: 0.1,
            alpha: 1.0,
            local_search: true,
            local_search_passes: 20,
        }
    }
}

impl AcoConfig {
    pub fn with_ants(mut self, ants: usize) -> Self {
        self.ants = ants;
        self
    }

    pub fn with_evaporation(mut self, rho: f64) -> Self {
        self.evaporation = rho;
        self
    }

    pub fn with_local_search(mut self, enabled: bool) -> Self {
        self.local_search = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.ants == 0 {
            return Err("ants must be at least 1".into());
        }
        if !(self.evaporation > 0.0 && self.evaporation < 1.0) {
            return Err(format!("evaporation must be in (0, 1), got {}", self.evaporation));
        }
        if self.alpha < 0.0 {
            return Err(format!("alpha must be non-negative, got {}", self.alpha));
        }
        Ok(())
    }
}

/// MMAS with iteration-best deposit and trail limits.
#[derive(Debug)]
pub struct AntColony {
    config: AcoConfig,
    pheromone: Option<SquareMatrix>,
    best_cost: f64,
}

impl AntColony {
    pub fn new(config: AcoConfig) -> Self {
        Self {
            config,
            pheromone: None,
            best_cost: f64::INFINITY,
        }
    }

    fn limits(&self, n: usize) -> (f64, f64) {
        let tau_max = 1.0 / (self.config.evaporation * self.best_cost.max(f64::MIN_POSITIVE));
        (tau_max / (2.0 * n as f64), tau_max)
    }
}

/// One ant's assignment sampled from the trails.
fn build_ant<R: Rng>(pheromone: &SquareMatrix, alpha: f64, rng: &mut R) -> Vec<usize> {
    let n = pheromone.size();
    let mut facilities: Vec<usize> = (0..n).collect();
    facilities.shuffle(rng);
    let mut free: Vec<usize> = (0..n).collect();
    let mut perm = vec![0; n];
    for i in facilities {
        let weights: Vec<f64> = free.iter().map(|&l| pheromone.get(i, l).powf(alpha)).collect();
        let total: f64 = weights.iter().sum();
        let mut pick = free.len() - 1;
        if total > 0.0 && total.is_finite() {
            let mut r = rng.random_range(0.0..total);
            for (k, w) in weights.iter().enumerate() {
                if r < *w {
                    pick = k;
                    break;
                }
                r -= w;
            }
        } else {
            pick = rng.random_range(0..free.len());
        }
        perm[i] = free.swap_remove(pick);
    }
    perm
}

impl SolverMethod for AntColony {
    fn initialize(&mut self, ctx: &mut StepContext<'_>, state: &mut SolverState) -> QapResult<()> {
        let perm = state.permutation_mut()?;
        let n = perm.len();
        self.best_cost = ctx.problem.permutation_cost(perm.as_slice());
        let (_, tau_max) = self.limits(n);
        self.pheromone = Some(SquareMatrix::filled(n, tau_max));
        Ok(())
    }

    fn step(&mut self, ctx: &mut StepContext<'_>, state: &mut SolverState) -> QapResult<()> {
        if self.pheromone.is_none() {
            self.initialize(ctx, state)?;
        }
        let n = ctx.problem.size();
        let alpha = self.config.alpha;
        let ants: Vec<Vec<usize>> = match &self.pheromone {
            Some(tau) => (0..self.config.ants).map(|_| build_ant(tau, alpha, ctx.rng)).collect(),
            None => return Ok(()),
        };
        let costs = evaluate_all(ctx.problem, &ants);
        let Some((k, &cost)) = costs.iter().enumerate().min_by(|a, b| a.1.total_cmp(b.1)) else {
            return Ok(());
        };
        let mut iteration_best = ants[k].clone();
        let mut iteration_cost = cost;
        if self.config.local_search {
            swap_descent(
                ctx.problem,
                &mut iteration_best,
                &mut iteration_cost,
                self.config.local_search_passes,
            );
        }
        self.best_cost = self.best_cost.min(iteration_cost);

        let (tau_min, tau_max) = self.limits(n);
        let deposit = 1.0 / iteration_cost.max(f64::MIN_POSITIVE);
        let keep = 1.0 - self.config.evaporation;
        if let Some(tau) = self.pheromone.as_mut() {
            tau.scale(keep);
            for (i, &l) in iteration_best.iter().enumerate() {
                tau.set(i, l, tau.get(i, l) + deposit);
            }
            tau.map_inplace(|v| v.clamp(tau_min, tau_max));
        }

        publish(state, &iteration_best, iteration_cost);
        Ok(())
    }
}

impl MethodSpec for AntColony {
    const NAME: &'static str = "ant_colony";
    const FAMILY: Family = Family::Baseline;

    fn schema() -> ParamSchema {
        let d = AcoConfig::default();
        ParamSchema::new()
            .with(ParamSpec::int("ants", d.ants as i64, "ants per iteration").at_least(1.0))
            .with(ParamSpec::float("evaporation", d.evaporation, "trail evaporation rate").range(1e-6, 0.999_999))
            .with(ParamSpec::float("alpha", d.alpha, "pheromone exponent").at_least(0.0))
            .with(ParamSpec::bool("local_search", d.local_search, "descend from the iteration best"))
            .with(
                ParamSpec::int("local_search_passes", d.local_search_passes as i64, "descent pass limit")
                    .at_least(1.0),
            )
    }

    fn from_params(params: &Params) -> QapResult<Self> {
        let config = AcoConfig {
            ants: params.usize("ants")?,
            evaporation: params.float("evaporation")?,
            alpha: params.float("alpha")?,
            local_search: params.bool("local_search")?,
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
        assert!(AcoConfig::default().validate().is_ok());
        assert!(AcoConfig::default().with_ants(0).validate().is_err());
        assert!(AcoConfig::default().with_evaporation(1.0).validate().is_err());
    }

    #[test]
    fn test_build_ant_valid() {
        let mut rng = create_rng(2);
        let tau = SquareMatrix::filled(7, 0.5);
        for _ in 0..20 {
            assert!(Permutation::new(build_ant(&tau, 1.0, &mut rng)).is_ok());
        }
    }

    #[test]
    fn test_build_ant_follows_dominant_trail() {
        let mut rng = create_rng(3);
        let n = 5;
        let mut tau = SquareMatrix::filled(n, 1e-9);
        for i in 0..n {
            tau.set(i, (i + 2) % n, 1.0);
        }
        let perm = build_ant(&tau, 1.0, &mut rng);
        assert_eq!(perm, (0..n).map(|i| (i + 2) % n).collect::<Vec<_>>());
    }

    #[test]
    fn test_trails_stay_within_limits() {
        let p = generate::random_uniform(7, 10, 31).unwrap();
        let projection = ProjectionConfig::default();
        let mut rng = create_rng(5);
        let start = Permutation::random(7, &mut rng);
        let mut state = SolverState::new(Iterate::Discrete(start), 0.0);
        let mut aco = AntColony::new(AcoConfig::default().with_ants(4).with_local_search(false));
        let mut ctx = StepContext {
            problem: &p,
            rng: &mut rng,
            projection: &projection,
            iteration: 0,
            best_objective: f64::INFINITY,
        };
        aco.initialize(&mut ctx, &mut state).unwrap();
        for _ in 0..10 {
            aco.step(&mut ctx, &mut state).unwrap();
            let (lo, hi) = aco.limits(7);
            let tau = aco.pheromone.as_ref().unwrap();
            assert!(tau.iter().all(|&v| v >= lo - 1e-12 && v <= hi + 1e-12));
        }
        let Iterate::Discrete(perm) = &state.iterate else {
            panic!("expected a permutation");
        };
        assert!((state.objective - p.permutation_cost(perm.as_slice())).abs() < 1e-6);
    }

    #[test]
    fn test_solve() {
        let mut r = MethodRegistry::new();
        r.register_method::<AntColony>();
        let p = generate::random_uniform(9, 10, 40).unwrap();
        let config = SolveConfig::default().with_max_iterations(20);
        let result = solve(&r, &p, "ant_colony", &config).unwrap();
        assert!(result.objective_value <= result.trace[0].best_objective);
    }
}
