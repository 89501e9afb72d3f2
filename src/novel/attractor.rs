//! Attractor programming.
//!
//! Evolves a small population of relaxed iterates ("attractors") by
//! independent projected gradient descent. Every `cadence` steps each
//! attractor is scored by the cost of its discretized permutation, and the
//! worst fraction is replaced by perturbed copies of the best. The
//! orchestrator sees the best attractor as the run's iterate.
//!
//! Independent basins give the population diversity; periodic
//! replacement concentrates effort on the most promising basin.
//!
//! # References
//!
//! - Hopfield & Tank (1985), "Neural computation of decisions in
//!   optimization problems"
//! - Gold & Rangarajan (1996), "A graduated assignment algorithm for graph
//!   matching"

use crate::error::{QapError, QapResult};
use crate::matrix::SquareMatrix;
use crate::novel::relax::{normalized_gradient, perturb, project, step_length, tangent_projection};
use crate::pipeline::{Iterate, SolverMethod, SolverState, StepContext};
use crate::projection::discretize;
use crate::registry::{Family, MethodSpec, ParamSchema, ParamSpec, Params};
use crate::solution::ContinuousSolution;

/// Configuration for [`AttractorProgramming`].
#[derive(Debug, Clone)]
pub struct AttractorConfig {
    /// Step size before the `1/n` entry scaling.
    pub learning_rate: f64,

    /// Population size.
    pub attractors: usize,

    /// Steps between selection rounds.
    pub cadence: usize,

    /// Fraction of the population replaced per round, in `(0, 1)`.
    pub replace_fraction: f64,

    /// Log-normal noise applied to initial members and replacements.
    pub noise: f64,
}

impl Default for AttractorConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.5,
            attractors: 6,
            cadence: 10,
            replace_fraction: 0.34,
            noise: 0.3,
        }
    }
}

impl AttractorConfig {
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_attractors(mut self, k: usize) -> Self {
        self.attractors = k;
        self
    }

    pub fn with_cadence(mut self, cadence: usize) -> Self {
        self.cadence = cadence;
        self
    }

    pub fn with_replace_fraction(mut self, fraction: f64) -> Self {
        self.replace_fraction = fraction;
        self
    }

    pub fn with_noise(mut self, noise: f64) -> Self {
        self.noise = noise;
        self
    }

    /// Number of members replaced per round: at least one, never all.
    pub fn replacements(&self) -> usize {
        let k = ((self.attractors as f64) * self.replace_fraction).ceil() as usize;
        k.clamp(1, self.attractors.saturating_sub(1).max(1))
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.learning_rate > 0.0) {
            return Err("learning_rate must be positive".into());
        }
        if self.attractors < 2 {
            return Err("attractors must be at least 2".into());
        }
        if self.cadence == 0 {
            return Err("cadence must be at least 1".into());
        }
        if !(self.replace_fraction > 0.0 && self.replace_fraction < 1.0) {
            return Err(format!(
                "replace_fraction must be in (0, 1), got {}",
                self.replace_fraction
            ));
        }
        if !(self.noise >= 0.0) {
            return Err("noise must be non-negative".into());
        }
        Ok(())
    }
}

/// Population of relaxed iterates with periodic best-of selection.
#[derive(Debug)]
pub struct AttractorProgramming {
    config: AttractorConfig,
    population: Vec<SquareMatrix>,
    scores: Vec<f64>,
    leader: usize,
}

impl AttractorProgramming {
    pub fn new(config: AttractorConfig) -> Self {
        Self {
            config,
            population: Vec::new(),
            scores: Vec::new(),
            leader: 0,
        }
    }

    pub fn population(&self) -> &[SquareMatrix] {
        &self.population
    }

    fn spawn(&self, ctx: &mut StepContext<'_>, from: &SquareMatrix) -> QapResult<SquareMatrix> {
        let mut m = from.clone();
        perturb(&mut m, self.config.noise, ctx.rng);
        project(&mut m, ctx.projection)?;
        Ok(m)
    }

    fn rescore(&mut self, ctx: &StepContext<'_>) {
        self.scores = self
            .population
            .iter()
            .map(|m| {
                let perm = discretize(m, ctx.projection);
                ctx.problem.permutation_cost(perm.as_slice())
            })
            .collect();
        self.leader = argmin(&self.scores);
    }

    /// Replaces the worst members with perturbations of the leader.
    fn select(&mut self, ctx: &mut StepContext<'_>) -> QapResult<()> {
        self.rescore(ctx);
        let mut order: Vec<usize> = (0..self.population.len()).collect();
        order.sort_by(|&a, &b| self.scores[b].total_cmp(&self.scores[a]));
        let count = self.config.replacements();
        let leader = self.population[self.leader].clone();
        for &idx in order.iter().take(count) {
            if idx == self.leader {
                continue;
            }
            self.population[idx] = self.spawn(ctx, &leader)?;
            self.scores[idx] = f64::INFINITY;
        }
        log::debug!(
            "attractor round at step {}: best {:.4}, replaced {count}",
            ctx.iteration,
            self.scores[self.leader]
        );
        Ok(())
    }
}

fn argmin(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map_or(0, |(i, _)| i)
}

impl SolverMethod for AttractorProgramming {
    fn initialize(&mut self, ctx: &mut StepContext<'_>, state: &mut SolverState) -> QapResult<()> {
        let seed = state.continuous_mut()?.matrix().clone();
        self.population = Vec::with_capacity(self.config.attractors);
        self.population.push(seed.clone());
        for _ in 1..self.config.attractors {
            let member = self.spawn(ctx, &seed)?;
            self.population.push(member);
        }
        self.rescore(ctx);
        state.iterate = Iterate::Continuous(ContinuousSolution::from_matrix(
            self.population[self.leader].clone(),
        ));
        Ok(())
    }

    fn step(&mut self, ctx: &mut StepContext<'_>, state: &mut SolverState) -> QapResult<()> {
        let n = ctx.problem.size();
        if self.population.is_empty() {
            self.initialize(ctx, state)?;
        }
        let eta = step_length(self.config.learning_rate, n, state.step_scale);
        let fallback = state.continuous_mut()?.matrix().clone();

        for idx in 0..self.population.len() {
            let advanced = {
                let member = &mut self.population[idx];
                normalized_gradient(ctx.problem, member).and_then(|mut g| {
                    tangent_projection(&mut g);
                    member.add_scaled(-eta, &g);
                    project(member, ctx.projection)
                })
            };
            if let Err(err) = advanced {
                match err {
                    QapError::NumericalInstability(_) | QapError::ProjectionDivergence { .. } => {
                        log::debug!("attractor {idx} reset at step {}: {err}", ctx.iteration);
                        self.population[idx] = fallback.clone();
                    }
                    other => return Err(other),
                }
            }
        }

        if ctx.iteration % self.config.cadence == 0 {
            self.select(ctx)?;
        }

        state.iterate = Iterate::Continuous(ContinuousSolution::from_matrix(
            self.population[self.leader].clone(),
        ));
        Ok(())
    }
}

impl MethodSpec for AttractorProgramming {
    const NAME: &'static str = "attractor_programming";
    const FAMILY: Family = Family::Novel;

    fn schema() -> ParamSchema {
        let d = AttractorConfig::default();
        ParamSchema::new()
            .with(ParamSpec::float("learning_rate", d.learning_rate, "step size").range(1e-9, 1e3))
            .with(ParamSpec::int("attractors", d.attractors as i64, "population size").range(2.0, 256.0))
            .with(ParamSpec::int("cadence", d.cadence as i64, "steps between selection rounds").at_least(1.0))
            .with(
                ParamSpec::float("replace_fraction", d.replace_fraction, "share replaced per round")
                    .range(0.01, 0.99),
            )
            .with(ParamSpec::float("noise", d.noise, "perturbation magnitude").at_least(0.0))
    }

    fn from_params(params: &Params) -> QapResult<Self> {
        let config = AttractorConfig {
            learning_rate: params.float("learning_rate")?,
            attractors: params.usize("attractors")?,
            cadence: params.usize("cadence")?,
            replace_fraction: params.float("replace_fraction")?,
            noise: params.float("noise")?,
        };
        config.validate().map_err(QapError::InvalidConfig)?;
        Ok(Self::new(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{solve, SolveConfig};
    use crate::problem::generate;
    use crate::projection::{is_doubly_stochastic, ProjectionConfig};
    use crate::random::create_rng;
    use crate::registry::MethodRegistry;

    #[test]
    fn test_replacements() {
        let c = AttractorConfig::default();
        assert_eq!(c.replacements(), 3);
        assert_eq!(c.clone().with_attractors(2).with_replace_fraction(0.9).replacements(), 1);
        assert_eq!(c.with_attractors(10).with_replace_fraction(0.05).replacements(), 1);
    }

    #[test]
    fn test_validate() {
        assert!(AttractorConfig::default().validate().is_ok());
        assert!(AttractorConfig::default().with_attractors(1).validate().is_err());
        assert!(AttractorConfig::default().with_replace_fraction(1.0).validate().is_err());
        assert!(AttractorConfig::default().with_cadence(0).validate().is_err());
    }

    #[test]
    fn test_population_stays_feasible() {
        let p = generate::random_uniform(6, 10, 8).unwrap();
        let projection = ProjectionConfig::default();
        let mut rng = create_rng(2);
        let mut state =
            SolverState::new(Iterate::Continuous(ContinuousSolution::uniform(6)), 0.0);
        let mut m = AttractorProgramming::new(AttractorConfig::default().with_cadence(2));
        for iteration in 0..6 {
            let mut ctx = StepContext {
                problem: &p,
                rng: &mut rng,
                projection: &projection,
                iteration,
                best_objective: f64::INFINITY,
            };
            if iteration == 0 {
                m.initialize(&mut ctx, &mut state).unwrap();
            } else {
                m.step(&mut ctx, &mut state).unwrap();
            }
        }
        assert_eq!(m.population().len(), 6);
        for member in m.population() {
            assert!(is_doubly_stochastic(member, 1e-6));
        }
    }

    #[test]
    fn test_solve_improves_on_start() {
        let mut registry = MethodRegistry::new();
        registry.register_method::<AttractorProgramming>();
        let p = generate::random_uniform(9, 20, 11).unwrap();
        let config = SolveConfig::default().with_max_iterations(60).with_seed(4);
        let result = solve(&registry, &p, "attractor_programming", &config).unwrap();
        assert!(result.objective_value <= result.trace[0].best_objective);
        assert_eq!(result.solution.len(), 9);
    }
}
