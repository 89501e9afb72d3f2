//! Differential Evolution over random keys (DE/rand/1/bin).
//!
//! For each target vector `x_i` three distinct others `a, b, c` are drawn
//! and a mutant `a + F·(b − c)` is formed. Binomial crossover with rate
//! `CR` (and one forced dimension) builds the trial vector, which replaces
//! `x_i` if its decoded assignment is no worse.
//!
//! # Reference
//!
//! Storn, R. & Price, K. (1997). "Differential evolution – a simple and
//! efficient heuristic for global optimization over continuous spaces",
//! *Journal of Global Optimization* 11, 341-359.

use rand::Rng;

use crate::baseline::operators::{decode_keys, encode_keys};
use crate::baseline::{evaluate_all, publish};
use crate::error::{QapError, QapResult};
use crate::pipeline::{SolverMethod, SolverState, StepContext};
use crate::registry::{Family, MethodSpec, ParamSchema, ParamSpec, Params};

/// Configuration for [`DifferentialEvolution`].
#[derive(Debug, Clone)]
pub struct DeConfig {
    pub population_size: usize,
    /// Differential weight `F`.
    pub differential_weight: f64,
    /// Crossover rate `CR`.
    pub crossover_rate: f64,
}

impl Default for DeConfig {
    fn default() -> Self {
        Self {
            population_size: 20,
            differential_weight: 0.5,
            crossover_rate: 0.9,
        }
    }
}

impl DeConfig {
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    pub fn with_crossover_rate(mut self, cr: f64) -> Self {
        self.crossover_rate = cr;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.population_size < 4 {
            return Err("population_size must be at least 4".into());
        }
        if !(0.0..=2.0).contains(&self.differential_weight) {
            return Err(format!(
                "differential_weight must be in [0, 2], got {}",
                self.differential_weight
            ));
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(format!("crossover_rate must be in [0, 1], got {}", self.crossover_rate));
        }
        Ok(())
    }
}

/// DE/rand/1/bin with greedy one-to-one replacement.
#[derive(Debug)]
pub struct DifferentialEvolution {
    config: DeConfig,
    population: Vec<Vec<f64>>,
    costs: Vec<f64>,
}

impl DifferentialEvolution {
    pub fn new(config: DeConfig) -> Self {
        Self {
            config,
            population: Vec::new(),
            costs: Vec::new(),
        }
    }

    fn best_index(&self) -> usize {
        self.costs
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map_or(0, |(i, _)| i)
    }

    fn publish_best(&self, state: &mut SolverState) {
        let i = self.best_index();
        publish(state, &decode_keys(&self.population[i]), self.costs[i]);
    }
}

/// Three distinct indices in `0..size`, all different from `target`.
fn pick_three<R: Rng>(size: usize, target: usize, rng: &mut R) -> [usize; 3] {
    let mut picked = [usize::MAX; 3];
    let mut k = 0;
    while k < 3 {
        let c = rng.random_range(0..size);
        if c != target && !picked[..k].contains(&c) {
            picked[k] = c;
            k += 1;
        }
    }
    picked
}

impl SolverMethod for DifferentialEvolution {
    fn initialize(&mut self, ctx: &mut StepContext<'_>, state: &mut SolverState) -> QapResult<()> {
        let seed = encode_keys(state.permutation_mut()?.as_slice());
        let n = seed.len();
        self.population = Vec::with_capacity(self.config.population_size);
        self.population.push(seed);
        while self.population.len() < self.config.population_size {
            self.population
                .push((0..n).map(|_| ctx.rng.random_range(0.0..1.0)).collect());
        }
        let decoded: Vec<Vec<usize>> = self.population.iter().map(|k| decode_keys(k)).collect();
        self.costs = evaluate_all(ctx.problem, &decoded);
        self.publish_best(state);
        Ok(())
    }

    fn step(&mut self, ctx: &mut StepContext<'_>, state: &mut SolverState) -> QapResult<()> {
        if self.population.is_empty() {
            self.initialize(ctx, state)?;
        }
        let size = self.population.len();
        let n = self.population[0].len();
        let (f, cr) = (self.config.differential_weight, self.config.crossover_rate);

        let trials: Vec<Vec<f64>> = (0..size)
            .map(|i| {
                let [a, b, c] = pick_three(size, i, ctx.rng);
                let forced = ctx.rng.random_range(0..n);
                (0..n)
                    .map(|d| {
                        if d == forced || ctx.rng.random_range(0.0..1.0) < cr {
                            self.population[a][d] + f * (self.population[b][d] - self.population[c][d])
                        } else {
                            self.population[i][d]
                        }
                    })
                    .collect()
            })
            .collect();
        let decoded: Vec<Vec<usize>> = trials.iter().map(|k| decode_keys(k)).collect();
        let trial_costs = evaluate_all(ctx.problem, &decoded);

        for (i, (trial, cost)) in trials.into_iter().zip(trial_costs).enumerate() {
            if cost <= self.costs[i] {
                self.population[i] = trial;
                self.costs[i] = cost;
            }
        }
        self.publish_best(state);
        Ok(())
    }
}

impl MethodSpec for DifferentialEvolution {
    const NAME: &'static str = "differential_evolution";
    const FAMILY: Family = Family::Baseline;

    fn schema() -> ParamSchema {
        let d = DeConfig::default();
        ParamSchema::new()
            .with(ParamSpec::int("population_size", d.population_size as i64, "number of vectors").at_least(4.0))
            .with(ParamSpec::float("differential_weight", d.differential_weight, "F").range(0.0, 2.0))
            .with(ParamSpec::float("crossover_rate", d.crossover_rate, "CR").range(0.0, 1.0))
    }

    fn from_params(params: &Params) -> QapResult<Self> {
        let config = DeConfig {
            population_size: params.usize("population_size")?,
            differential_weight: params.float("differential_weight")?,
            crossover_rate: params.float("crossover_rate")?,
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
        assert!(DeConfig::default().validate().is_ok());
        assert!(DeConfig::default().with_population_size(3).validate().is_err());
        assert!(DeConfig::default().with_crossover_rate(1.1).validate().is_err());
    }

    #[test]
    fn test_pick_three_distinct() {
        let mut rng = create_rng(0);
        for target in 0..5 {
            let [a, b, c] = pick_three(5, target, &mut rng);
            assert!(a != b && b != c && a != c);
            assert!(![a, b, c].contains(&target));
        }
    }

    #[test]
    fn test_member_costs_never_increase() {
        let p = generate::random_uniform(8, 10, 14).unwrap();
        let projection = ProjectionConfig::default();
        let mut rng = create_rng(9);
        let start = Permutation::random(8, &mut rng);
        let mut state = SolverState::new(Iterate::Discrete(start), 0.0);
        let mut de = DifferentialEvolution::new(DeConfig::default().with_population_size(8));
        let mut ctx = StepContext {
            problem: &p,
            rng: &mut rng,
            projection: &projection,
            iteration: 0,
            best_objective: f64::INFINITY,
        };
        de.initialize(&mut ctx, &mut state).unwrap();
        for _ in 0..10 {
            let before = de.costs.clone();
            de.step(&mut ctx, &mut state).unwrap();
            assert!(de.costs.iter().zip(&before).all(|(after, b)| after <= b));
        }
        let best = de.costs.iter().copied().fold(f64::INFINITY, f64::min);
        assert!((state.objective - best).abs() < 1e-9);
    }

    #[test]
    fn test_solve() {
        let mut r = MethodRegistry::new();
        r.register_method::<DifferentialEvolution>();
        let p = generate::random_uniform(9, 10, 2).unwrap();
        let config = SolveConfig::default().with_max_iterations(30);
        let result = solve(&r, &p, "differential_evolution", &config).unwrap();
        assert!(result.objective_value <= result.trace[0].best_objective);
    }
}
