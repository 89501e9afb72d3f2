//! GA generation step.

use rand::Rng;

use super::config::{Crossover, GaConfig};
use crate::baseline::operators::{order_crossover, pmx_crossover, swap_mutation};
use crate::baseline::{evaluate_all, publish};
use crate::error::QapResult;
use crate::pipeline::{SolverMethod, SolverState, StepContext};
use crate::registry::{Family, MethodSpec, ParamSchema, Params};
use crate::solution::Permutation;

/// Generational GA with elitism. The state iterate is the population best.
#[derive(Debug)]
pub struct GeneticAlgorithm {
    config: GaConfig,
    population: Vec<Vec<usize>>,
    costs: Vec<f64>,
}

impl GeneticAlgorithm {
    pub fn new(config: GaConfig) -> Self {
        Self {
            config,
            population: Vec::new(),
            costs: Vec::new(),
        }
    }

    /// Population sorted best-first after every generation.
    pub fn population(&self) -> &[Vec<usize>] {
        &self.population
    }

    pub fn costs(&self) -> &[f64] {
        &self.costs
    }

    fn sort_population(&mut self) {
        let mut order: Vec<usize> = (0..self.population.len()).collect();
        order.sort_by(|&a, &b| self.costs[a].total_cmp(&self.costs[b]));
        self.population = order.iter().map(|&i| self.population[i].clone()).collect();
        self.costs = order.iter().map(|&i| self.costs[i]).collect();
    }
}

impl SolverMethod for GeneticAlgorithm {
    fn initialize(&mut self, ctx: &mut StepContext<'_>, state: &mut SolverState) -> QapResult<()> {
        let n = ctx.problem.size();
        let seed = state.permutation_mut()?.as_slice().to_vec();
        self.population = Vec::with_capacity(self.config.population_size);
        self.population.push(seed);
        while self.population.len() < self.config.population_size {
            self.population.push(Permutation::random(n, ctx.rng).into_vec());
        }
        self.costs = evaluate_all(ctx.problem, &self.population);
        self.sort_population();
        publish(state, &self.population[0], self.costs[0]);
        Ok(())
    }

    fn step(&mut self, ctx: &mut StepContext<'_>, state: &mut SolverState) -> QapResult<()> {
        if self.population.is_empty() {
            self.initialize(ctx, state)?;
        }
        let size = self.config.population_size;
        let elites = self.config.elite_count;

        let mut offspring: Vec<Vec<usize>> = Vec::with_capacity(size - elites);
        while offspring.len() < size - elites {
            let a = self.config.selection.select(&self.costs, ctx.rng);
            let b = self.config.selection.select(&self.costs, ctx.rng);
            let (p1, p2) = (&self.population[a], &self.population[b]);
            let (mut c1, mut c2) = if ctx.rng.random_range(0.0..1.0) < self.config.crossover_rate {
                match self.config.crossover {
                    Crossover::Order => order_crossover(p1, p2, ctx.rng),
                    Crossover::PartiallyMapped => pmx_crossover(p1, p2, ctx.rng),
                }
            } else {
                (p1.clone(), p2.clone())
            };
            for child in [&mut c1, &mut c2] {
                if ctx.rng.random_range(0.0..1.0) < self.config.mutation_rate {
                    swap_mutation(child, ctx.rng);
                }
            }
            offspring.push(c1);
            if offspring.len() < size - elites {
                offspring.push(c2);
            }
        }

        let offspring_costs = evaluate_all(ctx.problem, &offspring);
        self.population.truncate(elites);
        self.costs.truncate(elites);
        self.population.extend(offspring);
        self.costs.extend(offspring_costs);
        self.sort_population();

        publish(state, &self.population[0], self.costs[0]);
        Ok(())
    }
}

impl MethodSpec for GeneticAlgorithm {
    const NAME: &'static str = "genetic_algorithm";
    const FAMILY: Family = Family::Baseline;

    fn schema() -> ParamSchema {
        GaConfig::schema()
    }

    fn from_params(params: &Params) -> QapResult<Self> {
        GaConfig::from_params(params).map(Self::new)
    }
}
