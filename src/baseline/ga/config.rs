//! GA configuration.

use super::selection::Selection;
use crate::error::{QapError, QapResult};
use crate::registry::{ParamSchema, ParamSpec, Params};

/// Permutation crossover operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Crossover {
    /// Order crossover (relative order).
    #[default]
    Order,
    /// Partially mapped crossover (absolute position).
    PartiallyMapped,
}

/// Configuration for [`GeneticAlgorithm`](super::GeneticAlgorithm).
///
/// # Examples
///
/// ```
/// use u_qap::baseline::ga::{Crossover, GaConfig, Selection};
///
/// let config = GaConfig::default()
///     .with_population_size(60)
///     .with_selection(Selection::Tournament(5))
///     .with_crossover(Crossover::PartiallyMapped)
///     .with_mutation_rate(0.3);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct GaConfig {
    /// Number of individuals in the population.
    pub population_size: usize,

    /// Selection strategy for choosing parents.
    pub selection: Selection,

    /// Crossover operator.
    pub crossover: Crossover,

    /// Number of best individuals copied unchanged each generation.
    pub elite_count: usize,

    /// Probability of applying crossover to a pair of parents.
    pub crossover_rate: f64,

    /// Probability of applying swap mutation to an offspring.
    pub mutation_rate: f64,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 30,
            selection: Selection::default(),
            crossover: Crossover::default(),
            elite_count: 2,
            crossover_rate: 0.9,
            mutation_rate: 0.2,
        }
    }
}

impl GaConfig {
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_crossover(mut self, crossover: Crossover) -> Self {
        self.crossover = crossover;
        self
    }

    pub fn with_elite_count(mut self, n: usize) -> Self {
        self.elite_count = n;
        self
    }

    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate;
        self
    }

    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.population_size < 2 {
            return Err("population_size must be at least 2".into());
        }
        if self.elite_count >= self.population_size {
            return Err("elite_count must be less than population_size".into());
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err("crossover_rate must be in [0, 1]".into());
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err("mutation_rate must be in [0, 1]".into());
        }
        if let Selection::Tournament(0) = self.selection {
            return Err("tournament size must be at least 1".into());
        }
        Ok(())
    }

    pub(crate) fn schema() -> ParamSchema {
        let d = Self::default();
        ParamSchema::new()
            .with(ParamSpec::int("population_size", d.population_size as i64, "individuals").range(2.0, 10_000.0))
            .with(ParamSpec::int("elite_count", d.elite_count as i64, "elites kept per generation").at_least(0.0))
            .with(ParamSpec::float("crossover_rate", d.crossover_rate, "crossover probability").range(0.0, 1.0))
            .with(ParamSpec::float("mutation_rate", d.mutation_rate, "mutation probability").range(0.0, 1.0))
            .with(ParamSpec::int("selection", 0, "0 tournament, 1 roulette, 2 rank").range(0.0, 2.0))
            .with(ParamSpec::int("tournament_size", 3, "tournament size").at_least(1.0))
            .with(ParamSpec::bool("pmx", false, "use PMX instead of OX"))
    }

    pub(crate) fn from_params(params: &Params) -> QapResult<Self> {
        let selection = match params.int("selection")? {
            0 => Selection::Tournament(params.usize("tournament_size")?),
            1 => Selection::Roulette,
            _ => Selection::Rank,
        };
        let crossover = if params.bool("pmx")? {
            Crossover::PartiallyMapped
        } else {
            Crossover::Order
        };
        let config = Self {
            population_size: params.usize("population_size")?,
            selection,
            crossover,
            elite_count: params.usize("elite_count")?,
            crossover_rate: params.float("crossover_rate")?,
            mutation_rate: params.float("mutation_rate")?,
        };
        config.validate().map_err(QapError::InvalidConfig)?;
        Ok(config)
    }
}
