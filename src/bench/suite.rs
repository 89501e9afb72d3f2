//! Method-by-problem comparison runs.

use crate::pipeline::{Orchestrator, SolveConfig};
use crate::problem::Problem;
use crate::random::derive_seed;
use crate::registry::MethodRegistry;
use crate::solution::{OptimizationResult, StopReason};

use super::report::{BenchmarkReport, BenchmarkRow, FailedCell};

/// Settings shared by every cell of a comparison.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Runs per (method, problem) pair.
    pub repetitions: usize,
    /// Base from which every cell's seed is derived.
    pub base_seed: u64,
    /// Run settings; `seed` is overwritten per cell.
    pub solve: SolveConfig,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            repetitions: 5,
            base_seed: 42,
            solve: SolveConfig::default(),
        }
    }
}

impl BenchmarkConfig {
    pub fn with_repetitions(mut self, repetitions: usize) -> Self {
        self.repetitions = repetitions;
        self
    }

    pub fn with_base_seed(mut self, seed: u64) -> Self {
        self.base_seed = seed;
        self
    }

    pub fn with_solve(mut self, solve: SolveConfig) -> Self {
        self.solve = solve;
        self
    }
}

/// One (problem, method, repetition) run.
#[derive(Debug, Clone, Copy)]
struct Cell {
    problem: usize,
    method: usize,
    repetition: usize,
    seed: u64,
}

/// Cells in problem-major, then method, then repetition order; cell `k`
/// gets seed `derive_seed(base_seed, k)`.
fn plan_cells(problems: usize, methods: usize, config: &BenchmarkConfig) -> Vec<Cell> {
    let mut cells = Vec::with_capacity(problems * methods * config.repetitions);
    for problem in 0..problems {
        for method in 0..methods {
            for repetition in 0..config.repetitions {
                let seed = derive_seed(config.base_seed, cells.len() as u64);
                cells.push(Cell {
                    problem,
                    method,
                    repetition,
                    seed,
                });
            }
        }
    }
    cells
}

/// Runs registered methods over a set of problems.
///
/// # Examples
///
/// ```
/// use u_qap::bench::{BenchmarkConfig, BenchmarkSuite};
/// use u_qap::pipeline::SolveConfig;
/// use u_qap::problem::generate;
/// use u_qap::registry::MethodRegistry;
///
/// let registry = MethodRegistry::with_builtin();
/// let problems = vec![generate::random_uniform(6, 10, 1).unwrap()];
/// let config = BenchmarkConfig::default()
///     .with_repetitions(2)
///     .with_solve(SolveConfig::default().with_max_iterations(20));
/// let report = BenchmarkSuite::new(&registry).run_comparison(
///     &problems,
///     &["tabu_search", "grasp"],
///     &config,
/// );
/// assert_eq!(report.rows.len(), 2);
/// assert!(report.failures.is_empty());
/// ```
pub struct BenchmarkSuite<'r> {
    registry: &'r MethodRegistry,
}

impl<'r> BenchmarkSuite<'r> {
    pub fn new(registry: &'r MethodRegistry) -> Self {
        Self { registry }
    }

    /// Runs every method on every problem `config.repetitions` times.
    ///
    /// Cell `k` (problem-major, then method, then repetition) uses seed
    /// `derive_seed(base_seed, k)`, so a report is reproducible regardless
    /// of execution order. A failing cell is logged and recorded; the
    /// remaining cells still run.
    pub fn run_comparison(
        &self,
        problems: &[Problem],
        methods: &[&str],
        config: &BenchmarkConfig,
    ) -> BenchmarkReport {
        let cells = plan_cells(problems.len(), methods.len(), config);
        log::info!(
            "benchmark: {} problems x {} methods x {} repetitions",
            problems.len(),
            methods.len(),
            config.repetitions
        );

        let outcomes = self.run_cells(&cells, problems, methods, config);

        let mut report = BenchmarkReport::default();
        let reps = config.repetitions;
        for (p, problem) in problems.iter().enumerate() {
            for (m, &method) in methods.iter().enumerate() {
                let start = (p * methods.len() + m) * reps;
                let mut results = Vec::with_capacity(reps);
                let mut failures = 0;
                for (cell, outcome) in cells[start..start + reps].iter().zip(&outcomes[start..start + reps]) {
                    match outcome {
                        Ok(result) => results.push(result.clone()),
                        Err(error) => {
                            failures += 1;
                            report.failures.push(FailedCell {
                                method: method.to_string(),
                                problem: problem.name().to_string(),
                                repetition: cell.repetition,
                                error: error.clone(),
                            });
                        }
                    }
                }
                report.rows.push(BenchmarkRow::aggregate(
                    method,
                    problem.name(),
                    problem.best_known(),
                    &results,
                    failures,
                ));
            }
        }
        report
    }

    #[cfg(not(feature = "parallel"))]
    fn run_cells(
        &self,
        cells: &[Cell],
        problems: &[Problem],
        methods: &[&str],
        config: &BenchmarkConfig,
    ) -> Vec<Result<OptimizationResult, String>> {
        cells
            .iter()
            .map(|cell| self.run_cell(cell, problems, methods, config))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn run_cells(
        &self,
        cells: &[Cell],
        problems: &[Problem],
        methods: &[&str],
        config: &BenchmarkConfig,
    ) -> Vec<Result<OptimizationResult, String>> {
        use rayon::prelude::*;
        cells
            .par_iter()
            .map(|cell| self.run_cell(cell, problems, methods, config))
            .collect()
    }

    fn run_cell(
        &self,
        cell: &Cell,
        problems: &[Problem],
        methods: &[&str],
        config: &BenchmarkConfig,
    ) -> Result<OptimizationResult, String> {
        let problem = &problems[cell.problem];
        let method = methods[cell.method];
        let solve = config.solve.clone().with_seed(cell.seed);
        let outcome = match Orchestrator::new(self.registry).solve(problem, method, &solve) {
            Ok(result) if matches!(result.stop_reason, StopReason::Aborted | StopReason::ProjectionFailure) => {
                Err(format!("run stopped early: {:?}", result.stop_reason))
            }
            Ok(result) => Ok(result),
            Err(err) => Err(err.to_string()),
        };
        match &outcome {
            Ok(result) => log::debug!(
                "benchmark cell {method} / {} #{}: {:.4}",
                problem.name(),
                cell.repetition,
                result.objective_value
            ),
            Err(err) => log::warn!(
                "benchmark cell {method} / {} #{} failed: {err}",
                problem.name(),
                cell.repetition
            ),
        }
        outcome
    }
}
