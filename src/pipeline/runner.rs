//! Method-agnostic iterate–evaluate–stop loop.
//!
//! # Algorithm
//!
//! 1. Resolve the method, merge parameters, validate inputs (errors here
//!    are returned before any iteration)
//! 2. Seed the iterate: uniform matrix or warm start for continuous
//!    methods, random permutation or warm start for discrete ones
//! 3. Repeat until a stopping criterion fires:
//!    a. `step` the method
//!    b. recover from NaN/Inf by restoring the last valid iterate with a
//!       halved step scale
//!    c. re-project continuous iterates (one damped retry on divergence)
//!    d. score, discretize, update the best assignment, append to the trace
//!    e. stop on convergence, iteration budget, or deadline
//! 4. Return the best assignment seen

use std::collections::VecDeque;
use std::time::Instant;

use super::config::{SolveConfig, WarmStart};
use super::types::{Iterate, SolverState, StepContext};
use crate::error::{QapError, QapResult};
use crate::problem::Problem;
use crate::projection::discretize;
use crate::random::create_rng;
use crate::registry::{Family, MethodRegistry};
use crate::solution::{
    ContinuousSolution, OptimizationResult, Permutation, StopReason, TracePoint,
};

/// Solves `problem` with the method registered as `method`.
pub fn solve(
    registry: &MethodRegistry,
    problem: &Problem,
    method: &str,
    config: &SolveConfig,
) -> QapResult<OptimizationResult> {
    Orchestrator::new(registry).solve(problem, method, config)
}

/// Drives any registered method through the solve loop.
///
/// Holds only a shared reference to the registry; every call builds a
/// fresh solver instance and generator, so runs never share state.
pub struct Orchestrator<'r> {
    registry: &'r MethodRegistry,
}

/// Sliding-window improvement test.
///
/// Keeps only the last `window + 1` values.
#[derive(Debug)]
struct ConvergenceMonitor {
    window: usize,
    tolerance: f64,
    history: VecDeque<f64>,
}

impl ConvergenceMonitor {
    fn new(window: usize, tolerance: f64) -> Self {
        Self {
            window,
            tolerance,
            history: VecDeque::new(),
        }
    }

    fn push(&mut self, value: f64) {
        self.history.push_back(value);
        if self.history.len() > self.window.saturating_add(1) {
            self.history.pop_front();
        }
    }

    fn converged(&self) -> bool {
        if self.history.len() <= self.window {
            return false;
        }
        match (self.history.front(), self.history.back()) {
            (Some(&past), Some(&current)) => {
                (past - current).abs() <= self.tolerance * current.abs().max(1.0)
            }
            _ => false,
        }
    }
}

/// Best assignment seen so far.
struct Incumbent {
    perm: Permutation,
    cost: f64,
}

impl Incumbent {
    fn offer(&mut self, perm: &Permutation, cost: f64) {
        if cost < self.cost {
            self.perm = perm.clone();
            self.cost = cost;
        }
    }
}

impl<'r> Orchestrator<'r> {
    pub fn new(registry: &'r MethodRegistry) -> Self {
        Self { registry }
    }

    /// Runs one solve.
    ///
    /// Fails only on structural problems: invalid configuration, unknown
    /// method, invalid parameters, or a warm start of the wrong size.
    /// Non-convergence still yields a result with `converged == false`,
    /// including a start-up failure (projection or initialization), which
    /// stops the run at iteration 0 with the seed's assignment.
    pub fn solve(
        &self,
        problem: &Problem,
        method_name: &str,
        config: &SolveConfig,
    ) -> QapResult<OptimizationResult> {
        config.validate().map_err(QapError::InvalidConfig)?;
        let descriptor = self.registry.lookup(method_name)?;
        let mut method = descriptor.instantiate(&config.params)?;
        let family = descriptor.family();

        let n = problem.size();
        if let Some(start) = &config.warm_start {
            if start.size() != n {
                return Err(QapError::DimensionMismatch {
                    expected: n,
                    found: start.size(),
                });
            }
        }

        let started = Instant::now();
        let deadline = config.time_limit().map(|limit| started + limit);
        let mut rng = create_rng(config.seed);

        let iterate = self.seed_iterate(problem, family, config, &mut rng)?;
        let mut state = SolverState::new(iterate, 0.0);
        let seeded = reproject(&mut state.iterate, config);
        let (objective, perm, cost) = evaluate(problem, &state.iterate, config);
        state.objective = objective;
        let mut best = Incumbent { perm, cost };

        let started_up = seeded.and_then(|()| {
            let mut ctx = StepContext {
                problem,
                rng: &mut rng,
                projection: &config.projection,
                iteration: 0,
                best_objective: best.cost,
            };
            method.initialize(&mut ctx, &mut state)?;
            // Initialization may move the iterate (e.g. an initial local search).
            reproject(&mut state.iterate, config)
        });
        let mut stop_reason = StopReason::MaxIterations;
        let budget = match started_up {
            Ok(()) => {
                let (objective, perm, cost) = evaluate(problem, &state.iterate, config);
                state.objective = objective;
                best.offer(&perm, cost);
                config.max_iterations
            }
            Err(err) => {
                log::warn!("{method_name} failed to start: {err}");
                stop_reason = match err {
                    QapError::ProjectionDivergence { .. } => StopReason::ProjectionFailure,
                    _ => StopReason::Aborted,
                };
                0
            }
        };

        let mut trace = vec![TracePoint {
            iteration: 0,
            objective: state.objective,
            best_objective: best.cost,
        }];
        let mut monitor = ConvergenceMonitor::new(config.window, config.tolerance);
        monitor.push(signal(&state, best.cost));

        let mut last_valid = state.iterate.clone();
        let mut recoveries = 0usize;
        let mut iterations = 0usize;

        log::info!(
            "solving '{}' (n={n}) with {method_name} [{family}], seed {}",
            problem.name(),
            config.seed
        );

        for iteration in 1..=budget {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                stop_reason = StopReason::TimeLimit;
                break;
            }
            iterations = iteration;

            let outcome = {
                let mut ctx = StepContext {
                    problem,
                    rng: &mut rng,
                    projection: &config.projection,
                    iteration,
                    best_objective: best.cost,
                };
                method.step(&mut ctx, &mut state)
            };

            let unstable = match outcome {
                Ok(()) => !state.iterate.is_finite(),
                Err(QapError::NumericalInstability(msg)) => {
                    log::debug!("{method_name} step {iteration}: {msg}");
                    true
                }
                Err(err) => {
                    log::error!("{method_name} aborted at step {iteration}: {err}");
                    stop_reason = StopReason::Aborted;
                    break;
                }
            };
            if unstable {
                recover(&mut state, &last_valid, method_name, iteration);
                recoveries += 1;
            }

            match reproject(&mut state.iterate, config) {
                Ok(()) => {}
                Err(QapError::NumericalInstability(msg)) => {
                    log::warn!("{method_name} step {iteration}: {msg}");
                    recover(&mut state, &last_valid, method_name, iteration);
                    recoveries += 1;
                }
                Err(err) => {
                    log::warn!("{method_name} stopped at step {iteration}: {err}");
                    state.iterate = last_valid.clone();
                    stop_reason = StopReason::ProjectionFailure;
                    break;
                }
            }

            let (objective, perm, cost) = evaluate(problem, &state.iterate, config);
            state.objective = objective;
            best.offer(&perm, cost);
            last_valid.clone_from(&state.iterate);

            if iteration % config.trace_stride == 0 || iteration == config.max_iterations {
                trace.push(TracePoint {
                    iteration,
                    objective,
                    best_objective: best.cost,
                });
            }

            monitor.push(signal(&state, best.cost));
            if monitor.converged() {
                stop_reason = StopReason::Converged;
                break;
            }
        }

        if trace.last().is_some_and(|t| t.iteration != iterations) {
            trace.push(TracePoint {
                iteration: iterations,
                objective: state.objective,
                best_objective: best.cost,
            });
        }

        let elapsed = started.elapsed();
        log::info!(
            "{method_name} on '{}': objective {} after {iterations} iterations in {:.1} ms ({stop_reason:?})",
            problem.name(),
            best.cost,
            elapsed.as_secs_f64() * 1e3,
        );

        Ok(OptimizationResult {
            method: method_name.to_string(),
            solution: best.perm,
            objective_value: best.cost,
            iterations,
            elapsed,
            converged: stop_reason.is_converged(),
            stop_reason,
            trace,
            recoveries,
        })
    }

    fn seed_iterate(
        &self,
        problem: &Problem,
        family: Family,
        config: &SolveConfig,
        rng: &mut rand::rngs::StdRng,
    ) -> QapResult<Iterate> {
        let n = problem.size();
        let iterate = match (family, &config.warm_start) {
            (Family::Novel, None) => Iterate::Continuous(ContinuousSolution::uniform(n)),
            (Family::Novel, Some(WarmStart::Matrix(m))) => {
                if !m.is_finite() {
                    return Err(QapError::InvalidConfig(
                        "warm start contains NaN or infinite entries".into(),
                    ));
                }
                // Projected by the caller with the rest of start-up.
                Iterate::Continuous(ContinuousSolution::from_matrix(m.clone()))
            }
            (Family::Novel, Some(WarmStart::Permutation(p))) => {
                Iterate::Continuous(ContinuousSolution::from_matrix(p.to_matrix()))
            }
            (Family::Baseline, None) => Iterate::Discrete(Permutation::random(n, rng)),
            (Family::Baseline, Some(WarmStart::Matrix(m))) => {
                Iterate::Discrete(discretize(m, &config.projection))
            }
            (Family::Baseline, Some(WarmStart::Permutation(p))) => Iterate::Discrete(p.clone()),
        };
        Ok(iterate)
    }
}

/// Projects a continuous iterate; permutations are left untouched.
fn reproject(iterate: &mut Iterate, config: &SolveConfig) -> QapResult<()> {
    match iterate {
        Iterate::Continuous(x) => project_with_retry(x.matrix_mut(), config),
        Iterate::Discrete(_) => Ok(()),
    }
}

/// Sinkhorn projection with one damped retry.
fn project_with_retry(m: &mut crate::matrix::SquareMatrix, config: &SolveConfig) -> QapResult<()> {
    let projector = config.projection.projector();
    match projector.project(m) {
        Ok(_) => Ok(()),
        Err(QapError::ProjectionDivergence {
            iterations,
            residual,
        }) => {
            log::warn!(
                "projection diverged after {iterations} sweeps (residual {residual:.3e}); retrying with damping {}",
                config.projection.damping
            );
            projector
                .project_damped(m, config.projection.damping)
                .map(|_| ())
        }
        Err(err) => Err(err),
    }
}

/// Returns `(iterate objective, discretized permutation, permutation cost)`.
fn evaluate(problem: &Problem, iterate: &Iterate, config: &SolveConfig) -> (f64, Permutation, f64) {
    match iterate {
        Iterate::Continuous(x) => {
            let objective = problem.objective(x.matrix());
            let perm = discretize(x.matrix(), &config.projection);
            let cost = problem.permutation_cost(perm.as_slice());
            (objective, perm, cost)
        }
        Iterate::Discrete(p) => {
            let cost = problem.permutation_cost(p.as_slice());
            (cost, p.clone(), cost)
        }
    }
}

/// Convergence signal: the relaxed objective for continuous runs, the
/// best discrete objective for permutation runs.
fn signal(state: &SolverState, best_cost: f64) -> f64 {
    match state.iterate {
        Iterate::Continuous(_) => state.objective,
        Iterate::Discrete(_) => best_cost,
    }
}

fn recover(state: &mut SolverState, last_valid: &Iterate, method: &str, iteration: usize) {
    state.iterate = last_valid.clone();
    state.step_scale *= 0.5;
    log::warn!(
        "{method}: non-finite iterate at step {iteration}; restored last valid iterate, step scale now {}",
        state.step_scale
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::SquareMatrix;
    use crate::pipeline::SolverMethod;
    use crate::projection::ProjectionConfig;
    use crate::registry::{ParamSchema, Params};

    fn line4() -> Problem {
        let rows: Vec<Vec<f64>> = (0..4)
            .map(|i: i32| (0..4).map(|j: i32| (i - j).abs() as f64).collect())
            .collect();
        Problem::from_rows("line4", &rows, &rows).unwrap()
    }

    /// Writes NaN into the iterate on every odd step.
    struct Poison {
        calls: usize,
    }

    impl SolverMethod for Poison {
        fn step(&mut self, _ctx: &mut StepContext<'_>, state: &mut SolverState) -> QapResult<()> {
            self.calls += 1;
            let x = state.continuous_mut()?;
            if self.calls % 2 == 1 {
                x.matrix_mut()[(0, 0)] = f64::NAN;
            }
            Ok(())
        }
    }

    /// Leaves the iterate alone.
    struct Idle;

    impl SolverMethod for Idle {
        fn step(&mut self, _ctx: &mut StepContext<'_>, _state: &mut SolverState) -> QapResult<()> {
            Ok(())
        }
    }

    /// Zeroes the first row so projection cannot succeed.
    struct ZeroRow;

    impl SolverMethod for ZeroRow {
        fn step(&mut self, _ctx: &mut StepContext<'_>, state: &mut SolverState) -> QapResult<()> {
            let x = state.continuous_mut()?;
            x.matrix_mut().row_mut(0).iter_mut().for_each(|v| *v = 0.0);
            Ok(())
        }
    }

    /// Fails during initialization with the stored error.
    struct BrokenStart(fn() -> QapError);

    impl SolverMethod for BrokenStart {
        fn initialize(&mut self, _ctx: &mut StepContext<'_>, _state: &mut SolverState) -> QapResult<()> {
            Err((self.0)())
        }

        fn step(&mut self, _ctx: &mut StepContext<'_>, _state: &mut SolverState) -> QapResult<()> {
            Ok(())
        }
    }

    fn tight_projection() -> ProjectionConfig {
        ProjectionConfig::default()
            .with_max_iterations(1)
            .with_tolerance(1e-12)
    }

    fn assert_startup_stop(problem: &Problem, result: &OptimizationResult, reason: StopReason) {
        assert_eq!(result.stop_reason, reason);
        assert!(!result.converged);
        assert_eq!(result.iterations, 0);
        assert_eq!(result.trace.len(), 1);
        let perm = result.solution.as_slice();
        assert!(Permutation::new(perm.to_vec()).is_ok());
        assert!((result.objective_value - problem.permutation_cost(perm)).abs() < 1e-9);
    }

    fn registry() -> MethodRegistry {
        let mut r = MethodRegistry::new();
        r.register("poison", Family::Novel, ParamSchema::new(), |_: &Params| {
            Ok(Box::new(Poison { calls: 0 }) as Box<dyn SolverMethod>)
        });
        r.register("idle", Family::Novel, ParamSchema::new(), |_: &Params| {
            Ok(Box::new(Idle) as Box<dyn SolverMethod>)
        });
        r.register("idle_discrete", Family::Baseline, ParamSchema::new(), |_: &Params| {
            Ok(Box::new(Idle) as Box<dyn SolverMethod>)
        });
        r.register("zero_row", Family::Novel, ParamSchema::new(), |_: &Params| {
            Ok(Box::new(ZeroRow) as Box<dyn SolverMethod>)
        });
        r.register("diverging_start", Family::Novel, ParamSchema::new(), |_: &Params| {
            let err = || QapError::ProjectionDivergence {
                iterations: 1,
                residual: 0.5,
            };
            Ok(Box::new(BrokenStart(err)) as Box<dyn SolverMethod>)
        });
        r.register("failing_start", Family::Baseline, ParamSchema::new(), |_: &Params| {
            let err = || QapError::InvalidConfig("no start".into());
            Ok(Box::new(BrokenStart(err)) as Box<dyn SolverMethod>)
        });
        r
    }

    #[test]
    fn test_unknown_method() {
        let r = registry();
        let err = solve(&r, &line4(), "missing", &SolveConfig::default()).unwrap_err();
        assert!(matches!(err, QapError::MethodNotFound(_)));
    }

    #[test]
    fn test_invalid_config_rejected_before_run() {
        let r = registry();
        let config = SolveConfig::default().with_max_iterations(0);
        assert!(matches!(
            solve(&r, &line4(), "idle", &config),
            Err(QapError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_warm_start_size_mismatch() {
        let r = registry();
        let config =
            SolveConfig::default().with_warm_start(WarmStart::Permutation(Permutation::identity(3)));
        assert!(matches!(
            solve(&r, &line4(), "idle", &config),
            Err(QapError::DimensionMismatch { expected: 4, found: 3 })
        ));
    }

    #[test]
    fn test_idle_converges_after_window() {
        let r = registry();
        let config = SolveConfig::default().with_window(5);
        let result = solve(&r, &line4(), "idle", &config).unwrap();
        assert!(result.converged);
        assert_eq!(result.stop_reason, StopReason::Converged);
        assert_eq!(result.iterations, 5);
        assert_eq!(result.trace.len(), 6);
    }

    #[test]
    fn test_iteration_cap_is_not_converged() {
        let r = registry();
        let config = SolveConfig::default().with_window(50).with_max_iterations(10);
        let result = solve(&r, &line4(), "idle_discrete", &config).unwrap();
        assert!(!result.converged);
        assert_eq!(result.stop_reason, StopReason::MaxIterations);
        assert_eq!(result.iterations, 10);
    }

    #[test]
    fn test_nan_recovery_continues_run() {
        let r = registry();
        let config = SolveConfig::default().with_max_iterations(6).with_window(100);
        let result = solve(&r, &line4(), "poison", &config).unwrap();
        assert_eq!(result.recoveries, 3);
        assert_eq!(result.iterations, 6);
        assert!(Permutation::new(result.solution.as_slice().to_vec()).is_ok());
    }

    #[test]
    fn test_damped_retry_recovers_projection() {
        // A zero row fails plain Sinkhorn; the damped retry succeeds.
        let r = registry();
        let config = SolveConfig::default().with_max_iterations(3).with_window(100);
        let result = solve(&r, &line4(), "zero_row", &config).unwrap();
        assert_eq!(result.stop_reason, StopReason::MaxIterations);
        assert_eq!(result.iterations, 3);
    }

    #[test]
    fn test_warm_start_matrix_is_projected() {
        let r = registry();
        let mut m = SquareMatrix::filled(4, 1.0);
        m[(0, 0)] = 5.0;
        let config = SolveConfig::default()
            .with_warm_start(WarmStart::Matrix(m))
            .with_max_iterations(1);
        let result = solve(&r, &line4(), "idle", &config).unwrap();
        assert_eq!(result.iterations, 1);
    }

    #[test]
    fn test_initialize_divergence_is_projection_failure() {
        let r = registry();
        let p = line4();
        let result = solve(&r, &p, "diverging_start", &SolveConfig::default()).unwrap();
        assert_startup_stop(&p, &result, StopReason::ProjectionFailure);
    }

    #[test]
    fn test_initialize_error_aborts_with_seed() {
        let r = registry();
        let p = line4();
        let config = SolveConfig::default().with_seed(9);
        let result = solve(&r, &p, "failing_start", &config).unwrap();
        assert_startup_stop(&p, &result, StopReason::Aborted);
        let seed = Permutation::random(4, &mut create_rng(9));
        assert_eq!(result.solution, seed);
    }

    #[test]
    fn test_unprojectable_warm_start_matrix() {
        let r = registry();
        let p = line4();
        let mut m = SquareMatrix::filled(4, 1.0);
        m[(0, 0)] = 5.0;
        let config = SolveConfig::default()
            .with_warm_start(WarmStart::Matrix(m))
            .with_projection(tight_projection());
        let result = solve(&r, &p, "idle", &config).unwrap();
        assert_startup_stop(&p, &result, StopReason::ProjectionFailure);
    }

    #[test]
    fn test_builtin_startup_projection_failure_is_reported() {
        let r = MethodRegistry::with_builtin();
        let p = line4();
        let config = SolveConfig::default().with_projection(tight_projection());
        let result = solve(&r, &p, "attractor_programming", &config).unwrap();
        assert!(!result.converged);
        assert!(Permutation::new(result.solution.as_slice().to_vec()).is_ok());
    }

    #[test]
    fn test_time_limit_stops_run() {
        let r = registry();
        let config = SolveConfig::default()
            .with_max_iterations(usize::MAX)
            .with_tolerance(0.0)
            .with_window(usize::MAX - 1)
            .with_trace_stride(1000)
            .with_time_limit_ms(20);
        let result = solve(&r, &line4(), "idle_discrete", &config).unwrap();
        assert_eq!(result.stop_reason, StopReason::TimeLimit);
        assert!(!result.converged);
    }

    #[test]
    fn test_monitor() {
        let mut m = ConvergenceMonitor::new(2, 1e-6);
        m.push(10.0);
        m.push(5.0);
        assert!(!m.converged());
        m.push(5.0);
        assert!(!m.converged());
        m.push(5.0);
        assert!(m.converged());
        assert_eq!(m.history.len(), 3);
        for _ in 0..100 {
            m.push(5.0);
        }
        assert_eq!(m.history.len(), 3);
        assert!(m.converged());
    }
}
