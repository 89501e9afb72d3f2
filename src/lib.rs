//! Quadratic Assignment Problem (QAP) optimization engine.
//!
//! Solves Koopmans–Beckmann QAP instances, minimising
//! `Σᵢⱼ A[i][j] · B[π(i)][π(j)]` over permutations `π`, with two families of
//! solvers behind one interface:
//!
//! - **Novel** methods work on a continuous relaxation over the Birkhoff
//!   polytope of doubly-stochastic matrices and are discretized back to a
//!   permutation: FFT-preconditioned Laplace descent, reverse-time saddle
//!   escape, attractor programming, entropic mirror descent, and homotopy
//!   continuation.
//! - **Baseline** methods are classical permutation metaheuristics:
//!   simulated annealing, genetic algorithm, particle swarm, differential
//!   evolution, ant colony, tabu search, variable neighborhood search,
//!   iterated local search, and GRASP.
//!
//! # Architecture
//!
//! - [`problem`]: instances, the QAPLIB loader, and generators
//! - [`projection`]: Sinkhorn projection and assignment-based discretization
//! - [`registry`]: the explicit name → method table with parameter schemas
//! - [`pipeline`]: the orchestrator that drives any method to a result
//! - [`bench`]: multi-seed comparisons and report export
//!
//! All randomness flows from the seed in [`pipeline::SolveConfig`]; the same
//! problem, method, configuration, and seed always replay the same run.
//!
//! # Examples
//!
//! ```
//! use u_qap::pipeline::{solve, SolveConfig};
//! use u_qap::problem::Problem;
//! use u_qap::registry::MethodRegistry;
//!
//! let line: Vec<Vec<f64>> = (0..4)
//!     .map(|i: i32| (0..4).map(|j: i32| (i - j).abs() as f64).collect())
//!     .collect();
//! let problem = Problem::from_rows("line4", &line, &line).unwrap();
//!
//! let registry = MethodRegistry::with_builtin();
//! let result = solve(&registry, &problem, "simulated_annealing", &SolveConfig::default()).unwrap();
//! assert!(result.objective_value <= 40.0);
//! ```

pub mod baseline;
pub mod bench;
pub mod error;
pub mod matrix;
pub mod novel;
pub mod pipeline;
pub mod problem;
pub mod projection;
pub mod random;
pub mod registry;
pub mod solution;

pub use error::{QapError, QapResult};
pub use pipeline::{solve, Orchestrator, SolveConfig};
pub use problem::Problem;
pub use registry::MethodRegistry;
pub use solution::{OptimizationResult, Permutation, StopReason};
