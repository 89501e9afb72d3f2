//! Solve pipeline.
//!
//! The [`Orchestrator`] drives any registered [`SolverMethod`] through a
//! uniform iterate–evaluate–stop loop:
//!
//! - continuous iterates are re-projected onto the Birkhoff polytope after
//!   every step, with one damped retry when projection diverges
//! - NaN/Inf iterates are rolled back to the last valid iterate with a
//!   halved step scale, and the run continues
//! - every step is discretized and scored, so the result always carries
//!   the best assignment seen
//! - the run stops on windowed convergence, the iteration budget, or the
//!   wall-clock limit, whichever fires first
//!
//! # Examples
//!
//! ```
//! use u_qap::pipeline::{solve, SolveConfig};
//! use u_qap::problem::generate;
//! use u_qap::registry::MethodRegistry;
//!
//! let registry = MethodRegistry::with_builtin();
//! let problem = generate::random_uniform(8, 10, 1).unwrap();
//! let config = SolveConfig::default().with_max_iterations(50).with_seed(3);
//!
//! let result = solve(&registry, &problem, "tabu_search", &config).unwrap();
//! assert_eq!(result.solution.len(), 8);
//! assert!(result.iterations <= 50);
//! ```

mod config;
mod runner;
mod types;

pub use config::{SolveConfig, WarmStart};
pub use runner::{solve, Orchestrator};
pub use types::{Iterate, SolverMethod, SolverState, StepContext};
