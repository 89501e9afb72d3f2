//! Problem model: instances, scoring, loading, and generation.
//!
//! [`Problem::objective`] is the single scoring function; every solver and
//! the post-hoc validation go through it (or its permutation fast paths
//! [`Problem::permutation_cost`] and [`Problem::swap_delta`]).

pub mod generate;
mod loader;
mod types;

pub use loader::{
    load_instance_file, load_solution_file, parse_instance, parse_solution, SolutionFile,
};
pub use types::Problem;
