//! Genetic Algorithm (GA) over permutations.
//!
//! One solver step is one generation:
//!
//! 1. Copy the elites unchanged
//! 2. Select parents, apply OX or PMX crossover
//! 3. Apply swap mutation
//! 4. Evaluate the offspring (on the rayon pool with the `parallel`
//!    feature)
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Tate & Smith (1995), "A genetic approach to the quadratic assignment
//!   problem", *Computers & Operations Research* 22(1)

mod config;
mod method;
mod selection;

pub use config::{Crossover, GaConfig};
pub use method::GeneticAlgorithm;
pub use selection::Selection;
