//! Simulated Annealing (SA) over the swap neighbourhood.
//!
//! A single-solution trajectory method. Worsening swaps are accepted with
//! the Metropolis probability `exp(-Δ/T)`, and the temperature `T` falls
//! according to a cooling schedule. One solver step performs
//! `moves_per_step` proposals and then cools once.
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Burkard & Rendl (1984), "A thermodynamically motivated simulation
//!   procedure for combinatorial optimization problems"
//! - Lundy & Mees (1986), "Convergence of an Annealing Algorithm"

mod config;
mod method;

pub use config::{CoolingSchedule, SaConfig};
pub use method::SimulatedAnnealing;
