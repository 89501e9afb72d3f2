//! Baseline solver family: classical metaheuristics on permutations.
//!
//! Every method keeps the run's iterate a valid [`Permutation`]; the
//! orchestrator's projection step is a no-op for them. One solver step is
//! one natural unit of work:
//!
//! | Name | One step |
//! |---|---|
//! | `simulated_annealing` | `moves_per_step` Metropolis swaps, then one cooling step |
//! | `genetic_algorithm` | one generation |
//! | `particle_swarm` | one swarm update over random keys |
//! | `differential_evolution` | one DE/rand/1/bin generation over random keys |
//! | `ant_colony` | one MAX–MIN ant system iteration |
//! | `tabu_search` | one best admissible swap |
//! | `variable_neighborhood` | one shake + local search + neighbourhood change |
//! | `iterated_local_search` | one perturbation + local search + acceptance |
//! | `grasp` | one randomized greedy construction + local search |

pub mod aco;
pub mod de;
pub mod ga;
pub mod grasp;
pub mod ils;
pub mod local_search;
pub mod operators;
pub mod pso;
pub mod sa;
pub mod tabu;
pub mod vns;

pub use aco::AntColony;
pub use de::DifferentialEvolution;
pub use ga::GeneticAlgorithm;
pub use grasp::Grasp;
pub use ils::IteratedLocalSearch;
pub use pso::ParticleSwarm;
pub use sa::SimulatedAnnealing;
pub use tabu::TabuSearch;
pub use vns::VariableNeighborhood;

use crate::pipeline::{Iterate, SolverState};
use crate::problem::Problem;
use crate::registry::MethodRegistry;
use crate::solution::Permutation;

/// Registers every baseline method.
pub fn register_all(registry: &mut MethodRegistry) {
    registry.register_method::<SimulatedAnnealing>();
    registry.register_method::<GeneticAlgorithm>();
    registry.register_method::<ParticleSwarm>();
    registry.register_method::<DifferentialEvolution>();
    registry.register_method::<AntColony>();
    registry.register_method::<TabuSearch>();
    registry.register_method::<VariableNeighborhood>();
    registry.register_method::<IteratedLocalSearch>();
    registry.register_method::<Grasp>();
}

/// Costs of a batch of assignments.
#[cfg(not(feature = "parallel"))]
pub(crate) fn evaluate_all(problem: &Problem, perms: &[Vec<usize>]) -> Vec<f64> {
    perms.iter().map(|p| problem.permutation_cost(p)).collect()
}

/// Costs of a batch of assignments, evaluated on the rayon pool.
#[cfg(feature = "parallel")]
pub(crate) fn evaluate_all(problem: &Problem, perms: &[Vec<usize>]) -> Vec<f64> {
    use rayon::prelude::*;
    perms.par_iter().map(|p| problem.permutation_cost(p)).collect()
}

/// Makes `perm` the run's iterate.
pub(crate) fn publish(state: &mut SolverState, perm: &[usize], cost: f64) {
    state.iterate = Iterate::Discrete(Permutation::from_vec_unchecked(perm.to_vec()));
    state.objective = cost;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{solve, SolveConfig};
    use crate::problem::generate;
    use crate::registry::Family;

    #[test]
    fn test_register_all() {
        let mut r = MethodRegistry::new();
        register_all(&mut r);
        assert_eq!(r.by_family(Family::Baseline).len(), 9);
    }

    #[test]
    fn test_every_method_returns_valid_permutation() {
        let mut r = MethodRegistry::new();
        register_all(&mut r);
        let p = generate::random_uniform(7, 10, 13).unwrap();
        let config = SolveConfig::default().with_max_iterations(15).with_seed(2);
        for name in r.names() {
            let result = solve(&r, &p, name, &config).unwrap();
            assert!(Permutation::new(result.solution.as_slice().to_vec()).is_ok(), "{name}");
            assert!(
                (result.objective_value - p.permutation_cost(result.solution.as_slice())).abs() < 1e-6,
                "{name}"
            );
        }
    }

    #[test]
    fn test_evaluate_all_matches_serial() {
        let p = generate::random_uniform(6, 10, 1).unwrap();
        let perms = vec![vec![0, 1, 2, 3, 4, 5], vec![5, 4, 3, 2, 1, 0]];
        let costs = evaluate_all(&p, &perms);
        assert_eq!(costs[0], p.permutation_cost(&perms[0]));
        assert_eq!(costs[1], p.permutation_cost(&perms[1]));
    }
}
