//! Property-based checks of the core invariants.

use proptest::prelude::*;

use u_qap::matrix::SquareMatrix;
use u_qap::pipeline::{solve, SolveConfig};
use u_qap::problem::Problem;
use u_qap::projection::{discretize, is_doubly_stochastic, ProjectionConfig};
use u_qap::registry::MethodRegistry;
use u_qap::solution::Permutation;

fn positive_matrix(max_n: usize) -> impl Strategy<Value = SquareMatrix> {
    (2..=max_n).prop_flat_map(|n| {
        prop::collection::vec(0.01f64..10.0, n * n)
            .prop_map(move |data| SquareMatrix::from_vec(n, data).unwrap())
    })
}

/// Mixed-sign entries on top of a positive diagonal and cyclic shift, so
/// the clamped matrix keeps a scalable support.
fn mixed_sign_matrix(max_n: usize) -> impl Strategy<Value = SquareMatrix> {
    (2..=max_n).prop_flat_map(|n| {
        (
            prop::collection::vec(-10.0f64..10.0, n * n),
            prop::collection::vec(1.0f64..10.0, 2 * n),
        )
            .prop_map(move |(mut data, support)| {
                for i in 0..n {
                    data[i * n + i] = support[i];
                    data[i * n + (i + 1) % n] = support[n + i];
                }
                SquareMatrix::from_vec(n, data).unwrap()
            })
    })
}

fn instance(max_n: usize) -> impl Strategy<Value = Problem> {
    (2..=max_n).prop_flat_map(|n| {
        (
            prop::collection::vec(0u32..20, n * n),
            prop::collection::vec(0u32..20, n * n),
        )
            .prop_map(move |(a, b)| {
                let a = SquareMatrix::from_vec(n, a.into_iter().map(f64::from).collect()).unwrap();
                let b = SquareMatrix::from_vec(n, b.into_iter().map(f64::from).collect()).unwrap();
                Problem::new("prop", a, b).unwrap()
            })
    })
}

fn permutation(n: usize) -> impl Strategy<Value = Vec<usize>> {
    Just((0..n).collect::<Vec<usize>>()).prop_shuffle()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_projection_marginals(mut m in positive_matrix(12)) {
        let config = ProjectionConfig::default();
        config.projector().project(&mut m).unwrap();
        prop_assert!(is_doubly_stochastic(&m, config.tolerance));
        prop_assert!(m.min_value() >= 0.0);
    }

    #[test]
    fn test_projection_clamps_negatives(m in mixed_sign_matrix(10)) {
        let config = ProjectionConfig::default();
        let mut x = m.clone();
        config.projector().project(&mut x).unwrap();
        prop_assert!(is_doubly_stochastic(&x, config.tolerance));
        let n = m.size();
        for i in 0..n {
            for j in 0..n {
                if m.get(i, j) <= 0.0 {
                    prop_assert_eq!(x.get(i, j), 0.0);
                } else {
                    prop_assert!(x.get(i, j) > 0.0);
                }
            }
        }
    }

    #[test]
    fn test_projection_idempotent(mut m in positive_matrix(10)) {
        let projector = ProjectionConfig::default().projector();
        projector.project(&mut m).unwrap();
        let once = m.clone();
        projector.project(&mut m).unwrap();
        prop_assert!(m.max_abs_diff(&once) <= 1e-6);
    }

    #[test]
    fn test_discretize_is_permutation(m in positive_matrix(16)) {
        let perm = discretize(&m, &ProjectionConfig::default());
        prop_assert!(Permutation::new(perm.as_slice().to_vec()).is_ok());
    }

    #[test]
    fn test_relabel_symmetry(
        (p, perm, sigma) in instance(7).prop_flat_map(|p| {
            let n = p.size();
            (Just(p), permutation(n), permutation(n))
        })
    ) {
        let n = p.size();
        let mut a = SquareMatrix::zeros(n);
        for i in 0..n {
            for j in 0..n {
                a.set(i, j, p.flow().get(sigma[i], sigma[j]));
            }
        }
        let relabeled = Problem::new("relabeled", a, p.distance().clone()).unwrap();
        let moved: Vec<usize> = (0..n).map(|i| perm[sigma[i]]).collect();
        let (x, y) = (p.permutation_cost(&perm), relabeled.permutation_cost(&moved));
        prop_assert!((x - y).abs() <= 1e-9 * x.abs().max(1.0));
    }

    #[test]
    fn test_objective_invariant_under_joint_relabeling(
        (p, x, sigma, rho) in instance(7).prop_flat_map(|p| {
            let n = p.size();
            (
                Just(p),
                prop::collection::vec(0.01f64..1.0, n * n),
                permutation(n),
                permutation(n),
            )
        })
    ) {
        let n = p.size();
        let mut x = SquareMatrix::from_vec(n, x).unwrap();
        ProjectionConfig::default().projector().project(&mut x).unwrap();

        let (mut a, mut b, mut y) = (SquareMatrix::zeros(n), SquareMatrix::zeros(n), SquareMatrix::zeros(n));
        for i in 0..n {
            for j in 0..n {
                a.set(i, j, p.flow().get(sigma[i], sigma[j]));
                b.set(i, j, p.distance().get(rho[i], rho[j]));
                y.set(i, j, x.get(sigma[i], rho[j]));
            }
        }
        let relabeled = Problem::new("relabeled", a, b).unwrap();
        let (before, after) = (p.objective(&x), relabeled.objective(&y));
        prop_assert!((before - after).abs() <= 1e-9 * before.abs().max(1.0), "{before} vs {after}");
    }

    #[test]
    fn test_objective_matches_permutation_cost(
        (p, perm) in instance(8).prop_flat_map(|p| {
            let n = p.size();
            (Just(p), permutation(n))
        })
    ) {
        let m = Permutation::new(perm.clone()).unwrap().to_matrix();
        let (x, y) = (p.objective(&m), p.permutation_cost(&perm));
        prop_assert!((x - y).abs() <= 1e-9 * y.abs().max(1.0));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn test_best_history_non_increasing(p in instance(7), seed in 0u64..1000, pick in 0usize..14) {
        let registry = MethodRegistry::with_builtin();
        let names = registry.names();
        let method = names[pick % names.len()];
        let config = SolveConfig::default().with_max_iterations(25).with_seed(seed);
        let result = solve(&registry, &p, method, &config).unwrap();
        let history = result.best_history();
        prop_assert!(history.windows(2).all(|w| w[1] <= w[0]), "{method}: {history:?}");
        prop_assert!(Permutation::new(result.solution.as_slice().to_vec()).is_ok());
        prop_assert!((result.objective_value - p.permutation_cost(result.solution.as_slice())).abs() < 1e-6);
    }
}
