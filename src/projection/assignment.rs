//! Discretization: nearest permutation by linear assignment.
//!
//! Chooses the permutation maximising `Σ X[i][π(i)]`. Small and medium
//! matrices use the exact Hungarian method; large ones a greedy
//! largest-entry extraction.
//!
//! # References
//!
//! - Kuhn (1955), "The Hungarian method for the assignment problem"
//! - Munkres (1957), "Algorithms for the Assignment and Transportation Problems"

use super::validate::marginal_error;
use super::ProjectionConfig;
use crate::matrix::SquareMatrix;
use crate::solution::Permutation;

/// Rounds a (near) doubly-stochastic matrix to a permutation.
///
/// Always returns a valid permutation. When the input is further than
/// `config.far_threshold` from the polytope a warning is logged and the
/// result is still the best assignment for the given weights.
pub fn discretize(x: &SquareMatrix, config: &ProjectionConfig) -> Permutation {
    let err = marginal_error(x);
    if !(err <= config.far_threshold) {
        log::warn!(
            "discretizing a matrix {err:.3e} away from the Birkhoff polytope (threshold {:.1e})",
            config.far_threshold
        );
    }
    if x.size() <= config.exact_assignment_limit {
        hungarian_max(x)
    } else {
        greedy_max(x)
    }
}

/// Exact maximum-weight assignment (Hungarian method with potentials), O(n³).
///
/// Non-finite weights are treated as zero.
pub fn hungarian_max(weights: &SquareMatrix) -> Permutation {
    let n = weights.size();
    let max_w = weights
        .iter()
        .filter(|v| v.is_finite())
        .fold(0.0f64, |m, &v| m.max(v));
    // cost[i][j] = max_w - w[i][j] >= 0, 1-indexed below.
    let cost = |i: usize, j: usize| -> f64 {
        let w = weights[(i - 1, j - 1)];
        max_w - if w.is_finite() { w } else { 0.0 }
    };

    let mut u = vec![0.0; n + 1];
    let mut v = vec![0.0; n + 1];
    // p[j]: row matched to column j (0 = none).
    let mut p = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0usize;
        let mut minv = vec![f64::INFINITY; n + 1];
        let mut used = vec![false; n + 1];
        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0usize;
            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let cur = cost(i0, j) - u[i0] - v[j];
                if cur < minv[j] {
                    minv[j] = cur;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }
            for j in 0..=n {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }
            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }
        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut perm = vec![0usize; n];
    for j in 1..=n {
        perm[p[j] - 1] = j - 1;
    }
    Permutation::from_vec_unchecked(perm)
}

/// Greedy assignment: repeatedly take the largest remaining entry whose
/// row and column are both free. O(n² log n).
pub fn greedy_max(weights: &SquareMatrix) -> Permutation {
    let n = weights.size();
    let mut entries: Vec<(usize, usize, f64)> = (0..n)
        .flat_map(|i| (0..n).map(move |j| (i, j)))
        .map(|(i, j)| {
            let w = weights[(i, j)];
            (i, j, if w.is_finite() { w } else { f64::NEG_INFINITY })
        })
        .collect();
    entries.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));

    let mut perm = vec![usize::MAX; n];
    let mut col_used = vec![false; n];
    let mut assigned = 0;
    for (i, j, _) in entries {
        if perm[i] == usize::MAX && !col_used[j] {
            perm[i] = j;
            col_used[j] = true;
            assigned += 1;
            if assigned == n {
                break;
            }
        }
    }
    Permutation::from_vec_unchecked(perm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;
    use rand::Rng;

    fn assignment_value(w: &SquareMatrix, p: &Permutation) -> f64 {
        p.as_slice().iter().enumerate().map(|(i, &j)| w[(i, j)]).sum()
    }

    fn brute_force_max(w: &SquareMatrix) -> f64 {
        fn rec(w: &SquareMatrix, i: usize, used: &mut Vec<bool>) -> f64 {
            if i == w.size() {
                return 0.0;
            }
            let mut best = f64::NEG_INFINITY;
            for j in 0..w.size() {
                if !used[j] {
                    used[j] = true;
                    best = best.max(w[(i, j)] + rec(w, i + 1, used));
                    used[j] = false;
                }
            }
            best
        }
        rec(w, 0, &mut vec![false; w.size()])
    }

    #[test]
    fn test_hungarian_recovers_permutation_matrix() {
        let p = Permutation::new(vec![3, 1, 0, 4, 2]).unwrap();
        assert_eq!(hungarian_max(&p.to_matrix()), p);
    }

    #[test]
    fn test_hungarian_is_optimal() {
        let mut rng = create_rng(17);
        for n in 2..=6 {
            for _ in 0..10 {
                let mut w = SquareMatrix::zeros(n);
                w.map_inplace(|_| rng.random_range(0.0..1.0));
                let p = hungarian_max(&w);
                assert!((assignment_value(&w, &p) - brute_force_max(&w)).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_greedy_is_valid_permutation() {
        let mut rng = create_rng(2);
        let mut w = SquareMatrix::zeros(9);
        w.map_inplace(|_| rng.random_range(0.0..1.0));
        let p = greedy_max(&w);
        assert!(Permutation::new(p.into_vec()).is_ok());
    }

    #[test]
    fn test_discretize_far_matrix_still_valid() {
        let mut w = SquareMatrix::zeros(4);
        w[(0, 0)] = 5.0;
        w[(1, 0)] = 3.0;
        let p = discretize(&w, &ProjectionConfig::default());
        assert!(Permutation::new(p.as_slice().to_vec()).is_ok());
        assert_eq!(p.as_slice()[0], 0);
    }

    #[test]
    fn test_discretize_handles_nan() {
        let mut w = SquareMatrix::filled(3, 0.2);
        w[(1, 1)] = f64::NAN;
        let p = discretize(&w, &ProjectionConfig::default());
        assert!(Permutation::new(p.into_vec()).is_ok());
    }
}
