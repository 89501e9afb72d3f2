//! QAP instance representation and scoring.

use crate::error::{QapError, QapResult};
use crate::matrix::SquareMatrix;

/// A Quadratic Assignment Problem instance.
///
/// Assign `n` facilities to `n` locations minimising
/// `Σ_ij flow[i][j] · distance[π(i)][π(j)]`.
///
/// Immutable once constructed; solvers only ever borrow it.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Problem {
    name: String,
    flow: SquareMatrix,
    distance: SquareMatrix,
    #[cfg_attr(feature = "serde", serde(skip))]
    flow_t: SquareMatrix,
    #[cfg_attr(feature = "serde", serde(skip))]
    distance_t: SquareMatrix,
    best_known: Option<f64>,
}

impl Problem {
    /// Creates and validates an instance.
    ///
    /// Fails with [`QapError::InvalidProblem`] when the matrices differ in
    /// size, `n < 2`, or an entry is negative or non-finite.
    pub fn new(
        name: impl Into<String>,
        flow: SquareMatrix,
        distance: SquareMatrix,
    ) -> QapResult<Self> {
        let n = flow.size();
        if distance.size() != n {
            return Err(QapError::InvalidProblem(format!(
                "flow is {n}x{n} but distance is {0}x{0}",
                distance.size()
            )));
        }
        if n < 2 {
            return Err(QapError::InvalidProblem(format!(
                "instance size must be at least 2, got {n}"
            )));
        }
        for (label, m) in [("flow", &flow), ("distance", &distance)] {
            if let Some(v) = m.iter().find(|v| !v.is_finite() || **v < 0.0) {
                return Err(QapError::InvalidProblem(format!(
                    "{label} matrix contains invalid entry {v}"
                )));
            }
        }
        let flow_t = flow.transpose();
        let distance_t = distance.transpose();
        Ok(Self {
            name: name.into(),
            flow,
            distance,
            flow_t,
            distance_t,
            best_known: None,
        })
    }

    /// Convenience constructor from nested rows.
    pub fn from_rows(
        name: impl Into<String>,
        flow: &[Vec<f64>],
        distance: &[Vec<f64>],
    ) -> QapResult<Self> {
        Self::new(
            name,
            SquareMatrix::from_rows(flow)?,
            SquareMatrix::from_rows(distance)?,
        )
    }

    /// Attaches a best-known (or optimal) objective value used for gap reporting.
    pub fn with_best_known(mut self, value: f64) -> Self {
        self.best_known = Some(value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.flow.size()
    }

    pub fn flow(&self) -> &SquareMatrix {
        &self.flow
    }

    pub fn distance(&self) -> &SquareMatrix {
        &self.distance
    }

    pub fn best_known(&self) -> Option<f64> {
        self.best_known
    }

    /// Objective `trace(A · X · Bᵀ · Xᵀ)` for any `n×n` matrix `X`.
    ///
    /// For a permutation matrix this equals [`permutation_cost`](Self::permutation_cost).
    /// This is the scoring function used by every solver and by validation.
    pub fn objective(&self, x: &SquareMatrix) -> f64 {
        debug_assert_eq!(x.size(), self.size());
        let axbt = self.flow.matmul(x).matmul(&self.distance_t);
        axbt.dot(x)
    }

    /// Objective of an assignment `perm` (facility `i` at location `perm[i]`).
    pub fn permutation_cost(&self, perm: &[usize]) -> f64 {
        let n = self.size();
        debug_assert_eq!(perm.len(), n);
        let mut cost = 0.0;
        for i in 0..n {
            let a = self.flow.row(i);
            let b = self.distance.row(perm[i]);
            for j in 0..n {
                cost += a[j] * b[perm[j]];
            }
        }
        cost
    }

    /// Change in cost from exchanging the locations of facilities `r` and `s`.
    ///
    /// O(n); valid for asymmetric matrices (Taillard's delta formula).
    pub fn swap_delta(&self, perm: &[usize], r: usize, s: usize) -> f64 {
        if r == s {
            return 0.0;
        }
        let a = &self.flow;
        let b = &self.distance;
        let (pr, ps) = (perm[r], perm[s]);
        let mut d = (a[(r, r)] - a[(s, s)]) * (b[(ps, ps)] - b[(pr, pr)])
            + (a[(r, s)] - a[(s, r)]) * (b[(ps, pr)] - b[(pr, ps)]);
        for (k, &pk) in perm.iter().enumerate() {
            if k == r || k == s {
                continue;
            }
            d += (a[(k, r)] - a[(k, s)]) * (b[(pk, ps)] - b[(pk, pr)])
                + (a[(r, k)] - a[(s, k)]) * (b[(ps, pk)] - b[(pr, pk)]);
        }
        d
    }

    /// Gradient of [`objective`](Self::objective): `Aᵀ·X·B + A·X·Bᵀ`.
    pub fn gradient(&self, x: &SquareMatrix) -> SquareMatrix {
        let mut g = self.flow_t.matmul(x).matmul(&self.distance);
        let second = self.flow.matmul(x).matmul(&self.distance_t);
        g.add_scaled(1.0, &second);
        g
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;
    use crate::solution::Permutation;
    use approx::assert_relative_eq;
    use rand::Rng;

    fn line4() -> Problem {
        let rows: Vec<Vec<f64>> = (0..4)
            .map(|i: i32| (0..4).map(|j: i32| (i - j).abs() as f64).collect())
            .collect();
        Problem::from_rows("line4", &rows, &rows).unwrap()
    }

    fn random_asymmetric(n: usize, seed: u64) -> Problem {
        let mut rng = create_rng(seed);
        let mut make = || -> Vec<Vec<f64>> {
            (0..n)
                .map(|_| (0..n).map(|_| rng.random_range(0.0..10.0)).collect())
                .collect()
        };
        let a = make();
        let b = make();
        Problem::from_rows("rand", &a, &b).unwrap()
    }

    #[test]
    fn test_rejects_mismatched_sizes() {
        let a = SquareMatrix::zeros(3);
        let b = SquareMatrix::zeros(4);
        assert!(matches!(
            Problem::new("x", a, b),
            Err(QapError::InvalidProblem(_))
        ));
    }

    #[test]
    fn test_rejects_tiny_and_negative() {
        assert!(Problem::new("x", SquareMatrix::zeros(1), SquareMatrix::zeros(1)).is_err());
        let mut a = SquareMatrix::zeros(2);
        a[(0, 1)] = -1.0;
        assert!(Problem::new("x", a, SquareMatrix::zeros(2)).is_err());
    }

    #[test]
    fn test_identity_cost_line4() {
        let p = line4();
        // Σ |i-j|² over ordered pairs of a 4-point line.
        assert_relative_eq!(p.permutation_cost(&[0, 1, 2, 3]), 40.0);
    }

    #[test]
    fn test_objective_matches_permutation_cost() {
        let p = random_asymmetric(6, 5);
        let perm = vec![3, 0, 5, 1, 4, 2];
        let x = Permutation::new(perm.clone()).unwrap().to_matrix();
        assert_relative_eq!(p.objective(&x), p.permutation_cost(&perm), epsilon = 1e-9);
    }

    #[test]
    fn test_swap_delta_matches_recompute() {
        let p = random_asymmetric(7, 9);
        let mut rng = create_rng(1);
        let mut perm: Vec<usize> = (0..7).collect();
        crate::random::shuffle(&mut perm, &mut rng);
        let base = p.permutation_cost(&perm);
        for r in 0..7 {
            for s in 0..7 {
                let mut swapped = perm.clone();
                swapped.swap(r, s);
                let expected = p.permutation_cost(&swapped) - base;
                assert_relative_eq!(p.swap_delta(&perm, r, s), expected, epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn test_gradient_finite_difference() {
        let p = random_asymmetric(4, 21);
        let x = SquareMatrix::filled(4, 0.25);
        let g = p.gradient(&x);
        let h = 1e-6;
        for (i, j) in [(0, 0), (1, 3), (2, 1), (3, 2)] {
            let mut xp = x.clone();
            xp[(i, j)] += h;
            let mut xm = x.clone();
            xm[(i, j)] -= h;
            let fd = (p.objective(&xp) - p.objective(&xm)) / (2.0 * h);
            assert_relative_eq!(g[(i, j)], fd, epsilon = 1e-4, max_relative = 1e-5);
        }
    }
}
