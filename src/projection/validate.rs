//! Polytope and permutation membership checks.

use crate::matrix::SquareMatrix;

/// Largest deviation of any row or column sum from 1.
pub fn marginal_error(m: &SquareMatrix) -> f64 {
    let rows = m.row_sums();
    let cols = m.col_sums();
    rows.iter()
        .chain(cols.iter())
        .fold(0.0f64, |e, s| e.max((s - 1.0).abs()))
}

/// True if every entry is `>= -eps` and all marginals are within `eps` of 1.
pub fn is_doubly_stochastic(m: &SquareMatrix, eps: f64) -> bool {
    m.is_finite() && m.min_value() >= -eps && marginal_error(m) <= eps
}

/// True if `m` is an exact 0/1 matrix with a single 1 per row and column.
pub fn is_permutation_matrix(m: &SquareMatrix) -> bool {
    let n = m.size();
    let mut col_seen = vec![false; n];
    for i in 0..n {
        let mut ones = 0;
        for (j, &v) in m.row(i).iter().enumerate() {
            if v == 1.0 {
                if col_seen[j] {
                    return false;
                }
                col_seen[j] = true;
                ones += 1;
            } else if v != 0.0 {
                return false;
            }
        }
        if ones != 1 {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marginal_error() {
        let mut m = SquareMatrix::filled(2, 0.5);
        assert!(marginal_error(&m) < 1e-15);
        m[(0, 0)] = 0.7;
        assert!((marginal_error(&m) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_doubly_stochastic_rejects_negative() {
        let mut m = SquareMatrix::identity(2);
        m[(0, 0)] = 1.5;
        m[(0, 1)] = -0.5;
        m[(1, 0)] = -0.5;
        m[(1, 1)] = 1.5;
        assert!(marginal_error(&m) < 1e-12);
        assert!(!is_doubly_stochastic(&m, 1e-6));
    }

    #[test]
    fn test_permutation_matrix() {
        assert!(is_permutation_matrix(&SquareMatrix::identity(4)));
        assert!(!is_permutation_matrix(&SquareMatrix::filled(2, 0.5)));
        let mut m = SquareMatrix::zeros(2);
        m[(0, 0)] = 1.0;
        m[(1, 0)] = 1.0;
        assert!(!is_permutation_matrix(&m));
    }
}
