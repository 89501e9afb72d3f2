//! Programmatic instance generators.

use rand::Rng;

use super::types::Problem;
use crate::error::{QapError, QapResult};
use crate::matrix::SquareMatrix;
use crate::random::create_rng;

/// Symmetric instance with zero diagonals and integer entries drawn
/// uniformly from `0..=max_value` (Taillard "a" style).
pub fn random_uniform(n: usize, max_value: u32, seed: u64) -> QapResult<Problem> {
    let mut rng = create_rng(seed);
    let flow = random_symmetric(n, max_value, &mut rng);
    let distance = random_symmetric(n, max_value, &mut rng);
    Problem::new(format!("rand{n}_s{seed}"), flow, distance)
}

/// Grid instance: locations on a `rows×cols` lattice with Manhattan
/// distances, random symmetric flows (Nugent style).
pub fn grid_instance(rows: usize, cols: usize, max_flow: u32, seed: u64) -> QapResult<Problem> {
    if rows == 0 || cols == 0 {
        return Err(QapError::InvalidProblem(format!(
            "grid must have positive dimensions, got {rows}x{cols}"
        )));
    }
    let n = rows * cols;
    let mut distance = SquareMatrix::zeros(n);
    for a in 0..n {
        for b in 0..n {
            let (ra, ca) = (a / cols, a % cols);
            let (rb, cb) = (b / cols, b % cols);
            distance[(a, b)] = (ra.abs_diff(rb) + ca.abs_diff(cb)) as f64;
        }
    }
    let mut rng = create_rng(seed);
    let flow = random_symmetric(n, max_flow, &mut rng);
    Problem::new(format!("grid{rows}x{cols}_s{seed}"), flow, distance)
}

fn random_symmetric<R: Rng>(n: usize, max_value: u32, rng: &mut R) -> SquareMatrix {
    let mut m = SquareMatrix::zeros(n);
    for i in 0..n {
        for j in (i + 1)..n {
            let v = rng.random_range(0..=max_value) as f64;
            m[(i, j)] = v;
            m[(j, i)] = v;
        }
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_uniform_is_symmetric_and_reproducible() {
        let a = random_uniform(8, 20, 3).unwrap();
        let b = random_uniform(8, 20, 3).unwrap();
        assert_eq!(a.flow(), b.flow());
        assert_eq!(a.flow(), &a.flow().transpose());
        assert_eq!(a.distance(), &a.distance().transpose());
        assert!((0..8).all(|i| a.flow()[(i, i)] == 0.0));
    }

    #[test]
    fn test_grid_distances_are_manhattan() {
        let p = grid_instance(2, 3, 5, 1).unwrap();
        assert_eq!(p.size(), 6);
        // (0,0) to (1,2)
        assert_eq!(p.distance()[(0, 5)], 3.0);
        assert_eq!(p.distance()[(1, 4)], 1.0);
    }

    #[test]
    fn test_grid_rejects_empty() {
        assert!(grid_instance(0, 3, 5, 1).is_err());
        assert!(grid_instance(1, 1, 5, 1).is_err());
    }
}
