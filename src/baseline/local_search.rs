//! Swap-neighbourhood descent.
//!
//! Every move exchanges the locations of two facilities and is priced in
//! O(n) with [`Problem::swap_delta`], so one full neighbourhood scan costs
//! O(n³).

use crate::problem::Problem;

/// Improvement below this is treated as zero.
const EPS: f64 = 1e-9;

/// Best-improvement descent until no swap improves or `max_passes` scans
/// have been made. Returns the number of moves applied; `cost` is kept in
/// sync with `perm`.
pub fn swap_descent(problem: &Problem, perm: &mut [usize], cost: &mut f64, max_passes: usize) -> usize {
    let n = perm.len();
    let mut moves = 0;
    for _ in 0..max_passes {
        let mut best = (0, 0, -EPS);
        for r in 0..n {
            for s in (r + 1)..n {
                let d = problem.swap_delta(perm, r, s);
                if d < best.2 {
                    best = (r, s, d);
                }
            }
        }
        if best.2 >= -EPS {
            break;
        }
        perm.swap(best.0, best.1);
        *cost += best.2;
        moves += 1;
    }
    moves
}

/// First-improvement descent: applies each improving swap as soon as it is
/// found and rescans until a full pass finds none or `max_passes` is hit.
pub fn first_improvement(problem: &Problem, perm: &mut [usize], cost: &mut f64, max_passes: usize) -> usize {
    let n = perm.len();
    let mut moves = 0;
    for _ in 0..max_passes {
        let mut improved = false;
        for r in 0..n {
            for s in (r + 1)..n {
                let d = problem.swap_delta(perm, r, s);
                if d < -EPS {
                    perm.swap(r, s);
                    *cost += d;
                    moves += 1;
                    improved = true;
                }
            }
        }
        if !improved {
            break;
        }
    }
    moves
}
