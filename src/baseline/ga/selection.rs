//! Parent selection over population costs.
//!
//! All strategies assume **minimization** (lower cost = better).
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"
//! - Baker (1985), "Adaptive Selection Methods for Genetic Algorithms"

use rand::Rng;

/// Selection strategy for choosing parents.
///
/// # Examples
///
/// ```
/// use u_qap::baseline::ga::Selection;
/// use u_qap::random::create_rng;
///
/// let costs = [10.0, 5.0, 1.0, 8.0];
/// let mut rng = create_rng(1);
/// let idx = Selection::Tournament(3).select(&costs, &mut rng);
/// assert!(idx < costs.len());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Pick `k` individuals at random, select the best.
    ///
    /// Higher `k` = stronger selection pressure.
    Tournament(usize),

    /// Fitness-proportionate selection on inverted costs.
    Roulette,

    /// Linear ranking: weight `n - rank`.
    Rank,
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Tournament(3)
    }
}

impl Selection {
    /// Index of the selected individual. `costs` must not be empty.
    pub fn select<R: Rng>(&self, costs: &[f64], rng: &mut R) -> usize {
        debug_assert!(!costs.is_empty(), "cannot select from empty population");
        match self {
            Selection::Tournament(k) => tournament(costs, *k, rng),
            Selection::Roulette => roulette(costs, rng),
            Selection::Rank => rank(costs, rng),
        }
    }
}

fn tournament<R: Rng>(costs: &[f64], k: usize, rng: &mut R) -> usize {
    let n = costs.len();
    let mut best = rng.random_range(0..n);
    for _ in 1..k.max(1) {
        let idx = rng.random_range(0..n);
        if costs[idx] < costs[best] {
            best = idx;
        }
    }
    best
}

/// Weight `max_cost - cost + ε`, so the best gets the largest share.
fn roulette<R: Rng>(costs: &[f64], rng: &mut R) -> usize {
    let n = costs.len();
    if n == 1 {
        return 0;
    }
    let max_cost = costs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let epsilon = 1e-10;
    let weights: Vec<f64> = costs.iter().map(|&c| (max_cost - c).max(0.0) + epsilon).collect();
    let total: f64 = weights.iter().sum();
    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        cumulative += w;
        if cumulative > threshold {
            return i;
        }
    }
    n - 1
}

fn rank<R: Rng>(costs: &[f64], rng: &mut R) -> usize {
    let n = costs.len();
    if n == 1 {
        return 0;
    }
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| costs[a].total_cmp(&costs[b]));
    let total = (n * (n + 1)) as f64 / 2.0;
    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (r, &idx) in order.iter().enumerate() {
        cumulative += (n - r) as f64;
        if cumulative > threshold {
            return idx;
        }
    }
    order[n - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;

    fn counts(sel: Selection, costs: &[f64], draws: usize) -> Vec<u32> {
        let mut rng = create_rng(42);
        let mut counts = vec![0u32; costs.len()];
        for _ in 0..draws {
            counts[sel.select(costs, &mut rng)] += 1;
        }
        counts
    }

    #[test]
    fn test_tournament_favors_best() {
        let c = counts(Selection::Tournament(4), &[10.0, 5.0, 1.0, 8.0], 10_000);
        assert!(c[2] > 6000, "expected best >60%, got {c:?}");
    }

    #[test]
    fn test_tournament_size_1_is_uniform() {
        let c = counts(Selection::Tournament(1), &[10.0, 5.0, 1.0, 8.0], 10_000);
        assert!(c.iter().all(|&x| x > 1500), "{c:?}");
    }

    #[test]
    fn test_roulette_and_rank_favor_best() {
        let costs = [100.0, 50.0, 1.0, 80.0];
        for sel in [Selection::Roulette, Selection::Rank] {
            let c = counts(sel, &costs, 10_000);
            assert!(c[2] > c[0], "{sel:?}: {c:?}");
        }
    }

    #[test]
    fn test_single_individual() {
        let mut rng = create_rng(42);
        for sel in [Selection::Tournament(3), Selection::Roulette, Selection::Rank] {
            assert_eq!(sel.select(&[5.0], &mut rng), 0);
        }
    }
}
