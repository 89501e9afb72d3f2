//! Permutation operators shared by the baseline methods.
//!
//! # Crossover
//!
//! - [`order_crossover`] (OX): Davis (1985), preserves relative order
//! - [`pmx_crossover`] (PMX): Goldberg & Lingle (1985), preserves absolute position
//!
//! # Mutation and decoding
//!
//! - [`swap_mutation`]: exchange the locations of two distinct facilities
//! - [`random_swaps`]: `k` successive swap mutations (shaking / perturbation)
//! - [`decode_keys`]: random-key vector to permutation by ranking
//!
//! # References
//!
//! - Davis (1985), "Applying Adaptive Algorithms to Epistatic Domains"
//! - Goldberg & Lingle (1985), "Alleles, Loci, and the Traveling Salesman Problem"
//! - Bean (1994), "Genetic Algorithms and Random Keys for Sequencing and
//!   Optimization"

use rand::Rng;

use crate::random::distinct_pair;

/// Order Crossover (OX).
///
/// 1. Select a random segment `[start, end]`
/// 2. Copy the segment from one parent
/// 3. Fill the remaining positions with the other parent's values in
///    their original order, starting after the segment and wrapping
///
/// Parents must be permutations of the same length.
pub fn order_crossover<R: Rng>(
    parent1: &[usize],
    parent2: &[usize],
    rng: &mut R,
) -> (Vec<usize>, Vec<usize>) {
    let n = parent1.len();
    debug_assert_eq!(n, parent2.len());
    if n < 2 {
        return (parent1.to_vec(), parent2.to_vec());
    }
    let (start, end) = random_segment(n, rng);
    (
        ox_child(parent1, parent2, start, end),
        ox_child(parent2, parent1, start, end),
    )
}

fn ox_child(template: &[usize], donor: &[usize], start: usize, end: usize) -> Vec<usize> {
    let n = template.len();
    let mut child = vec![usize::MAX; n];
    let mut taken = vec![false; n];
    for i in start..=end {
        child[i] = template[i];
        taken[template[i]] = true;
    }
    let mut pos = (end + 1) % n;
    for offset in 0..n {
        let val = donor[(end + 1 + offset) % n];
        if !taken[val] {
            child[pos] = val;
            pos = (pos + 1) % n;
        }
    }
    child
}

/// Partially Mapped Crossover (PMX).
///
/// 1. Select a random segment `[start, end]`
/// 2. Copy the segment from one parent
/// 3. Place each displaced value of the other parent's segment by
///    following the segment mapping until a free position is reached
/// 4. Fill the rest from the other parent
pub fn pmx_crossover<R: Rng>(
    parent1: &[usize],
    parent2: &[usize],
    rng: &mut R,
) -> (Vec<usize>, Vec<usize>) {
    let n = parent1.len();
    debug_assert_eq!(n, parent2.len());
    if n < 2 {
        return (parent1.to_vec(), parent2.to_vec());
    }
    let (start, end) = random_segment(n, rng);
    (
        pmx_child(parent1, parent2, start, end),
        pmx_child(parent2, parent1, start, end),
    )
}

fn pmx_child(template: &[usize], donor: &[usize], start: usize, end: usize) -> Vec<usize> {
    let n = template.len();
    let mut child = vec![usize::MAX; n];
    let mut placed = vec![false; n];
    let mut donor_pos = vec![0; n];
    for (i, &v) in donor.iter().enumerate() {
        donor_pos[v] = i;
    }

    for i in start..=end {
        child[i] = template[i];
        placed[template[i]] = true;
    }

    for i in start..=end {
        let val = donor[i];
        if placed[val] {
            continue;
        }
        let mut pos = i;
        loop {
            let next = donor_pos[template[pos]];
            if next < start || next > end {
                child[next] = val;
                placed[val] = true;
                break;
            }
            pos = next;
        }
    }

    for (c, &d) in child.iter_mut().zip(donor) {
        if *c == usize::MAX {
            *c = d;
        }
    }
    child
}

/// Exchanges two distinct positions. No-op for `n < 2`.
pub fn swap_mutation<R: Rng>(perm: &mut [usize], rng: &mut R) {
    if perm.len() < 2 {
        return;
    }
    let (i, j) = distinct_pair(perm.len(), rng);
    perm.swap(i, j);
}

/// Applies `k` random swaps.
pub fn random_swaps<R: Rng>(perm: &mut [usize], k: usize, rng: &mut R) {
    for _ in 0..k {
        swap_mutation(perm, rng);
    }
}

/// Decodes random keys: facility `i` goes to the rank of `keys[i]`.
///
/// Ties are broken by index, so every key vector decodes to a valid
/// permutation.
pub fn decode_keys(keys: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| keys[a].total_cmp(&keys[b]).then(a.cmp(&b)));
    let mut perm = vec![0; keys.len()];
    for (rank, &i) in order.iter().enumerate() {
        perm[i] = rank;
    }
    perm
}

/// Random keys that decode to `perm`.
pub fn encode_keys(perm: &[usize]) -> Vec<f64> {
    let n = perm.len().max(1) as f64;
    perm.iter().map(|&p| (p as f64 + 0.5) / n).collect()
}

/// Random segment `[start, end]` with `start <= end < n`.
fn random_segment<R: Rng>(n: usize, rng: &mut R) -> (usize, usize) {
    let a = rng.random_range(0..n);
    let b = rng.random_range(0..n);
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
