//! Seeded random number generation.
//!
//! Every randomized routine in the crate receives its generator as an
//! argument. There is no process-wide RNG: a `(problem, method, config,
//! seed)` tuple always replays the same run.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Creates a deterministic generator from a 64-bit seed.
pub fn create_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Derives an independent seed for stream `stream` from `base`.
///
/// Uses the SplitMix64 finaliser so neighbouring stream indices give
/// uncorrelated seeds.
pub fn derive_seed(base: u64, stream: u64) -> u64 {
    let mut z = base.wrapping_add(stream.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Fisher–Yates shuffle in place.
pub fn shuffle<T, R: Rng>(items: &mut [T], rng: &mut R) {
    items.shuffle(rng);
}

/// Two distinct indices in `0..n`. Requires `n >= 2`.
pub fn distinct_pair<R: Rng>(n: usize, rng: &mut R) -> (usize, usize) {
    let r = rng.random_range(0..n);
    let mut s = rng.random_range(0..n - 1);
    if s >= r {
        s += 1;
    }
    (r, s)
}
