//! The randomness boundary (SPEC_FULL.md §9): the only place in this crate
//! that calls into `rand`. Everything above this port is generic over
//! `RandomPort`, so tests substitute `FixedRandom` and production code gets
//! `SystemRandom`. `taleweave_domain::dice::classify` never sees a PRNG at
//! all -- it only classifies values this port already produced.

use rand::seq::SliceRandom;
use rand::Rng;

/// Real randomness, injected rather than called directly, so that nothing
/// downstream can route a roll through an LLM by accident.
pub trait RandomPort: Send + Sync {
    /// A uniform integer in `[1, 100]`.
    fn roll_d100(&self) -> i32;

    /// A uniform integer in `[min, max]` inclusive.
    fn gen_range(&self, min: i32, max: i32) -> i32;

    /// `n` distinct indices into `0..len`, without replacement. Returns
    /// fewer than `n` if `len < n`.
    fn sample_indices(&self, len: usize, n: usize) -> Vec<usize>;
}

#[derive(Debug, Default)]
pub struct SystemRandom;

impl SystemRandom {
    pub fn new() -> Self {
        Self
    }
}

impl RandomPort for SystemRandom {
    fn roll_d100(&self) -> i32 {
        rand::thread_rng().gen_range(1..=100)
    }

    fn gen_range(&self, min: i32, max: i32) -> i32 {
        rand::thread_rng().gen_range(min..=max)
    }

    fn sample_indices(&self, len: usize, n: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..len).collect();
        indices.shuffle(&mut rand::thread_rng());
        indices.truncate(n);
        indices
    }
}

/// Deterministic test double: every roll returns the same fixed value,
/// and index sampling is just the first `n` indices in order.
#[cfg(test)]
pub struct FixedRandom(pub i32);

#[cfg(test)]
impl RandomPort for FixedRandom {
    fn roll_d100(&self) -> i32 {
        self.0
    }

    fn gen_range(&self, min: i32, max: i32) -> i32 {
        self.0.clamp(min, max)
    }

    fn sample_indices(&self, len: usize, n: usize) -> Vec<usize> {
        (0..len.min(n)).collect()
    }
}
