//! Jitter sources for the queue ranker
//!
//! The ranker never touches a global RNG. Hosts inject a [`RandomSource`],
//! which makes shuffled queues reproducible under a fixed seed.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Source of uniform samples in `[-1, 1)`
pub trait RandomSource {
    /// Next uniform sample in `[-1, 1)`
    fn next_uniform_signed(&mut self) -> f64;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_uniform_signed(&mut self) -> f64 {
        (**self).next_uniform_signed()
    }
}

/// ChaCha8-backed random source
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
}

impl SeededRandom {
    /// Deterministic source (for tests and reproducible sessions)
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Source seeded from the operating system
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_uniform_signed(&mut self) -> f64 {
        self.rng.gen_range(-1.0..1.0)
    }
}

/// Source that always returns zero
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl RandomSource for NoJitter {
    fn next_uniform_signed(&mut self) -> f64 {
        0.0
    }
}
