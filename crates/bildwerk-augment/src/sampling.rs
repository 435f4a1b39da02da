// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Randomized parameter draws for the executors.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Uniform sampler for effective transform parameters.
///
/// Seeded runs are reproducible: two samplers built from the same seed yield
/// the same sequence of draws.
#[derive(Clone)]
pub struct ParamSampler {
    rng: ChaCha8Rng,
}

impl ParamSampler {
    /// Seed from `seed`, or from the thread RNG when `None`.
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(rand::random);
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Draw uniformly from the closed interval between `a` and `b`, in either
    /// order. A degenerate interval returns its single value.
    pub fn uniform(&mut self, a: f32, b: f32) -> f32 {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        if lo == hi {
            return lo;
        }
        self.rng.random_range(lo..=hi)
    }
}
