//! Seedable random source shared by spawners and triggers.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Uniform random numbers for every stochastic decision in the engine.
///
/// Injected per engine instance so spawn fields and trigger rolls are
/// reproducible under a fixed seed.
pub trait RandomSource {
	/// Returns a float in `[0, 1)`.
	fn next_f64(&mut self) -> f64;

	/// Returns a float in `[min, max)`.
	fn range(&mut self, min: f64, max: f64) -> f64 {
		min + self.next_f64() * (max - min)
	}

	/// Bernoulli trial with success probability `p`.
	fn chance(&mut self, p: f64) -> bool {
		self.next_f64() < p
	}

	/// Index in `0..len`; `len` must be non-zero.
	fn index(&mut self, len: usize) -> usize {
		((self.next_f64() * len as f64) as usize).min(len.saturating_sub(1))
	}

	/// Returns `-1.0` or `1.0`.
	fn sign(&mut self) -> f64 {
		if self.next_f64() < 0.5 { -1.0 } else { 1.0 }
	}
}

/// Default engine RNG: a small, fast PRNG seeded from a `u64`.
pub struct SeededRng {
	inner: SmallRng,
}

impl SeededRng {
	pub fn new(seed: u64) -> Self {
		Self {
			inner: SmallRng::seed_from_u64(seed),
		}
	}
}

impl RandomSource for SeededRng {
	fn next_f64(&mut self) -> f64 {
		self.inner.gen_range(0.0..1.0)
	}
}

/// Always yields the same value. `FixedRng(0.0)` makes every `chance` succeed.
#[derive(Clone, Copy, Debug)]
pub struct FixedRng(pub f64);

impl RandomSource for FixedRng {
	fn next_f64(&mut self) -> f64 {
		self.0
	}
}
