//! Frame clock and frame-rate-independent smoothing helpers.

/// Longest step the simulation will take, in seconds. A tab returning from
/// the background would otherwise hand the physics a multi-second `dt`.
pub const MAX_FRAME_DT: f64 = 0.25;

/// Display rate the legacy per-frame constants were tuned against.
pub const REFERENCE_FPS: f64 = 60.0;

/// Tracks the last frame timestamp and derives `dt` in seconds.
#[derive(Clone, Debug, Default)]
pub struct FrameClock {
	last_ms: Option<f64>,
	/// Total simulated time in seconds.
	pub elapsed: f64,
	/// Most recent step in seconds.
	pub dt: f64,
}

impl FrameClock {
	pub fn new() -> Self {
		Self::default()
	}

	/// Advance to `now_ms` (a host timestamp in milliseconds) and return `dt`.
	///
	/// The first tick after construction or [`reset`](Self::reset) yields zero.
	pub fn tick(&mut self, now_ms: f64) -> f64 {
		let dt = match self.last_ms {
			Some(last) => sanitize_dt((now_ms - last) / 1000.0),
			None => 0.0,
		};
		if now_ms.is_finite() {
			self.last_ms = Some(now_ms);
		}
		self.dt = dt;
		self.elapsed += dt;
		dt
	}

	/// Forget the last timestamp so a restarted loop does not see the paused gap.
	pub fn reset(&mut self) {
		self.last_ms = None;
		self.dt = 0.0;
	}
}

/// Clamp a raw step to `[0, MAX_FRAME_DT]`, mapping NaN and negatives to zero.
pub fn sanitize_dt(dt: f64) -> f64 {
	if dt.is_finite() && dt > 0.0 {
		dt.min(MAX_FRAME_DT)
	} else {
		0.0
	}
}

/// Fraction of the remaining distance covered in `dt` when easing at `rate` per second.
///
/// `value += (target - value) * smoothing_factor(rate, dt)`
pub fn smoothing_factor(rate: f64, dt: f64) -> f64 {
	if dt <= 0.0 || rate <= 0.0 {
		return 0.0;
	}
	1.0 - (-rate * dt).exp()
}

/// Where inside a step of `dt` a follower easing at `rate` should sample a
/// leader that moves linearly across the step, as a fraction in `[0.5, 1)`.
///
/// Sampling there reproduces the continuous solution exactly for linear
/// leader motion; it tends to `0.5` for small steps.
pub fn follow_weight(rate: f64, dt: f64) -> f64 {
	let x = rate * dt;
	if x < 1e-4 {
		return 0.5;
	}
	let decay = (-x).exp();
	1.0 - (1.0 / x - decay / (1.0 - decay))
}

/// Converts a "move this fraction per frame at 60fps" constant into a per-second rate
/// with the same look at the reference rate.
pub fn rate_from_frame_fraction(fraction: f64) -> f64 {
	let f = fraction.clamp(0.0, 0.999_999);
	-(1.0 - f).ln() * REFERENCE_FPS
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn first_tick_is_zero() {
		let mut clock = FrameClock::new();
		assert_eq!(clock.tick(1234.0), 0.0);
		let dt = clock.tick(1234.0 + 16.0);
		assert!((dt - 0.016).abs() < 1e-12);
	}

	#[test]
	fn backwards_and_huge_steps_are_clamped() {
		let mut clock = FrameClock::new();
		clock.tick(1000.0);
		assert_eq!(clock.tick(900.0), 0.0);
		assert_eq!(clock.tick(10_000.0), MAX_FRAME_DT);
		assert_eq!(clock.tick(f64::NAN), 0.0);
	}

	#[test]
	fn reset_hides_paused_gap() {
		let mut clock = FrameClock::new();
		clock.tick(0.0);
		clock.tick(16.0);
		clock.reset();
		assert_eq!(clock.tick(60_000.0), 0.0);
	}

	#[test]
	fn frame_fraction_matches_at_reference_rate() {
		let rate = rate_from_frame_fraction(0.1);
		let f = smoothing_factor(rate, 1.0 / REFERENCE_FPS);
		assert!((f - 0.1).abs() < 1e-9);
	}

	#[test]
	fn follow_weight_limits() {
		assert_eq!(follow_weight(5.0, 0.0), 0.5);
		let small = follow_weight(1.0, 0.001);
		assert!((small - 0.5).abs() < 1e-3);
		let big = follow_weight(100.0, 1.0);
		assert!(big > 0.98 && big < 1.0);
	}

	#[test]
	fn follow_weight_is_exact_for_linear_leader() {
		// x' = r (v t - x), x(0) = 0 has x(h) = v (h - (1 - e^{-rh}) / r).
		let (r, v, h): (f64, f64, f64) = (8.0, 30.0, 0.1);
		let exact = v * (h - (1.0 - (-r * h).exp()) / r);
		let leader = v * h * follow_weight(r, h);
		let stepped = leader * smoothing_factor(r, h);
		assert!((stepped - exact).abs() < 1e-9);
	}

	#[test]
	fn smoothing_is_step_count_independent() {
		let rate = 5.0;
		let mut a: f64 = 0.0;
		for _ in 0..60 {
			a += (1.0 - a) * smoothing_factor(rate, 1.0 / 60.0);
		}
		let mut b: f64 = 0.0;
		for _ in 0..30 {
			b += (1.0 - b) * smoothing_factor(rate, 1.0 / 30.0);
		}
		assert!((a - b).abs() < 1e-9);
		assert_eq!(smoothing_factor(rate, 0.0), 0.0);
	}
}
