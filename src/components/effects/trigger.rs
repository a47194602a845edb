//! Frame-sampled stochastic triggers.
//!
//! A trigger rolls once per frame while ready. On success it becomes active
//! for a fixed window, then cools down; neither state can re-fire. The frame
//! on which it fires reports [`TriggerEvent::Fired`] exactly once so callers
//! can run one-shot side effects (sound, bolt generation).

use super::clock::REFERENCE_FPS;
use super::rng::RandomSource;
use super::theme::TriggerStyle;

/// Remaining time at or below this counts as elapsed, absorbing rounding
/// from repeated `dt` subtraction.
const TIME_EPSILON: f64 = 1e-9;

/// How often a trigger fires on average.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TriggerRate {
	/// Fixed probability per rendered frame; real frequency scales with refresh rate.
	PerFrame(f64),
	/// Mean events per second, independent of refresh rate.
	PerSecond(f64),
}

impl TriggerRate {
	/// Probability of firing during a step of `dt` seconds.
	pub fn probability(self, dt: f64) -> f64 {
		match self {
			TriggerRate::PerFrame(p) => p.clamp(0.0, 1.0),
			TriggerRate::PerSecond(rate) => {
				if rate <= 0.0 || dt <= 0.0 {
					0.0
				} else {
					1.0 - (-rate * dt).exp()
				}
			}
		}
	}

	/// The per-second rate a per-frame roll produces at the reference refresh rate.
	pub fn normalized(self) -> Self {
		match self {
			TriggerRate::PerFrame(p) => {
				let p = p.clamp(0.0, 0.999_999);
				TriggerRate::PerSecond(-(1.0 - p).ln() * REFERENCE_FPS)
			}
			other => other,
		}
	}
}

/// Where a trigger is in its cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TriggerPhase {
	/// Rolling every frame.
	Ready,
	/// Firing; `remaining` seconds left in the window.
	Active { remaining: f64 },
	/// Waiting out the cooldown before rolling again.
	Cooldown { remaining: f64 },
}

/// Transition reported by [`StochasticTrigger::update`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerEvent {
	/// The trigger activated this frame.
	Fired,
	/// The active window closed this frame.
	Ended,
}

/// A frame-sampled trigger with a fixed active window and cooldown.
#[derive(Clone, Debug)]
pub struct StochasticTrigger {
	style: TriggerStyle,
	phase: TriggerPhase,
	fired_count: u64,
}

impl StochasticTrigger {
	pub fn new(style: TriggerStyle) -> Self {
		Self {
			style,
			phase: TriggerPhase::Ready,
			fired_count: 0,
		}
	}

	pub fn phase(&self) -> TriggerPhase {
		self.phase
	}

	pub fn is_active(&self) -> bool {
		matches!(self.phase, TriggerPhase::Active { .. })
	}

	pub fn is_ready(&self) -> bool {
		self.phase == TriggerPhase::Ready
	}

	/// Activations since creation.
	pub fn fired_count(&self) -> u64 {
		self.fired_count
	}

	/// Fraction of the active window elapsed, `0.0` at activation and `1.0` at the end.
	pub fn active_progress(&self) -> f64 {
		match self.phase {
			TriggerPhase::Active { remaining } if self.style.active_seconds > 0.0 => {
				(1.0 - remaining / self.style.active_seconds).clamp(0.0, 1.0)
			}
			TriggerPhase::Active { .. } => 0.0,
			_ => 1.0,
		}
	}

	/// Activate now if ready. Returns whether activation happened.
	pub fn fire(&mut self) -> bool {
		if !self.is_ready() {
			return false;
		}
		self.phase = TriggerPhase::Active {
			remaining: self.style.active_seconds.max(0.0),
		};
		self.fired_count += 1;
		true
	}

	/// Advance timers and, when ready, roll for activation.
	///
	/// A zero `dt` changes nothing.
	pub fn update(&mut self, dt: f64, rng: &mut dyn RandomSource) -> Option<TriggerEvent> {
		if dt <= 0.0 {
			return None;
		}
		match self.phase {
			TriggerPhase::Active { remaining } => {
				let remaining = remaining - dt;
				if remaining <= TIME_EPSILON {
					self.phase = self.cooldown_phase();
					Some(TriggerEvent::Ended)
				} else {
					self.phase = TriggerPhase::Active { remaining };
					None
				}
			}
			TriggerPhase::Cooldown { remaining } => {
				let remaining = remaining - dt;
				self.phase = if remaining <= TIME_EPSILON {
					TriggerPhase::Ready
				} else {
					TriggerPhase::Cooldown { remaining }
				};
				None
			}
			TriggerPhase::Ready => {
				let p = self.style.rate.probability(dt);
				(p > 0.0 && rng.chance(p) && self.fire()).then_some(TriggerEvent::Fired)
			}
		}
	}

	fn cooldown_phase(&self) -> TriggerPhase {
		if self.style.cooldown_seconds > 0.0 {
			TriggerPhase::Cooldown {
				remaining: self.style.cooldown_seconds,
			}
		} else {
			TriggerPhase::Ready
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::effects::rng::{FixedRng, SeededRng};

	fn style(rate: TriggerRate) -> TriggerStyle {
		TriggerStyle {
			rate,
			active_seconds: 0.1,
			cooldown_seconds: 0.2,
		}
	}

	#[test]
	fn cannot_refire_while_active_or_cooling() {
		let mut t = StochasticTrigger::new(style(TriggerRate::PerFrame(0.005)));
		assert!(t.fire());
		assert!(!t.fire());
		let mut rng = FixedRng(0.0);
		for _ in 0..6 {
			t.update(1.0 / 60.0, &mut rng);
		}
		assert!(matches!(t.phase(), TriggerPhase::Cooldown { .. }));
		assert!(!t.fire());
	}

	#[test]
	fn windows_last_whole_frames_at_sixty_hertz() {
		let dt = 1.0 / 60.0;
		let mut t = StochasticTrigger::new(TriggerStyle {
			rate: TriggerRate::PerFrame(0.0),
			active_seconds: 0.1,
			cooldown_seconds: 0.1,
		});
		let mut rng = FixedRng(0.0);
		assert!(t.fire());
		for frame in 1..=5 {
			assert_eq!(t.update(dt, &mut rng), None, "frame {frame}");
			assert!(t.is_active());
		}
		assert_eq!(t.update(dt, &mut rng), Some(TriggerEvent::Ended));
		for _ in 1..=5 {
			t.update(dt, &mut rng);
			assert!(matches!(t.phase(), TriggerPhase::Cooldown { .. }));
		}
		t.update(dt, &mut rng);
		assert!(t.is_ready());
	}

	#[test]
	fn forced_success_is_suppressed_inside_window() {
		let dt = 1.0 / 60.0;
		let mut t = StochasticTrigger::new(style(TriggerRate::PerFrame(0.005)));
		let mut rng = FixedRng(0.0);
		let mut fired_at = Vec::new();
		for frame in 0..600 {
			if t.update(dt, &mut rng) == Some(TriggerEvent::Fired) {
				fired_at.push(frame);
			}
		}
		assert!(fired_at.len() > 1);
		assert_eq!(t.fired_count(), fired_at.len() as u64);
		let window_frames = ((0.1 + 0.2) / dt).floor() as usize;
		for pair in fired_at.windows(2) {
			assert!(pair[1] - pair[0] >= window_frames);
		}
	}

	#[test]
	fn fired_reported_once_per_activation() {
		let mut t = StochasticTrigger::new(style(TriggerRate::PerSecond(1000.0)));
		let mut rng = FixedRng(0.0);
		let events: Vec<_> = (0..10).filter_map(|_| t.update(0.02, &mut rng)).collect();
		assert_eq!(events[0], TriggerEvent::Fired);
		assert_eq!(events[1], TriggerEvent::Ended);
		assert_eq!(
			events.iter().filter(|e| **e == TriggerEvent::Fired).count(),
			1
		);
	}

	#[test]
	fn zero_dt_is_inert() {
		let mut t = StochasticTrigger::new(style(TriggerRate::PerFrame(1.0)));
		let mut rng = FixedRng(0.0);
		assert_eq!(t.update(0.0, &mut rng), None);
		assert!(t.is_ready());
	}

	#[test]
	fn per_second_rate_is_refresh_independent() {
		let rate = TriggerRate::PerSecond(0.3);
		let p60 = 1.0 - (1.0 - rate.probability(1.0 / 60.0)).powi(60);
		let p30 = 1.0 - (1.0 - rate.probability(1.0 / 30.0)).powi(30);
		assert!((p60 - p30).abs() < 1e-9);
	}

	#[test]
	fn normalized_matches_per_frame_at_reference_rate() {
		let legacy = TriggerRate::PerFrame(0.005);
		let p = legacy.normalized().probability(1.0 / REFERENCE_FPS);
		assert!((p - 0.005).abs() < 1e-9);
	}

	#[test]
	fn mean_rate_roughly_holds() {
		let mut t = StochasticTrigger::new(TriggerStyle {
			rate: TriggerRate::PerSecond(2.0),
			active_seconds: 0.0,
			cooldown_seconds: 0.0,
		});
		let mut rng = SeededRng::new(11);
		for _ in 0..(60 * 200) {
			t.update(1.0 / 60.0, &mut rng);
		}
		// Every fire costs one extra frame to end, so the observed rate sits a bit under 2/s.
		let per_second = t.fired_count() as f64 / 200.0;
		assert!((1.5..2.3).contains(&per_second), "{per_second}");
	}
}
