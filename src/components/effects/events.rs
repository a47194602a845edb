//! Trigger-driven overlays: lightning strikes and jump-scares.

use super::compositor::{flash, with_blend};
use super::error::FxResult;
use super::eye::{EyeParams, draw_eye};
use super::rng::RandomSource;
use super::surface::{BlendMode, LineCap, LineJoin, Paint, Surface, Viewport};
use super::theme::{Color, EyeStyle, LightningStyle, ScareStyle};
use super::trigger::{StochasticTrigger, TriggerEvent};

/// Subdivision passes when generating a bolt (2^depth segments).
const BOLT_DEPTH: u32 = 6;

/// A jagged polyline from the top of the viewport downward.
pub fn generate_bolt(viewport: Viewport, roughness: f64, rng: &mut dyn RandomSource) -> Vec<(f64, f64)> {
	let start = (rng.range(viewport.width * 0.15, viewport.width * 0.85), 0.0);
	let end = (
		start.0 + rng.range(-viewport.width * 0.2, viewport.width * 0.2),
		rng.range(viewport.height * 0.55, viewport.height * 0.95),
	);

	let mut points = vec![start, end];
	for _ in 0..BOLT_DEPTH {
		let mut next = Vec::with_capacity(points.len() * 2 - 1);
		for pair in points.windows(2) {
			let (a, b) = (pair[0], pair[1]);
			let (dx, dy) = (b.0 - a.0, b.1 - a.1);
			let len = (dx * dx + dy * dy).sqrt();
			let offset = rng.range(-1.0, 1.0) * len * roughness;
			let (nx, ny) = if len > f64::EPSILON {
				(-dy / len, dx / len)
			} else {
				(0.0, 0.0)
			};
			next.push(a);
			next.push(((a.0 + b.0) / 2.0 + nx * offset, (a.1 + b.1) / 2.0 + ny * offset));
		}
		if let Some(&last) = points.last() {
			next.push(last);
		}
		points = next;
	}
	points
}

/// Lightning: a bolt plus a decaying full-screen flash while the trigger is active.
#[derive(Clone, Debug)]
pub struct Lightning {
	style: LightningStyle,
	trigger: StochasticTrigger,
	bolt: Vec<(f64, f64)>,
}

impl Lightning {
	pub fn new(style: LightningStyle) -> Self {
		Self {
			trigger: StochasticTrigger::new(style.trigger),
			style,
			bolt: Vec::new(),
		}
	}

	pub fn trigger(&self) -> &StochasticTrigger {
		&self.trigger
	}

	pub fn bolt(&self) -> &[(f64, f64)] {
		&self.bolt
	}

	/// Returns `true` on the frame a strike begins.
	pub fn update(&mut self, dt: f64, viewport: Viewport, rng: &mut dyn RandomSource) -> bool {
		match self.trigger.update(dt, rng) {
			Some(TriggerEvent::Fired) => {
				self.bolt = generate_bolt(viewport, self.style.roughness, rng);
				true
			}
			Some(TriggerEvent::Ended) => {
				self.bolt.clear();
				false
			}
			None => false,
		}
	}

	pub fn draw<S: Surface>(&self, surface: &mut S) -> FxResult<()> {
		if !self.trigger.is_active() {
			return Ok(());
		}
		let fade = 1.0 - self.trigger.active_progress();
		flash(surface, self.style.flash_color, self.style.flash_alpha * fade)?;

		if self.bolt.len() < 2 {
			return Ok(());
		}
		let style = &self.style;
		with_blend(surface, BlendMode::Screen, |s| {
			s.set_glow(style.glow, style.bolt_color);
			s.set_global_alpha(fade);
			s.set_stroke(&Paint::Solid(style.bolt_color))?;
			s.set_line_width(style.bolt_width);
			s.set_line_cap(LineCap::Round);
			s.set_line_join(LineJoin::Round);
			s.begin_path();
			s.move_to(self.bolt[0].0, self.bolt[0].1);
			for &(x, y) in &self.bolt[1..] {
				s.line_to(x, y);
			}
			s.stroke();
			s.set_glow(0.0, Color::TRANSPARENT);
			s.set_global_alpha(1.0);
			Ok(())
		})
	}
}

/// A huge eye that snaps open over everything for a moment.
#[derive(Clone, Debug)]
pub struct JumpScare {
	style: ScareStyle,
	trigger: StochasticTrigger,
}

impl JumpScare {
	pub fn new(style: ScareStyle) -> Self {
		Self {
			trigger: StochasticTrigger::new(style.trigger),
			style,
		}
	}

	pub fn trigger(&self) -> &StochasticTrigger {
		&self.trigger
	}

	/// Returns `true` on the frame the scare begins, from a roll or a press.
	pub fn update(&mut self, dt: f64, pressed: bool, rng: &mut dyn RandomSource) -> bool {
		if pressed && self.style.on_press && self.trigger.fire() {
			return true;
		}
		self.trigger.update(dt, rng) == Some(TriggerEvent::Fired)
	}

	pub fn draw<S: Surface>(
		&self,
		surface: &mut S,
		eye: &EyeStyle,
		look: (f64, f64),
		iris_image: Option<&S::Image>,
	) -> FxResult<()> {
		if !self.trigger.is_active() {
			return Ok(());
		}
		let progress = self.trigger.active_progress();
		// Snap open in the first fifth, hold, fade in the last fifth.
		let openness = (progress * 5.0).min(1.0);
		let opacity = ((1.0 - progress) * 5.0).min(1.0);

		flash(
			surface,
			self.style.backdrop.with_alpha(1.0),
			self.style.backdrop.a * opacity,
		)?;
		let viewport = surface.viewport();
		let (cx, cy) = viewport.center();
		let params = EyeParams {
			x: cx,
			y: cy,
			size: viewport.width.min(viewport.height) * self.style.eye_scale,
			opacity,
			blink_progress: openness,
			look,
		};
		draw_eye(surface, eye, &params, iris_image)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::effects::rng::{FixedRng, SeededRng};
	use crate::components::effects::surface::{DrawCommand, RecordingSurface};
	use crate::components::effects::theme::Theme;

	const VIEW: Viewport = Viewport::new(800.0, 600.0);

	#[test]
	fn bolt_runs_top_down_with_expected_resolution() {
		let mut rng = SeededRng::new(9);
		let bolt = generate_bolt(VIEW, 0.35, &mut rng);
		assert_eq!(bolt.len(), (1 << BOLT_DEPTH) + 1);
		assert_eq!(bolt[0].1, 0.0);
		assert!(bolt.last().unwrap().1 >= VIEW.height * 0.55);
		assert!(bolt.iter().all(|(x, y)| x.is_finite() && y.is_finite()));
	}

	#[test]
	fn strike_fires_once_and_clears_bolt() {
		let mut lightning = Lightning::new(Theme::storm().lightning.unwrap());
		let mut rng = FixedRng(0.0);
		let mut strikes = 0;
		for _ in 0..30 {
			if lightning.update(1.0 / 60.0, VIEW, &mut rng) {
				strikes += 1;
			}
		}
		// One strike: 0.18s active then a 1.5s cooldown.
		assert_eq!(strikes, 1);
		assert!(lightning.bolt().is_empty());
		assert!(!lightning.trigger().is_active());
	}

	#[test]
	fn active_strike_draws_flash_and_bolt() {
		let mut lightning = Lightning::new(Theme::storm().lightning.unwrap());
		let mut rng = FixedRng(0.0);
		assert!(lightning.update(1.0 / 60.0, VIEW, &mut rng));
		let mut surface = RecordingSurface::new(800.0, 600.0);
		lightning.draw(&mut surface).unwrap();
		assert!(surface.commands.contains(&DrawCommand::FillRect(0.0, 0.0, 800.0, 600.0)));
		assert_eq!(surface.count(|c| matches!(c, DrawCommand::LineTo(..))), 64);
		assert_eq!(
			surface.commands.last(),
			Some(&DrawCommand::Blend(BlendMode::SourceOver))
		);
	}

	#[test]
	fn idle_lightning_draws_nothing() {
		let lightning = Lightning::new(Theme::storm().lightning.unwrap());
		let mut surface = RecordingSurface::new(800.0, 600.0);
		lightning.draw(&mut surface).unwrap();
		assert!(surface.commands.is_empty());
	}

	#[test]
	fn press_forces_scare_only_when_ready() {
		let haunt = Theme::haunt();
		let mut scare = JumpScare::new(haunt.scare.unwrap());
		let mut rng = FixedRng(0.99);
		assert!(scare.update(1.0 / 60.0, true, &mut rng));
		assert!(!scare.update(1.0 / 60.0, true, &mut rng));

		let mut surface = RecordingSurface::new(800.0, 600.0);
		scare
			.draw::<RecordingSurface>(&mut surface, &haunt.eyes.unwrap(), (0.0, 0.0), None)
			.unwrap();
		assert_eq!(surface.count(|c| matches!(c, DrawCommand::Clip)), 1);
	}
}
