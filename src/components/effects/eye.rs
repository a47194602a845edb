//! Procedural eyes: blink state machine, gaze smoothing, and rendering.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use super::clock::smoothing_factor;
use super::compositor::with_blend;
use super::error::FxResult;
use super::rng::RandomSource;
use super::surface::{BlendMode, Gradient, Paint, Surface, Viewport, ready_image};
use super::theme::{Color, EyeStyle, IrisStyle};
use super::trigger::{StochasticTrigger, TriggerEvent};

/// Stage of a blink.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlinkPhase {
	/// Fully open, waiting for the next blink.
	#[default]
	Idle,
	Closing,
	Opening,
}

/// Blink progress, `1.0` fully open and `0.0` fully closed.
///
/// Phases only advance Idle → Closing → Opening → Idle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlinkState {
	phase: BlinkPhase,
	progress: f64,
	closing_speed: f64,
	opening_speed: f64,
}

impl BlinkState {
	pub fn new(closing_speed: f64, opening_speed: f64) -> Self {
		Self {
			phase: BlinkPhase::Idle,
			progress: 1.0,
			closing_speed: closing_speed.max(f64::EPSILON),
			opening_speed: opening_speed.max(f64::EPSILON),
		}
	}

	pub fn phase(&self) -> BlinkPhase {
		self.phase
	}

	pub fn progress(&self) -> f64 {
		self.progress
	}

	/// Begin a blink. Ignored unless idle.
	pub fn start(&mut self) -> bool {
		if self.phase != BlinkPhase::Idle {
			return false;
		}
		self.phase = BlinkPhase::Closing;
		true
	}

	pub fn update(&mut self, dt: f64) {
		if dt <= 0.0 {
			return;
		}
		match self.phase {
			BlinkPhase::Idle => {}
			BlinkPhase::Closing => {
				self.progress -= self.closing_speed * dt;
				if self.progress <= 0.0 {
					self.progress = 0.0;
					self.phase = BlinkPhase::Opening;
				}
			}
			BlinkPhase::Opening => {
				self.progress += self.opening_speed * dt;
				if self.progress >= 1.0 {
					self.progress = 1.0;
					self.phase = BlinkPhase::Idle;
				}
			}
		}
		self.progress = self.progress.clamp(0.0, 1.0);
	}
}

/// Smoothed look offset, each axis in `[-1, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GazeState {
	pub offset: (f64, f64),
	pub target: (f64, f64),
}

impl GazeState {
	/// Aim toward a pointer, normalised by half the viewport and clamped to the unit disc.
	pub fn look_at(&mut self, center: (f64, f64), pointer: (f64, f64), viewport: Viewport) {
		let half_w = (viewport.width / 2.0).max(1.0);
		let half_h = (viewport.height / 2.0).max(1.0);
		let (mut x, mut y) = (
			(pointer.0 - center.0) / half_w,
			(pointer.1 - center.1) / half_h,
		);
		let len = (x * x + y * y).sqrt();
		if len > 1.0 {
			x /= len;
			y /= len;
		}
		if x.is_finite() && y.is_finite() {
			self.target = (x, y);
		}
	}

	pub fn update(&mut self, rate: f64, dt: f64) {
		let k = smoothing_factor(rate, dt);
		self.offset.0 += (self.target.0 - self.offset.0) * k;
		self.offset.1 += (self.target.1 - self.offset.1) * k;
	}
}

/// Everything needed to draw one eye in one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EyeParams {
	pub x: f64,
	pub y: f64,
	/// Half-width of the lens
	pub size: f64,
	pub opacity: f64,
	pub blink_progress: f64,
	pub look: (f64, f64),
}

/// A watching eye: position plus blink and gaze state.
#[derive(Clone, Debug)]
pub struct Eye {
	pub x: f64,
	pub y: f64,
	pub size: f64,
	pub blink: BlinkState,
	pub gaze: GazeState,
	blink_trigger: StochasticTrigger,
	open_for: f64,
}

impl Eye {
	pub fn new(style: &EyeStyle, x: f64, y: f64, size: f64) -> Self {
		Self {
			x,
			y,
			size,
			blink: BlinkState::new(style.closing_speed, style.opening_speed),
			gaze: GazeState::default(),
			blink_trigger: StochasticTrigger::new(style.blink),
			open_for: 0.0,
		}
	}

	/// Scatter `style.count` eyes over the upper part of the viewport.
	pub fn scatter(style: &EyeStyle, viewport: Viewport, rng: &mut dyn RandomSource) -> Vec<Self> {
		let n = style.count.max(1) as f64;
		(0..style.count)
			.map(|i| {
				let band = viewport.width / n;
				let x = band * (i as f64 + 0.5) + rng.range(-band * 0.2, band * 0.2);
				let y = rng.range(viewport.height * 0.15, viewport.height * 0.55);
				let size = rng.range(style.size_min, style.size_max);
				Eye::new(style, x, y, size)
			})
			.collect()
	}

	/// Advance blink timing and gaze; starts a blink on a trigger roll or
	/// after staying open for `style.max_open_seconds`.
	pub fn update(&mut self, style: &EyeStyle, dt: f64, rng: &mut dyn RandomSource) {
		if dt <= 0.0 {
			return;
		}
		if self.blink.phase() == BlinkPhase::Idle {
			self.open_for += dt;
		}
		let rolled = self.blink_trigger.update(dt, rng) == Some(TriggerEvent::Fired);
		if (rolled || self.open_for >= style.max_open_seconds) && self.blink.start() {
			self.open_for = 0.0;
		}
		self.blink.update(dt);
		self.gaze.update(style.gaze_rate, dt);
	}

	pub fn params(&self, opacity: f64) -> EyeParams {
		EyeParams {
			x: self.x,
			y: self.y,
			size: self.size,
			opacity,
			blink_progress: self.blink.progress(),
			look: self.gaze.offset,
		}
	}
}

/// Build the almond-shaped lens path; vertical extent follows `openness`.
fn lens_path<S: Surface>(surface: &mut S, p: &EyeParams, openness: f64) {
	let (w, h) = (p.size, p.size * 0.55 * openness);
	surface.begin_path();
	surface.move_to(p.x - w, p.y);
	surface.quadratic_curve_to(p.x, p.y - h * 2.0, p.x + w, p.y);
	surface.quadratic_curve_to(p.x, p.y + h * 2.0, p.x - w, p.y);
	surface.close_path();
}

/// Draw an eye: clipped lens, sclera, iris, texture, highlight, then the lid outline.
///
/// A missing or not-yet-loaded iris image falls back to a procedural disc.
pub fn draw_eye<S: Surface>(
	surface: &mut S,
	style: &EyeStyle,
	params: &EyeParams,
	iris_image: Option<&S::Image>,
) -> FxResult<()> {
	let openness = (params.blink_progress.clamp(0.0, 1.0) * FRAC_PI_2).sin();
	let (cx, cy, r) = (params.x, params.y, params.size);

	surface.save();
	surface.set_global_alpha(params.opacity.clamp(0.0, 1.0));
	let result = (|| -> FxResult<()> {
		lens_path(surface, params, openness);
		surface.clip();

		let sclera = Gradient::radial(cx, cy, r * 0.1, cx, cy, r)
			.stop(0.0, style.sclera_inner)
			.stop(1.0, style.sclera_outer);
		surface.set_fill(&Paint::Gradient(sclera))?;
		surface.fill_rect(cx - r, cy - r, r * 2.0, r * 2.0);

		let iris_r = r * 0.48;
		surface.save();
		let iris = (|| -> FxResult<()> {
			surface.translate(
				cx + params.look.0 * r * style.look_scale,
				cy + params.look.1 * r * style.look_scale,
			)?;
			match &style.iris {
				IrisStyle::Image => match ready_image(iris_image) {
					Some((image, _, _)) => {
						surface.draw_image(image, -iris_r, -iris_r, iris_r * 2.0, iris_r * 2.0)?
					}
					None => draw_disc_iris(surface, style, iris_r)?,
				},
				IrisStyle::Disc => draw_disc_iris(surface, style, iris_r)?,
				IrisStyle::Rings { rings, palette } => {
					draw_ring_iris(surface, style, iris_r, *rings, palette.colors.as_slice())?
				}
			}
			draw_streaks(surface, style, iris_r)?;

			surface.set_fill(&Paint::Solid(Color::rgba(255, 255, 255, 0.85)))?;
			surface.begin_path();
			surface.ellipse(
				-iris_r * 0.35,
				-iris_r * 0.35,
				iris_r * 0.22,
				iris_r * 0.14,
				-PI / 4.0,
				0.0,
				TAU,
			)?;
			surface.fill();
			Ok(())
		})();
		surface.restore();
		iris
	})();
	surface.restore();
	result?;

	lens_path(surface, params, openness);
	surface.set_global_alpha(params.opacity.clamp(0.0, 1.0));
	surface.set_stroke(&Paint::Solid(style.lid_color))?;
	surface.set_line_width(style.lid_width);
	surface.stroke();
	surface.set_global_alpha(1.0);
	Ok(())
}

fn draw_disc_iris<S: Surface>(surface: &mut S, style: &EyeStyle, r: f64) -> FxResult<()> {
	let iris = Gradient::radial(0.0, 0.0, r * 0.2, 0.0, 0.0, r)
		.stop(0.0, style.iris_color.lighten(0.3))
		.stop(0.8, style.iris_color)
		.stop(1.0, style.iris_color.darken(0.5));
	surface.set_fill(&Paint::Gradient(iris))?;
	surface.begin_path();
	surface.arc(0.0, 0.0, r, 0.0, TAU)?;
	surface.fill();

	surface.set_fill(&Paint::Solid(style.pupil_color))?;
	surface.begin_path();
	surface.arc(0.0, 0.0, r * 0.42, 0.0, TAU)?;
	surface.fill();
	Ok(())
}

fn draw_ring_iris<S: Surface>(
	surface: &mut S,
	style: &EyeStyle,
	r: f64,
	rings: usize,
	colors: &[Color],
) -> FxResult<()> {
	let rings = rings.max(1);
	for j in 0..rings {
		let radius = r * (1.0 - j as f64 / (rings as f64 + 1.0));
		let color = if colors.is_empty() {
			style.iris_color
		} else {
			colors[j % colors.len()]
		};
		surface.set_fill(&Paint::Solid(color))?;
		surface.begin_path();
		surface.arc(0.0, 0.0, radius, 0.0, TAU)?;
		surface.fill();
	}
	surface.set_fill(&Paint::Solid(style.pupil_color))?;
	surface.begin_path();
	surface.arc(0.0, 0.0, r / (rings as f64 + 1.0), 0.0, TAU)?;
	surface.fill();
	Ok(())
}

fn draw_streaks<S: Surface>(surface: &mut S, style: &EyeStyle, r: f64) -> FxResult<()> {
	if style.streaks == 0 {
		return Ok(());
	}
	with_blend(surface, BlendMode::Multiply, |s| {
		s.set_stroke(&Paint::Solid(Color::rgba(0, 0, 0, 0.35)))?;
		s.set_line_width((r * 0.03).max(0.5));
		s.begin_path();
		for k in 0..style.streaks {
			let angle = k as f64 / style.streaks as f64 * TAU;
			let (c, sn) = (angle.cos(), angle.sin());
			s.move_to(c * r * 0.45, sn * r * 0.45);
			s.line_to(c * r * 0.95, sn * r * 0.95);
		}
		s.stroke();
		Ok(())
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::effects::rng::{FixedRng, SeededRng};
	use crate::components::effects::surface::{DrawCommand, RecordingSurface, StaticImage};
	use crate::components::effects::theme::Theme;
	use proptest::prelude::*;

	fn style() -> EyeStyle {
		Theme::raven().eyes.unwrap()
	}

	fn params() -> EyeParams {
		EyeParams {
			x: 100.0,
			y: 100.0,
			size: 40.0,
			opacity: 1.0,
			blink_progress: 1.0,
			look: (0.5, -0.2),
		}
	}

	#[test]
	fn full_blink_cycle_returns_to_open_idle() {
		let mut blink = BlinkState::new(9.0, 5.0);
		assert!(blink.start());
		assert!(!blink.start());
		let mut phases = vec![blink.phase()];
		for _ in 0..120 {
			blink.update(1.0 / 60.0);
			if phases.last() != Some(&blink.phase()) {
				phases.push(blink.phase());
			}
		}
		assert_eq!(
			phases,
			vec![BlinkPhase::Closing, BlinkPhase::Opening, BlinkPhase::Idle]
		);
		assert_eq!(blink.progress(), 1.0);
	}

	#[test]
	fn huge_dt_clamps_progress() {
		let mut blink = BlinkState::new(9.0, 5.0);
		blink.start();
		blink.update(10.0);
		assert_eq!(blink.progress(), 0.0);
		assert_eq!(blink.phase(), BlinkPhase::Opening);
		blink.update(10.0);
		assert_eq!(blink.progress(), 1.0);
		assert_eq!(blink.phase(), BlinkPhase::Idle);
	}

	proptest! {
		#[test]
		fn progress_stays_in_unit_interval(dts in proptest::collection::vec(0.0f64..0.5, 1..200)) {
			let mut blink = BlinkState::new(9.0, 5.0);
			for (i, dt) in dts.iter().enumerate() {
				if i % 7 == 0 {
					blink.start();
				}
				blink.update(*dt);
				prop_assert!((0.0..=1.0).contains(&blink.progress()));
			}
		}
	}

	#[test]
	fn gaze_is_clamped_and_smoothed() {
		let mut gaze = GazeState::default();
		gaze.look_at((0.0, 0.0), (10_000.0, 0.0), Viewport::new(200.0, 200.0));
		assert_eq!(gaze.target, (1.0, 0.0));
		gaze.update(6.0, 1.0 / 60.0);
		assert!(gaze.offset.0 > 0.0 && gaze.offset.0 < 0.2);
		for _ in 0..600 {
			gaze.update(6.0, 1.0 / 60.0);
		}
		assert!((gaze.offset.0 - 1.0).abs() < 1e-6);
	}

	#[test]
	fn eye_forces_blink_after_max_open() {
		let mut s = style();
		s.blink.rate = crate::components::effects::trigger::TriggerRate::PerFrame(0.0);
		let mut eye = Eye::new(&s, 0.0, 0.0, 30.0);
		let mut rng = SeededRng::new(3);
		let frames = (s.max_open_seconds * 60.0) as usize + 2;
		for _ in 0..frames {
			eye.update(&s, 1.0 / 60.0, &mut rng);
		}
		assert_eq!(eye.blink.phase(), BlinkPhase::Closing);
	}

	#[test]
	fn trigger_roll_starts_blink() {
		let s = style();
		let mut eye = Eye::new(&s, 0.0, 0.0, 30.0);
		eye.update(&s, 1.0 / 60.0, &mut FixedRng(0.0));
		assert_eq!(eye.blink.phase(), BlinkPhase::Closing);
	}

	#[test]
	fn pending_iris_image_falls_back_to_disc() {
		let mut surface = RecordingSurface::new(200.0, 200.0);
		draw_eye(&mut surface, &style(), &params(), Some(&StaticImage::pending())).unwrap();
		assert_eq!(surface.count(|c| matches!(c, DrawCommand::Image { .. })), 0);
		// Iris disc and pupil.
		assert!(surface.count(|c| matches!(c, DrawCommand::Arc { .. })) >= 2);
		assert_eq!(surface.save_depth(), 0);
		assert_eq!(surface.count(|c| matches!(c, DrawCommand::Clip)), 1);
		assert_eq!(surface.commands.last(), Some(&DrawCommand::GlobalAlpha(1.0)));
	}

	#[test]
	fn loaded_iris_image_is_blitted_after_look_offset() {
		let mut surface = RecordingSurface::new(200.0, 200.0);
		let image = StaticImage::loaded(64.0, 64.0);
		draw_eye(&mut surface, &style(), &params(), Some(&image)).unwrap();
		assert_eq!(surface.count(|c| matches!(c, DrawCommand::Image { .. })), 1);
		let s = style();
		let expected = DrawCommand::Translate(
			100.0 + 0.5 * 40.0 * s.look_scale,
			100.0 - 0.2 * 40.0 * s.look_scale,
		);
		assert!(surface.commands.contains(&expected));
	}

	#[test]
	fn streak_overlay_resets_blend() {
		let mut surface = RecordingSurface::new(200.0, 200.0);
		draw_eye(&mut surface, &style(), &params(), None).unwrap();
		let blends: Vec<_> = surface
			.commands
			.iter()
			.filter_map(|c| match c {
				DrawCommand::Blend(m) => Some(*m),
				_ => None,
			})
			.collect();
		assert_eq!(blends, vec![BlendMode::Multiply, BlendMode::SourceOver]);
	}

	#[test]
	fn ring_iris_draws_every_ring() {
		let haunt = Theme::haunt().eyes.unwrap();
		let mut surface = RecordingSurface::new(200.0, 200.0);
		draw_eye(&mut surface, &haunt, &params(), None).unwrap();
		// Five rings plus the pupil.
		assert_eq!(surface.count(|c| matches!(c, DrawCommand::Arc { .. })), 6);
	}

	#[test]
	fn failure_mid_draw_still_balances_save_restore() {
		let mut surface = RecordingSurface::new(200.0, 200.0);
		surface.fail_after = Some(12);
		assert!(draw_eye(&mut surface, &style(), &params(), None).is_err());
		assert_eq!(surface.save_depth(), 0);
	}
}
