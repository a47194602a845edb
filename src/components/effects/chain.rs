//! Chain-follow body: the dragon that chases the pointer.
//!
//! Segment 0 eases toward the target; every later segment eases toward its
//! predecessor with a traveling sinusoidal undulation. All easing uses the
//! `1 - exp(-k dt)` form so the motion looks the same at any refresh rate.

use std::f64::consts::PI;

use super::clock::{follow_weight, rate_from_frame_fraction, smoothing_factor};
use super::compositor::with_blend;
use super::error::FxResult;
use super::surface::{LineCap, LineJoin, Paint, Surface, ready_image};
use super::theme::{ChainStyle, Color};

/// Below this separation the heading is not recomputed.
pub const HEADING_EPSILON: f64 = 0.5;

/// Below this separation a segment has no meaningful perpendicular.
const PERP_EPSILON: f64 = 1e-6;

/// One link of a chain, in surface coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Segment {
	pub x: f64,
	pub y: f64,
}

/// An ordered, fixed-length chain of segments.
#[derive(Clone, Debug)]
pub struct ChainBody {
	segments: Vec<Segment>,
	style: ChainStyle,
	head_rate: f64,
	body_rate: f64,
	target: (f64, f64),
	heading: f64,
	facing_left: bool,
	time: f64,
}

impl ChainBody {
	/// Create a chain with every segment stacked at `(x, y)`.
	pub fn new(style: ChainStyle, x: f64, y: f64) -> Self {
		let count = style.segments.max(1);
		Self {
			segments: vec![Segment { x, y }; count],
			head_rate: rate_from_frame_fraction(style.head_follow),
			body_rate: rate_from_frame_fraction(style.body_follow),
			style,
			target: (x, y),
			heading: 0.0,
			facing_left: false,
			time: 0.0,
		}
	}

	/// Segments from head to tail.
	pub fn segments(&self) -> &[Segment] {
		&self.segments
	}

	pub fn head(&self) -> Segment {
		self.segments[0]
	}

	/// Heading in radians, held at its last valid value while motion stalls.
	pub fn heading(&self) -> f64 {
		self.heading
	}

	pub fn facing_left(&self) -> bool {
		self.facing_left
	}

	pub fn target(&self) -> (f64, f64) {
		self.target
	}

	/// Record the latest pointer sample as the follow target.
	pub fn set_target(&mut self, x: f64, y: f64) {
		if x.is_finite() && y.is_finite() {
			self.target = (x, y);
		}
	}

	/// Scale every position and the target after a viewport change.
	pub fn rescale(&mut self, sx: f64, sy: f64) {
		for s in &mut self.segments {
			s.x *= sx;
			s.y *= sy;
		}
		self.target = (self.target.0 * sx, self.target.1 * sy);
	}

	/// Target plus the optional floatiness wobble at time `t`.
	fn floating_target(&self, t: f64) -> (f64, f64) {
		let a = self.style.float_amplitude;
		if a <= 0.0 {
			return self.target;
		}
		(
			self.target.0 + (t * 1.3).sin() * a,
			self.target.1 + (t * 0.9).cos() * a,
		)
	}

	/// Advance the chain by `dt` seconds.
	pub fn step(&mut self, dt: f64) {
		if dt <= 0.0 {
			return;
		}
		let start_time = self.time;
		self.time += dt;

		// Each follower chases its leader at the point inside the step where
		// the exponential kernel is centred, which makes the cascade nearly
		// independent of step size.
		let head_w = follow_weight(self.head_rate, dt);
		let body_w = follow_weight(self.body_rate, dt);
		let (ax, ay) = self.floating_target(start_time);
		let (bx, by) = self.floating_target(self.time);
		let (tx, ty) = (ax + (bx - ax) * head_w, ay + (by - ay) * head_w);
		let head_k = smoothing_factor(self.head_rate, dt);
		let body_k = smoothing_factor(self.body_rate, dt);
		let wave_time = start_time + dt * body_w;
		let style = &self.style;

		let mut prev_old = self.segments[0];
		let head = &mut self.segments[0];
		head.x += (tx - head.x) * head_k;
		head.y += (ty - head.y) * head_k;

		for i in 1..self.segments.len() {
			let prev_new = self.segments[i - 1];
			let anchor = (
				prev_old.x + (prev_new.x - prev_old.x) * body_w,
				prev_old.y + (prev_new.y - prev_old.y) * body_w,
			);
			let seg = self.segments[i];
			let (dx, dy) = (anchor.0 - seg.x, anchor.1 - seg.y);
			let dist = (dx * dx + dy * dy).sqrt();

			let (gx, gy) = if dist > PERP_EPSILON && style.undulation_amplitude > 0.0 {
				let activity = (dist / style.undulation_reach.max(1.0)).min(1.0);
				let wave = (wave_time * style.undulation_speed + i as f64 * style.phase_step).sin()
					* style.undulation_amplitude
					* activity;
				(anchor.0 - dy / dist * wave, anchor.1 + dx / dist * wave)
			} else {
				anchor
			};

			prev_old = seg;
			let seg = &mut self.segments[i];
			seg.x += (gx - seg.x) * body_k;
			seg.y += (gy - seg.y) * body_k;
		}

		self.update_heading();
	}

	fn update_heading(&mut self) {
		let back = self.style.heading_lookback.min(self.segments.len() - 1);
		let (front, reference) = (self.segments[0], self.segments[back]);
		let (dx, dy) = (front.x - reference.x, front.y - reference.y);
		if (dx * dx + dy * dy).sqrt() < HEADING_EPSILON {
			return;
		}
		self.heading = dy.atan2(dx);
		if dx < -HEADING_EPSILON {
			self.facing_left = true;
		} else if dx > HEADING_EPSILON {
			self.facing_left = false;
		}
	}

	/// Draw the tapered body, then the head ornament (image or procedural).
	pub fn draw<S: Surface>(&self, surface: &mut S, ornament: Option<&S::Image>) -> FxResult<()> {
		let style = &self.style;
		with_blend(surface, style.blend, |s| {
			if style.glow > 0.0 {
				s.set_glow(style.glow, style.head_color);
			}
			s.set_line_cap(LineCap::Round);
			s.set_line_join(LineJoin::Round);

			let n = self.segments.len();
			let last = (n - 1).max(1) as f64;
			// Tail first so the head overlaps the body.
			for i in (0..n.saturating_sub(1)).rev() {
				let t = i as f64 / last;
				let (a, b) = (self.segments[i], self.segments[i + 1]);
				s.set_stroke(&Paint::Solid(style.head_color.lerp(style.tail_color, t)))?;
				s.set_line_width(style.head_width + (style.tail_width - style.head_width) * t);
				s.begin_path();
				s.move_to(a.x, a.y);
				s.line_to(b.x, b.y);
				s.stroke();
			}
			s.set_glow(0.0, Color::TRANSPARENT);
			self.draw_head(s, ornament)
		})
	}

	fn draw_head<S: Surface>(&self, surface: &mut S, ornament: Option<&S::Image>) -> FxResult<()> {
		let head = self.head();
		let size = self.style.ornament_size;

		surface.save();
		let result = (|| -> FxResult<()> {
			surface.translate(head.x, head.y)?;
			surface.rotate(self.heading)?;
			if self.facing_left {
				// Keep the ornament upright when heading left.
				surface.scale(1.0, -1.0)?;
			}
			match ready_image(ornament) {
				Some((image, w, h)) => {
					let aspect = h / w;
					surface.draw_image(image, -size / 2.0, -size * aspect / 2.0, size, size * aspect)
				}
				None => draw_procedural_head(surface, size, self.style.head_color),
			}
		})();
		surface.restore();
		result
	}
}

fn draw_procedural_head<S: Surface>(surface: &mut S, size: f64, color: Color) -> FxResult<()> {
	let r = size * 0.22;
	surface.set_fill(&Paint::Solid(color))?;
	surface.begin_path();
	surface.ellipse(r * 0.4, 0.0, r * 1.4, r, 0.0, 0.0, PI * 2.0)?;
	surface.fill();

	surface.set_fill(&Paint::Solid(Color::rgb(255, 240, 180)))?;
	surface.begin_path();
	surface.arc(r * 0.9, -r * 0.45, r * 0.18, 0.0, PI * 2.0)?;
	surface.fill();
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::effects::surface::{DrawCommand, RecordingSurface, StaticImage};
	use crate::components::effects::theme::{SKIN_NAMES, Theme};

	fn style() -> ChainStyle {
		Theme::inferno().dragon.unwrap()
	}

	fn still_style() -> ChainStyle {
		ChainStyle {
			float_amplitude: 0.0,
			..style()
		}
	}

	#[test]
	fn converges_to_stationary_target() {
		let mut chain = ChainBody::new(still_style(), 0.0, 0.0);
		chain.set_target(300.0, -120.0);
		for _ in 0..(60 * 30) {
			chain.step(1.0 / 60.0);
		}
		for s in chain.segments() {
			assert!((s.x - 300.0).abs() < 0.01, "{s:?}");
			assert!((s.y + 120.0).abs() < 0.01, "{s:?}");
		}
	}

	#[test]
	fn body_follows_more_loosely_than_head() {
		let mut dragons = 0;
		for name in SKIN_NAMES {
			let Some(style) = Theme::by_name(name).dragon else {
				continue;
			};
			dragons += 1;
			let chain = ChainBody::new(style, 0.0, 0.0);
			assert!(
				chain.body_rate < chain.head_rate,
				"{name}: body {} vs head {}",
				chain.body_rate,
				chain.head_rate
			);
		}
		assert!(dragons >= 2);
	}

	fn run_for_one_second(style: ChainStyle, steps: usize) -> Vec<Segment> {
		let mut chain = ChainBody::new(style, 100.0, 100.0);
		chain.set_target(220.0, 40.0);
		for _ in 0..steps {
			chain.step(1.0 / steps as f64);
		}
		chain.segments().to_vec()
	}

	#[test]
	fn frame_rate_independent_follow() {
		let (a, b) = (
			run_for_one_second(still_style(), 60),
			run_for_one_second(still_style(), 30),
		);
		assert!((a[0].x - b[0].x).abs() < 1e-6);
		assert!((a[0].y - b[0].y).abs() < 1e-6);
		for (sa, sb) in a.iter().zip(&b) {
			assert!((sa.x - sb.x).abs() < 1.5, "{sa:?} vs {sb:?}");
			assert!((sa.y - sb.y).abs() < 1.5, "{sa:?} vs {sb:?}");
		}
	}

	#[test]
	fn frame_rate_independent_with_floating_target() {
		let (a, b) = (
			run_for_one_second(style(), 60),
			run_for_one_second(style(), 30),
		);
		assert!((a[0].x - b[0].x).abs() < 0.05);
		assert!((a[0].y - b[0].y).abs() < 0.05);
		for (sa, sb) in a.iter().zip(&b) {
			assert!((sa.x - sb.x).abs() < 2.0, "{sa:?} vs {sb:?}");
			assert!((sa.y - sb.y).abs() < 2.0, "{sa:?} vs {sb:?}");
		}
	}

	#[test]
	fn heading_held_when_points_coincide() {
		let mut chain = ChainBody::new(still_style(), 50.0, 50.0);
		chain.set_target(50.0, 50.0);
		let before = chain.heading();
		chain.step(1.0 / 60.0);
		assert_eq!(chain.heading(), before);
		assert!(!chain.heading().is_nan());

		chain.set_target(0.0, 50.0);
		for _ in 0..30 {
			chain.step(1.0 / 60.0);
		}
		let moving = chain.heading();
		assert!(chain.facing_left());
		assert!((moving.abs() - PI).abs() < 0.3);

		// Stall: let it collapse onto the target, heading must not snap.
		for _ in 0..600 {
			chain.step(1.0 / 60.0);
		}
		let settled = chain.heading();
		chain.step(1.0 / 60.0);
		assert_eq!(chain.heading(), settled);
		assert!(chain.facing_left());
	}

	#[test]
	fn zero_dt_changes_nothing() {
		let mut chain = ChainBody::new(style(), 10.0, 10.0);
		chain.set_target(90.0, 90.0);
		let before = chain.segments().to_vec();
		chain.step(0.0);
		assert_eq!(chain.segments(), &before[..]);
	}

	#[test]
	fn non_finite_target_ignored() {
		let mut chain = ChainBody::new(style(), 10.0, 10.0);
		chain.set_target(f64::NAN, 3.0);
		assert_eq!(chain.target(), (10.0, 10.0));
	}

	#[test]
	fn draws_taper_and_falls_back_without_image() {
		let mut chain = ChainBody::new(style(), 0.0, 0.0);
		chain.set_target(200.0, 0.0);
		for _ in 0..20 {
			chain.step(1.0 / 60.0);
		}
		let mut surface = RecordingSurface::new(400.0, 400.0);
		chain.draw(&mut surface, Some(&StaticImage::pending())).unwrap();
		let widths: Vec<f64> = surface
			.commands
			.iter()
			.filter_map(|c| match c {
				DrawCommand::LineWidth(w) => Some(*w),
				_ => None,
			})
			.collect();
		assert_eq!(widths.len(), 23);
		assert!(widths.first().unwrap() < widths.last().unwrap());
		assert_eq!(surface.count(|c| matches!(c, DrawCommand::Image { .. })), 0);
		assert!(surface.count(|c| matches!(c, DrawCommand::Ellipse { .. })) >= 1);
		assert_eq!(surface.save_depth(), 0);

		surface.clear();
		chain.draw(&mut surface, Some(&StaticImage::loaded(64.0, 32.0))).unwrap();
		assert_eq!(surface.count(|c| matches!(c, DrawCommand::Image { .. })), 1);
	}

	#[test]
	fn facing_left_flips_ornament() {
		let mut chain = ChainBody::new(still_style(), 300.0, 0.0);
		chain.set_target(0.0, 0.0);
		for _ in 0..20 {
			chain.step(1.0 / 60.0);
		}
		let mut surface = RecordingSurface::new(400.0, 400.0);
		chain.draw(&mut surface, None).unwrap();
		assert!(surface.commands.contains(&DrawCommand::Scale(1.0, -1.0)));
	}
}
