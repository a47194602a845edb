//! Pooled particle effects: embers, rain, feathers, petals, ink.
//!
//! One parametrized system covers every variant; a [`ParticleStyle`] picks
//! the spawn distribution, velocity field, and shape. The pool is filled
//! once and never grows: a particle that fades out, shrinks away, or leaves
//! the viewport is respawned in place.

use std::f64::consts::{PI, TAU};

use super::compositor::with_blend;
use super::error::FxResult;
use super::rng::RandomSource;
use super::surface::{Gradient, Paint, Surface, Viewport};
use super::theme::{Color, Motion, ParticleShape, ParticleStyle, SpawnRegion};

/// Distance outside the viewport a particle may travel before it is recycled.
const BOUNDS_MARGIN: f64 = 40.0;

/// A single point-like element.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	pub size: f64,
	pub opacity: f64,
	/// Opacity at spawn; the upper bound for the particle's whole life.
	pub initial_opacity: f64,
	pub color: Color,
	pub rotation: f64,
	pub spin: f64,
	/// Sway phase offset
	pub phase: f64,
}

impl ParticleStyle {
	/// Create a fresh particle for this style.
	///
	/// `initial` spawns spread across the whole viewport so the first frame
	/// is not empty; respawns come from the style's spawn region.
	pub fn spawn(&self, viewport: Viewport, rng: &mut dyn RandomSource, initial: bool) -> Particle {
		let (w, h) = (viewport.width, viewport.height);
		let edge = BOUNDS_MARGIN * 0.5;
		let (x, y) = match (self.spawn, initial) {
			(SpawnRegion::Anywhere, _) | (_, true) => (rng.range(0.0, w), rng.range(0.0, h)),
			(SpawnRegion::Above, false) => (rng.range(-edge, w + edge), rng.range(-edge, 0.0)),
			(SpawnRegion::Below, false) => (rng.range(-edge, w + edge), rng.range(h, h + edge)),
		};

		let speed = rng.range(self.speed_min, self.speed_max);
		let (vx, vy) = match self.motion {
			Motion::Drift => {
				let angle = rng.range(0.0, TAU);
				(angle.cos() * speed, angle.sin() * speed)
			}
			Motion::Fall { .. } => (self.wind, speed),
			Motion::Rise { .. } => (self.wind, -speed),
		};

		let opacity = rng.range(self.opacity_min, self.opacity_max).clamp(0.0, 1.0);
		let color = if self.palette.is_empty() {
			Color::WHITE
		} else {
			self.palette.get(rng.index(self.palette.len()))
		};

		Particle {
			x,
			y,
			vx,
			vy,
			size: rng.range(self.size_min, self.size_max).max(0.0),
			opacity,
			initial_opacity: opacity,
			color,
			rotation: rng.range(0.0, TAU),
			spin: if self.spin_max > 0.0 {
				rng.range(-self.spin_max, self.spin_max)
			} else {
				0.0
			},
			phase: rng.range(0.0, TAU),
		}
	}
}

/// Manages a fixed-size pool of particles.
#[derive(Clone, Debug)]
pub struct ParticleSystem {
	particles: Vec<Particle>,
	style: ParticleStyle,
	viewport: Viewport,
	time: f64,
}

impl ParticleSystem {
	/// Fill a pool of `style.count` particles.
	pub fn new(style: ParticleStyle, viewport: Viewport, rng: &mut dyn RandomSource) -> Self {
		let mut system = Self {
			particles: Vec::new(),
			style,
			viewport,
			time: 0.0,
		};
		system.init(system.style.count, rng);
		system
	}

	/// Refill the pool with `count` freshly spawned particles.
	pub fn init(&mut self, count: usize, rng: &mut dyn RandomSource) {
		self.particles.clear();
		self.particles.reserve_exact(count);
		for _ in 0..count {
			let p = self.style.spawn(self.viewport, rng, true);
			self.particles.push(p);
		}
	}

	pub fn particles(&self) -> &[Particle] {
		&self.particles
	}

	pub fn len(&self) -> usize {
		self.particles.len()
	}

	pub fn is_empty(&self) -> bool {
		self.particles.is_empty()
	}

	pub fn style(&self) -> &ParticleStyle {
		&self.style
	}

	/// Advance every particle by `dt` seconds and recycle the expired ones.
	pub fn update(&mut self, dt: f64, rng: &mut dyn RandomSource) {
		if dt <= 0.0 {
			return;
		}
		self.time += dt;
		let time = self.time;
		let style = &self.style;
		let viewport = self.viewport;

		for p in &mut self.particles {
			let sway_dx = match style.motion {
				Motion::Fall {
					sway,
					sway_frequency,
				}
				| Motion::Rise {
					sway,
					sway_frequency,
				} => (time * sway_frequency + p.phase).cos() * sway * dt,
				Motion::Drift => 0.0,
			};

			p.x += p.vx * dt + sway_dx;
			p.y += p.vy * dt;
			p.rotation += p.spin * dt;
			p.opacity = (p.opacity - style.fade_rate * dt).clamp(0.0, p.initial_opacity);
			p.size = (p.size + style.growth_rate * dt).max(0.0);

			let expired = p.opacity <= 0.0 || p.size <= 0.0;
			if expired || !viewport.contains(p.x, p.y, BOUNDS_MARGIN) {
				*p = style.spawn(viewport, rng, false);
			}
		}
	}

	/// Respawn up to `n` of the faintest particles at a point, bursting outward.
	///
	/// The pool size does not change.
	pub fn burst(&mut self, x: f64, y: f64, n: usize, rng: &mut dyn RandomSource) {
		let mut order: Vec<usize> = (0..self.particles.len()).collect();
		order.sort_by(|&a, &b| {
			self.particles[a]
				.opacity
				.total_cmp(&self.particles[b].opacity)
		});
		for idx in order.into_iter().take(n) {
			let mut p = self.style.spawn(self.viewport, rng, true);
			let angle = rng.range(0.0, TAU);
			let speed = rng.range(self.style.speed_min, self.style.speed_max.max(1.0)) * 1.5;
			p.x = x;
			p.y = y;
			p.vx = angle.cos() * speed;
			p.vy = angle.sin() * speed;
			self.particles[idx] = p;
		}
	}

	/// Rescale positions to a new viewport without respawning.
	pub fn resize(&mut self, viewport: Viewport) {
		if viewport == self.viewport {
			return;
		}
		let scale_x = if self.viewport.width > 0.0 {
			viewport.width / self.viewport.width
		} else {
			1.0
		};
		let scale_y = if self.viewport.height > 0.0 {
			viewport.height / self.viewport.height
		} else {
			1.0
		};

		for p in &mut self.particles {
			p.x *= scale_x;
			p.y *= scale_y;
		}

		self.viewport = viewport;
	}

	/// Draw every particle with its own color and opacity.
	pub fn draw<S: Surface>(&self, surface: &mut S) -> FxResult<()> {
		let style = &self.style;
		with_blend(surface, style.blend, |s| {
			if style.glow > 0.0 {
				s.set_glow(style.glow, style.palette.get(0));
			}
			let result = self
				.particles
				.iter()
				.filter(|p| p.opacity > 0.0 && p.size > 0.0)
				.try_for_each(|p| draw_particle(s, style.shape, p));
			s.set_glow(0.0, Color::TRANSPARENT);
			s.set_global_alpha(1.0);
			result
		})
	}
}

fn draw_particle<S: Surface>(surface: &mut S, shape: ParticleShape, p: &Particle) -> FxResult<()> {
	surface.set_global_alpha(p.opacity);
	match shape {
		ParticleShape::Circle => {
			surface.set_fill(&Paint::Solid(p.color))?;
			surface.begin_path();
			surface.arc(p.x, p.y, p.size, 0.0, TAU)?;
			surface.fill();
		}
		ParticleShape::Ellipse { aspect } => {
			surface.set_fill(&Paint::Solid(p.color))?;
			surface.begin_path();
			surface.ellipse(p.x, p.y, p.size, p.size * aspect, p.rotation, 0.0, TAU)?;
			surface.fill();
			// Spine
			let (c, s) = (p.rotation.cos(), p.rotation.sin());
			surface.set_stroke(&Paint::Solid(p.color.lighten(0.25)))?;
			surface.set_line_width((p.size * 0.08).max(0.5));
			surface.begin_path();
			surface.move_to(p.x - c * p.size, p.y - s * p.size);
			surface.line_to(p.x + c * p.size, p.y + s * p.size);
			surface.stroke();
		}
		ParticleShape::Streak { length } => {
			surface.set_stroke(&Paint::Solid(p.color))?;
			surface.set_line_width(p.size);
			surface.begin_path();
			surface.move_to(p.x, p.y);
			surface.line_to(p.x - p.vx * length, p.y - p.vy * length);
			surface.stroke();
		}
		ParticleShape::Blot => {
			let gradient = Gradient::radial(p.x, p.y, 0.0, p.x, p.y, p.size)
				.stop(0.0, p.color)
				.stop(0.6, p.color.with_alpha(0.6))
				.stop(1.0, p.color.with_alpha(0.0));
			surface.set_fill(&Paint::Gradient(gradient))?;
			surface.begin_path();
			surface.arc(p.x, p.y, p.size, 0.0, PI * 2.0)?;
			surface.fill();
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::effects::rng::SeededRng;
	use crate::components::effects::surface::{BlendMode, DrawCommand, RecordingSurface};
	use crate::components::effects::theme::Theme;
	use proptest::prelude::*;

	fn embers() -> ParticleStyle {
		Theme::inferno().back_particles.unwrap()
	}

	fn rain() -> ParticleStyle {
		Theme::storm().front_particles.unwrap()
	}

	const VIEW: Viewport = Viewport::new(800.0, 600.0);

	#[test]
	fn zero_dt_is_a_noop() {
		let mut rng = SeededRng::new(1);
		let mut ps = ParticleSystem::new(embers(), VIEW, &mut rng);
		let before = ps.particles().to_vec();
		ps.update(0.0, &mut rng);
		assert_eq!(ps.particles(), &before[..]);
	}

	#[test]
	fn faded_particles_respawn_from_region() {
		let mut rng = SeededRng::new(2);
		let mut style = embers();
		style.fade_rate = 100.0;
		let mut ps = ParticleSystem::new(style, VIEW, &mut rng);
		ps.update(0.1, &mut rng);
		assert_eq!(ps.len(), 90);
		for p in ps.particles() {
			assert!(p.y >= VIEW.height, "respawned below the bottom edge");
			assert!(p.opacity > 0.0);
		}
	}

	#[test]
	fn rain_falls_and_leaves_via_bottom() {
		let mut rng = SeededRng::new(3);
		let mut ps = ParticleSystem::new(rain(), VIEW, &mut rng);
		let y0: Vec<f64> = ps.particles().iter().map(|p| p.y).collect();
		ps.update(0.01, &mut rng);
		let moved_down = ps
			.particles()
			.iter()
			.zip(&y0)
			.filter(|(p, y)| p.y > **y)
			.count();
		assert!(moved_down > ps.len() / 2);
	}

	#[test]
	fn burst_keeps_pool_size() {
		let mut rng = SeededRng::new(4);
		let mut ps = ParticleSystem::new(embers(), VIEW, &mut rng);
		ps.burst(100.0, 100.0, 500, &mut rng);
		assert_eq!(ps.len(), 90);
		assert!(ps.particles().iter().all(|p| p.x == 100.0 && p.y == 100.0));
	}

	#[test]
	fn resize_scales_without_respawn() {
		let mut rng = SeededRng::new(5);
		let mut ps = ParticleSystem::new(embers(), VIEW, &mut rng);
		let before = ps.particles().to_vec();
		ps.resize(Viewport::new(1600.0, 300.0));
		for (a, b) in before.iter().zip(ps.particles()) {
			assert!((b.x - a.x * 2.0).abs() < 1e-9);
			assert!((b.y - a.y * 0.5).abs() < 1e-9);
			assert_eq!(a.opacity, b.opacity);
		}
	}

	#[test]
	fn additive_layer_resets_blend() {
		let mut rng = SeededRng::new(6);
		let ps = ParticleSystem::new(embers(), VIEW, &mut rng);
		let mut surface = RecordingSurface::new(800.0, 600.0);
		ps.draw(&mut surface).unwrap();
		let blends: Vec<_> = surface
			.commands
			.iter()
			.filter_map(|c| match c {
				DrawCommand::Blend(m) => Some(*m),
				_ => None,
			})
			.collect();
		assert_eq!(blends, vec![BlendMode::Screen, BlendMode::SourceOver]);
		assert_eq!(
			surface.count(|c| matches!(c, DrawCommand::Arc { .. })),
			90
		);
	}

	proptest! {
		#[test]
		fn pool_size_and_opacity_bounds_hold(seed in any::<u64>(), dt in 0.0f64..0.5, steps in 1usize..40) {
			let mut rng = SeededRng::new(seed);
			let mut ps = ParticleSystem::new(embers(), VIEW, &mut rng);
			for _ in 0..steps {
				ps.update(dt, &mut rng);
				prop_assert_eq!(ps.len(), 90);
				for p in ps.particles() {
					prop_assert!(p.opacity >= 0.0 && p.opacity <= p.initial_opacity);
				}
			}
		}

		#[test]
		fn opacity_never_increases_without_respawn(seed in any::<u64>(), dt in 0.001f64..0.1) {
			let mut rng = SeededRng::new(seed);
			let mut ps = ParticleSystem::new(embers(), VIEW, &mut rng);
			let before = ps.particles().to_vec();
			ps.update(dt, &mut rng);
			for (a, b) in before.iter().zip(ps.particles()) {
				let respawned = b.initial_opacity != a.initial_opacity;
				prop_assert!(respawned || b.opacity <= a.opacity);
			}
		}
	}
}
