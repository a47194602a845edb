//! Owned simulation state for one canvas.
//!
//! An [`Engine`] holds everything a running scene mutates: particle pools,
//! the chain body, eyes, triggers, the clock and the random source. Event
//! handlers only write to the shared [`InputMailbox`](super::input::InputMailbox);
//! the engine drains it once per [`Engine::frame`].

use log::{debug, info, warn};

use super::audio::AudioCue;
use super::chain::ChainBody;
use super::clock::FrameClock;
use super::compositor::{Layer, begin_frame, draw_vignette};
use super::error::FxResult;
use super::events::{JumpScare, Lightning};
use super::eye::{Eye, GazeState, draw_eye};
use super::input::{InputFrame, PointerSample, SharedInput};
use super::particles::ParticleSystem;
use super::rng::RandomSource;
use super::surface::{ImageSource, Surface, Viewport};
use super::theme::{EyeStyle, Theme};

/// Particles respawned at the pointer on a press.
pub const BURST_COUNT: usize = 12;

/// Optional raster assets. Missing and unloaded images fall back to procedural drawing.
pub struct Assets<I> {
	pub dragon_head: Option<I>,
	pub iris: Option<I>,
}

impl<I> Default for Assets<I> {
	fn default() -> Self {
		Self {
			dragon_head: None,
			iris: None,
		}
	}
}

/// Sounds fired once per trigger activation.
#[derive(Default)]
pub struct Cues {
	pub thunder: Option<Box<dyn AudioCue>>,
	pub scare: Option<Box<dyn AudioCue>>,
}

/// One animated scene built from a [`Theme`]. Platform-neutral; it draws to
/// any [`Surface`].
pub struct Engine<I: ImageSource> {
	theme: Theme,
	viewport: Viewport,
	clock: FrameClock,
	rng: Box<dyn RandomSource>,
	input: SharedInput,
	pointer: Option<PointerSample>,
	pressed: bool,
	back: Option<ParticleSystem>,
	front: Option<ParticleSystem>,
	dragon: Option<ChainBody>,
	eyes: Vec<Eye>,
	scare_eye: EyeStyle,
	lightning: Option<Lightning>,
	scare: Option<JumpScare>,
	assets: Assets<I>,
	cues: Cues,
	frames: u64,
	failed_frames: u64,
	failing: bool,
}

impl<I: ImageSource> Engine<I> {
	/// Build every subsystem the theme enables, sized to `viewport`.
	pub fn new(theme: Theme, viewport: Viewport, mut rng: Box<dyn RandomSource>) -> Self {
		let back = theme
			.back_particles
			.clone()
			.map(|style| ParticleSystem::new(style, viewport, &mut *rng));
		let front = theme
			.front_particles
			.clone()
			.map(|style| ParticleSystem::new(style, viewport, &mut *rng));
		let (cx, cy) = viewport.center();
		let dragon = theme.dragon.clone().map(|style| ChainBody::new(style, cx, cy));
		let eyes = theme
			.eyes
			.as_ref()
			.map(|style| Eye::scatter(style, viewport, &mut *rng))
			.unwrap_or_default();

		info!(
			"skin-canvas: engine created with skin '{}' at {}x{}",
			theme.name, viewport.width, viewport.height
		);

		Self {
			scare_eye: theme.eyes.clone().unwrap_or_default(),
			lightning: theme.lightning.map(Lightning::new),
			scare: theme.scare.map(JumpScare::new),
			theme,
			viewport,
			clock: FrameClock::new(),
			rng,
			input: SharedInput::default(),
			pointer: None,
			pressed: false,
			back,
			front,
			dragon,
			eyes,
			assets: Assets::default(),
			cues: Cues::default(),
			frames: 0,
			failed_frames: 0,
			failing: false,
		}
	}

	pub fn with_assets(mut self, assets: Assets<I>) -> Self {
		self.assets = assets;
		self
	}

	pub fn with_cues(mut self, cues: Cues) -> Self {
		self.cues = cues;
		self
	}

	/// Handle for event listeners to post input into.
	pub fn input_handle(&self) -> SharedInput {
		self.input.clone()
	}

	pub fn theme(&self) -> &Theme {
		&self.theme
	}

	pub fn viewport(&self) -> Viewport {
		self.viewport
	}

	pub fn clock(&self) -> &FrameClock {
		&self.clock
	}

	pub fn back_particles(&self) -> Option<&ParticleSystem> {
		self.back.as_ref()
	}

	pub fn front_particles(&self) -> Option<&ParticleSystem> {
		self.front.as_ref()
	}

	pub fn dragon(&self) -> Option<&ChainBody> {
		self.dragon.as_ref()
	}

	pub fn eyes(&self) -> &[Eye] {
		&self.eyes
	}

	pub fn lightning(&self) -> Option<&Lightning> {
		self.lightning.as_ref()
	}

	pub fn scare(&self) -> Option<&JumpScare> {
		self.scare.as_ref()
	}

	/// Frames run so far, including failed ones.
	pub fn frames(&self) -> u64 {
		self.frames
	}

	/// Frames whose draw step returned an error.
	pub fn failed_frames(&self) -> u64 {
		self.failed_frames
	}

	/// Run one frame: tick the clock, drain input, update, then draw.
	///
	/// Draw errors are contained here. Returns whether the draw succeeded.
	pub fn frame<S: Surface<Image = I>>(&mut self, now_ms: f64, surface: &mut S) -> bool {
		self.frames += 1;
		let dt = self.clock.tick(now_ms);
		let input = self.input.borrow_mut().take_frame();
		if let Some(viewport) = input.resize {
			self.resize(viewport);
		}
		surface.resize(self.viewport);
		self.apply_input(&input);
		self.update(dt);

		surface.save();
		let result = self.draw(surface);
		surface.restore();

		match result {
			Ok(()) => {
				if self.failing {
					info!("skin-canvas: drawing recovered");
					self.failing = false;
				}
				true
			}
			Err(err) => {
				self.failed_frames += 1;
				if !self.failing {
					warn!("skin-canvas: frame draw failed: {err}");
					self.failing = true;
				}
				false
			}
		}
	}

	fn apply_input(&mut self, input: &InputFrame) {
		if let Some(pointer) = input.pointer {
			self.pointer = Some(pointer);
			if let Some(dragon) = self.dragon.as_mut() {
				dragon.set_target(pointer.x, pointer.y);
			}
			for eye in &mut self.eyes {
				eye.gaze
					.look_at((eye.x, eye.y), (pointer.x, pointer.y), self.viewport);
			}
		}
		if let Some(press) = input.press {
			self.press(press.x, press.y);
		}
	}

	/// Burst particles at `(x, y)` and arm a press-forced scare for the next update.
	pub fn press(&mut self, x: f64, y: f64) {
		let rng = self.rng.as_mut();
		if let Some(system) = self.front.as_mut().or(self.back.as_mut()) {
			system.burst(x, y, BURST_COUNT, rng);
		}
		self.pressed = true;
	}

	/// Advance every simulation by `dt` seconds. Zero `dt` changes nothing.
	pub fn update(&mut self, dt: f64) {
		if dt <= 0.0 {
			return;
		}
		let rng = self.rng.as_mut();

		if let Some(system) = self.back.as_mut() {
			system.update(dt, rng);
		}
		if let Some(system) = self.front.as_mut() {
			system.update(dt, rng);
		}
		if let Some(dragon) = self.dragon.as_mut() {
			dragon.step(dt);
		}
		if let Some(style) = self.theme.eyes.as_ref() {
			for eye in &mut self.eyes {
				eye.update(style, dt, rng);
			}
		}
		if let Some(lightning) = self.lightning.as_mut() {
			if lightning.update(dt, self.viewport, rng) {
				debug!("skin-canvas: lightning strike");
				if let Some(cue) = &self.cues.thunder {
					cue.play();
				}
			}
		}
		let pressed = std::mem::take(&mut self.pressed);
		if let Some(scare) = self.scare.as_mut() {
			if scare.update(dt, pressed, rng) {
				debug!("skin-canvas: scare triggered");
				if let Some(cue) = &self.cues.scare {
					cue.play();
				}
			}
		}
	}

	/// Draw every layer in [`Layer::ORDER`].
	pub fn draw<S: Surface<Image = I>>(&self, surface: &mut S) -> FxResult<()> {
		for layer in Layer::ORDER {
			match layer {
				Layer::Background => begin_frame(surface, &self.theme.background)?,
				Layer::BackParticles => {
					if let Some(system) = &self.back {
						system.draw(surface)?;
					}
				}
				Layer::Body => {
					if let Some(dragon) = &self.dragon {
						dragon.draw(surface, self.assets.dragon_head.as_ref())?;
					}
				}
				Layer::Features => {
					if let Some(style) = &self.theme.eyes {
						for eye in &self.eyes {
							draw_eye(
								surface,
								style,
								&eye.params(style.opacity),
								self.assets.iris.as_ref(),
							)?;
						}
					}
				}
				Layer::FrontParticles => {
					if let Some(system) = &self.front {
						system.draw(surface)?;
					}
				}
				Layer::Overlay => {
					draw_vignette(surface, self.theme.background.vignette)?;
					if let Some(lightning) = &self.lightning {
						lightning.draw(surface)?;
					}
					if let Some(scare) = &self.scare {
						scare.draw(
							surface,
							&self.scare_eye,
							self.scare_look(),
							self.assets.iris.as_ref(),
						)?;
					}
				}
			}
		}
		Ok(())
	}

	fn scare_look(&self) -> (f64, f64) {
		let mut gaze = GazeState::default();
		if let Some(pointer) = self.pointer {
			gaze.look_at(self.viewport.center(), (pointer.x, pointer.y), self.viewport);
		}
		gaze.target
	}

	/// Rescale every simulation to a new viewport without resetting it.
	///
	/// Returns `false` for an unchanged or degenerate size.
	pub fn resize(&mut self, viewport: Viewport) -> bool {
		let valid = viewport.width > 0.0 && viewport.height > 0.0;
		if !valid || viewport == self.viewport {
			return false;
		}
		let sx = if self.viewport.width > 0.0 {
			viewport.width / self.viewport.width
		} else {
			1.0
		};
		let sy = if self.viewport.height > 0.0 {
			viewport.height / self.viewport.height
		} else {
			1.0
		};

		if let Some(system) = self.back.as_mut() {
			system.resize(viewport);
		}
		if let Some(system) = self.front.as_mut() {
			system.resize(viewport);
		}
		if let Some(dragon) = self.dragon.as_mut() {
			dragon.rescale(sx, sy);
		}
		for eye in &mut self.eyes {
			eye.x *= sx;
			eye.y *= sy;
		}
		debug!(
			"skin-canvas: engine resized {}x{} -> {}x{}",
			self.viewport.width, self.viewport.height, viewport.width, viewport.height
		);
		self.viewport = viewport;
		true
	}
}
