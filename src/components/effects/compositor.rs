//! Per-frame surface preparation and blend-mode layering.
//!
//! Layers are drawn in a fixed order:
//! 1. Background fill (full clear or a translucent fade for trails)
//! 2. Background particles
//! 3. Chain body
//! 4. Procedural features (eyes)
//! 5. Foreground particles
//! 6. Overlays (lightning, scares, vignette)

use super::error::FxResult;
use super::surface::{BlendMode, Gradient, Paint, Surface, Viewport};
use super::theme::{BackgroundStyle, Color};

/// How the previous frame is removed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum ClearMode {
	/// Repaint the background completely.
	#[default]
	Full,
	/// Paint the background at low alpha so moving things leave trails.
	Trail { alpha: f64 },
}

/// Drawing order of engine layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
	Background,
	BackParticles,
	Body,
	Features,
	FrontParticles,
	Overlay,
}

impl Layer {
	pub const ORDER: [Layer; 6] = [
		Layer::Background,
		Layer::BackParticles,
		Layer::Body,
		Layer::Features,
		Layer::FrontParticles,
		Layer::Overlay,
	];
}

/// Run `draw` with `mode` active, restoring normal compositing afterwards
/// even when `draw` fails.
pub fn with_blend<S, F>(surface: &mut S, mode: BlendMode, draw: F) -> FxResult<()>
where
	S: Surface,
	F: FnOnce(&mut S) -> FxResult<()>,
{
	if mode == BlendMode::SourceOver {
		return draw(surface);
	}
	surface.set_blend_mode(mode)?;
	let result = draw(surface);
	let reset = surface.set_blend_mode(BlendMode::SourceOver);
	result.and(reset)
}

/// Clear or fade the surface ready for a new frame.
pub fn begin_frame<S: Surface>(surface: &mut S, background: &BackgroundStyle) -> FxResult<()> {
	let Viewport { width, height } = surface.viewport();
	surface.set_global_alpha(1.0);
	surface.set_blend_mode(BlendMode::SourceOver)?;

	let paint = if background.use_gradient {
		Paint::Gradient(
			Gradient::radial(
				width / 2.0,
				height / 2.0,
				0.0,
				width / 2.0,
				height / 2.0,
				width.max(height) * 0.8,
			)
			.stop(0.0, background.color_secondary)
			.stop(1.0, background.color),
		)
	} else {
		Paint::Solid(background.color)
	};

	match background.clear {
		ClearMode::Full => {
			surface.clear_rect(0.0, 0.0, width, height);
			surface.set_fill(&paint)?;
			surface.fill_rect(0.0, 0.0, width, height);
		}
		ClearMode::Trail { alpha } => {
			surface.set_global_alpha(alpha.clamp(0.0, 1.0));
			surface.set_fill(&paint)?;
			surface.fill_rect(0.0, 0.0, width, height);
			surface.set_global_alpha(1.0);
		}
	}
	Ok(())
}

/// Darken the edges of the frame.
pub fn draw_vignette<S: Surface>(surface: &mut S, strength: f64) -> FxResult<()> {
	if strength <= 0.0 {
		return Ok(());
	}
	let Viewport { width, height } = surface.viewport();
	let gradient = Gradient::radial(
		width / 2.0,
		height / 2.0,
		width.min(height) * 0.3,
		width / 2.0,
		height / 2.0,
		width.max(height) * 0.7,
	)
	.stop(0.0, Color::TRANSPARENT)
	.stop(1.0, Color::BLACK.with_alpha(strength.clamp(0.0, 1.0)));

	surface.set_fill(&Paint::Gradient(gradient))?;
	surface.fill_rect(0.0, 0.0, width, height);
	Ok(())
}

/// Full-screen translucent wash, used for flashes.
pub fn flash<S: Surface>(surface: &mut S, color: Color, alpha: f64) -> FxResult<()> {
	if alpha <= 0.0 {
		return Ok(());
	}
	let Viewport { width, height } = surface.viewport();
	surface.set_global_alpha(alpha.clamp(0.0, 1.0));
	surface.set_fill(&Paint::Solid(color))?;
	surface.fill_rect(0.0, 0.0, width, height);
	surface.set_global_alpha(1.0);
	Ok(())
}
