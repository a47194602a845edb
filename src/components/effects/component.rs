//! Leptos component hosting an effects scene on a canvas.
//!
//! On mount the component acquires the 2D context, builds an [`Engine`] from
//! the scene config, binds window input into the engine's mailbox and starts
//! the animation loop. Everything lives in one [`Runtime`] value owned by the
//! component; unmounting drops it, which cancels the pending frame and
//! removes every listener.

use leptos::prelude::*;
use log::{info, warn};
use web_sys::HtmlCanvasElement;

use super::audio::{AudioCue, HtmlAudioCue};
use super::canvas::{CanvasSurface, WebImage};
use super::config::SceneConfig;
use super::engine::{Assets, Cues, Engine};
use super::error::FxResult;
use super::frame_loop::AnimationLoop;
use super::input::{ListenerRegistry, bind_input};
use super::rng::SeededRng;
use super::surface::{Surface, Viewport};

/// Fallback size when the canvas cannot be measured yet.
const DEFAULT_VIEWPORT: Viewport = Viewport::new(800.0, 600.0);

/// A running scene. Field order matters: the loop stops before listeners detach.
struct Runtime {
	frame_loop: AnimationLoop,
	_listeners: ListenerRegistry,
}

fn measurer(canvas: HtmlCanvasElement, fullscreen: bool) -> impl Fn() -> Option<Viewport> + 'static {
	move || {
		if fullscreen {
			let window = web_sys::window()?;
			Some(Viewport::new(
				window.inner_width().ok()?.as_f64()?,
				window.inner_height().ok()?.as_f64()?,
			))
		} else {
			let parent = canvas.parent_element()?;
			Some(Viewport::new(
				parent.client_width() as f64,
				parent.client_height() as f64,
			))
		}
	}
}

fn load_image(url: Option<&str>) -> Option<WebImage> {
	match WebImage::load(url?) {
		Ok(image) => Some(image),
		Err(err) => {
			warn!("skin-canvas: {err}");
			None
		}
	}
}

fn load_cue(url: Option<&str>, looping: bool) -> Option<Box<dyn AudioCue>> {
	match HtmlAudioCue::load(url?, looping) {
		Ok(cue) => Some(Box::new(cue)),
		Err(err) => {
			warn!("skin-canvas: {err}");
			None
		}
	}
}

fn start_scene(canvas: &HtmlCanvasElement, config: &SceneConfig, fullscreen: bool) -> FxResult<Runtime> {
	let mut surface = CanvasSurface::acquire(canvas)?;
	let viewport = measurer(canvas.clone(), fullscreen)().unwrap_or(DEFAULT_VIEWPORT);
	surface.resize(viewport);

	let seed = config
		.seed
		.unwrap_or_else(|| (js_sys::Math::random() * u32::MAX as f64) as u64);
	info!(
		"skin-canvas: starting '{}' with seed {seed}",
		config.skin
	);

	let mut engine = Engine::new(config.to_theme(), viewport, Box::new(SeededRng::new(seed)))
		.with_assets(Assets {
			dragon_head: load_image(config.dragon_head.as_deref()),
			iris: load_image(config.iris.as_deref()),
		})
		.with_cues(Cues {
			thunder: load_cue(config.thunder_audio.as_deref(), false),
			scare: load_cue(config.scare_audio.as_deref(), false),
		});

	let listeners = bind_input(
		&engine.input_handle(),
		canvas,
		measurer(canvas.clone(), fullscreen),
	)?;
	let frame_loop = AnimationLoop::new(move |now| {
		engine.frame(now, &mut surface);
	})?;
	frame_loop.start();

	Ok(Runtime {
		frame_loop,
		_listeners: listeners,
	})
}

/// Renders an animated skin background on a canvas element.
///
/// With `fullscreen` (the default) the canvas tracks the window size;
/// otherwise it sizes itself to its parent. A change to `config` tears the
/// running scene down and starts a new one.
#[component]
pub fn EffectsCanvas(
	#[prop(into)] config: Signal<SceneConfig>,
	#[prop(default = true)] fullscreen: bool,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let runtime = StoredValue::new_local(None::<Runtime>);

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let config = config.get();

		// Stop the previous scene before its replacement binds listeners.
		runtime.set_value(None);
		match start_scene(&canvas, &config, fullscreen) {
			Ok(scene) => runtime.set_value(Some(scene)),
			Err(err) => warn!("skin-canvas: effects disabled: {err}"),
		}
	});

	on_cleanup(move || {
		if let Some(Some(scene)) = runtime.try_update_value(Option::take) {
			scene.frame_loop.stop();
		}
	});

	let style = if fullscreen {
		"display: block; position: fixed; inset: 0; z-index: 0;"
	} else {
		"display: block;"
	};

	view! { <canvas node_ref=canvas_ref class="effects-canvas" style=style /> }
}
