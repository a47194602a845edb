//! One-shot sound cues.
//!
//! Browsers reject `play()` until the page has seen a user gesture. Rejections
//! are logged and otherwise ignored; a silent thunderclap is never an error
//! the animation needs to hear about.

use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::HtmlAudioElement;

use super::error::{FxError, FxResult, describe};

/// Something that can be told to play.
pub trait AudioCue {
	/// Start playback from the beginning. Must not block or panic.
	fn play(&self);
}

/// An `<audio>` element created from a URL.
pub struct HtmlAudioCue {
	element: HtmlAudioElement,
	label: String,
	on_rejected: Closure<dyn FnMut(JsValue)>,
}

impl HtmlAudioCue {
	pub fn load(url: &str, looping: bool) -> FxResult<Self> {
		let element =
			HtmlAudioElement::new_with_src(url).map_err(|e| FxError::Audio(describe(&e)))?;
		element.set_loop(looping);
		element.set_preload("auto");

		let label = url.to_string();
		let tag = label.clone();
		let on_rejected = Closure::<dyn FnMut(JsValue)>::new(move |err: JsValue| {
			warn!("skin-canvas: audio {} rejected: {}", tag, describe(&err));
		});

		Ok(Self {
			element,
			label,
			on_rejected,
		})
	}
}

impl AudioCue for HtmlAudioCue {
	fn play(&self) {
		self.element.set_current_time(0.0);
		match self.element.play() {
			Ok(promise) => {
				let _ = promise.catch(&self.on_rejected);
			}
			Err(e) => warn!("skin-canvas: audio {} failed: {}", self.label, describe(&e)),
		}
	}
}
