//! Error taxonomy for the effects engine.
//!
//! Nothing here is fatal to the animation loop: every variant is caught at
//! the frame boundary (see [`Engine::frame`](super::Engine::frame)) or at the
//! asset/audio edge and degrades to a missing visual flourish.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Errors raised by the drawing surface, assets, audio, or configuration.
#[derive(Debug, Error)]
pub enum FxError {
	/// The 2D drawing context could not be acquired.
	#[error("drawing surface unavailable: {0}")]
	SurfaceUnavailable(String),
	/// A canvas call threw.
	#[error("canvas operation failed: {0}")]
	Canvas(String),
	/// An image failed to load or decode.
	#[error("asset failed: {0}")]
	Asset(String),
	/// Audio playback was rejected or could not be created.
	#[error("audio failed: {0}")]
	Audio(String),
	/// Scene configuration could not be parsed.
	#[error("invalid scene config: {0}")]
	Config(#[from] serde_json::Error),
}

impl FxError {
	/// Wrap a thrown JS value from a canvas call.
	pub fn canvas(err: JsValue) -> Self {
		Self::Canvas(describe(&err))
	}
}

/// Best-effort string rendering of a JS exception.
pub(crate) fn describe(err: &JsValue) -> String {
	err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

/// Result alias used throughout the engine.
pub type FxResult<T> = Result<T, FxError>;
