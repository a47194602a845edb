//! skin-canvas: procedural animation backgrounds for themed personal sites.
//!
//! This crate provides a WASM canvas component that renders particle fields,
//! a pointer-chasing dragon, watching eyes and triggered effects such as
//! lightning, all configured per skin.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::effects::{EffectsCanvas, Engine, FxError, SceneConfig, Theme};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("skin-canvas: logging initialized");
}

/// Load the scene config from a script element with id="scene-config".
/// Missing or malformed config falls back to the defaults.
fn load_scene_config() -> SceneConfig {
	let Some(json_text) = scene_config_text() else {
		info!("skin-canvas: no scene config, using defaults");
		return SceneConfig::default();
	};

	match SceneConfig::from_json(&json_text) {
		Ok(config) => {
			info!("skin-canvas: loaded scene config for skin '{}'", config.skin);
			config
		}
		Err(e) => {
			warn!("skin-canvas: {}", e);
			SceneConfig::default()
		}
	}
}

fn scene_config_text() -> Option<String> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id("scene-config")?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	script.text().ok()
}

/// Main application component.
/// Loads the scene config from the DOM and renders the animated background.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let config = load_scene_config();
	let title = config.title.clone().unwrap_or_else(|| "skin-canvas".into());
	let config_signal = Signal::derive(move || config.clone());

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text=title.clone() />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="skin-root">
			<EffectsCanvas config=config_signal fullscreen=true />
			<div class="skin-overlay">
				<h1>{title}</h1>
			</div>
		</div>
	}
}
