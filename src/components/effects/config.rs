//! Scene configuration supplied by the host page as JSON.

use log::warn;
use serde::Deserialize;

use super::error::FxResult;
use super::theme::{SKIN_NAMES, Theme, TriggerStyle};

/// How legacy per-frame trigger probabilities are interpreted.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TriggerPolicy {
	/// Roll the preset probability once per rendered frame, so events fire
	/// more often on high refresh-rate displays.
	PerFrame,
	/// Convert presets to the per-second rate they produce at 60fps.
	#[default]
	PerSecond,
}

/// Options read from `<script id="scene-config" type="application/json">`.
///
/// Every field is optional; an empty object yields the default scene.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
	/// Skin preset name (see [`SKIN_NAMES`]).
	pub skin: String,
	/// RNG seed. `None` seeds from the host.
	pub seed: Option<u64>,
	pub trigger_rate: TriggerPolicy,
	pub show_dragon: bool,
	pub show_eyes: bool,
	/// Overrides the size of the skin's particle pool, the background one
	/// when the skin has both.
	pub ember_count: Option<usize>,
	pub title: Option<String>,
	/// Image URL for the dragon's head ornament.
	pub dragon_head: Option<String>,
	/// Image URL for eye irises.
	pub iris: Option<String>,
	pub thunder_audio: Option<String>,
	pub scare_audio: Option<String>,
}

impl Default for SceneConfig {
	fn default() -> Self {
		Self {
			skin: "inferno".into(),
			seed: None,
			trigger_rate: TriggerPolicy::default(),
			show_dragon: true,
			show_eyes: true,
			ember_count: None,
			title: None,
			dragon_head: None,
			iris: None,
			thunder_audio: None,
			scare_audio: None,
		}
	}
}

impl SceneConfig {
	pub fn from_json(json: &str) -> FxResult<Self> {
		Ok(serde_json::from_str(json)?)
	}

	/// Resolve the preset and apply every override.
	pub fn to_theme(&self) -> Theme {
		if !SKIN_NAMES.contains(&self.skin.as_str()) {
			warn!(
				"skin-canvas: unknown skin '{}', using inferno",
				self.skin
			);
		}
		let mut theme = Theme::by_name(&self.skin);

		if !self.show_dragon {
			theme.dragon = None;
		}
		if !self.show_eyes {
			theme.eyes = None;
		}
		if let Some(count) = self.ember_count {
			match theme
				.back_particles
				.as_mut()
				.or(theme.front_particles.as_mut())
			{
				Some(style) => style.count = count,
				None => warn!(
					"skin-canvas: skin '{}' has no particles, ember_count ignored",
					theme.name
				),
			}
		}
		if self.trigger_rate == TriggerPolicy::PerSecond {
			let normalize = |t: &mut TriggerStyle| t.rate = t.rate.normalized();
			if let Some(eyes) = theme.eyes.as_mut() {
				normalize(&mut eyes.blink);
			}
			if let Some(lightning) = theme.lightning.as_mut() {
				normalize(&mut lightning.trigger);
			}
			if let Some(scare) = theme.scare.as_mut() {
				normalize(&mut scare.trigger);
			}
		}
		theme
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::components::effects::error::FxError;
	use crate::components::effects::trigger::TriggerRate;

	#[test]
	fn empty_object_is_default() {
		assert_eq!(SceneConfig::from_json("{}").unwrap(), SceneConfig::default());
	}

	#[test]
	fn parses_every_field() {
		let config = SceneConfig::from_json(
			r#"{
				"skin": "storm",
				"seed": 42,
				"trigger_rate": "per_frame",
				"show_dragon": false,
				"ember_count": 50,
				"title": "Night",
				"thunder_audio": "/thunder.mp3"
			}"#,
		)
		.unwrap();
		assert_eq!(config.skin, "storm");
		assert_eq!(config.seed, Some(42));
		assert_eq!(config.trigger_rate, TriggerPolicy::PerFrame);
		assert!(!config.show_dragon);
		assert!(config.show_eyes);
		assert_eq!(config.ember_count, Some(50));
		assert_eq!(config.thunder_audio.as_deref(), Some("/thunder.mp3"));
	}

	#[test]
	fn malformed_json_is_a_config_error() {
		assert!(matches!(
			SceneConfig::from_json("{ skin: "),
			Err(FxError::Config(_))
		));
	}

	#[test]
	fn unknown_skin_falls_back() {
		let config = SceneConfig {
			skin: "vaporwave".into(),
			..SceneConfig::default()
		};
		assert_eq!(config.to_theme().name, "inferno");
	}

	#[test]
	fn overrides_apply() {
		let config = SceneConfig {
			show_dragon: false,
			ember_count: Some(50),
			..SceneConfig::default()
		};
		let theme = config.to_theme();
		assert!(theme.dragon.is_none());
		assert_eq!(theme.back_particles.map(|p| p.count), Some(50));
	}

	#[test]
	fn ember_count_reaches_foreground_only_skins() {
		for skin in ["storm", "raven", "sakura"] {
			let theme = SceneConfig {
				skin: skin.into(),
				ember_count: Some(50),
				..SceneConfig::default()
			}
			.to_theme();
			assert!(theme.back_particles.is_none(), "{skin}");
			assert_eq!(theme.front_particles.map(|p| p.count), Some(50), "{skin}");
		}
	}

	#[test]
	fn trigger_policy_controls_rate_semantics() {
		let per_frame = SceneConfig {
			skin: "storm".into(),
			trigger_rate: TriggerPolicy::PerFrame,
			..SceneConfig::default()
		};
		assert_eq!(
			per_frame.to_theme().lightning.map(|l| l.trigger.rate),
			Some(TriggerRate::PerFrame(0.005))
		);

		let per_second = SceneConfig {
			skin: "storm".into(),
			..SceneConfig::default()
		};
		match per_second.to_theme().lightning.map(|l| l.trigger.rate) {
			Some(TriggerRate::PerSecond(rate)) => assert!((rate - 0.3008).abs() < 1e-3),
			other => panic!("expected a per-second rate, got {other:?}"),
		}
	}
}
