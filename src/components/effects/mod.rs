//! Procedural canvas animation engine for site skins.
//!
//! One parametrized engine drives every skin:
//! - Fixed-size particle pools (embers, rain, feathers, petals, ink)
//! - A chain body that follows the pointer (the dragon)
//! - Procedural eyes with blink and gaze
//! - Stochastic triggers for lightning and jump-scares
//! - Layered compositing with additive glow
//!
//! All timing is `dt`-based. The core is drawn through the [`Surface`] trait,
//! so it runs headless against [`RecordingSurface`] as well as on a real
//! canvas through [`CanvasSurface`].
//!
//! # Example
//!
//! ```ignore
//! use skin_canvas::{EffectsCanvas, SceneConfig};
//!
//! let config = SceneConfig { skin: "storm".into(), ..SceneConfig::default() };
//! view! { <EffectsCanvas config=config /> }
//! ```

pub mod audio;
mod canvas;
pub mod chain;
pub mod clock;
mod component;
pub mod compositor;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod eye;
mod frame_loop;
pub mod input;
pub mod particles;
pub mod rng;
pub mod surface;
pub mod theme;
pub mod trigger;

pub use canvas::{CanvasSurface, WebImage};
pub use component::EffectsCanvas;
pub use config::{SceneConfig, TriggerPolicy};
pub use engine::{Assets, Cues, Engine};
pub use error::{FxError, FxResult};
pub use frame_loop::AnimationLoop;
pub use surface::{RecordingSurface, StaticImage, Surface, Viewport};
pub use theme::Theme;
