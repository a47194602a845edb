//! Visual theming for the effects engine.
//!
//! A [`Theme`] is one skin: palette, background, and the parameters of every
//! sub-system it switches on. Skins differ only in these values; the
//! simulation code is shared.

use super::compositor::ClearMode;
use super::surface::BlendMode;
use super::trigger::TriggerRate;

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const WHITE: Color = Color::rgb(255, 255, 255);
	pub const BLACK: Color = Color::rgb(0, 0, 0);
	pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0.0);

	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Lighten the color by a factor (0.0 = unchanged, 1.0 = white)
	pub fn lighten(self, factor: f64) -> Self {
		let f = factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 + (255.0 - self.r as f64) * f) as u8,
			g: (self.g as f64 + (255.0 - self.g as f64) * f) as u8,
			b: (self.b as f64 + (255.0 - self.b as f64) * f) as u8,
			a: self.a,
		}
	}

	/// Darken the color by a factor (0.0 = unchanged, 1.0 = black)
	pub fn darken(self, factor: f64) -> Self {
		let f = 1.0 - factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 * f) as u8,
			g: (self.g as f64 * f) as u8,
			b: (self.b as f64 * f) as u8,
			a: self.a,
		}
	}

	/// Linear interpolation between two colors
	pub fn lerp(self, other: Color, t: f64) -> Self {
		let t = t.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 * (1.0 - t) + other.r as f64 * t).round() as u8,
			g: (self.g as f64 * (1.0 - t) + other.g as f64 * t).round() as u8,
			b: (self.b as f64 * (1.0 - t) + other.b as f64 * t).round() as u8,
			a: self.a * (1.0 - t) + other.a * t,
		}
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// A small set of colors particles sample from.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
	pub colors: Vec<Color>,
}

impl Palette {
	pub fn single(color: Color) -> Self {
		Self {
			colors: vec![color],
		}
	}

	/// Fire: yellow core through orange to deep red
	pub fn embers() -> Self {
		Self {
			colors: vec![
				Color::rgb(255, 214, 102), // Candle
				Color::rgb(255, 159, 67),  // Tangerine
				Color::rgb(255, 107, 53),  // Flame
				Color::rgb(230, 57, 70),   // Ember red
				Color::rgb(255, 236, 179), // White-hot
			],
		}
	}

	/// Cold rain streaks
	pub fn rain() -> Self {
		Self {
			colors: vec![
				Color::rgb(174, 194, 224),
				Color::rgb(150, 170, 205),
				Color::rgb(200, 214, 235),
			],
		}
	}

	/// Raven feathers: near-black with oil-slick tints
	pub fn feathers() -> Self {
		Self {
			colors: vec![
				Color::rgb(20, 20, 28),
				Color::rgb(36, 32, 48),
				Color::rgb(28, 40, 52),
				Color::rgb(48, 36, 56),
			],
		}
	}

	/// Cherry blossom pinks
	pub fn sakura() -> Self {
		Self {
			colors: vec![
				Color::rgb(255, 183, 197),
				Color::rgb(255, 209, 220),
				Color::rgb(250, 160, 180),
				Color::rgb(255, 228, 235),
			],
		}
	}

	/// Sumi ink washes
	pub fn ink() -> Self {
		Self {
			colors: vec![
				Color::rgb(18, 18, 22),
				Color::rgb(40, 40, 48),
				Color::rgb(70, 66, 74),
				Color::rgb(120, 20, 30), // Seal red
			],
		}
	}

	/// Dust motes in a dark room
	pub fn motes() -> Self {
		Self {
			colors: vec![
				Color::rgb(210, 200, 180),
				Color::rgb(180, 170, 160),
				Color::rgb(160, 190, 170),
			],
		}
	}

	pub fn get(&self, index: usize) -> Color {
		if self.colors.is_empty() {
			return Color::WHITE;
		}
		self.colors[index % self.colors.len()]
	}

	pub fn len(&self) -> usize {
		self.colors.len()
	}

	pub fn is_empty(&self) -> bool {
		self.colors.is_empty()
	}
}

/// Where fresh particles appear.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SpawnRegion {
	/// Uniformly over the viewport.
	Anywhere,
	/// Just above the top edge (falling things).
	Above,
	/// Just below the bottom edge (rising things).
	Below,
}

/// Velocity field applied on top of each particle's own velocity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Motion {
	/// Constant velocity in a random direction.
	Drift,
	/// Downward, with a horizontal sinusoidal sway.
	Fall { sway: f64, sway_frequency: f64 },
	/// Upward buoyancy, with a horizontal sinusoidal sway.
	Rise { sway: f64, sway_frequency: f64 },
}

/// What each particle is drawn as.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParticleShape {
	Circle,
	/// Rotated ellipse; `aspect` is minor/major axis ratio (feathers, petals).
	Ellipse { aspect: f64 },
	/// A line along the velocity vector (rain).
	Streak { length: f64 },
	/// Soft radial-gradient disc (ink).
	Blot,
}

/// Particle effect configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleStyle {
	/// Fixed pool size
	pub count: usize,
	pub palette: Palette,
	pub shape: ParticleShape,
	pub spawn: SpawnRegion,
	pub motion: Motion,
	pub size_min: f64,
	pub size_max: f64,
	/// Speed in pixels per second
	pub speed_min: f64,
	pub speed_max: f64,
	pub opacity_min: f64,
	pub opacity_max: f64,
	/// Opacity lost per second
	pub fade_rate: f64,
	/// Size change per second (negative shrinks)
	pub growth_rate: f64,
	/// Constant horizontal velocity added to every particle
	pub wind: f64,
	/// Maximum angular velocity in radians per second
	pub spin_max: f64,
	/// Glow blur radius in pixels (0 = none)
	pub glow: f64,
	pub blend: BlendMode,
}

/// Dragon / trailing-body configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainStyle {
	pub segments: usize,
	/// Fraction of the gap the head closes per 60fps frame
	pub head_follow: f64,
	/// Fraction of the gap each body segment closes per 60fps frame; weaker than `head_follow`
	pub body_follow: f64,
	pub undulation_amplitude: f64,
	/// Radians per second of the traveling wave
	pub undulation_speed: f64,
	/// Phase offset between neighbouring segments
	pub phase_step: f64,
	/// Separation at which the undulation reaches full amplitude
	pub undulation_reach: f64,
	/// Secondary wobble added to the pointer target (0 = none)
	pub float_amplitude: f64,
	/// How many segments back the heading reference point sits
	pub heading_lookback: usize,
	pub head_width: f64,
	pub tail_width: f64,
	pub head_color: Color,
	pub tail_color: Color,
	/// Head ornament size in pixels
	pub ornament_size: f64,
	pub glow: f64,
	pub blend: BlendMode,
}

/// How the iris is rendered.
#[derive(Clone, Debug, PartialEq)]
pub enum IrisStyle {
	/// Image asset, falling back to [`IrisStyle::Disc`] while not loaded.
	Image,
	/// Colored disc with a dark pupil.
	Disc,
	/// Fully procedural concentric rings.
	Rings { rings: usize, palette: Palette },
}

/// Stochastic trigger configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerStyle {
	pub rate: TriggerRate,
	/// Seconds the trigger stays active after firing
	pub active_seconds: f64,
	/// Seconds after the active window during which it cannot re-fire
	pub cooldown_seconds: f64,
}

/// Watching-eye configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct EyeStyle {
	pub count: usize,
	pub size_min: f64,
	pub size_max: f64,
	pub opacity: f64,
	pub sclera_inner: Color,
	pub sclera_outer: Color,
	pub iris: IrisStyle,
	pub iris_color: Color,
	pub pupil_color: Color,
	pub lid_color: Color,
	pub lid_width: f64,
	/// Number of radial texture streaks across the iris
	pub streaks: usize,
	/// Gaze easing rate per second
	pub gaze_rate: f64,
	/// Maximum iris travel as a fraction of eye size
	pub look_scale: f64,
	pub blink: TriggerStyle,
	/// Progress per second while closing / opening
	pub closing_speed: f64,
	pub opening_speed: f64,
	/// Forced blink after this many seconds fully open
	pub max_open_seconds: f64,
}

/// Lightning strike configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightningStyle {
	pub trigger: TriggerStyle,
	pub flash_color: Color,
	/// Peak full-screen flash opacity
	pub flash_alpha: f64,
	pub bolt_color: Color,
	pub bolt_width: f64,
	/// Midpoint displacement as a fraction of segment length
	pub roughness: f64,
	pub glow: f64,
}

/// Jump-scare configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScareStyle {
	pub trigger: TriggerStyle,
	/// Eye size as a fraction of the smaller viewport side
	pub eye_scale: f64,
	pub backdrop: Color,
	/// Whether a press forces the scare when ready
	pub on_press: bool,
}

/// Background style configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct BackgroundStyle {
	/// Primary background color
	pub color: Color,
	/// Secondary color for gradients
	pub color_secondary: Color,
	/// Whether to use radial gradient
	pub use_gradient: bool,
	/// Vignette intensity (0.0 = none, 1.0 = strong)
	pub vignette: f64,
	pub clear: ClearMode,
}

/// Complete visual theme.
#[derive(Clone, Debug, PartialEq)]
pub struct Theme {
	pub name: &'static str,
	pub background: BackgroundStyle,
	/// Drawn beneath the body and features
	pub back_particles: Option<ParticleStyle>,
	/// Drawn above everything but overlays
	pub front_particles: Option<ParticleStyle>,
	pub dragon: Option<ChainStyle>,
	pub eyes: Option<EyeStyle>,
	pub lightning: Option<LightningStyle>,
	pub scare: Option<ScareStyle>,
}

/// Names accepted by [`Theme::by_name`].
pub const SKIN_NAMES: [&str; 6] = ["inferno", "storm", "raven", "sakura", "ink", "haunt"];

fn dragon_chain() -> ChainStyle {
	ChainStyle {
		segments: 24,
		head_follow: 0.1,
		body_follow: 0.08,
		undulation_amplitude: 4.0,
		undulation_speed: 4.0,
		phase_step: 0.45,
		undulation_reach: 24.0,
		float_amplitude: 12.0,
		heading_lookback: 3,
		head_width: 18.0,
		tail_width: 2.0,
		head_color: Color::rgb(255, 120, 40),
		tail_color: Color::rgba(120, 20, 10, 0.4),
		ornament_size: 56.0,
		glow: 14.0,
		blend: BlendMode::Screen,
	}
}

fn watching_eyes(iris: IrisStyle, count: usize) -> EyeStyle {
	EyeStyle {
		count,
		size_min: 28.0,
		size_max: 54.0,
		opacity: 0.9,
		sclera_inner: Color::rgb(245, 240, 230),
		sclera_outer: Color::rgb(180, 160, 150),
		iris,
		iris_color: Color::rgb(150, 30, 30),
		pupil_color: Color::rgb(8, 6, 6),
		lid_color: Color::rgb(20, 10, 12),
		lid_width: 2.0,
		streaks: 18,
		gaze_rate: 6.0,
		look_scale: 0.35,
		blink: TriggerStyle {
			rate: TriggerRate::PerFrame(0.005),
			active_seconds: 0.0,
			cooldown_seconds: 0.4,
		},
		closing_speed: 9.0,
		opening_speed: 5.0,
		max_open_seconds: 7.0,
	}
}

impl Default for EyeStyle {
	fn default() -> Self {
		watching_eyes(IrisStyle::Disc, 1)
	}
}

impl Theme {
	/// Embers rising behind a fire dragon that chases the pointer (default)
	pub fn inferno() -> Self {
		Self {
			name: "inferno",
			background: BackgroundStyle {
				color: Color::rgb(14, 6, 6),
				color_secondary: Color::rgb(44, 14, 8),
				use_gradient: true,
				vignette: 0.35,
				clear: ClearMode::Full,
			},
			back_particles: Some(ParticleStyle {
				count: 90,
				palette: Palette::embers(),
				shape: ParticleShape::Circle,
				spawn: SpawnRegion::Below,
				motion: Motion::Rise {
					sway: 18.0,
					sway_frequency: 1.6,
				},
				size_min: 1.0,
				size_max: 3.5,
				speed_min: 30.0,
				speed_max: 90.0,
				opacity_min: 0.5,
				opacity_max: 1.0,
				fade_rate: 0.25,
				growth_rate: -0.4,
				wind: 0.0,
				spin_max: 0.0,
				glow: 8.0,
				blend: BlendMode::Screen,
			}),
			front_particles: None,
			dragon: Some(dragon_chain()),
			eyes: None,
			lightning: None,
			scare: None,
		}
	}

	/// Slanted rain with lightning strikes and thunder
	pub fn storm() -> Self {
		Self {
			name: "storm",
			background: BackgroundStyle {
				color: Color::rgb(10, 12, 20),
				color_secondary: Color::rgb(26, 32, 48),
				use_gradient: true,
				vignette: 0.3,
				clear: ClearMode::Full,
			},
			back_particles: None,
			front_particles: Some(ParticleStyle {
				count: 220,
				palette: Palette::rain(),
				shape: ParticleShape::Streak { length: 0.04 },
				spawn: SpawnRegion::Above,
				motion: Motion::Fall {
					sway: 0.0,
					sway_frequency: 0.0,
				},
				size_min: 0.8,
				size_max: 1.6,
				speed_min: 600.0,
				speed_max: 900.0,
				opacity_min: 0.25,
				opacity_max: 0.6,
				fade_rate: 0.0,
				growth_rate: 0.0,
				wind: -120.0,
				spin_max: 0.0,
				glow: 0.0,
				blend: BlendMode::SourceOver,
			}),
			dragon: None,
			eyes: None,
			lightning: Some(LightningStyle {
				trigger: TriggerStyle {
					rate: TriggerRate::PerFrame(0.005),
					active_seconds: 0.18,
					cooldown_seconds: 1.5,
				},
				flash_color: Color::rgb(220, 230, 255),
				flash_alpha: 0.55,
				bolt_color: Color::rgb(235, 240, 255),
				bolt_width: 2.5,
				roughness: 0.35,
				glow: 18.0,
			}),
			scare: None,
		}
	}

	/// Feathers tumbling down past watching red eyes
	pub fn raven() -> Self {
		Self {
			name: "raven",
			background: BackgroundStyle {
				color: Color::rgb(6, 6, 10),
				color_secondary: Color::rgb(22, 18, 30),
				use_gradient: true,
				vignette: 0.45,
				clear: ClearMode::Full,
			},
			back_particles: None,
			front_particles: Some(ParticleStyle {
				count: 36,
				palette: Palette::feathers(),
				shape: ParticleShape::Ellipse { aspect: 0.28 },
				spawn: SpawnRegion::Above,
				motion: Motion::Fall {
					sway: 40.0,
					sway_frequency: 1.1,
				},
				size_min: 8.0,
				size_max: 18.0,
				speed_min: 25.0,
				speed_max: 60.0,
				opacity_min: 0.6,
				opacity_max: 0.95,
				fade_rate: 0.04,
				growth_rate: 0.0,
				wind: 10.0,
				spin_max: 1.5,
				glow: 0.0,
				blend: BlendMode::SourceOver,
			}),
			dragon: None,
			eyes: Some(watching_eyes(IrisStyle::Image, 3)),
			lightning: None,
			scare: None,
		}
	}

	/// Drifting cherry-blossom petals
	pub fn sakura() -> Self {
		Self {
			name: "sakura",
			background: BackgroundStyle {
				color: Color::rgb(40, 24, 36),
				color_secondary: Color::rgb(84, 52, 72),
				use_gradient: true,
				vignette: 0.2,
				clear: ClearMode::Full,
			},
			back_particles: None,
			front_particles: Some(ParticleStyle {
				count: 60,
				palette: Palette::sakura(),
				shape: ParticleShape::Ellipse { aspect: 0.6 },
				spawn: SpawnRegion::Above,
				motion: Motion::Fall {
					sway: 30.0,
					sway_frequency: 0.8,
				},
				size_min: 4.0,
				size_max: 8.0,
				speed_min: 20.0,
				speed_max: 50.0,
				opacity_min: 0.6,
				opacity_max: 0.9,
				fade_rate: 0.05,
				growth_rate: 0.0,
				wind: 35.0,
				spin_max: 2.0,
				glow: 0.0,
				blend: BlendMode::SourceOver,
			}),
			dragon: None,
			eyes: None,
			lightning: None,
			scare: None,
		}
	}

	/// Ink blots welling up and smearing into trails
	pub fn ink() -> Self {
		Self {
			name: "ink",
			background: BackgroundStyle {
				color: Color::rgb(236, 228, 212),
				color_secondary: Color::rgb(214, 204, 186),
				use_gradient: false,
				vignette: 0.1,
				clear: ClearMode::Trail { alpha: 0.08 },
			},
			back_particles: Some(ParticleStyle {
				count: 40,
				palette: Palette::ink(),
				shape: ParticleShape::Blot,
				spawn: SpawnRegion::Below,
				motion: Motion::Rise {
					sway: 12.0,
					sway_frequency: 0.5,
				},
				size_min: 3.0,
				size_max: 9.0,
				speed_min: 15.0,
				speed_max: 40.0,
				opacity_min: 0.3,
				opacity_max: 0.7,
				fade_rate: 0.08,
				growth_rate: 1.5,
				wind: 0.0,
				spin_max: 0.0,
				glow: 0.0,
				blend: BlendMode::Multiply,
			}),
			front_particles: None,
			dragon: Some(ChainStyle {
				head_color: Color::rgb(20, 20, 24),
				tail_color: Color::rgba(60, 60, 70, 0.2),
				glow: 0.0,
				blend: BlendMode::SourceOver,
				..dragon_chain()
			}),
			eyes: None,
			lightning: None,
			scare: None,
		}
	}

	/// Dust motes, concentric-ring eyes, and the occasional jump-scare
	pub fn haunt() -> Self {
		Self {
			name: "haunt",
			background: BackgroundStyle {
				color: Color::rgb(4, 6, 6),
				color_secondary: Color::rgb(16, 24, 22),
				use_gradient: true,
				vignette: 0.55,
				clear: ClearMode::Full,
			},
			back_particles: Some(ParticleStyle {
				count: 70,
				palette: Palette::motes(),
				shape: ParticleShape::Circle,
				spawn: SpawnRegion::Anywhere,
				motion: Motion::Drift,
				size_min: 0.5,
				size_max: 2.0,
				speed_min: 4.0,
				speed_max: 14.0,
				opacity_min: 0.2,
				opacity_max: 0.6,
				fade_rate: 0.06,
				growth_rate: 0.0,
				wind: 0.0,
				spin_max: 0.0,
				glow: 4.0,
				blend: BlendMode::Screen,
			}),
			front_particles: None,
			dragon: None,
			eyes: Some(watching_eyes(
				IrisStyle::Rings {
					rings: 5,
					palette: Palette {
						colors: vec![
							Color::rgb(40, 120, 90),
							Color::rgb(200, 180, 60),
							Color::rgb(20, 60, 50),
						],
					},
				},
				2,
			)),
			lightning: None,
			scare: Some(ScareStyle {
				trigger: TriggerStyle {
					rate: TriggerRate::PerFrame(0.0005),
					active_seconds: 0.6,
					cooldown_seconds: 20.0,
				},
				eye_scale: 0.45,
				backdrop: Color::rgba(0, 0, 0, 0.85),
				on_press: true,
			}),
		}
	}

	/// Look up a skin by name, falling back to [`Theme::inferno`].
	pub fn by_name(name: &str) -> Self {
		match name {
			"storm" => Self::storm(),
			"raven" => Self::raven(),
			"sakura" => Self::sakura(),
			"ink" => Self::ink(),
			"haunt" => Self::haunt(),
			_ => Self::inferno(),
		}
	}
}

impl Default for Theme {
	fn default() -> Self {
		Self::inferno()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lerp_endpoints() {
		let a = Color::rgb(0, 0, 0);
		let b = Color::rgba(200, 100, 50, 0.5);
		assert_eq!(a.lerp(b, 0.0), a);
		assert_eq!(a.lerp(b, 1.0), b);
		assert_eq!(a.lerp(b, 0.5).r, 100);
	}

	#[test]
	fn css_formats() {
		assert_eq!(Color::rgb(255, 0, 16).to_css(), "#ff0010");
		assert_eq!(Color::rgba(1, 2, 3, 0.5).to_css(), "rgba(1, 2, 3, 0.5)");
	}

	#[test]
	fn every_skin_name_resolves_to_itself() {
		for name in SKIN_NAMES {
			assert_eq!(Theme::by_name(name).name, name);
		}
		assert_eq!(Theme::by_name("nope").name, "inferno");
	}

	#[test]
	fn palette_get_wraps_and_tolerates_empty() {
		let p = Palette::embers();
		assert_eq!(p.get(p.len()), p.get(0));
		assert_eq!(Palette { colors: vec![] }.get(3), Color::WHITE);
	}
}
