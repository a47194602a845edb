//! The drawing-surface boundary.
//!
//! The engine draws through [`Surface`], an immediate-mode 2D API shaped
//! after the HTML canvas context. [`CanvasSurface`](super::canvas::CanvasSurface)
//! implements it for the browser; [`RecordingSurface`] implements it headless,
//! recording every command so frames can be inspected off-screen.

use super::error::{FxError, FxResult};
use super::theme::Color;

/// Size of the drawable area in surface pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	pub width: f64,
	pub height: f64,
}

impl Viewport {
	pub const fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}

	pub fn center(&self) -> (f64, f64) {
		(self.width / 2.0, self.height / 2.0)
	}

	/// Whether a point lies within the viewport grown by `margin` on every side.
	pub fn contains(&self, x: f64, y: f64, margin: f64) -> bool {
		x >= -margin && x <= self.width + margin && y >= -margin && y <= self.height + margin
	}
}

/// Compositing operation applied to subsequent draws.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlendMode {
	#[default]
	SourceOver,
	/// Additive-looking glow for fire and light.
	Screen,
	Lighter,
	/// Darkens what is underneath; used for texture overlays.
	Multiply,
}

impl BlendMode {
	pub fn as_css(self) -> &'static str {
		match self {
			BlendMode::SourceOver => "source-over",
			BlendMode::Screen => "screen",
			BlendMode::Lighter => "lighter",
			BlendMode::Multiply => "multiply",
		}
	}
}

/// Stroke end-cap style.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineCap {
	#[default]
	Butt,
	Round,
	Square,
}

impl LineCap {
	pub fn as_css(self) -> &'static str {
		match self {
			LineCap::Butt => "butt",
			LineCap::Round => "round",
			LineCap::Square => "square",
		}
	}
}

/// Stroke corner style.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineJoin {
	#[default]
	Miter,
	Round,
	Bevel,
}

impl LineJoin {
	pub fn as_css(self) -> &'static str {
		match self {
			LineJoin::Miter => "miter",
			LineJoin::Round => "round",
			LineJoin::Bevel => "bevel",
		}
	}
}

/// Geometry of a gradient fill.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GradientShape {
	Linear {
		x0: f64,
		y0: f64,
		x1: f64,
		y1: f64,
	},
	Radial {
		x0: f64,
		y0: f64,
		r0: f64,
		x1: f64,
		y1: f64,
		r1: f64,
	},
}

/// A gradient with its color stops (offsets in `[0, 1]`).
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
	pub shape: GradientShape,
	pub stops: Vec<(f64, Color)>,
}

impl Gradient {
	pub fn linear(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
		Self {
			shape: GradientShape::Linear { x0, y0, x1, y1 },
			stops: Vec::new(),
		}
	}

	pub fn radial(x0: f64, y0: f64, r0: f64, x1: f64, y1: f64, r1: f64) -> Self {
		Self {
			shape: GradientShape::Radial {
				x0,
				y0,
				r0,
				x1,
				y1,
				r1,
			},
			stops: Vec::new(),
		}
	}

	pub fn stop(mut self, offset: f64, color: Color) -> Self {
		self.stops.push((offset.clamp(0.0, 1.0), color));
		self
	}
}

/// Fill or stroke paint.
#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
	Solid(Color),
	Gradient(Gradient),
}

impl From<Color> for Paint {
	fn from(color: Color) -> Self {
		Paint::Solid(color)
	}
}

impl From<Gradient> for Paint {
	fn from(gradient: Gradient) -> Self {
		Paint::Gradient(gradient)
	}
}

/// A raster image that may or may not be usable yet.
///
/// "Not yet loaded" and "failed to load" both report `None`.
pub trait ImageSource {
	/// Natural `(width, height)` once the image is decoded and non-empty.
	fn dimensions(&self) -> Option<(f64, f64)>;
}

/// Returns the image only if it is loaded and has non-zero dimensions.
pub fn ready_image<I: ImageSource>(image: Option<&I>) -> Option<(&I, f64, f64)> {
	let image = image?;
	let (w, h) = image.dimensions()?;
	(w > 0.0 && h > 0.0).then_some((image, w, h))
}

/// Immediate-mode 2D drawing surface.
///
/// Calls that can throw on the web return [`FxResult`]; infallible state
/// setters do not.
pub trait Surface {
	/// Image type this surface can blit.
	type Image: ImageSource;

	fn viewport(&self) -> Viewport;
	/// Resynchronize the backing store size. Must be a no-op if unchanged.
	fn resize(&mut self, viewport: Viewport);

	fn save(&mut self);
	fn restore(&mut self);
	fn translate(&mut self, x: f64, y: f64) -> FxResult<()>;
	fn rotate(&mut self, angle: f64) -> FxResult<()>;
	fn scale(&mut self, sx: f64, sy: f64) -> FxResult<()>;

	fn set_global_alpha(&mut self, alpha: f64);
	fn set_blend_mode(&mut self, mode: BlendMode) -> FxResult<()>;
	fn set_fill(&mut self, paint: &Paint) -> FxResult<()>;
	fn set_stroke(&mut self, paint: &Paint) -> FxResult<()>;
	fn set_line_width(&mut self, width: f64);
	fn set_line_cap(&mut self, cap: LineCap);
	fn set_line_join(&mut self, join: LineJoin);
	/// Soft glow around subsequent draws; `blur <= 0` disables it.
	fn set_glow(&mut self, blur: f64, color: Color);

	fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
	fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64);

	fn begin_path(&mut self);
	fn move_to(&mut self, x: f64, y: f64);
	fn line_to(&mut self, x: f64, y: f64);
	fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64);
	fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64) -> FxResult<()>;
	#[allow(clippy::too_many_arguments)]
	fn ellipse(
		&mut self,
		x: f64,
		y: f64,
		rx: f64,
		ry: f64,
		rotation: f64,
		start: f64,
		end: f64,
	) -> FxResult<()>;
	fn close_path(&mut self);
	fn fill(&mut self);
	fn stroke(&mut self);
	fn clip(&mut self);

	fn draw_image(&mut self, image: &Self::Image, x: f64, y: f64, w: f64, h: f64)
	-> FxResult<()>;
}

/// A headless image with fixed dimensions; `None` models a pending or failed load.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StaticImage {
	pub size: Option<(f64, f64)>,
}

impl StaticImage {
	pub const fn loaded(width: f64, height: f64) -> Self {
		Self {
			size: Some((width, height)),
		}
	}

	pub const fn pending() -> Self {
		Self { size: None }
	}
}

impl ImageSource for StaticImage {
	fn dimensions(&self) -> Option<(f64, f64)> {
		self.size
	}
}

/// One recorded call on a [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
	Resize(Viewport),
	Save,
	Restore,
	Translate(f64, f64),
	Rotate(f64),
	Scale(f64, f64),
	GlobalAlpha(f64),
	Blend(BlendMode),
	Fill(Paint),
	Stroke(Paint),
	LineWidth(f64),
	LineCap(LineCap),
	LineJoin(LineJoin),
	Glow(f64),
	ClearRect,
	FillRect(f64, f64, f64, f64),
	BeginPath,
	MoveTo(f64, f64),
	LineTo(f64, f64),
	Quadratic,
	Arc { x: f64, y: f64, radius: f64 },
	Ellipse { x: f64, y: f64, rx: f64, ry: f64 },
	ClosePath,
	FillPath,
	StrokePath,
	Clip,
	Image { x: f64, y: f64, w: f64, h: f64 },
}

/// Headless surface that records commands instead of rasterizing.
///
/// Setting `fail_after` makes every fallible call past that many commands
/// return [`FxError::Canvas`], for exercising error containment.
#[derive(Clone, Debug)]
pub struct RecordingSurface {
	viewport: Viewport,
	pub commands: Vec<DrawCommand>,
	pub fail_after: Option<usize>,
	save_depth: usize,
	max_save_depth: usize,
	resizes: usize,
}

impl RecordingSurface {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			viewport: Viewport::new(width, height),
			commands: Vec::new(),
			fail_after: None,
			save_depth: 0,
			max_save_depth: 0,
			resizes: 0,
		}
	}

	/// Forget recorded commands, keeping size and failure settings.
	pub fn clear(&mut self) {
		self.commands.clear();
	}

	/// Number of `save` calls not yet matched by `restore`.
	pub fn save_depth(&self) -> usize {
		self.save_depth
	}

	pub fn max_save_depth(&self) -> usize {
		self.max_save_depth
	}

	/// How many times the backing store actually changed size.
	pub fn resize_count(&self) -> usize {
		self.resizes
	}

	pub fn count(&self, pred: impl Fn(&DrawCommand) -> bool) -> usize {
		self.commands.iter().filter(|c| pred(c)).count()
	}

	fn push(&mut self, command: DrawCommand) {
		self.commands.push(command);
	}

	fn fallible(&mut self, command: DrawCommand) -> FxResult<()> {
		if let Some(limit) = self.fail_after {
			if self.commands.len() >= limit {
				return Err(FxError::Canvas(format!("injected failure at {command:?}")));
			}
		}
		self.push(command);
		Ok(())
	}
}

impl Surface for RecordingSurface {
	type Image = StaticImage;

	fn viewport(&self) -> Viewport {
		self.viewport
	}

	fn resize(&mut self, viewport: Viewport) {
		if viewport == self.viewport {
			return;
		}
		self.viewport = viewport;
		self.resizes += 1;
		self.push(DrawCommand::Resize(viewport));
	}

	fn save(&mut self) {
		self.save_depth += 1;
		self.max_save_depth = self.max_save_depth.max(self.save_depth);
		self.push(DrawCommand::Save);
	}

	fn restore(&mut self) {
		self.save_depth = self.save_depth.saturating_sub(1);
		self.push(DrawCommand::Restore);
	}

	fn translate(&mut self, x: f64, y: f64) -> FxResult<()> {
		self.fallible(DrawCommand::Translate(x, y))
	}

	fn rotate(&mut self, angle: f64) -> FxResult<()> {
		self.fallible(DrawCommand::Rotate(angle))
	}

	fn scale(&mut self, sx: f64, sy: f64) -> FxResult<()> {
		self.fallible(DrawCommand::Scale(sx, sy))
	}

	fn set_global_alpha(&mut self, alpha: f64) {
		self.push(DrawCommand::GlobalAlpha(alpha));
	}

	fn set_blend_mode(&mut self, mode: BlendMode) -> FxResult<()> {
		self.fallible(DrawCommand::Blend(mode))
	}

	fn set_fill(&mut self, paint: &Paint) -> FxResult<()> {
		self.fallible(DrawCommand::Fill(paint.clone()))
	}

	fn set_stroke(&mut self, paint: &Paint) -> FxResult<()> {
		self.fallible(DrawCommand::Stroke(paint.clone()))
	}

	fn set_line_width(&mut self, width: f64) {
		self.push(DrawCommand::LineWidth(width));
	}

	fn set_line_cap(&mut self, cap: LineCap) {
		self.push(DrawCommand::LineCap(cap));
	}

	fn set_line_join(&mut self, join: LineJoin) {
		self.push(DrawCommand::LineJoin(join));
	}

	fn set_glow(&mut self, blur: f64, _color: Color) {
		self.push(DrawCommand::Glow(blur));
	}

	fn clear_rect(&mut self, _x: f64, _y: f64, _w: f64, _h: f64) {
		self.push(DrawCommand::ClearRect);
	}

	fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
		self.push(DrawCommand::FillRect(x, y, w, h));
	}

	fn begin_path(&mut self) {
		self.push(DrawCommand::BeginPath);
	}

	fn move_to(&mut self, x: f64, y: f64) {
		self.push(DrawCommand::MoveTo(x, y));
	}

	fn line_to(&mut self, x: f64, y: f64) {
		self.push(DrawCommand::LineTo(x, y));
	}

	fn quadratic_curve_to(&mut self, _cpx: f64, _cpy: f64, _x: f64, _y: f64) {
		self.push(DrawCommand::Quadratic);
	}

	fn arc(&mut self, x: f64, y: f64, radius: f64, _start: f64, _end: f64) -> FxResult<()> {
		self.fallible(DrawCommand::Arc { x, y, radius })
	}

	fn ellipse(
		&mut self,
		x: f64,
		y: f64,
		rx: f64,
		ry: f64,
		_rotation: f64,
		_start: f64,
		_end: f64,
	) -> FxResult<()> {
		self.fallible(DrawCommand::Ellipse { x, y, rx, ry })
	}

	fn close_path(&mut self) {
		self.push(DrawCommand::ClosePath);
	}

	fn fill(&mut self) {
		self.push(DrawCommand::FillPath);
	}

	fn stroke(&mut self) {
		self.push(DrawCommand::StrokePath);
	}

	fn clip(&mut self) {
		self.push(DrawCommand::Clip);
	}

	fn draw_image(
		&mut self,
		_image: &Self::Image,
		x: f64,
		y: f64,
		w: f64,
		h: f64,
	) -> FxResult<()> {
		self.fallible(DrawCommand::Image { x, y, w, h })
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ready_image_rejects_pending_and_empty() {
		assert!(ready_image::<StaticImage>(None).is_none());
		assert!(ready_image(Some(&StaticImage::pending())).is_none());
		assert!(ready_image(Some(&StaticImage::loaded(0.0, 10.0))).is_none());
		let img = StaticImage::loaded(32.0, 16.0);
		let (_, w, h) = ready_image(Some(&img)).unwrap();
		assert_eq!((w, h), (32.0, 16.0));
	}

	#[test]
	fn resize_is_idempotent() {
		let mut s = RecordingSurface::new(100.0, 100.0);
		s.resize(Viewport::new(100.0, 100.0));
		assert_eq!(s.resize_count(), 0);
		s.resize(Viewport::new(200.0, 100.0));
		s.resize(Viewport::new(200.0, 100.0));
		assert_eq!(s.resize_count(), 1);
	}

	#[test]
	fn injected_failure_only_hits_fallible_calls() {
		let mut s = RecordingSurface::new(10.0, 10.0);
		s.fail_after = Some(0);
		s.begin_path();
		assert!(s.arc(0.0, 0.0, 1.0, 0.0, 1.0).is_err());
	}

	#[test]
	fn viewport_contains_with_margin() {
		let v = Viewport::new(100.0, 50.0);
		assert!(v.contains(-5.0, 25.0, 10.0));
		assert!(!v.contains(-15.0, 25.0, 10.0));
		assert!(!v.contains(50.0, 61.0, 10.0));
	}
}
