//! [`Surface`] over an HTML canvas 2D context, and image assets loaded by URL.

use std::cell::Cell;
use std::rc::Rc;

use log::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasGradient, CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use super::error::{FxError, FxResult, describe};
use super::surface::{
	BlendMode, Gradient, GradientShape, ImageSource, LineCap, LineJoin, Paint, Surface, Viewport,
};
use super::theme::Color;

/// Immediate-mode drawing onto a `<canvas>`.
pub struct CanvasSurface {
	canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
	viewport: Viewport,
}

impl CanvasSurface {
	/// Acquire the 2D context, failing with [`FxError::SurfaceUnavailable`] if the
	/// browser refuses one.
	pub fn acquire(canvas: &HtmlCanvasElement) -> FxResult<Self> {
		let ctx: CanvasRenderingContext2d = canvas
			.get_context("2d")
			.map_err(|e| FxError::SurfaceUnavailable(describe(&e)))?
			.ok_or_else(|| FxError::SurfaceUnavailable("no 2d context".into()))?
			.dyn_into()
			.map_err(|_| FxError::SurfaceUnavailable("context is not 2d".into()))?;

		Ok(Self {
			viewport: Viewport::new(canvas.width() as f64, canvas.height() as f64),
			canvas: canvas.clone(),
			ctx,
		})
	}

	fn gradient(&self, gradient: &Gradient) -> FxResult<CanvasGradient> {
		let g = match gradient.shape {
			GradientShape::Linear { x0, y0, x1, y1 } => {
				self.ctx.create_linear_gradient(x0, y0, x1, y1)
			}
			GradientShape::Radial {
				x0,
				y0,
				r0,
				x1,
				y1,
				r1,
			} => self
				.ctx
				.create_radial_gradient(x0, y0, r0.max(0.0), x1, y1, r1.max(0.0))
				.map_err(FxError::canvas)?,
		};
		for (offset, color) in &gradient.stops {
			g.add_color_stop(offset.clamp(0.0, 1.0) as f32, &color.to_css())
				.map_err(FxError::canvas)?;
		}
		Ok(g)
	}
}

impl Surface for CanvasSurface {
	type Image = WebImage;

	fn viewport(&self) -> Viewport {
		self.viewport
	}

	fn resize(&mut self, viewport: Viewport) {
		if viewport == self.viewport {
			return;
		}
		self.canvas.set_width(viewport.width.max(0.0) as u32);
		self.canvas.set_height(viewport.height.max(0.0) as u32);
		self.viewport = viewport;
	}

	fn save(&mut self) {
		self.ctx.save();
	}

	fn restore(&mut self) {
		self.ctx.restore();
	}

	fn translate(&mut self, x: f64, y: f64) -> FxResult<()> {
		self.ctx.translate(x, y).map_err(FxError::canvas)
	}

	fn rotate(&mut self, angle: f64) -> FxResult<()> {
		self.ctx.rotate(angle).map_err(FxError::canvas)
	}

	fn scale(&mut self, sx: f64, sy: f64) -> FxResult<()> {
		self.ctx.scale(sx, sy).map_err(FxError::canvas)
	}

	fn set_global_alpha(&mut self, alpha: f64) {
		self.ctx.set_global_alpha(alpha);
	}

	fn set_blend_mode(&mut self, mode: BlendMode) -> FxResult<()> {
		self.ctx
			.set_global_composite_operation(mode.as_css())
			.map_err(FxError::canvas)
	}

	fn set_fill(&mut self, paint: &Paint) -> FxResult<()> {
		match paint {
			Paint::Solid(color) => self.ctx.set_fill_style_str(&color.to_css()),
			Paint::Gradient(gradient) => {
				let g = self.gradient(gradient)?;
				#[allow(deprecated)]
				self.ctx.set_fill_style(&g);
			}
		}
		Ok(())
	}

	fn set_stroke(&mut self, paint: &Paint) -> FxResult<()> {
		match paint {
			Paint::Solid(color) => self.ctx.set_stroke_style_str(&color.to_css()),
			Paint::Gradient(gradient) => {
				let g = self.gradient(gradient)?;
				#[allow(deprecated)]
				self.ctx.set_stroke_style(&g);
			}
		}
		Ok(())
	}

	fn set_line_width(&mut self, width: f64) {
		self.ctx.set_line_width(width);
	}

	fn set_line_cap(&mut self, cap: LineCap) {
		self.ctx.set_line_cap(cap.as_css());
	}

	fn set_line_join(&mut self, join: LineJoin) {
		self.ctx.set_line_join(join.as_css());
	}

	fn set_glow(&mut self, blur: f64, color: Color) {
		if blur > 0.0 {
			self.ctx.set_shadow_blur(blur);
			self.ctx.set_shadow_color(&color.to_css());
		} else {
			self.ctx.set_shadow_blur(0.0);
			self.ctx.set_shadow_color(&Color::TRANSPARENT.to_css());
		}
	}

	fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
		self.ctx.clear_rect(x, y, w, h);
	}

	fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
		self.ctx.fill_rect(x, y, w, h);
	}

	fn begin_path(&mut self) {
		self.ctx.begin_path();
	}

	fn move_to(&mut self, x: f64, y: f64) {
		self.ctx.move_to(x, y);
	}

	fn line_to(&mut self, x: f64, y: f64) {
		self.ctx.line_to(x, y);
	}

	fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) {
		self.ctx.quadratic_curve_to(cpx, cpy, x, y);
	}

	fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64) -> FxResult<()> {
		self.ctx
			.arc(x, y, radius.max(0.0), start, end)
			.map_err(FxError::canvas)
	}

	fn ellipse(
		&mut self,
		x: f64,
		y: f64,
		rx: f64,
		ry: f64,
		rotation: f64,
		start: f64,
		end: f64,
	) -> FxResult<()> {
		self.ctx
			.ellipse(x, y, rx.max(0.0), ry.max(0.0), rotation, start, end)
			.map_err(FxError::canvas)
	}

	fn close_path(&mut self) {
		self.ctx.close_path();
	}

	fn fill(&mut self) {
		self.ctx.fill();
	}

	fn stroke(&mut self) {
		self.ctx.stroke();
	}

	fn clip(&mut self) {
		self.ctx.clip();
	}

	fn draw_image(&mut self, image: &WebImage, x: f64, y: f64, w: f64, h: f64) -> FxResult<()> {
		self.ctx
			.draw_image_with_html_image_element_and_dw_and_dh(&image.element, x, y, w, h)
			.map_err(FxError::canvas)
	}
}

/// An `<img>` loading in the background.
///
/// Reports no dimensions until decoded, and never again once loading failed.
pub struct WebImage {
	element: HtmlImageElement,
	failed: Rc<Cell<bool>>,
	_on_error: Closure<dyn FnMut()>,
}

impl WebImage {
	pub fn load(url: &str) -> FxResult<Self> {
		let element = HtmlImageElement::new().map_err(|e| FxError::Asset(describe(&e)))?;
		let failed = Rc::new(Cell::new(false));

		let (flag, label) = (failed.clone(), url.to_string());
		let on_error = Closure::<dyn FnMut()>::new(move || {
			warn!("skin-canvas: image {} failed to load", label);
			flag.set(true);
		});
		element.set_onerror(Some(on_error.as_ref().unchecked_ref()));
		element.set_src(url);

		Ok(Self {
			element,
			failed,
			_on_error: on_error,
		})
	}
}

impl ImageSource for WebImage {
	fn dimensions(&self) -> Option<(f64, f64)> {
		if self.failed.get() || !self.element.complete() {
			return None;
		}
		let (w, h) = (self.element.natural_width(), self.element.natural_height());
		(w > 0 && h > 0).then_some((w as f64, h as f64))
	}
}
