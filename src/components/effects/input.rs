//! Pointer and viewport input.
//!
//! Event handlers never touch simulation state directly. They drop the
//! latest sample into an [`InputMailbox`], a one-slot box per input kind
//! that the frame callback drains once per frame. Intermediate pointer
//! positions between frames are overwritten, not queued.

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Event, EventTarget, HtmlCanvasElement, MouseEvent, TouchEvent};

use super::error::{FxError, FxResult, describe};
use super::surface::Viewport;

/// A pointer position in surface coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerSample {
	pub x: f64,
	pub y: f64,
}

/// Latest-value input slots.
#[derive(Clone, Debug, Default)]
pub struct InputMailbox {
	pointer: Option<PointerSample>,
	press: Option<PointerSample>,
	resize: Option<Viewport>,
}

/// Everything one frame consumes from the mailbox.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputFrame {
	/// Most recent pointer position; persists across frames once known.
	pub pointer: Option<PointerSample>,
	/// Set on the first frame after a press, then cleared.
	pub press: Option<PointerSample>,
	/// Pending viewport size, if it changed since the last frame.
	pub resize: Option<Viewport>,
}

/// Mailbox shared between event handlers and the frame callback.
pub type SharedInput = Rc<RefCell<InputMailbox>>;

impl InputMailbox {
	pub fn pointer_moved(&mut self, x: f64, y: f64) {
		self.pointer = Some(PointerSample { x, y });
	}

	pub fn pointer_down(&mut self, x: f64, y: f64) {
		let sample = PointerSample { x, y };
		self.pointer = Some(sample);
		self.press = Some(sample);
	}

	/// Record a new viewport size. Repeated identical sizes collapse to one.
	pub fn resized(&mut self, viewport: Viewport) {
		self.resize = Some(viewport);
	}

	/// Drain one-shot slots and snapshot the persistent ones.
	pub fn take_frame(&mut self) -> InputFrame {
		InputFrame {
			pointer: self.pointer,
			press: self.press.take(),
			resize: self.resize.take(),
		}
	}
}

type Handler = Closure<dyn FnMut(Event)>;

/// Owns every DOM listener the engine installs so they can be removed together.
#[derive(Default)]
pub struct ListenerRegistry {
	entries: Vec<(EventTarget, &'static str, Handler)>,
}

impl ListenerRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn listen(
		&mut self,
		target: &EventTarget,
		event: &'static str,
		handler: impl FnMut(Event) + 'static,
	) -> FxResult<()> {
		let closure: Handler = Closure::new(handler);
		target
			.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
			.map_err(|e| FxError::Canvas(describe(&e)))?;
		self.entries.push((target.clone(), event, closure));
		Ok(())
	}

	/// Detach and drop every handler.
	pub fn clear(&mut self) {
		for (target, event, closure) in self.entries.drain(..) {
			let _ = target
				.remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
		}
	}
}

impl Drop for ListenerRegistry {
	fn drop(&mut self) {
		self.clear();
	}
}

fn canvas_point(canvas: &HtmlCanvasElement, client_x: f64, client_y: f64) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(client_x - rect.left(), client_y - rect.top())
}

/// Wire window-level pointer and resize events into `input`.
///
/// `measure` reports the viewport to use after a window resize.
pub fn bind_input(
	input: &SharedInput,
	canvas: &HtmlCanvasElement,
	measure: impl Fn() -> Option<Viewport> + 'static,
) -> FxResult<ListenerRegistry> {
	let window = web_sys::window()
		.ok_or_else(|| FxError::SurfaceUnavailable("no window".into()))?;
	let target: &EventTarget = window.as_ref();
	let mut registry = ListenerRegistry::new();

	let (mailbox, el) = (input.clone(), canvas.clone());
	registry.listen(target, "mousemove", move |ev: Event| {
		if let Some(ev) = ev.dyn_ref::<MouseEvent>() {
			let (x, y) = canvas_point(&el, ev.client_x() as f64, ev.client_y() as f64);
			mailbox.borrow_mut().pointer_moved(x, y);
		}
	})?;

	let (mailbox, el) = (input.clone(), canvas.clone());
	registry.listen(target, "touchmove", move |ev: Event| {
		if let Some(touch) = ev
			.dyn_ref::<TouchEvent>()
			.and_then(|t| t.touches().get(0))
		{
			let (x, y) = canvas_point(&el, touch.client_x() as f64, touch.client_y() as f64);
			mailbox.borrow_mut().pointer_moved(x, y);
		}
	})?;

	let (mailbox, el) = (input.clone(), canvas.clone());
	registry.listen(target, "mousedown", move |ev: Event| {
		if let Some(ev) = ev.dyn_ref::<MouseEvent>() {
			let (x, y) = canvas_point(&el, ev.client_x() as f64, ev.client_y() as f64);
			mailbox.borrow_mut().pointer_down(x, y);
		}
	})?;

	let (mailbox, el) = (input.clone(), canvas.clone());
	registry.listen(target, "touchstart", move |ev: Event| {
		if let Some(touch) = ev
			.dyn_ref::<TouchEvent>()
			.and_then(|t| t.touches().get(0))
		{
			let (x, y) = canvas_point(&el, touch.client_x() as f64, touch.client_y() as f64);
			mailbox.borrow_mut().pointer_down(x, y);
		}
	})?;

	let mailbox = input.clone();
	registry.listen(target, "resize", move |_| {
		if let Some(viewport) = measure() {
			debug!(
				"skin-canvas: resize to {}x{}",
				viewport.width, viewport.height
			);
			mailbox.borrow_mut().resized(viewport);
		}
	})?;

	Ok(registry)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn pointer_is_latest_value_only() {
		let mut mb = InputMailbox::default();
		mb.pointer_moved(1.0, 1.0);
		mb.pointer_moved(2.0, 2.0);
		mb.pointer_moved(3.0, 4.0);
		let frame = mb.take_frame();
		assert_eq!(frame.pointer, Some(PointerSample { x: 3.0, y: 4.0 }));
		// Pointer persists; nothing new arrived.
		assert_eq!(mb.take_frame().pointer, Some(PointerSample { x: 3.0, y: 4.0 }));
	}

	#[test]
	fn press_and_resize_are_consumed_once() {
		let mut mb = InputMailbox::default();
		mb.pointer_down(5.0, 6.0);
		mb.resized(Viewport::new(10.0, 10.0));
		mb.resized(Viewport::new(20.0, 10.0));
		let first = mb.take_frame();
		assert_eq!(first.press, Some(PointerSample { x: 5.0, y: 6.0 }));
		assert_eq!(first.pointer, first.press);
		assert_eq!(first.resize, Some(Viewport::new(20.0, 10.0)));
		let second = mb.take_frame();
		assert!(second.press.is_none());
		assert!(second.resize.is_none());
		assert_eq!(second.pointer, Some(PointerSample { x: 5.0, y: 6.0 }));
	}
}
