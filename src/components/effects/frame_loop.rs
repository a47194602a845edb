//! `requestAnimationFrame` scheduling with deterministic cancellation.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use log::{info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::Window;

use super::error::{FxError, FxResult, describe};

struct LoopState {
	window: Window,
	running: Cell<bool>,
	pending: Cell<Option<i32>>,
	callback: RefCell<Option<Closure<dyn FnMut(f64)>>>,
}

impl LoopState {
	fn schedule(&self) {
		let callback = self.callback.borrow();
		let Some(cb) = callback.as_ref() else {
			return;
		};
		match self.window.request_animation_frame(cb.as_ref().unchecked_ref()) {
			Ok(handle) => self.pending.set(Some(handle)),
			Err(e) => {
				warn!("skin-canvas: could not schedule frame: {}", describe(&e));
				self.running.set(false);
			}
		}
	}
}

/// A per-frame callback driven by the browser's refresh.
///
/// The callback receives the host timestamp in milliseconds. After
/// [`stop`](Self::stop) returns no further callback runs: the pending request is
/// cancelled and a callback already queued returns without doing anything.
/// Dropping the loop stops it.
pub struct AnimationLoop {
	state: Rc<LoopState>,
}

impl AnimationLoop {
	pub fn new(mut on_frame: impl FnMut(f64) + 'static) -> FxResult<Self> {
		let window = web_sys::window()
			.ok_or_else(|| FxError::SurfaceUnavailable("no window".into()))?;
		let state = Rc::new(LoopState {
			window,
			running: Cell::new(false),
			pending: Cell::new(None),
			callback: RefCell::new(None),
		});

		// Weak so the closure stored inside the state does not keep it alive.
		let weak: Weak<LoopState> = Rc::downgrade(&state);
		let closure = Closure::<dyn FnMut(f64)>::new(move |now: f64| {
			let Some(state) = weak.upgrade() else {
				return;
			};
			state.pending.set(None);
			if !state.running.get() {
				return;
			}
			on_frame(now);
			if state.running.get() {
				state.schedule();
			}
		});
		*state.callback.borrow_mut() = Some(closure);

		Ok(Self { state })
	}

	pub fn start(&self) {
		if self.state.running.replace(true) {
			return;
		}
		info!("skin-canvas: animation loop started");
		self.state.schedule();
	}

	pub fn stop(&self) {
		if !self.state.running.replace(false) {
			return;
		}
		if let Some(handle) = self.state.pending.take() {
			let _ = self.state.window.cancel_animation_frame(handle);
		}
		info!("skin-canvas: animation loop stopped");
	}
}

impl Drop for AnimationLoop {
	fn drop(&mut self) {
		self.stop();
	}
}
