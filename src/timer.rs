use std::cell::{Cell, RefCell};

use leptos::prelude::window;
use wasm_bindgen::prelude::*;

/// A cancellable one-shot timer over `window.setTimeout`.
///
/// Scheduling again before the timer fires replaces the pending callback, so
/// each task owns at most one timeout at a time.
#[derive(Default)]
pub struct DelayedTask {
    handle: Cell<Option<i32>>,
    // Held so the browser can still call into it; dropped on cancel/reschedule.
    callback: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl DelayedTask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&self, delay_ms: i32, task: impl FnOnce() + 'static) {
        self.cancel();
        let callback = Closure::once(task);
        match window()
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                delay_ms,
            ) {
            Ok(id) => {
                self.handle.set(Some(id));
                self.callback.replace(Some(callback));
            }
            Err(err) => leptos::logging::warn!("setTimeout failed: {err:?}"),
        }
    }

    pub fn cancel(&self) {
        if let Some(id) = self.handle.take() {
            window().clear_timeout_with_handle(id);
        }
        self.callback.replace(None);
    }
}
