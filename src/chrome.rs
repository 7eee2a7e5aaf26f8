//! Auto-hiding window chrome. Each edge region (title bar, sidebar) owns a
//! small visibility machine: show cancels the pending hide, leaving the
//! region schedules it again. The mousemove watcher only triggers the show
//! side; hiding is always driven by the region's own delay.

use std::cell::Cell;

use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use web_sys::MouseEvent;

use crate::timer::DelayedTask;

/// Pointer distance from the window edge that reveals a region.
pub const EDGE_THRESHOLD_PX: i32 = 2;
/// Pause between leaving a region and it sliding away.
pub const HIDE_DELAY_MS: i32 = 200;

#[derive(Clone, Copy)]
pub struct EdgeRegion {
    visible: RwSignal<bool>,
    hide: StoredValue<DelayedTask, LocalStorage>,
    hide_after_ms: i32,
}

impl EdgeRegion {
    pub fn new(hide_after_ms: i32) -> Self {
        Self {
            visible: RwSignal::new(false),
            hide: StoredValue::new_local(DelayedTask::new()),
            hide_after_ms,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    pub fn show(&self) {
        self.hide.with_value(|task| task.cancel());
        if !self.visible.get_untracked() {
            self.visible.set(true);
        }
    }

    pub fn schedule_hide(&self) {
        let visible = self.visible;
        self.hide.with_value(|task| {
            task.schedule(self.hide_after_ms, move || visible.set(false));
        });
    }
}

/// Installs the window-level mousemove watcher that reveals the top and
/// left regions when the pointer touches the corresponding edge. Fires only
/// on entering the edge zone; staying there is not repeated work.
pub fn watch_edges(top: EdgeRegion, left: EdgeRegion) {
    let near_top = Cell::new(false);
    let near_left = Cell::new(false);

    let on_mousemove = Closure::<dyn FnMut(MouseEvent)>::new(move |ev: MouseEvent| {
        let at_top = ev.client_y() <= EDGE_THRESHOLD_PX;
        if at_top && !near_top.get() {
            top.show();
        }
        near_top.set(at_top);

        let at_left = ev.client_x() <= EDGE_THRESHOLD_PX;
        if at_left && !near_left.get() {
            left.show();
        }
        near_left.set(at_left);
    });

    if let Err(err) = window()
        .add_event_listener_with_callback("mousemove", on_mousemove.as_ref().unchecked_ref())
    {
        leptos::logging::warn!("edge watcher not installed: {err:?}");
    }
    on_mousemove.forget();
}
