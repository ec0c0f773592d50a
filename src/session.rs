//! Pointer-event wiring between a navigation list, the prefetch coordinator
//! and the hover preview controller.
//!
//! Entering an item warms its full resource (debounced) and starts loading
//! its preview. Leaving cancels a prefetch that has not started yet and hides
//! the preview. `pump()` is called from the host event loop to fire due
//! timers and apply finished loads.

use std::time::Instant;

use log::debug;

use crate::catalog::PatternId;
use crate::clock::Clock;
use crate::loader::{Executor, LoadOutcome};
use crate::placement::Size;
use crate::prefetch::PrefetchCoordinator;
use crate::preview::{HoverPreviewController, Visibility};

pub struct HoverSession<C, E> {
    prefetch: PrefetchCoordinator<C>,
    preview: HoverPreviewController,
    executor: E,
}

impl<C: Clock, E: Executor> HoverSession<C, E> {
    pub fn new(prefetch: PrefetchCoordinator<C>, preview: HoverPreviewController, executor: E) -> Self {
        Self {
            prefetch,
            preview,
            executor,
        }
    }

    /// Pointer entered the item `id` at `(x, y)`.
    pub fn pointer_enter(&mut self, id: &PatternId, x: i32, y: i32) {
        if let Some(prev) = self.preview.hovered().cloned()
            && &prev != id
        {
            self.pointer_leave();
        }
        self.preview.on_pointer_move(x, y);
        self.prefetch.request_prefetch(id);
        if let Some(req) = self.preview.on_hover_start(id) {
            self.executor.submit(req);
        }
    }

    /// Pointer left whatever item it was over.
    pub fn pointer_leave(&mut self) {
        if let Some(id) = self.preview.hovered().cloned() {
            self.prefetch.cancel_prefetch(&id);
        }
        self.preview.on_hover_end();
    }

    pub fn pointer_move(&mut self, x: i32, y: i32) {
        self.preview.on_pointer_move(x, y);
    }

    pub fn resize(&mut self, width: i32, height: i32) {
        self.preview.set_viewport(Size::new(width, height));
    }

    /// Fire due prefetch timers and apply finished loads.
    ///
    /// Returns true when the preview panel changed and needs repainting.
    pub fn pump(&mut self) -> bool {
        for req in self.prefetch.poll() {
            self.executor.submit(req);
        }

        let mut changed = false;
        for outcome in self.executor.drain() {
            match outcome {
                LoadOutcome::Full { id, result } => self.prefetch.complete(&id, result),
                LoadOutcome::Preview { id, generation, result } => {
                    changed |= self.preview.apply_preview(&id, generation, result);
                }
            }
        }
        if changed {
            debug!("session: preview changed ({:?})", self.preview.visibility());
        }
        changed
    }

    /// Deadline of the next debounce timer, if any.
    pub fn next_wakeup(&self) -> Option<Instant> {
        self.prefetch.next_deadline()
    }

    /// True while some load this session started has not come back yet.
    pub fn is_loading(&self) -> bool {
        self.preview.visibility() == Visibility::Loading || self.prefetch.in_flight() > 0
    }

    pub fn prefetch(&self) -> &PrefetchCoordinator<C> {
        &self.prefetch
    }

    pub fn preview(&self) -> &HoverPreviewController {
        &self.preview
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }
}
