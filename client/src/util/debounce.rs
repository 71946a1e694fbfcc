//! Trailing-edge debounce.
//!
//! Every [`Debounce::arm`] supersedes the previous one; a scheduled action
//! only runs if its token is still the latest when the wait elapses.

#[cfg(test)]
#[path = "debounce_test.rs"]
mod debounce_test;

use std::cell::Cell;
use std::rc::Rc;

/// Ticket for one armed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceToken(u64);

/// Shared generation counter. Clones observe the same counter.
#[derive(Debug, Clone, Default)]
pub struct Debounce {
    generation: Rc<Cell<u64>>,
}

impl Debounce {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Supersede any pending run and return the ticket for a new one.
    pub fn arm(&self) -> DebounceToken {
        let next = self.generation.get().wrapping_add(1);
        self.generation.set(next);
        DebounceToken(next)
    }

    /// Drop any pending run.
    pub fn cancel(&self) {
        self.arm();
    }

    #[must_use]
    pub fn is_current(&self, token: DebounceToken) -> bool {
        self.generation.get() == token.0
    }

    /// Run `action` once `wait_ms` passes without another `schedule`.
    #[cfg(feature = "hydrate")]
    pub fn schedule(&self, wait_ms: u32, action: impl FnOnce() + 'static) {
        let token = self.arm();
        let this = self.clone();
        wasm_bindgen_futures::spawn_local(async move {
            gloo_timers::future::TimeoutFuture::new(wait_ms).await;
            if this.is_current(token) {
                action();
            }
        });
    }
}
