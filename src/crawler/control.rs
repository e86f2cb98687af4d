//! Cooperative crawl control
//!
//! `CrawlControl` is the only piece of a crawl shared across threads. Operators
//! flip its flags from anywhere; the traversal reads them at its check points
//! (before each page, and inside the image and link loops). An in-flight request
//! is never interrupted.

use crate::state::CrawlState;
use crate::GleanError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Default)]
struct ControlInner {
    stopped: AtomicBool,
    paused: AtomicBool,
    state: Mutex<CrawlState>,
}

/// Cloneable handle to a crawl's pause/stop flags and lifecycle state
#[derive(Debug, Clone, Default)]
pub struct CrawlControl {
    inner: Arc<ControlInner>,
}

impl CrawlControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a pause; takes effect at the traversal's next check point
    pub fn pause(&self) {
        self.inner.paused.store(true, Ordering::SeqCst);
        let mut state = self.lock_state();
        if state.can_transition_to(CrawlState::Paused) {
            *state = CrawlState::Paused;
        }
    }

    /// Clears a pause request
    pub fn resume(&self) {
        self.inner.paused.store(false, Ordering::SeqCst);
        let mut state = self.lock_state();
        if *state == CrawlState::Paused {
            *state = CrawlState::Running;
        }
    }

    /// Requests a stop; the traversal winds down at its next check point
    pub fn stop(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.inner.paused.load(Ordering::SeqCst)
    }

    /// Current lifecycle state
    pub fn state(&self) -> CrawlState {
        *self.lock_state()
    }

    /// Clears both flags and puts the state back to `Running` for a fresh traversal
    pub(crate) fn begin(&self) {
        self.inner.stopped.store(false, Ordering::SeqCst);
        self.inner.paused.store(false, Ordering::SeqCst);
        *self.lock_state() = CrawlState::Running;
    }

    /// Moves to `next`, rejecting illegal transitions
    pub(crate) fn transition(&self, next: CrawlState) -> Result<(), GleanError> {
        let mut state = self.lock_state();
        if !state.can_transition_to(next) {
            return Err(GleanError::InvalidTransition {
                from: *state,
                to: next,
            });
        }
        *state = next;
        Ok(())
    }

    /// Parks the caller while paused, sleeping `poll` between checks
    ///
    /// Returns true if the crawl should keep going, false if it was stopped.
    pub(crate) async fn wait_while_paused(&self, poll: Duration) -> bool {
        while self.is_paused() {
            if self.is_stopped() {
                return false;
            }
            tokio::time::sleep(poll).await;
        }
        !self.is_stopped()
    }

    fn lock_state(&self) -> MutexGuard<'_, CrawlState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
