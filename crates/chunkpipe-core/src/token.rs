//! Pause/cancel token shared by the scheduler, the retry executor and processors.
//!
//! The token carries two independent facets (`paused`, `cancelled`) plus an
//! interruption handle. Pause and cancel fire the current handle; resume mints
//! a fresh one, so work that was interrupted stays interrupted while work
//! started after the resume sees an un-fired handle.
//!
//! Pending delays are force-resolved by bumping a wake epoch: every `delay`
//! races its timer against the epoch changing, so pause/cancel never leave a
//! sleeper behind.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TokenState {
    paused: bool,
    cancelled: bool,
    /// Bumped whenever pending delays must resolve early.
    wake_epoch: u64,
    /// Bumped on every resume; identifies the active interruption handle.
    generation: u64,
}

#[derive(Debug)]
struct TokenInner {
    state: watch::Sender<TokenState>,
    interrupt: Mutex<CancellationToken>,
}

/// Re-armable pause/cancel token. Clones share the same state.
#[derive(Debug, Clone)]
pub struct PipelineToken {
    inner: Arc<TokenInner>,
}

impl Default for PipelineToken {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineToken {
    pub fn new() -> Self {
        let (state, _) = watch::channel(TokenState::default());
        Self {
            inner: Arc::new(TokenInner {
                state,
                interrupt: Mutex::new(CancellationToken::new()),
            }),
        }
    }

    fn interrupt(&self) -> MutexGuard<'_, CancellationToken> {
        // A poisoned lock still holds a valid token; keep using it.
        self.inner
            .interrupt
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.state.borrow().cancelled
    }

    pub fn is_paused(&self) -> bool {
        self.inner.state.borrow().paused
    }

    /// Number of resumes so far; changes exactly when a new interruption handle is minted.
    pub fn generation(&self) -> u64 {
        self.inner.state.borrow().generation
    }

    /// The currently active interruption handle. Interruption-aware work should
    /// grab this when it starts and stop when it fires.
    pub fn interrupt_handle(&self) -> CancellationToken {
        self.interrupt().clone()
    }

    /// Cancels: fires the active handle, resolves pending delays and releases
    /// anyone waiting for a resume. Idempotent.
    pub fn request_cancel(&self) {
        let interrupt = self.interrupt();
        let mut newly = false;
        self.inner.state.send_modify(|s| {
            if !s.cancelled {
                s.cancelled = true;
                s.wake_epoch += 1;
                newly = true;
            }
        });
        if newly {
            interrupt.cancel();
            tracing::debug!("token cancelled");
        }
    }

    /// Pauses: fires the active handle and resolves pending delays early.
    /// No-op when already paused.
    pub fn request_pause(&self) {
        let interrupt = self.interrupt();
        let mut newly = false;
        self.inner.state.send_modify(|s| {
            if !s.paused {
                s.paused = true;
                s.wake_epoch += 1;
                newly = true;
            }
        });
        if newly {
            interrupt.cancel();
            tracing::debug!("token paused");
        }
    }

    /// Resumes: mints a new interruption handle and releases pause waiters.
    /// No-op when not paused.
    pub fn request_resume(&self) {
        let mut interrupt = self.interrupt();
        if !self.is_paused() {
            return;
        }
        let fresh = CancellationToken::new();
        if self.is_cancelled() {
            fresh.cancel();
        }
        *interrupt = fresh;
        self.inner.state.send_modify(|s| {
            s.paused = false;
            s.generation += 1;
        });
        drop(interrupt);
        tracing::debug!(generation = self.generation(), "token resumed");
    }

    /// Fails with `Cancelled` once cancellation was requested.
    pub fn check_cancelled(&self) -> Result<(), PipelineError> {
        if self.is_cancelled() {
            Err(PipelineError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Suspends until resumed (or cancelled). Returns at once when not paused.
    pub async fn wait_while_paused(&self) {
        let mut rx = self.inner.state.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here.
        let _ = rx.wait_for(|s| !s.paused || s.cancelled).await;
    }

    /// Completes once cancellation was requested.
    pub async fn cancelled(&self) {
        let mut rx = self.inner.state.subscribe();
        let _ = rx.wait_for(|s| s.cancelled).await;
    }

    /// Sleeps for `duration`, resolving early if pause, cancel or
    /// `clear_residuals` force pending delays. Returns at once when cancelled.
    pub async fn delay(&self, duration: Duration) {
        if duration.is_zero() || self.is_cancelled() {
            return;
        }
        let mut rx = self.inner.state.subscribe();
        let epoch = rx.borrow_and_update().wake_epoch;
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = rx.wait_for(|s| s.wake_epoch != epoch) => {}
        }
    }

    /// Force-resolves every pending delay. Called when a run settles.
    pub fn clear_residuals(&self) {
        self.inner.state.send_modify(|s| s.wake_epoch += 1);
    }
}
