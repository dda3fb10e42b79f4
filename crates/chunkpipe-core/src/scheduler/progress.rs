//! Progress reporting for a pipeline run (chunks completed out of total).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Callback invoked with `(completed, total)` after each chunk succeeds.
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Snapshot of run progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressStats {
    /// Chunks whose operation succeeded.
    pub completed: usize,
    /// Chunks in the run.
    pub total: usize,
}

impl ProgressStats {
    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.completed as f64 / self.total as f64).min(1.0)
    }

    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}

#[derive(Debug, Default)]
struct CounterState {
    completed: usize,
    frozen: bool,
}

/// Counts successful chunks for one run. Bounded by `total`; frozen at settlement.
pub(crate) struct ProgressCounter {
    total: usize,
    state: Mutex<CounterState>,
    // Mirror of `state.completed` for lock-free snapshots (callbacks may read it).
    completed: AtomicUsize,
    on_progress: Option<ProgressCallback>,
}

impl ProgressCounter {
    pub(crate) fn new(total: usize, on_progress: Option<ProgressCallback>) -> Self {
        Self {
            total,
            state: Mutex::new(CounterState::default()),
            completed: AtomicUsize::new(0),
            on_progress,
        }
    }

    pub(crate) fn snapshot(&self) -> ProgressStats {
        ProgressStats {
            completed: self.completed.load(Ordering::Acquire),
            total: self.total,
        }
    }

    /// Records one chunk success and reports it. Returns false (and reports
    /// nothing) once the run has settled or the counter is full.
    pub(crate) fn record_success(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        if state.frozen || state.completed >= self.total {
            return false;
        }
        state.completed += 1;
        self.completed.store(state.completed, Ordering::Release);
        // Reported under the lock so callbacks observe strictly increasing counts.
        if let Some(cb) = &self.on_progress {
            cb(state.completed, self.total);
        }
        true
    }

    /// Stops further increments. Called when the run settles.
    pub(crate) fn freeze(&self) {
        self.state.lock().unwrap_or_else(|p| p.into_inner()).frozen = true;
    }
}
