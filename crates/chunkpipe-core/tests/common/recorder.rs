//! Records what a test processor saw: attempts, successes, progress events.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One processor invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub index: usize,
    /// Whether the interruption handle was already fired when the attempt began.
    pub handle_fired_at_start: bool,
    pub generation: u64,
}

#[derive(Debug, Default)]
pub struct Recorder {
    attempts: Mutex<Vec<Attempt>>,
    successes: Mutex<Vec<usize>>,
    progress: Mutex<Vec<(usize, usize)>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Logs an attempt and returns how many attempts `index` has had so far (including this one).
    pub fn attempt(&self, index: usize, handle_fired_at_start: bool, generation: u64) -> usize {
        let mut attempts = self.attempts.lock().unwrap();
        attempts.push(Attempt {
            index,
            handle_fired_at_start,
            generation,
        });
        attempts.iter().filter(|a| a.index == index).count()
    }

    pub fn attempts(&self) -> Vec<Attempt> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn attempts_for(&self, index: usize) -> Vec<Attempt> {
        self.attempts()
            .into_iter()
            .filter(|a| a.index == index)
            .collect()
    }

    pub fn success(&self, index: usize) {
        self.successes.lock().unwrap().push(index);
    }

    pub fn successes(&self) -> Vec<usize> {
        self.successes.lock().unwrap().clone()
    }

    pub fn progress_event(&self, completed: usize, total: usize) {
        self.progress.lock().unwrap().push((completed, total));
    }

    pub fn progress_events(&self) -> Vec<(usize, usize)> {
        self.progress.lock().unwrap().clone()
    }

    /// Marks an operation as running; pair with `leave`.
    pub fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
    }

    pub fn leave(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}
