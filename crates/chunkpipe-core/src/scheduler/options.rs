//! Options for one pipeline run.

use std::sync::Arc;

use crate::config::ChunkpipeConfig;
use crate::retry::RetryPolicy;

use super::progress::ProgressCallback;

/// Default number of chunk operations in flight.
pub const DEFAULT_CONCURRENCY: usize = 6;

/// Tuning for `process_chunks`.
#[derive(Clone)]
pub struct PipelineOptions {
    /// Maximum simultaneous chunk operations (values below 1 are treated as 1).
    pub concurrency: usize,
    /// Backoff between failed attempts of one chunk.
    pub retry: RetryPolicy,
    /// Called with `(completed, total)` after each chunk succeeds.
    pub on_progress: Option<ProgressCallback>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            retry: RetryPolicy::default(),
            on_progress: None,
        }
    }
}

impl std::fmt::Debug for PipelineOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineOptions")
            .field("concurrency", &self.concurrency)
            .field("retry", &self.retry)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

impl PipelineOptions {
    /// Options taken from the loaded config (no progress callback).
    pub fn from_config(cfg: &ChunkpipeConfig) -> Self {
        Self {
            concurrency: cfg.concurrency,
            retry: cfg.retry_policy(),
            on_progress: None,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(f));
        self
    }

    /// Effective concurrency (at least 1).
    pub(crate) fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}
