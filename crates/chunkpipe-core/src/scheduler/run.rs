//! `process_chunks` and the `PipelineRun` lifecycle handle.

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::chunk::{Chunk, ChunkSource};
use crate::control::RunControl;
use crate::error::PipelineError;
use crate::token::PipelineToken;

use super::guard::SettleGuard;
use super::options::PipelineOptions;
use super::parallel::{admit_all, InFlight};
use super::progress::{ProgressCounter, ProgressStats};

/// Handle to a running pipeline: lifecycle control plus the eventual outcome.
#[derive(Debug)]
pub struct PipelineRun {
    control: RunControl,
    driver: JoinHandle<Result<(), PipelineError>>,
}

impl PipelineRun {
    /// Clone-able control handle (e.g. for a control socket or signal handler).
    pub fn control(&self) -> RunControl {
        self.control.clone()
    }

    pub fn pause(&self) {
        self.control.pause();
    }

    pub fn resume(&self) {
        self.control.resume();
    }

    pub fn cancel(&self) {
        self.control.cancel();
    }

    pub fn progress(&self) -> ProgressStats {
        self.control.progress()
    }

    /// Waits for the run to settle: `Ok(())` once every chunk succeeded,
    /// `Cancelled` after an explicit cancel, or the triggering error.
    pub async fn outcome(self) -> Result<(), PipelineError> {
        match self.driver.await {
            Ok(result) => result,
            Err(e) => Err(PipelineError::TaskFailed(e.to_string())),
        }
    }
}

/// Starts processing `sources` with `processor`, at most
/// `options.concurrency` chunks at a time. Must be called from within a
/// Tokio runtime; the run proceeds in the background and is observed through
/// the returned handle.
///
/// `processor` receives the chunk and the run's token. Errors it returns are
/// retried with backoff until success or cancellation; it should watch
/// `token.interrupt_handle()` to stop promptly on pause/cancel.
pub fn process_chunks<F, Fut>(
    sources: Vec<ChunkSource>,
    processor: F,
    options: PipelineOptions,
) -> PipelineRun
where
    F: Fn(Arc<Chunk>, PipelineToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    let token = PipelineToken::new();
    let progress = Arc::new(ProgressCounter::new(
        sources.len(),
        options.on_progress.clone(),
    ));
    let control = RunControl::new(token.clone(), Arc::clone(&progress));

    let guard = SettleGuard {
        token: token.clone(),
        progress: Arc::clone(&progress),
        control: control.clone(),
    };
    let driver = tokio::spawn(drive(
        sources,
        Arc::new(processor),
        options,
        token,
        progress,
        guard,
    ));

    PipelineRun { control, driver }
}

async fn drive<F, Fut>(
    sources: Vec<ChunkSource>,
    processor: Arc<F>,
    options: PipelineOptions,
    token: PipelineToken,
    progress: Arc<ProgressCounter>,
    guard: SettleGuard,
) -> Result<(), PipelineError>
where
    F: Fn(Arc<Chunk>, PipelineToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    let total = sources.len();
    let concurrency = options.effective_concurrency();
    tracing::info!(total, concurrency, "pipeline run started");

    let mut in_flight = InFlight::new();
    let result = admit_all(
        &mut in_flight,
        sources,
        processor,
        options.retry,
        concurrency,
        &token,
        &progress,
    )
    .await;

    drop(guard);
    // Leftover tasks are not force-terminated; they wind down on their own
    // once they observe the token.
    let leftover = in_flight.len();
    in_flight.detach_all();

    let stats = progress.snapshot();
    match &result {
        Ok(()) => tracing::info!(completed = stats.completed, total, "pipeline run completed"),
        Err(e) => tracing::warn!(
            completed = stats.completed,
            total,
            leftover,
            "pipeline run failed: {}",
            e
        ),
    }
    result
}
