//! Admission loop: keep at most `concurrency` chunk tasks in flight.
//!
//! Sources are awaited and admitted in order, so the operation starts on
//! chunks in submission order and a failed source stops admission. Once the
//! set is full, the loop waits for whichever task finishes first before
//! admitting the next one. Every wait also races the token so a cancel
//! settles the run without waiting for in-flight work.

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::Instrument;

use crate::chunk::{Chunk, ChunkSource};
use crate::error::PipelineError;
use crate::retry::RetryPolicy;
use crate::token::PipelineToken;

use super::progress::ProgressCounter;
use super::task::run_chunk;

pub(super) type InFlight = JoinSet<Result<(), PipelineError>>;

/// Submits every source and waits for all admitted tasks. Returns the first
/// unrecovered failure; remaining tasks are left in `in_flight` for the caller.
pub(super) async fn admit_all<F, Fut>(
    in_flight: &mut InFlight,
    sources: Vec<ChunkSource>,
    processor: Arc<F>,
    policy: RetryPolicy,
    concurrency: usize,
    token: &PipelineToken,
    progress: &Arc<ProgressCounter>,
) -> Result<(), PipelineError>
where
    F: Fn(Arc<Chunk>, PipelineToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    for source in sources {
        token.check_cancelled()?;
        let chunk = await_source(in_flight, &source, token).await?;
        tracing::debug!(index = chunk.index, bytes = chunk.len(), "chunk admitted");
        let span = tracing::debug_span!("chunk", index = chunk.index);
        let task = run_chunk(
            chunk,
            Arc::clone(&processor),
            policy,
            token.clone(),
            Arc::clone(progress),
        );
        in_flight.spawn(task.instrument(span));

        while in_flight.len() >= concurrency {
            wait_for_one(in_flight, token).await?;
        }
    }

    while !in_flight.is_empty() {
        wait_for_one(in_flight, token).await?;
    }
    Ok(())
}

/// Waits for `source` to settle. In-flight tasks that finish meanwhile are
/// reaped so their failures end the run without waiting on a slow producer.
async fn await_source(
    in_flight: &mut InFlight,
    source: &ChunkSource,
    token: &PipelineToken,
) -> Result<Arc<Chunk>, PipelineError> {
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => return Err(PipelineError::Cancelled),
            resolved = source.resolve() => return resolved,
            joined = in_flight.join_next(), if !in_flight.is_empty() => match joined {
                None | Some(Ok(Ok(()))) => {}
                Some(Ok(Err(e))) => return Err(e),
                Some(Err(e)) => return Err(PipelineError::TaskFailed(e.to_string())),
            },
        }
    }
}

/// Waits for the first in-flight task to finish, or for cancellation.
async fn wait_for_one(in_flight: &mut InFlight, token: &PipelineToken) -> Result<(), PipelineError> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(PipelineError::Cancelled),
        joined = in_flight.join_next() => match joined {
            None => Ok(()),
            Some(Ok(result)) => result,
            Some(Err(e)) => Err(PipelineError::TaskFailed(e.to_string())),
        },
    }
}
