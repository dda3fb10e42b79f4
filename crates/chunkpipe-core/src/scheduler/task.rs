//! One chunk's task: run the operation on a resolved chunk with retry, count it.

use std::future::Future;
use std::sync::Arc;

use crate::chunk::Chunk;
use crate::error::PipelineError;
use crate::retry::{execute_with_retry, RetryPolicy};
use crate::token::PipelineToken;

use super::progress::ProgressCounter;

/// Retries `processor` on `chunk` until success or cancel. A success observed
/// after cancellation is not counted.
pub(super) async fn run_chunk<F, Fut>(
    chunk: Arc<Chunk>,
    processor: Arc<F>,
    policy: RetryPolicy,
    token: PipelineToken,
    progress: Arc<ProgressCounter>,
) -> Result<(), PipelineError>
where
    F: Fn(Arc<Chunk>, PipelineToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    let index = chunk.index;

    execute_with_retry(index, &policy, &token, || {
        (*processor)(Arc::clone(&chunk), token.clone())
    })
    .await?;

    token.check_cancelled()?;
    if progress.record_success() {
        tracing::debug!(index, "chunk completed");
    }
    Ok(())
}
