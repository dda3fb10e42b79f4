//! Error taxonomy for a pipeline run.
//!
//! Processor failures are normally absorbed by the retry executor; only the
//! terminal kinds below reach a run's outcome.

use thiserror::Error;

/// Terminal failure of a pipeline run (or of a standalone collector/hash call).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The run was cancelled through its token. Never retried.
    #[error("pipeline cancelled")]
    Cancelled,

    /// The producer failed to deliver a chunk. Fatal for the run, never retried.
    #[error("chunk source {index} failed: {reason}")]
    ChunkSourceFailed { index: usize, reason: String },

    /// The per-chunk operation kept failing until the configured attempt cap.
    /// With the default (unbounded) policy this never escapes the executor.
    #[error("processor failed on chunk {index} after {attempts} attempt(s): {reason}")]
    ProcessorFailed {
        index: usize,
        attempts: u32,
        reason: String,
    },

    /// A per-chunk task panicked or was aborted by the runtime.
    #[error("chunk task failed: {0}")]
    TaskFailed(String),
}

impl PipelineError {
    /// True for `Cancelled`.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }
}
