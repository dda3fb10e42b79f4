//! Chunkpipe core: split a large resource into chunks and run a
//! bounded-concurrency, retrying, pausable pipeline of per-chunk operations.
//!
//! ```no_run
//! # async fn demo() -> Result<(), chunkpipe_core::PipelineError> {
//! use chunkpipe_core::{process_chunks, splitter, PipelineOptions};
//!
//! let sources = splitter::split_bytes(vec![0u8; 10_000], 4096, 2);
//! let run = process_chunks(
//!     sources.clone(),
//!     |chunk, _token| async move {
//!         println!("chunk {} -> {}", chunk.index, chunk.content_hash);
//!         Ok(())
//!     },
//!     PipelineOptions::default().with_concurrency(2),
//! );
//! run.outcome().await?;
//! let digest = chunkpipe_core::calculate_file_hash(&sources).await?;
//! # let _ = digest;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod logging;

pub mod aggregate;
pub mod checksum;
pub mod chunk;
pub mod control;
pub mod error;
pub mod retry;
pub mod scheduler;
pub mod splitter;
pub mod token;

pub use aggregate::{calculate_content_hash, calculate_file_hash, collect_chunks};
pub use chunk::{chunk_slots, Chunk, ChunkResolver, ChunkSource};
pub use control::{ControlCommand, RunControl};
pub use error::PipelineError;
pub use retry::{execute_with_retry, RetryPolicy};
pub use scheduler::{process_chunks, PipelineOptions, PipelineRun, ProgressStats};
pub use token::PipelineToken;
