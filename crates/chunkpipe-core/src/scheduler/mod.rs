//! Bounded-concurrency chunk scheduler.
//!
//! Drains an ordered list of chunk sources, runs each chunk's operation
//! through the retry executor and keeps at most `concurrency` chunk tasks in
//! flight. Admission follows source order; completions (and progress events)
//! interleave freely.

mod guard;
mod options;
mod parallel;
mod progress;
mod run;
mod task;

pub use options::PipelineOptions;
pub(crate) use progress::ProgressCounter;
pub use progress::{ProgressCallback, ProgressStats};
pub use run::{process_chunks, PipelineRun};
