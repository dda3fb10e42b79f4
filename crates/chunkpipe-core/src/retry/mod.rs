//! Retry and backoff.
//!
//! A failed per-chunk operation is retried with a linearly growing, capped
//! delay until it succeeds or the run is cancelled. Waits go through the
//! pipeline token so pause and cancel cut them short.

mod policy;
mod run;

pub use policy::RetryPolicy;
pub use run::execute_with_retry;
