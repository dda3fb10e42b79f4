//! Reference producer: splits a resource into fixed-size chunks.
//!
//! Slots are created up front; a background task reads and hashes ranges on
//! a bounded pool of blocking workers and settles each slot exactly once.
//! Callers get the sources back immediately and can hand them to the
//! scheduler, the collector and the hash aggregator at the same time.

mod produce;
mod range;

pub use produce::{split_bytes, split_file};
pub use range::{plan_chunks, ByteRange};

/// Default chunk size (4 MiB).
pub const DEFAULT_CHUNK_SIZE: u64 = 4 * 1024 * 1024;

/// Worker count when the caller does not choose one.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
