//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod recorder;

use chunkpipe_core::{Chunk, ChunkSource};

/// Chunk `index` of a resource split into 4-byte chunks, with hash `h{index}`.
pub fn chunk(index: usize) -> Chunk {
    Chunk {
        index,
        start: index as u64 * 4,
        end: index as u64 * 4 + 4,
        content_hash: format!("h{index}"),
        payload: vec![index as u8; 4],
    }
}

/// `n` already-resolved sources.
pub fn ready_sources(n: usize) -> Vec<ChunkSource> {
    (0..n).map(|i| ChunkSource::ready(chunk(i))).collect()
}
