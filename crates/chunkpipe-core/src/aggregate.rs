//! Order-preserving consumers of a chunk source list.
//!
//! Both functions await every source concurrently and fail fast on the first
//! producer failure, but always hand results back in source-index order.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::task::JoinSet;

use crate::chunk::{Chunk, ChunkSource};
use crate::error::PipelineError;

/// Awaits every source and returns the chunks in source order, regardless of
/// the order they resolve in.
pub async fn collect_chunks(sources: &[ChunkSource]) -> Result<Vec<Arc<Chunk>>, PipelineError> {
    let mut pending = JoinSet::new();
    for (pos, source) in sources.iter().enumerate() {
        let source = source.clone();
        pending.spawn(async move { (pos, source.resolve().await) });
    }

    let mut slots: Vec<Option<Arc<Chunk>>> = vec![None; sources.len()];
    while let Some(joined) = pending.join_next().await {
        let (pos, resolved) = joined.map_err(|e| PipelineError::TaskFailed(e.to_string()))?;
        // Dropping `pending` on return aborts the remaining waiters.
        slots[pos] = Some(resolved?);
    }

    Ok(slots.into_iter().flatten().collect())
}

/// Whole-resource digest: SHA-256 over the per-chunk hashes in index order,
/// as lowercase hex. Per-chunk hashes are trusted, not recomputed.
pub async fn calculate_file_hash(sources: &[ChunkSource]) -> Result<String, PipelineError> {
    let chunks = collect_chunks(sources).await?;
    let digest = combine_chunk_hashes(chunks.iter().map(|c| c.content_hash.as_str()));
    tracing::debug!(chunks = chunks.len(), %digest, "computed whole-resource hash");
    Ok(digest)
}

/// Plain SHA-256 of the resource, rebuilt by streaming chunk payloads in
/// index order. Matches a one-pass digest of the original bytes.
pub async fn calculate_content_hash(sources: &[ChunkSource]) -> Result<String, PipelineError> {
    let chunks = collect_chunks(sources).await?;
    let mut hasher = Sha256::new();
    for chunk in &chunks {
        hasher.update(&chunk.payload);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Folds already-ordered per-chunk hashes into one digest.
pub fn combine_chunk_hashes<'a>(hashes: impl IntoIterator<Item = &'a str>) -> String {
    let mut hasher = Sha256::new();
    for h in hashes {
        hasher.update(h.as_bytes());
    }
    hex::encode(hasher.finalize())
}
