//! Chunk records and the write-once slots a producer fills them through.
//!
//! `chunk_slots(n)` creates every slot up front, indexed by position. The
//! producer owns the `ChunkResolver` half and settles each index exactly once;
//! any number of consumers (scheduler, collector, hash aggregator) can await
//! the same `ChunkSource` without triggering duplicate production.

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::PipelineError;

/// One contiguous byte range of the source resource plus its precomputed hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position of this chunk in the resource (0-based).
    pub index: usize,
    /// Start offset (inclusive).
    pub start: u64,
    /// End offset (exclusive).
    pub end: u64,
    /// Lowercase hex digest of `payload`, computed by the producer.
    pub content_hash: String,
    /// Raw bytes of the range.
    pub payload: Vec<u8>,
}

impl Chunk {
    /// Length of the byte range.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

type SlotValue = Option<Result<Arc<Chunk>, String>>;

/// Awaitable handle to one chunk. Cheap to clone; all clones observe the same value.
#[derive(Debug, Clone)]
pub struct ChunkSource {
    index: usize,
    rx: watch::Receiver<SlotValue>,
}

/// Write-once producer side of a slot. Consumed by `resolve` or `reject`.
#[derive(Debug)]
pub struct ChunkResolver {
    index: usize,
    tx: watch::Sender<SlotValue>,
}

/// Creates `count` empty slots. Index `i` of both vectors refers to the same chunk.
pub fn chunk_slots(count: usize) -> (Vec<ChunkResolver>, Vec<ChunkSource>) {
    let mut resolvers = Vec::with_capacity(count);
    let mut sources = Vec::with_capacity(count);
    for index in 0..count {
        let (tx, rx) = watch::channel(None);
        resolvers.push(ChunkResolver { index, tx });
        sources.push(ChunkSource { index, rx });
    }
    (resolvers, sources)
}

impl ChunkSource {
    /// A source that is already resolved with `chunk`.
    pub fn ready(chunk: Chunk) -> Self {
        let index = chunk.index;
        let (_tx, rx) = watch::channel(Some(Ok(Arc::new(chunk))));
        Self { index, rx }
    }

    /// A source that is already failed.
    pub fn failed(index: usize, reason: impl Into<String>) -> Self {
        let (_tx, rx) = watch::channel(Some(Err(reason.into())));
        Self { index, rx }
    }

    /// Slot position this source was created for.
    pub fn index(&self) -> usize {
        self.index
    }

    /// True once the producer has settled this slot (either way).
    pub fn is_settled(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Waits until the producer settles the slot. A resolver dropped without
    /// writing counts as a producer failure.
    pub async fn resolve(&self) -> Result<Arc<Chunk>, PipelineError> {
        let mut rx = self.rx.clone();
        let settled = match rx.wait_for(Option::is_some).await {
            Ok(value) => (*value).clone(),
            Err(_) => None,
        };
        match settled {
            Some(Ok(chunk)) => Ok(chunk),
            Some(Err(reason)) => Err(PipelineError::ChunkSourceFailed {
                index: self.index,
                reason,
            }),
            None => Err(PipelineError::ChunkSourceFailed {
                index: self.index,
                reason: "producer dropped the chunk before resolving it".to_string(),
            }),
        }
    }
}

impl ChunkResolver {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Publishes the chunk for this slot.
    pub fn resolve(self, chunk: Chunk) {
        debug_assert_eq!(chunk.index, self.index);
        self.tx.send_replace(Some(Ok(Arc::new(chunk))));
    }

    /// Marks this slot as failed; every consumer sees `ChunkSourceFailed`.
    pub fn reject(self, reason: impl Into<String>) {
        self.tx.send_replace(Some(Err(reason.into())));
    }
}
