//! Background production of chunk sources from memory or a file.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinSet;

use crate::checksum::sha256_hex;
use crate::chunk::{chunk_slots, Chunk, ChunkResolver, ChunkSource};

use super::range::{plan_chunks, ByteRange};

/// Splits an in-memory buffer into `chunk_size` chunks hashed on up to
/// `workers` blocking threads. Must be called from within a Tokio runtime.
pub fn split_bytes(data: impl Into<Arc<[u8]>>, chunk_size: u64, workers: usize) -> Vec<ChunkSource> {
    let data: Arc<[u8]> = data.into();
    let ranges = plan_chunks(data.len() as u64, chunk_size);
    spawn_producer(ranges, workers, move |range| {
        Ok(data[range.start as usize..range.end as usize].to_vec())
    })
}

/// Splits the file at `path` into `chunk_size` chunks read and hashed on up
/// to `workers` blocking threads. The file size is taken once, up front; a
/// read failure rejects only the affected chunk. Must be called from within
/// a Tokio runtime.
pub fn split_file(path: &Path, chunk_size: u64, workers: usize) -> Result<Vec<ChunkSource>> {
    let size = std::fs::metadata(path)
        .with_context(|| format!("stat {}", path.display()))?
        .len();
    let ranges = plan_chunks(size, chunk_size);
    tracing::debug!(path = %path.display(), size, chunks = ranges.len(), "splitting file");
    let path: PathBuf = path.to_path_buf();
    Ok(spawn_producer(ranges, workers, move |range| {
        read_range(&path, range)
    }))
}

fn read_range(path: &Path, range: ByteRange) -> std::io::Result<Vec<u8>> {
    let mut f = File::open(path)?;
    f.seek(SeekFrom::Start(range.start))?;
    let mut buf = vec![0u8; range.len() as usize];
    f.read_exact(&mut buf)?;
    Ok(buf)
}

/// Creates one slot per range and settles them from a bounded worker pool.
/// Sources are returned before any chunk is produced.
fn spawn_producer<R>(ranges: Vec<ByteRange>, workers: usize, read: R) -> Vec<ChunkSource>
where
    R: Fn(ByteRange) -> std::io::Result<Vec<u8>> + Send + Sync + 'static,
{
    let (resolvers, sources) = chunk_slots(ranges.len());
    let workers = workers.max(1);
    let read = Arc::new(read);

    tokio::spawn(async move {
        let mut pool = JoinSet::new();
        for (resolver, range) in resolvers.into_iter().zip(ranges) {
            while pool.len() >= workers {
                let _ = pool.join_next().await;
            }
            let read = Arc::clone(&read);
            pool.spawn_blocking(move || produce_one(resolver, range, read.as_ref()));
        }
        while pool.join_next().await.is_some() {}
    });

    sources
}

fn produce_one<R>(resolver: ChunkResolver, range: ByteRange, read: &R)
where
    R: Fn(ByteRange) -> std::io::Result<Vec<u8>>,
{
    let index = resolver.index();
    match read(range) {
        Ok(payload) => {
            let content_hash = sha256_hex(&payload);
            resolver.resolve(Chunk {
                index,
                start: range.start,
                end: range.end,
                content_hash,
                payload,
            });
        }
        Err(e) => {
            tracing::warn!(index, start = range.start, end = range.end, "chunk read failed: {}", e);
            resolver.reject(format!("read {}..{}: {}", range.start, range.end, e));
        }
    }
}
