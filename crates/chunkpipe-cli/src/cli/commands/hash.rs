//! `chunkpipe hash` – chunked whole-file hash (optionally with the plain SHA-256).

use anyhow::Result;
use chunkpipe_core::config::ChunkpipeConfig;
use chunkpipe_core::{calculate_content_hash, calculate_file_hash, splitter};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct HashArgs {
    pub path: PathBuf,
    pub chunk_size: Option<u64>,
    pub sha256: bool,
}

/// Splits the file, prints the whole-file digest built from per-chunk hashes.
pub async fn run_hash(cfg: &ChunkpipeConfig, args: HashArgs) -> Result<()> {
    let chunk_size = args.chunk_size.unwrap_or(cfg.chunk_size_bytes);
    anyhow::ensure!(chunk_size > 0, "chunk size must be positive");

    let sources = splitter::split_file(&args.path, chunk_size, cfg.producer_workers())?;
    tracing::debug!(chunks = sources.len(), "hashing {}", args.path.display());
    let digest = calculate_file_hash(&sources).await?;
    println!("{}  {}  (chunks of {} bytes)", digest, args.path.display(), chunk_size);

    if args.sha256 {
        let plain = calculate_content_hash(&sources).await?;
        println!("{}  {}  (sha256)", plain, args.path.display());
    }
    Ok(())
}

pub(crate) async fn chunked_digest(path: &Path, chunk_size: u64, workers: usize) -> Result<String> {
    let sources = splitter::split_file(path, chunk_size, workers)?;
    Ok(calculate_file_hash(&sources).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkpipe_core::aggregate::combine_chunk_hashes;
    use chunkpipe_core::checksum::sha256_hex;
    use std::io::Write;

    #[tokio::test]
    async fn digest_combines_per_chunk_hashes() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"aaaabbbbcc").unwrap();
        f.flush().unwrap();

        let digest = chunked_digest(f.path(), 4, 2).await.unwrap();
        let expected = combine_chunk_hashes([
            sha256_hex(b"aaaa").as_str(),
            sha256_hex(b"bbbb").as_str(),
            sha256_hex(b"cc").as_str(),
        ]);
        assert_eq!(digest, expected);
    }

    #[tokio::test]
    async fn plain_digest_from_chunks_matches_whole_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"aaaabbbbcc").unwrap();
        f.flush().unwrap();

        let sources = splitter::split_file(f.path(), 3, 2).unwrap();
        let plain = calculate_content_hash(&sources).await.unwrap();
        assert_eq!(plain, sha256_hex(b"aaaabbbbcc"));
    }

    #[tokio::test]
    async fn zero_chunk_size_rejected() {
        let f = tempfile::NamedTempFile::new().unwrap();
        let args = HashArgs {
            path: f.path().to_path_buf(),
            chunk_size: Some(0),
            sha256: false,
        };
        assert!(run_hash(&ChunkpipeConfig::default(), args).await.is_err());
    }
}
