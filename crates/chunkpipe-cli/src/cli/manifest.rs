//! `manifest.json` written next to the chunk files by `chunkpipe run`.

use anyhow::{Context, Result};
use chunkpipe_core::Chunk;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.json";

/// One chunk entry in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestChunk {
    pub index: usize,
    pub start: u64,
    pub end: u64,
    pub hash: String,
    /// File name of the chunk inside the output directory.
    pub file: String,
}

/// Describes how a source file was split and its chunked whole-file hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub source: PathBuf,
    pub size: u64,
    pub chunk_size: u64,
    pub file_hash: String,
    pub chunks: Vec<ManifestChunk>,
}

/// File name for chunk `index` inside the output directory.
pub fn chunk_file_name(index: usize) -> String {
    format!("{index:06}.chunk")
}

impl Manifest {
    pub fn new(source: &Path, chunk_size: u64, file_hash: String, chunks: &[std::sync::Arc<Chunk>]) -> Self {
        let size = chunks.last().map(|c| c.end).unwrap_or(0);
        Self {
            source: source.to_path_buf(),
            size,
            chunk_size,
            file_hash,
            chunks: chunks
                .iter()
                .map(|c| ManifestChunk {
                    index: c.index,
                    start: c.start,
                    end: c.end,
                    hash: c.content_hash.clone(),
                    file: chunk_file_name(c.index),
                })
                .collect(),
        }
    }

    /// Writes `manifest.json` into `dir` and returns its path.
    pub async fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(MANIFEST_FILE);
        let json = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }
}
