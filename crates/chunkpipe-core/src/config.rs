use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::retry::RetryPolicy;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Delay added per consecutive failure, in milliseconds.
    pub step_ms: u64,
    /// Maximum backoff delay in milliseconds.
    pub max_delay_ms: u64,
    /// Optional cap on attempts per chunk (including the first). Unset = retry until cancelled.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            step_ms: 1000,
            max_delay_ms: 5000,
            max_attempts: None,
        }
    }
}

/// Global configuration loaded from `~/.config/chunkpipe/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkpipeConfig {
    /// Maximum chunk operations in flight per run.
    pub concurrency: usize,
    /// Chunk size in bytes for the built-in splitter.
    pub chunk_size_bytes: u64,
    /// Blocking workers used to read and hash chunks (None = available parallelism).
    #[serde(default)]
    pub producer_workers: Option<usize>,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for ChunkpipeConfig {
    fn default() -> Self {
        Self {
            concurrency: 6,
            chunk_size_bytes: crate::splitter::DEFAULT_CHUNK_SIZE,
            producer_workers: None,
            retry: None,
        }
    }
}

impl ChunkpipeConfig {
    /// Retry policy from the `[retry]` section, or the defaults.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryPolicy::from)
            .unwrap_or_default()
    }

    /// Producer worker count, falling back to available parallelism.
    pub fn producer_workers(&self) -> usize {
        self.producer_workers
            .unwrap_or_else(crate::splitter::default_workers)
            .max(1)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("chunkpipe")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ChunkpipeConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ChunkpipeConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: ChunkpipeConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn default_config_values() {
        let cfg = ChunkpipeConfig::default();
        assert_eq!(cfg.concurrency, 6);
        assert_eq!(cfg.chunk_size_bytes, 4 * 1024 * 1024);
        assert!(cfg.producer_workers.is_none());
        assert!(cfg.retry.is_none());
        assert_eq!(cfg.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = ChunkpipeConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: ChunkpipeConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.concurrency, cfg.concurrency);
        assert_eq!(parsed.chunk_size_bytes, cfg.chunk_size_bytes);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            concurrency = 2
            chunk_size_bytes = 1048576
            producer_workers = 3
        "#;
        let cfg: ChunkpipeConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.concurrency, 2);
        assert_eq!(cfg.chunk_size_bytes, 1_048_576);
        assert_eq!(cfg.producer_workers(), 3);
        assert!(cfg.retry.is_none());
    }

    #[test]
    fn config_toml_retry_section() {
        let toml = r#"
            concurrency = 4
            chunk_size_bytes = 65536

            [retry]
            step_ms = 500
            max_delay_ms = 2000
            max_attempts = 10
        "#;
        let cfg: ChunkpipeConfig = toml::from_str(toml).unwrap();
        let retry = cfg.retry.as_ref().unwrap();
        assert_eq!(retry.max_attempts, Some(10));
        let policy = cfg.retry_policy();
        assert_eq!(policy.step, Duration::from_millis(500));
        assert_eq!(policy.max_delay, Duration::from_millis(2000));
        assert_eq!(policy.max_attempts, Some(10));
    }

    #[test]
    fn retry_section_without_cap_is_unbounded() {
        let toml = r#"
            concurrency = 4
            chunk_size_bytes = 65536

            [retry]
            step_ms = 100
            max_delay_ms = 300
        "#;
        let cfg: ChunkpipeConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.retry_policy().max_attempts, None);
    }
}
