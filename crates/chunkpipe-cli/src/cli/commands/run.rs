//! `chunkpipe run` – split a file and write every chunk through the pipeline.

use anyhow::{Context, Result};
use chunkpipe_core::config::ChunkpipeConfig;
use chunkpipe_core::{
    calculate_file_hash, collect_chunks, process_chunks, splitter, Chunk, PipelineOptions,
    PipelineToken,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::cli::control_socket;
use crate::cli::manifest::{chunk_file_name, Manifest};

const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct RunArgs {
    pub path: PathBuf,
    pub out: PathBuf,
    pub concurrency: Option<usize>,
    pub chunk_size: Option<u64>,
}

/// Runs the pipeline with the default control socket and Ctrl-C cancelling the run.
pub async fn run_pipeline(cfg: &ChunkpipeConfig, args: RunArgs) -> Result<()> {
    let socket = chunkpipe_core::control::default_control_socket_path().ok();
    let manifest = execute(cfg, &args, socket.as_deref(), true).await?;
    println!(
        "Wrote {} chunk(s) to {}; file hash {}",
        manifest.chunks.len(),
        args.out.display(),
        manifest.file_hash
    );
    Ok(())
}

/// Splits `args.path`, writes each chunk into `args.out` and then the manifest.
pub(crate) async fn execute(
    cfg: &ChunkpipeConfig,
    args: &RunArgs,
    socket: Option<&Path>,
    cancel_on_ctrl_c: bool,
) -> Result<Manifest> {
    let chunk_size = args.chunk_size.unwrap_or(cfg.chunk_size_bytes);
    anyhow::ensure!(chunk_size > 0, "chunk size must be positive");
    tokio::fs::create_dir_all(&args.out)
        .await
        .with_context(|| format!("create {}", args.out.display()))?;

    let sources = splitter::split_file(&args.path, chunk_size, cfg.producer_workers())?;
    let mut options = PipelineOptions::from_config(cfg);
    if let Some(c) = args.concurrency {
        options.concurrency = c;
    }
    let options = options.with_progress(progress_printer());

    let out_dir = Arc::new(args.out.clone());
    let run = process_chunks(
        sources.clone(),
        move |chunk, token| {
            let out_dir = Arc::clone(&out_dir);
            async move { write_chunk(&out_dir, &chunk, &token).await }
        },
        options,
    );
    let control = run.control();

    let listener = socket.and_then(|path| {
        match control_socket::spawn_control_listener(control.clone(), path) {
            Ok(handle) => {
                tracing::debug!(path = %path.display(), "control socket listening");
                Some(handle)
            }
            Err(e) => {
                tracing::warn!("control socket unavailable: {:#}", e);
                None
            }
        }
    });
    let ctrl_c = cancel_on_ctrl_c.then(|| {
        let control = control.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                control.cancel();
            }
        })
    });

    let outcome = run.outcome().await;
    if let Some(handle) = ctrl_c {
        handle.abort();
    }
    // Only the run that bound the socket removes it.
    if let (Some(handle), Some(path)) = (listener, socket) {
        handle.abort();
        let _ = std::fs::remove_file(path);
    }
    outcome.with_context(|| format!("processing {}", args.path.display()))?;

    let chunks = collect_chunks(&sources).await?;
    let file_hash = calculate_file_hash(&sources).await?;
    let manifest = Manifest::new(&args.path, chunk_size, file_hash, &chunks);
    let manifest_path = manifest.write_to(&args.out).await?;
    tracing::info!(path = %manifest_path.display(), chunks = chunks.len(), "manifest written");
    Ok(manifest)
}

/// Writes one chunk file; gives up early (and is retried) if the run is paused or cancelled.
async fn write_chunk(out_dir: &Path, chunk: &Chunk, token: &PipelineToken) -> Result<()> {
    let interrupt = token.interrupt_handle();
    let path = out_dir.join(chunk_file_name(chunk.index));
    tokio::select! {
        _ = interrupt.cancelled() => anyhow::bail!("chunk {} interrupted", chunk.index),
        res = tokio::fs::write(&path, &chunk.payload) => {
            res.with_context(|| format!("write {}", path.display()))
        }
    }
}

/// Progress callback printing at most every `PROGRESS_INTERVAL` (and always the last step).
fn progress_printer() -> impl Fn(usize, usize) + Send + Sync + 'static {
    let started = Instant::now();
    let last_print: Mutex<Option<Instant>> = Mutex::new(None);
    move |completed, total| {
        let mut last = last_print.lock().unwrap_or_else(|p| p.into_inner());
        let now = Instant::now();
        let due = last.map_or(true, |t| now.duration_since(t) >= PROGRESS_INTERVAL);
        if due || completed >= total {
            let pct = if total == 0 {
                100.0
            } else {
                completed as f64 * 100.0 / total as f64
            };
            println!(
                "\r  {} / {} chunks ({:.1}%)  {:.1}s",
                completed,
                total,
                pct,
                started.elapsed().as_secs_f64()
            );
            *last = Some(now);
        }
    }
}
