//! CLI for the chunkpipe chunk pipeline.

mod commands;
mod control_socket;
mod manifest;

use anyhow::Result;
use chunkpipe_core::config;
use chunkpipe_core::ControlCommand;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{run_control, run_hash, run_pipeline, HashArgs, RunArgs};

/// Top-level CLI for chunkpipe.
#[derive(Debug, Parser)]
#[command(name = "chunkpipe")]
#[command(about = "chunkpipe: split large files into chunks and process them concurrently", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Split a file and print its chunked whole-file hash.
    Hash {
        /// Path to the file.
        path: PathBuf,
        /// Chunk size in bytes (default from config).
        #[arg(long, value_name = "BYTES")]
        chunk_size: Option<u64>,
        /// Also print the plain SHA-256 of the file.
        #[arg(long)]
        sha256: bool,
    },

    /// Split a file and write every chunk plus a manifest into a directory.
    Run {
        /// Path to the file.
        path: PathBuf,
        /// Output directory for chunk files and manifest.json.
        #[arg(long, value_name = "DIR")]
        out: PathBuf,
        /// Chunks processed at once (default from config).
        #[arg(long, value_name = "N")]
        concurrency: Option<usize>,
        /// Chunk size in bytes (default from config).
        #[arg(long, value_name = "BYTES")]
        chunk_size: Option<u64>,
    },

    /// Pause the active `chunkpipe run`.
    Pause,

    /// Resume the active `chunkpipe run`.
    Resume,

    /// Cancel the active `chunkpipe run`.
    Cancel,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Hash {
                path,
                chunk_size,
                sha256,
            } => {
                run_hash(
                    &cfg,
                    HashArgs {
                        path,
                        chunk_size,
                        sha256,
                    },
                )
                .await?
            }
            CliCommand::Run {
                path,
                out,
                concurrency,
                chunk_size,
            } => {
                run_pipeline(
                    &cfg,
                    RunArgs {
                        path,
                        out,
                        concurrency,
                        chunk_size,
                    },
                )
                .await?
            }
            CliCommand::Pause => run_control(ControlCommand::Pause).await?,
            CliCommand::Resume => run_control(ControlCommand::Resume).await?,
            CliCommand::Cancel => run_control(ControlCommand::Cancel).await?,
        }

        Ok(())
    }
}
