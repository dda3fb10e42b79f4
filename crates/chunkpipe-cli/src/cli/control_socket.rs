//! Control socket: server (during `chunkpipe run`) and client (`chunkpipe pause|resume|cancel`).
//! Protocol: one command per line: "pause", "resume" or "cancel".

use anyhow::{Context, Result};
use chunkpipe_core::{ControlCommand, RunControl};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

/// Binds `path` and spawns a task that applies each received command to
/// `control`. Malformed lines are logged and ignored. The task ends once the
/// run settles and the next connection arrives, or when the runtime shuts down.
///
/// Fails if another run is already listening on `path`; a stale socket file
/// left by a dead run is replaced.
pub fn spawn_control_listener(
    control: RunControl,
    path: impl AsRef<Path>,
) -> Result<tokio::task::JoinHandle<()>> {
    let path = path.as_ref().to_path_buf();
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    if std::os::unix::net::UnixStream::connect(&path).is_ok() {
        anyhow::bail!("another run is already listening on {}", path.display());
    }
    if path.exists() {
        std::fs::remove_file(&path)
            .with_context(|| format!("remove stale socket {}", path.display()))?;
    }
    let listener =
        UnixListener::bind(&path).with_context(|| format!("bind {}", path.display()))?;

    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    if control.is_settled() {
                        break;
                    }
                    let control = control.clone();
                    tokio::spawn(async move {
                        let mut lines = BufReader::new(stream).lines();
                        while let Ok(Some(line)) = lines.next_line().await {
                            match line.parse::<ControlCommand>() {
                                Ok(cmd) => {
                                    tracing::debug!(command = cmd.as_str(), "control command");
                                    control.apply(cmd);
                                }
                                Err(e) => tracing::debug!("control socket: {}", e),
                            }
                        }
                    });
                }
                Err(e) => tracing::debug!("control socket accept: {}", e),
            }
        }
        let _ = std::fs::remove_file(&path);
    });
    Ok(handle)
}

/// Sends one command line to the control socket.
pub async fn send_command(socket_path: &Path, cmd: ControlCommand) -> Result<()> {
    let mut stream = UnixStream::connect(socket_path)
        .await
        .with_context(|| format!("no active run listening on {}", socket_path.display()))?;
    stream.write_all(format!("{}\n", cmd.as_str()).as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkpipe_core::{process_chunks, ChunkSource, PipelineOptions, PipelineRun};
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use tokio::sync::Notify;

    fn blocked_run(gate: &Arc<Notify>) -> PipelineRun {
        let gate = Arc::clone(gate);
        let sources = vec![ChunkSource::ready(chunkpipe_core::Chunk {
            index: 0,
            start: 0,
            end: 1,
            content_hash: "h0".into(),
            payload: vec![0],
        })];
        process_chunks(
            sources,
            move |_chunk, _token| {
                let gate = Arc::clone(&gate);
                async move {
                    gate.notified().await;
                    Ok(())
                }
            },
            PipelineOptions::default(),
        )
    }

    #[tokio::test]
    async fn second_listener_does_not_take_over_live_socket() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("control.sock");
        let gate = Arc::new(Notify::new());
        let first = blocked_run(&gate);
        let second = blocked_run(&gate);

        let listener = spawn_control_listener(first.control(), &socket).unwrap();
        let err = spawn_control_listener(second.control(), &socket).unwrap_err();
        assert!(format!("{:#}", err).contains("already listening"));

        send_command(&socket, ControlCommand::Pause).await.unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while !first.control().is_paused() && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(first.control().is_paused());
        assert!(!second.control().is_paused());

        first.cancel();
        second.cancel();
        listener.abort();
    }

    #[tokio::test]
    async fn stale_socket_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("control.sock");
        drop(std::os::unix::net::UnixListener::bind(&socket).unwrap());
        assert!(socket.exists());

        let gate = Arc::new(Notify::new());
        let run = blocked_run(&gate);
        let listener = spawn_control_listener(run.control(), &socket).unwrap();
        send_command(&socket, ControlCommand::Cancel).await.unwrap();
        assert!(run.outcome().await.is_err());
        listener.abort();
    }
}
