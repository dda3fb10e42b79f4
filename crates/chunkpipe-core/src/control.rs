//! Run control: pause/resume/cancel for an active pipeline run.
//!
//! `RunControl` is the clone-able handle behind `PipelineRun`. It forwards to
//! the run's token and ignores cancel/pause once the run has settled. The
//! CLI's control socket maps one-line `ControlCommand`s onto it.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::scheduler::ProgressStats;
use crate::scheduler::ProgressCounter;
use crate::token::PipelineToken;

/// Clone-able handle to pause, resume or cancel one run.
#[derive(Clone)]
pub struct RunControl {
    token: PipelineToken,
    progress: Arc<ProgressCounter>,
    settled: Arc<AtomicBool>,
}

impl std::fmt::Debug for RunControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunControl")
            .field("paused", &self.token.is_paused())
            .field("cancelled", &self.token.is_cancelled())
            .field("settled", &self.is_settled())
            .field("progress", &self.progress())
            .finish()
    }
}

impl RunControl {
    pub(crate) fn new(token: PipelineToken, progress: Arc<ProgressCounter>) -> Self {
        Self {
            token,
            progress,
            settled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn mark_settled(&self) {
        self.settled.store(true, Ordering::Release);
    }

    /// True once the run's outcome is decided.
    pub fn is_settled(&self) -> bool {
        self.settled.load(Ordering::Acquire)
    }

    /// Suspends the run: running interruption-aware work is interrupted,
    /// pending backoffs end early and no new attempt starts until `resume`.
    pub fn pause(&self) {
        if self.is_settled() {
            return;
        }
        tracing::info!("pause requested");
        self.token.request_pause();
    }

    /// Resumes a paused run. No-op when not paused.
    pub fn resume(&self) {
        if !self.token.is_paused() {
            return;
        }
        tracing::info!("resume requested");
        self.token.request_resume();
    }

    /// Cancels the run; its outcome becomes `Cancelled`. No-op after settlement.
    pub fn cancel(&self) {
        if self.is_settled() {
            return;
        }
        tracing::info!("cancel requested");
        self.token.request_cancel();
    }

    pub fn is_paused(&self) -> bool {
        self.token.is_paused()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Current progress counters.
    pub fn progress(&self) -> ProgressStats {
        self.progress.snapshot()
    }

    /// Applies a parsed control command.
    pub fn apply(&self, cmd: ControlCommand) {
        match cmd {
            ControlCommand::Pause => self.pause(),
            ControlCommand::Resume => self.resume(),
            ControlCommand::Cancel => self.cancel(),
        }
    }
}

/// One line of the control protocol: `pause`, `resume` or `cancel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Pause,
    Resume,
    Cancel,
}

impl ControlCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlCommand::Pause => "pause",
            ControlCommand::Resume => "resume",
            ControlCommand::Cancel => "cancel",
        }
    }
}

impl FromStr for ControlCommand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pause" => Ok(ControlCommand::Pause),
            "resume" => Ok(ControlCommand::Resume),
            "cancel" => Ok(ControlCommand::Cancel),
            other => anyhow::bail!("unknown control command: {:?}", other),
        }
    }
}

/// Default path for the control socket (XDG state dir).
pub fn default_control_socket_path() -> std::io::Result<PathBuf> {
    let dir = xdg::BaseDirectories::with_prefix("chunkpipe")?.get_state_home();
    Ok(dir.join("control.sock"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control() -> RunControl {
        RunControl::new(PipelineToken::new(), Arc::new(ProgressCounter::new(3, None)))
    }

    #[test]
    fn parse_commands() {
        assert_eq!("pause".parse::<ControlCommand>().unwrap(), ControlCommand::Pause);
        assert_eq!(" Resume\n".parse::<ControlCommand>().unwrap(), ControlCommand::Resume);
        assert_eq!("cancel".parse::<ControlCommand>().unwrap(), ControlCommand::Cancel);
        assert!("stop".parse::<ControlCommand>().is_err());
        assert_eq!(ControlCommand::Cancel.as_str(), "cancel");
    }

    #[test]
    fn pause_resume_cancel_forward_to_token() {
        let c = control();
        c.apply(ControlCommand::Pause);
        assert!(c.is_paused());
        c.apply(ControlCommand::Resume);
        assert!(!c.is_paused());
        c.apply(ControlCommand::Cancel);
        assert!(c.is_cancelled());
    }

    #[test]
    fn cancel_after_settlement_is_noop() {
        let c = control();
        c.mark_settled();
        c.cancel();
        c.pause();
        assert!(!c.is_cancelled());
        assert!(!c.is_paused());
        assert_eq!(c.progress().total, 3);
    }
}
