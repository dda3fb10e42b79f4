//! RAII guard that settles a run when the driver finishes (or unwinds).

use std::sync::Arc;

use crate::control::RunControl;
use crate::token::PipelineToken;

use super::progress::ProgressCounter;

/// Freezes progress, force-resolves leftover delays and marks the run settled when dropped.
pub(super) struct SettleGuard {
    pub(super) token: PipelineToken,
    pub(super) progress: Arc<ProgressCounter>,
    pub(super) control: RunControl,
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        self.progress.freeze();
        self.token.clear_residuals();
        self.control.mark_settled();
    }
}
