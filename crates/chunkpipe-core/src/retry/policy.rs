use std::time::Duration;

use crate::config::RetryConfig;

/// Backoff policy for per-chunk operations.
///
/// The delay after the n-th consecutive failure (0-based) is
/// `min(step * n, max_delay)`, giving 0, 1s, 2s, 3s, 4s, 5s, 5s, ... with the
/// defaults. Attempts are unbounded unless `max_attempts` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay added per failure.
    pub step: Duration,
    /// Upper bound on a single backoff delay.
    pub max_delay: Duration,
    /// Optional ceiling on attempts (including the first). `None` = retry forever.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            step: Duration::from_millis(1000),
            max_delay: Duration::from_millis(5000),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// Backoff to wait after a failure, given how many failures preceded it.
    pub fn delay_for(&self, prior_failures: u32) -> Duration {
        self.step.saturating_mul(prior_failures).min(self.max_delay)
    }

    /// True when `attempts` operations have run and the policy allows no more.
    pub fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max.max(1))
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self {
            step: Duration::from_millis(cfg.step_ms),
            max_delay: Duration::from_millis(cfg.max_delay_ms),
            max_attempts: cfg.max_attempts,
        }
    }
}
