//! Retry loop: run an async operation until success or cancellation.

use std::future::Future;

use crate::error::PipelineError;
use crate::token::PipelineToken;

use super::policy::RetryPolicy;

/// Runs `op` until it succeeds, backing off between failures.
///
/// Before every attempt the token is checked: a cancelled token ends the loop
/// with `Cancelled`, a paused one suspends until resume. Failures (including
/// ones caused by a fired interruption handle) are retried; only cancellation
/// or an exhausted attempt cap stop the loop. `index` labels the unit of work
/// in logs and errors.
pub async fn execute_with_retry<T, F, Fut>(
    index: usize,
    policy: &RetryPolicy,
    token: &PipelineToken,
    mut op: F,
) -> Result<T, PipelineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let mut failures = 0u32;
    loop {
        token.check_cancelled()?;
        token.wait_while_paused().await;
        token.check_cancelled()?;

        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let delay = policy.delay_for(failures);
                failures = failures.saturating_add(1);
                if policy.exhausted(failures) {
                    return Err(PipelineError::ProcessorFailed {
                        index,
                        attempts: failures,
                        reason: format!("{:#}", err),
                    });
                }
                tracing::warn!(
                    index,
                    attempt = failures,
                    delay_ms = delay.as_millis() as u64,
                    "chunk operation failed, retrying: {:#}",
                    err
                );
                token.delay(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::Instant;

    #[tokio::test]
    async fn returns_first_success() {
        let calls = AtomicU32::new(0);
        let out = execute_with_retry(0, &RetryPolicy::default(), &PipelineToken::new(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, anyhow::Error>(42) }
        })
        .await
        .unwrap();
        assert_eq!(out, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_sequence_is_linear_and_capped() {
        let start = Instant::now();
        let stamps: Arc<Mutex<Vec<Duration>>> = Arc::default();
        let token = PipelineToken::new();
        let seen = Arc::clone(&stamps);
        let out = execute_with_retry(0, &RetryPolicy::default(), &token, || {
            let mut seen = seen.lock().unwrap();
            seen.push(start.elapsed());
            let n = seen.len();
            async move {
                if n < 9 {
                    anyhow::bail!("transient failure {n}")
                }
                Ok(())
            }
        })
        .await;
        assert!(out.is_ok());

        let stamps = stamps.lock().unwrap();
        let gaps: Vec<u128> = stamps
            .windows(2)
            .map(|w| (w[1] - w[0]).as_millis())
            .collect();
        assert_eq!(gaps, vec![0, 1000, 2000, 3000, 4000, 5000, 5000, 5000]);
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_first_attempt() {
        let token = PipelineToken::new();
        token.request_cancel();
        let calls = AtomicU32::new(0);
        let err = execute_with_retry(0, &RetryPolicy::default(), &token, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, anyhow::Error>(()) }
        })
        .await
        .unwrap_err();
        assert_eq!(err, PipelineError::Cancelled);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_backoff_short_circuits() {
        let token = PipelineToken::new();
        let canceller = token.clone();
        let calls = Arc::new(AtomicU32::new(0));
        let counted = Arc::clone(&calls);
        let start = Instant::now();
        let err = execute_with_retry(3, &RetryPolicy::default(), &token, move || {
            let n = counted.fetch_add(1, Ordering::SeqCst) + 1;
            if n == 2 {
                // Second failure schedules a 1s backoff; cancel cuts it short.
                canceller.request_cancel();
            }
            async { Err::<(), _>(anyhow::anyhow!("always fails")) }
        })
        .await
        .unwrap_err();
        assert_eq!(err, PipelineError::Cancelled);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(start.elapsed() < Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn attempt_cap_turns_into_processor_failure() {
        let policy = RetryPolicy {
            step: Duration::ZERO,
            max_attempts: Some(3),
            ..RetryPolicy::default()
        };
        let calls = AtomicU32::new(0);
        let err = execute_with_retry(5, &policy, &PipelineToken::new(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(anyhow::anyhow!("boom")) }
        })
        .await
        .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match err {
            PipelineError::ProcessorFailed {
                index,
                attempts,
                reason,
            } => {
                assert_eq!(index, 5);
                assert_eq!(attempts, 3);
                assert_eq!(reason, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn paused_token_holds_next_attempt_until_resume() {
        let token = PipelineToken::new();
        token.request_pause();
        let calls = Arc::new(AtomicU32::new(0));
        let task = {
            let token = token.clone();
            let calls = Arc::clone(&calls);
            tokio::spawn(async move {
                execute_with_retry(0, &RetryPolicy::default(), &token, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok::<_, anyhow::Error>(()) }
                })
                .await
            })
        };
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        token.request_resume();
        task.await.unwrap().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
