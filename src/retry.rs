//! Exponential backoff with jitter for flaky network calls.
//!
//! Used by the source fetchers (feed downloads) and by the LLM adapter.
//!
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..=jitter)
//! ```

use rand::{rng, Rng};
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, warn};

/// Retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Attempts after the first one before giving up.
    pub max_retries: usize,
    /// Delay before the first retry; doubles on each further attempt.
    pub base_delay: Duration,
    /// Cap on the exponential part of the delay.
    pub max_delay: Duration,
    /// Upper bound of the random jitter added to every delay.
    pub jitter: Duration,
}

impl Backoff {
    /// Feed downloads: two retries starting at one second.
    pub const FETCH: Backoff = Backoff {
        max_retries: 2,
        base_delay: Duration::from_secs(1),
        max_delay: Duration::from_secs(8),
        jitter: Duration::from_millis(250),
    };

    /// LLM calls: five retries starting at one second, capped at 30 seconds.
    pub const LLM: Backoff = Backoff {
        max_retries: 5,
        base_delay: Duration::from_secs(1),
        max_delay: Duration::from_secs(30),
        jitter: Duration::from_millis(250),
    };

    /// Delay to wait after the `attempt`-th failure (1-based), without jitter.
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let shift = attempt.saturating_sub(1).min(31) as u32;
        self.base_delay.saturating_mul(1 << shift).min(self.max_delay)
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rng().random_range(0..=max_ms))
    }
}

/// Run `op` until it succeeds or the policy is exhausted.
///
/// Every error is treated as transient; see [`retry_when`] to stop early on
/// permanent failures.
///
/// # Arguments
///
/// * `label` - Name of the operation, attached to every log line
/// * `policy` - Retry count and delay bounds
/// * `op` - Produces a fresh future for each attempt
///
/// # Errors
///
/// Returns the error of the last attempt once `policy.max_retries` retries
/// have failed.
pub async fn retry<T, E, F, Fut>(label: &str, policy: &Backoff, op: F) -> Result<T, E>
where
    E: fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    retry_when(label, policy, op, |_| true).await
}

/// Like [`retry`], but only errors for which `is_transient` returns `true`
/// are retried. Any other error is returned right away.
pub async fn retry_when<T, E, F, Fut, P>(
    label: &str,
    policy: &Backoff,
    mut op: F,
    is_transient: P,
) -> Result<T, E>
where
    E: fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let total_t0 = Instant::now();
    let mut attempt = 0usize;

    loop {
        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };
        attempt += 1;

        if !is_transient(&err) {
            warn!(label, attempt, error = %err, "Permanent failure; not retrying");
            return Err(err);
        }

        if attempt > policy.max_retries {
            error!(
                label,
                attempt,
                max = policy.max_retries,
                elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                error = %err,
                "Retries exhausted"
            );
            return Err(err);
        }

        let delay = policy.delay_for(attempt) + policy.jitter();
        warn!(
            label,
            attempt,
            max = policy.max_retries,
            ?delay,
            error = %err,
            "Attempt failed; backing off"
        );
        drop(err);
        sleep(delay).await;
    }
}
