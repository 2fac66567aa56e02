use std::future::Future;
use std::time::Duration;

use marketpulse_core::MarketPulseError;

/// Exponential backoff schedule for retryable upstream failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: usize,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt following `attempt` (1-based).
    ///
    /// A server-provided `Retry-After` hint takes precedence over the
    /// computed backoff; both are capped at `max_backoff`.
    pub fn backoff(&self, attempt: usize, hint: Option<Duration>) -> Duration {
        if let Some(hint) = hint {
            return hint.min(self.max_backoff);
        }
        let exp = self.initial_backoff * 2u32.saturating_pow(attempt.saturating_sub(1) as u32);
        exp.min(self.max_backoff)
    }
}

/// Run `op` up to `policy.max_attempts` times, sleeping between retryable
/// failures and returning the last error on exhaustion.
///
/// Cancellation is drop-based: dropping the returned future aborts the
/// in-flight attempt and any backoff sleep.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    mut op: F,
) -> Result<T, MarketPulseError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, MarketPulseError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < policy.max_attempts => {
                let delay = policy.backoff(attempt, err.retry_after());
                tracing::debug!(attempt, ?delay, error = %err, "retrying upstream call");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
