//! Retry with exponential backoff and jitter.

use std::future::Future;
use std::time::Duration;

use crate::error::RelayError;

/// Retry policy configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Initial backoff duration.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Policy allowing `retries` extra attempts after the first.
    pub fn transient(retries: u32) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            ..Self::default()
        }
    }

    /// Execute an async operation with retry.
    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T, RelayError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RelayError>>,
    {
        self.execute_with(operation, |_, _| {}).await
    }

    /// Execute with retry, calling `on_retry(next_attempt, &error)` before each new attempt.
    ///
    /// Only errors with [`RelayError::is_retryable`] are retried.
    pub async fn execute_with<F, Fut, T, R>(
        &self,
        mut operation: F,
        mut on_retry: R,
    ) -> Result<T, RelayError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RelayError>>,
        R: FnMut(u32, &RelayError),
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            if attempt > self.max_attempts {
                // Only reachable with a zero-attempt policy.
                return Err(RelayError::Timeout(0));
            }
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if !err.is_retryable() || attempt == self.max_attempts {
                return Err(err);
            }

            let delay = self.delay_before(attempt, &err);
            tracing::warn!(
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "retrying"
            );
            on_retry(attempt + 1, &err);
            tokio::time::sleep(delay).await;
        }
    }

    /// Backoff before the attempt following `failed_attempt` (1-based).
    ///
    /// A rate limit that names its own wait is honoured up to `max_backoff`.
    fn delay_before(&self, failed_attempt: u32, err: &RelayError) -> Duration {
        if let RelayError::RateLimited {
            retry_after_ms: Some(ms),
        } = err
        {
            return Duration::from_millis(*ms).min(self.max_backoff);
        }
        let exponent = failed_attempt.saturating_sub(1).min(16) as i32;
        let base = (self.initial_backoff.as_secs_f64() * self.multiplier.powi(exponent))
            .min(self.max_backoff.as_secs_f64());
        Duration::from_secs_f64(base * jitter())
    }
}

/// Factor in [0.75, 1.25) drawn from a v4 uuid's random bits.
fn jitter() -> f64 {
    let bits = uuid::Uuid::new_v4().as_u128() as u64;
    0.75 + (bits % 10_000) as f64 / 20_000.0
}
