//! Bounded retry with exponential backoff.
//!
//! [`retry`] runs any fallible async operation under a [`RetryPolicy`];
//! [`RetryingFetcher`] applies the same policy to every call of a wrapped
//! [`Fetcher`].
//!
//! Only errors for which [`AppError::is_retryable`] holds are retried.
//! Anything else is returned on first occurrence, untouched.

use std::future::Future;
use std::time::Duration;

use crate::error::AppError;
use crate::models::PageRequest;
use crate::traits::Fetcher;

/// How many times to try, and how long to wait in between.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total invocations allowed, including the first. Treated as at least 1.
    pub max_attempts: u32,
    /// Wait after the first failure.
    pub base_delay: Duration,
    /// Growth factor applied to the wait after each further failure.
    pub multiplier: f64,
    /// Upper bound for any single wait.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    /// 3 attempts, waiting 1s then 2s, never more than 5s.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Wait before the next try, after `attempt` (1-indexed) has failed.
    ///
    /// `base_delay * multiplier^(attempt - 1)`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.multiplier.max(1.0).powi(exponent);
        let millis = self.base_delay.as_millis() as f64 * factor;
        let cap = self.max_delay.as_millis() as f64;
        if !millis.is_finite() || millis >= cap {
            self.max_delay
        } else {
            Duration::from_millis(millis as u64)
        }
    }
}

/// Run `op` until it succeeds, fails non-transiently, or runs out of attempts.
///
/// `label` identifies the operation in log output. On exhaustion the last
/// error is wrapped in [`AppError::RetriesExhausted`].
pub async fn retry<T, Op, Fut>(policy: &RetryPolicy, label: &str, mut op: Op) -> Result<T, AppError>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(%label, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if !e.is_retryable() => {
                tracing::debug!(%label, attempt, error = %e, "Non-transient failure, not retrying");
                return Err(e);
            }
            Err(e) if attempt >= max_attempts => {
                tracing::warn!(%label, attempts = attempt, error = %e, "Retries exhausted");
                return Err(AppError::RetriesExhausted {
                    attempts: attempt,
                    source: Box::new(e),
                });
            }
            Err(e) => {
                let delay = policy.delay_for_attempt(attempt);
                tracing::warn!(
                    %label,
                    attempt,
                    max_attempts,
                    delay_ms = %delay.as_millis(),
                    error = %e,
                    "Attempt failed, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// A [`Fetcher`] wrapper that retries transient failures.
#[derive(Clone)]
pub struct RetryingFetcher<F> {
    inner: F,
    policy: RetryPolicy,
}

impl<F: Fetcher> RetryingFetcher<F> {
    pub fn new(inner: F, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }
}

impl<F: Fetcher> Fetcher for RetryingFetcher<F> {
    async fn fetch(&self, request: &PageRequest) -> Result<String, AppError> {
        retry(&self.policy, &request.url, || self.inner.fetch(request)).await
    }

    async fn close(&self) -> Result<(), AppError> {
        self.inner.close().await
    }
}
