//! Bounded retry with exponential backoff for transient failures.
//!
//! The runner re-executes a whole operation (typically a read-modify-write
//! cycle against one aggregate), never a fragment of one. Only errors for
//! which [`AppError::is_transient`] holds are retried, and a stale
//! conditional write (`Conflict`) is retried at most once per call.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::config::RetryConfig;
use crate::error::{AppError, ErrorKind};
use crate::result::AppResult;

/// Retry behaviour derived from [`RetryConfig`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
    backoff_multiplier: f64,
    jitter: bool,
    attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
            backoff_multiplier: config.backoff_multiplier,
            jitter: config.jitter,
            attempt_timeout: Duration::from_millis(config.attempt_timeout_ms),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries. Each attempt is still deadline-bounded.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Run `f` until it succeeds, fails terminally, or the retry budget is spent.
    pub async fn run<F, Fut, T>(&self, operation: &str, mut f: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut attempt = 0u32;
        let mut conflicts = 0u32;
        let mut backoff = self.initial_backoff;

        loop {
            let result = match tokio::time::timeout(self.attempt_timeout, f()).await {
                Ok(result) => result,
                Err(_) => Err(AppError::service_unavailable(format!(
                    "{operation} timed out after {:?}",
                    self.attempt_timeout
                ))),
            };

            let err = match result {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_transient() || attempt >= self.max_retries {
                return Err(err);
            }
            if err.kind == ErrorKind::Conflict {
                conflicts += 1;
                if conflicts > 1 {
                    return Err(err);
                }
            }

            attempt += 1;
            let delay = self.jittered(backoff);
            warn!(
                operation = %operation,
                attempt = attempt,
                max_retries = self.max_retries,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Transient failure, retrying"
            );
            tokio::time::sleep(delay).await;

            backoff = Duration::from_millis(
                ((backoff.as_millis() as f64 * self.backoff_multiplier)
                    .min(self.max_backoff.as_millis() as f64)) as u64,
            );
        }
    }

    fn jittered(&self, base: Duration) -> Duration {
        if self.jitter {
            let factor = 1.0 + rand::thread_rng().gen_range(-0.3..0.3);
            Duration::from_millis((base.as_millis() as f64 * factor) as u64)
        } else {
            base
        }
    }
}
