//! Retry policy configuration.

use serde::{Deserialize, Serialize};

/// Bounded retry settings for transient store and notifier failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum re-executions after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,
    /// Upper bound on a single delay in milliseconds.
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
    /// Multiplier applied to the delay after each retry.
    #[serde(default = "default_multiplier")]
    pub backoff_multiplier: f64,
    /// Add ±30% random jitter to every delay.
    #[serde(default = "default_jitter")]
    pub jitter: bool,
    /// Deadline for one attempt in milliseconds.
    #[serde(default = "default_attempt_timeout")]
    pub attempt_timeout_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
            backoff_multiplier: default_multiplier(),
            jitter: default_jitter(),
            attempt_timeout_ms: default_attempt_timeout(),
        }
    }
}

fn default_max_retries() -> u32 {
    2
}

fn default_initial_backoff() -> u64 {
    50
}

fn default_max_backoff() -> u64 {
    1_000
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_jitter() -> bool {
    true
}

fn default_attempt_timeout() -> u64 {
    5_000
}
