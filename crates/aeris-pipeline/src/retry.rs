//! Retry policy for the training node.

use aeris_training::TrainingError;
use std::time::Duration;

/// Retry budget applied to the `run_training` node only, and only for
/// failures classified retryable (transient storage hiccups and timeouts).
/// All other failure kinds skip retry and go straight to FAILED.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Delay before each retry.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 1, backoff: Duration::from_secs(5) }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self { max_retries, backoff }
    }

    /// Whether another attempt should be made after `retries_so_far`
    /// failed retries ended in `error`.
    pub fn should_retry(&self, retries_so_far: u32, error: &TrainingError) -> bool {
        retries_so_far < self.max_retries && error.is_retryable()
    }
}
