//! Retry policy for RPC calls

use std::time::Duration;

/// Retry policy applied by [`crate::HttpRpcClient`] to each batch call
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the second attempt
    pub initial_interval: Duration,
    /// Multiplier applied to the delay after each attempt
    pub backoff_coefficient: f64,
    /// Upper bound for a single delay
    pub maximum_interval: Duration,
    /// Total attempts including the first one
    pub maximum_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::no_retry()
    }
}

impl RetryPolicy {
    /// Exponential backoff starting at `initial_interval`.
    pub fn exponential(maximum_attempts: u32, initial_interval: Duration) -> Self {
        Self {
            initial_interval,
            backoff_coefficient: 2.0,
            maximum_interval: Duration::from_secs(30),
            maximum_attempts: maximum_attempts.max(1),
        }
    }

    /// No retries - fail immediately
    pub fn no_retry() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            backoff_coefficient: 2.0,
            maximum_interval: Duration::from_secs(30),
            maximum_attempts: 1,
        }
    }

    /// Set maximum interval
    pub fn with_maximum_interval(mut self, interval: Duration) -> Self {
        self.maximum_interval = interval;
        self
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let millis = self.initial_interval.as_millis() as f64 * self.backoff_coefficient.powi(exponent);
        let capped = millis.min(self.maximum_interval.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.maximum_attempts
    }
}
