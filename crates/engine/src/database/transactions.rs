//! Retry policy for conflicting transactions

use std::time::Duration;
use tessera_core::error::Error;

/// How `Database::update_with_retry` treats a commit conflict
///
/// Only `Conflict` errors are retried; any other error is returned at once.
/// Between attempts the caller sleeps for an exponentially growing delay,
/// capped at `max_delay_ms`.
///
/// # Example
/// ```ignore
/// let policy = RetryConfig::new().with_max_retries(5);
/// db.update_with_retry(policy, |txn| { ... })?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Attempts after the first one (0 = never retry)
    pub max_retries: usize,
    /// Delay before the first retry, in milliseconds
    pub base_delay_ms: u64,
    /// Upper bound on any single delay, in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1,
            max_delay_ms: 50,
        }
    }
}

impl RetryConfig {
    /// Default policy: 3 retries, 1ms doubling up to 50ms
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy that never retries
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Set the number of retries
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the first delay and the cap
    pub fn with_delays(mut self, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Whether attempt `attempt` (0-based) failing with `err` gets another try
    pub(crate) fn should_retry(&self, err: &Error, attempt: usize) -> bool {
        err.is_conflict() && attempt < self.max_retries
    }

    /// Sleep after failed attempt `attempt`
    pub(crate) fn delay(&self, attempt: usize) -> Duration {
        let factor = 1u64.checked_shl(attempt.min(63) as u32).unwrap_or(u64::MAX);
        Duration::from_millis(
            self.base_delay_ms
                .saturating_mul(factor)
                .min(self.max_delay_ms),
        )
    }
}
