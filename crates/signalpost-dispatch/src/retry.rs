//! Linear backoff schedule for task retries.

use std::time::Duration;

use crate::{DEFAULT_BACKOFF_UNIT, DEFAULT_MAX_RETRIES};

/// Retry schedule applied to every task in a pool.
///
/// A task is attempted up to `max_retries + 1` times. After failed attempt
/// `r` (0-indexed), the worker sleeps `backoff_unit × (r + 1)` before the
/// next attempt, so delays grow linearly: one unit, two units, three units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Number of retries after a failed first attempt. Zero means a single
    /// attempt with no retry.
    pub max_retries: u32,
    /// Base delay multiplied by the attempt number.
    pub backoff_unit: Duration,
}

impl RetryPolicy {
    /// Creates a policy with the given retry count and backoff unit.
    pub fn new(max_retries: u32, backoff_unit: Duration) -> Self {
        Self { max_retries, backoff_unit }
    }

    /// Total number of attempts a task receives, counting the first.
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before the attempt that follows failed attempt `attempt`
    /// (0-indexed).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_unit.saturating_mul(attempt.saturating_add(1))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: DEFAULT_MAX_RETRIES, backoff_unit: DEFAULT_BACKOFF_UNIT }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_grow_linearly() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2));

        assert_eq!(policy.delay_after(0), Duration::from_secs(2));
        assert_eq!(policy.delay_after(1), Duration::from_secs(4));
        assert_eq!(policy.delay_after(2), Duration::from_secs(6));
    }

    #[test]
    fn total_attempts_counts_the_first_attempt() {
        assert_eq!(RetryPolicy::new(0, Duration::from_secs(1)).total_attempts(), 1);
        assert_eq!(RetryPolicy::new(4, Duration::from_secs(1)).total_attempts(), 5);
    }

    #[test]
    fn default_policy_matches_documented_values() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(policy.backoff_unit, DEFAULT_BACKOFF_UNIT);
    }
}
