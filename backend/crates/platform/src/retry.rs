//! Bounded Retry Policies
//!
//! Every RPC-facing loop in the backend is depth-limited: once the attempt
//! ceiling is reached the operation terminates with a failure value instead
//! of recursing or blocking indefinitely.

use std::time::Duration;

/// Retry policy with an attempt ceiling and exponentially growing delays.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first)
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub base_delay: Duration,
    /// Cap applied to the exponential growth
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
        }
    }

    /// Fixed-interval policy (no exponential growth)
    pub fn fixed(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            base_delay: interval,
            max_delay: interval,
        }
    }

    /// Delay to wait after the given attempt (1-based) fails.
    ///
    /// Doubles per attempt, capped at `max_delay`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(1u32 << shift);
        delay.min(self.max_delay)
    }

    /// Whether another attempt is allowed after `attempt` attempts were made.
    pub fn is_exhausted(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy::new(
            6,
            Duration::from_millis(250),
            Duration::from_secs(1),
        );
        assert_eq!(policy.delay_after(1), Duration::from_millis(250));
        assert_eq!(policy.delay_after(2), Duration::from_millis(500));
        assert_eq!(policy.delay_after(3), Duration::from_millis(1000));
        // Capped from here on
        assert_eq!(policy.delay_after(4), Duration::from_secs(1));
        assert_eq!(policy.delay_after(30), Duration::from_secs(1));
    }

    #[test]
    fn test_fixed_interval() {
        let policy = RetryPolicy::fixed(30, Duration::from_secs(15));
        assert_eq!(policy.delay_after(1), Duration::from_secs(15));
        assert_eq!(policy.delay_after(29), Duration::from_secs(15));
    }

    #[test]
    fn test_exhaustion() {
        let policy = RetryPolicy::default();
        assert!(!policy.is_exhausted(5));
        assert!(policy.is_exhausted(6));
        assert!(policy.is_exhausted(7));
    }
}
