//! Jittered retry backoff for breaker-gated callers.
//!
//! The breaker only classifies; when `can_proceed()` is false or a call
//! fails, the caller decides how to retry. This policy gives those callers
//! a shared exponential schedule with jitter so synchronized retries don't
//! stampede a recovering dependency.

use std::time::Duration;

use rand::Rng;

/// Exponential backoff schedule.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Delay before the given attempt (1-based). Attempt 0 is immediate.
    pub fn delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base_ms = self.base_delay.as_millis() as u64;
        let exponential = 2u64.saturating_pow(attempt - 1);
        let capped = base_ms
            .saturating_mul(exponential)
            .min(self.max_delay.as_millis() as u64);

        // Jitter up to 10% of the delay.
        let jitter_range = capped / 10;
        let jitter = if jitter_range > 0 {
            rand::thread_rng().gen_range(0..jitter_range)
        } else {
            0
        };

        Duration::from_millis(capped + jitter)
    }

    /// Whether another attempt is allowed after `attempt` tries.
    pub fn allows(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_grows_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(0), Duration::ZERO);
        assert!(policy.delay(1).as_millis() >= 100);
        assert!(policy.delay(2).as_millis() >= 200);

        let capped = policy.delay(10);
        assert!(capped.as_millis() >= 2000);
        assert!(capped.as_millis() <= 2200);
    }

    #[test]
    fn test_attempt_budget() {
        let policy = RetryPolicy::default();
        assert!(policy.allows(0));
        assert!(policy.allows(2));
        assert!(!policy.allows(3));
    }
}
