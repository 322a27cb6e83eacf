//! Reconnect backoff for consumers.

use std::time::Duration;

/// How a consumer paces reconnect attempts and when it gives up.
///
/// # Default Values
///
/// - `max_retries`: 10 consecutive connection failures
/// - `initial_delay`: 5 seconds
/// - `max_delay`: 5 seconds
/// - `multiplier`: 1.0 (fixed delay)
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// Consecutive connection failures tolerated before stopping
    pub max_retries: usize,
    /// Delay after the first failure
    pub initial_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
    /// Growth factor applied per consecutive failure
    pub multiplier: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(5), 10)
    }
}

impl BackoffPolicy {
    /// Same delay after every failure.
    pub fn fixed(delay: Duration, max_retries: usize) -> Self {
        Self {
            max_retries,
            initial_delay: delay,
            max_delay: delay,
            multiplier: 1.0,
        }
    }

    /// Create a new policy builder.
    #[must_use]
    pub fn builder() -> BackoffPolicyBuilder {
        BackoffPolicyBuilder {
            policy: Self::default(),
        }
    }

    /// Delay before reconnect attempt `attempt` (zero-based).
    ///
    /// `initial_delay * multiplier ^ attempt`, capped at `max_delay`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        if attempt == 0 {
            return self.initial_delay.min(self.max_delay);
        }

        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay_ms = self.initial_delay.as_millis() as f64 * self.multiplier.powi(exponent);

        if !delay_ms.is_finite() || delay_ms >= self.max_delay.as_millis() as f64 {
            self.max_delay
        } else {
            Duration::from_millis(delay_ms as u64)
        }
    }

    /// Returns true once `failures` consecutive failures exhaust the budget.
    #[must_use]
    pub fn is_exhausted(&self, failures: usize) -> bool {
        failures >= self.max_retries
    }
}

/// Builder for [`BackoffPolicy`].
#[derive(Debug, Clone)]
pub struct BackoffPolicyBuilder {
    policy: BackoffPolicy,
}

impl BackoffPolicyBuilder {
    #[must_use]
    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.policy.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.policy.initial_delay = delay;
        self
    }

    #[must_use]
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.policy.max_delay = delay;
        self
    }

    #[must_use]
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.policy.multiplier = multiplier;
        self
    }

    #[must_use]
    pub fn build(self) -> BackoffPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_fixed_five_seconds_ten_retries() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.max_retries, 10);
        for attempt in 0..10 {
            assert_eq!(policy.delay_for_attempt(attempt), Duration::from_secs(5));
        }
    }

    #[test]
    fn test_exponential_growth_is_capped() {
        let policy = BackoffPolicy::builder()
            .initial_delay(Duration::from_millis(100))
            .max_delay(Duration::from_secs(1))
            .multiplier(2.0)
            .build();

        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(800));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(1000), Duration::from_secs(1));
    }

    #[test]
    fn test_exhaustion_counts_consecutive_failures() {
        let policy = BackoffPolicy::fixed(Duration::ZERO, 3);
        assert!(!policy.is_exhausted(0));
        assert!(!policy.is_exhausted(2));
        assert!(policy.is_exhausted(3));
    }
}
