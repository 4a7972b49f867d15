//! Retry policy for page calls.
//!
//! Every retried page goes back through the quota guard, so retries spend
//! quota. The default is a single attempt.

use std::time::Duration;

use crate::error::FetchError;

/// Strategy for retrying failed page calls.
#[derive(Debug, Clone)]
pub struct RetryStrategy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Base delay between retries in seconds.
    pub base_delay_secs: u64,
    /// Whether to use exponential backoff.
    pub exponential_backoff: bool,
    /// Maximum delay between retries.
    pub max_delay_secs: u64,
}

impl RetryStrategy {
    /// Creates a new retry strategy.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_secs: 1,
            exponential_backoff: true,
            max_delay_secs: 60,
        }
    }

    /// Disables retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay_secs: 0,
            exponential_backoff: false,
            max_delay_secs: 0,
        }
    }

    /// Sets the base delay.
    #[must_use]
    pub fn with_base_delay(mut self, secs: u64) -> Self {
        self.base_delay_secs = secs;
        self
    }

    /// Enables or disables exponential backoff.
    #[must_use]
    pub fn with_exponential_backoff(mut self, enabled: bool) -> Self {
        self.exponential_backoff = enabled;
        self
    }

    /// Calculates the delay after a given (1-based) failed attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = if self.exponential_backoff {
            self.base_delay_secs
                .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
        } else {
            self.base_delay_secs
        };

        Duration::from_secs(delay.min(self.max_delay_secs))
    }

    /// Determines if a failed call should be attempted again.
    pub fn should_retry(&self, attempt: u32, error: &FetchError) -> bool {
        attempt < self.max_attempts && error.is_transient()
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::no_retry()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_single_attempt() {
        let strategy = RetryStrategy::default();
        assert_eq!(strategy.max_attempts, 1);
        assert!(!strategy.should_retry(1, &FetchError::Timeout(Duration::from_secs(1))));
    }

    #[test]
    fn test_exponential_backoff() {
        let strategy = RetryStrategy::new(5);

        assert_eq!(strategy.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(strategy.delay_for_attempt(2), Duration::from_secs(2));
        assert_eq!(strategy.delay_for_attempt(3), Duration::from_secs(4));
    }

    #[test]
    fn test_max_delay_cap() {
        let strategy = RetryStrategy::new(10).with_base_delay(10);
        assert_eq!(strategy.delay_for_attempt(5), Duration::from_secs(60));
    }

    #[test]
    fn test_only_transient_errors_are_retried() {
        let strategy = RetryStrategy::new(3);
        let server_error = FetchError::Status {
            status: 503,
            body: String::new(),
        };
        let bad_request = FetchError::Status {
            status: 400,
            body: String::new(),
        };

        assert!(strategy.should_retry(1, &server_error));
        assert!(!strategy.should_retry(3, &server_error));
        assert!(!strategy.should_retry(1, &bad_request));
        assert!(!strategy.should_retry(1, &FetchError::InvalidResponse("x".into())));
    }
}
