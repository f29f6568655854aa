//! Retry policies for HTTP requests.

use std::time::Duration;

/// Retry policy for an HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryPolicy {
    /// No retries.
    #[default]
    None,
    /// Retry on transport failures + 502/503/504, with backoff on 429.
    /// Default for GET endpoints.
    Idempotent,
}

/// Configuration for retry behavior. Delays double per attempt, capped at
/// `max_delay`, with optional jitter.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not counting the initial request).
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Ceiling on the per-attempt delay.
    pub max_delay: Duration,
    /// Whether to spread the delay by up to ±25%.
    pub jitter: bool,
    /// HTTP status codes that trigger a retry.
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
            jitter: true,
            retryable_statuses: vec![502, 503, 504],
        }
    }
}

impl RetryConfig {
    /// The default config for idempotent (GET) requests.
    pub fn idempotent() -> Self {
        Self {
            retryable_statuses: vec![429, 502, 503, 504],
            ..Self::default()
        }
    }

    /// Delay for a given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = attempt.min(16);
        let base = self
            .initial_delay
            .saturating_mul(1u32 << exp)
            .min(self.max_delay);
        if !self.jitter {
            return base;
        }

        let base_ms = base.as_millis() as u64;
        let spread = base_ms / 4;
        let jittered = if spread == 0 {
            base_ms
        } else {
            base_ms - spread + rand::random::<u64>() % (2 * spread + 1)
        };
        Duration::from_millis(jittered)
    }
}
