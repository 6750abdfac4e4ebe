//! Capped exponential backoff for search requests.

use std::time::Duration;

/// Tunable parameters for the retry loop in [`crate::SearchApi`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    /// 5 attempts, waiting 2s, 4s, 8s and 16s in between (30s cap).
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Delays slept between consecutive attempts, in order.
    ///
    /// Yields `max_attempts - 1` values.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        let first = self.initial_delay.min(self.max_delay);
        std::iter::successors(Some(first), move |d| Some(next_delay(*d, self)))
            .take(self.max_attempts.saturating_sub(1) as usize)
    }
}

/// Calculate the next backoff delay from the current delay and policy.
///
/// The result is clamped to [`RetryPolicy::max_delay`].
pub fn next_delay(current: Duration, policy: &RetryPolicy) -> Duration {
    let next_ms = (current.as_millis() as f64 * policy.multiplier) as u64;
    Duration::from_millis(next_ms).min(policy.max_delay)
}
