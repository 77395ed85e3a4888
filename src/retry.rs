//! Bounded exponential backoff for the structured engine client.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::{Result, SearchError};

/// Retry budget: attempts, first delay and growth factor.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub initial_delay: Duration,
    /// Factor applied to the delay after every further failure.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(10),
            multiplier: 1.5,
        }
    }
}

impl RetryPolicy {
    /// The sleeps between attempts: one fewer than `max_attempts`.
    pub fn delays(&self) -> Vec<Duration> {
        let mut delays = Vec::new();
        let mut delay = self.initial_delay;
        for _ in 1..self.max_attempts {
            delays.push(delay);
            let next = (delay.as_nanos() as f64 * self.multiplier).round();
            delay = Duration::from_nanos(next as u64);
        }
        delays
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error, or the
    /// budget is spent.
    ///
    /// Only [`SearchError::EngineApi`] is retried. The last failure is
    /// returned unchanged.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut delays = self.delays().into_iter();
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err @ SearchError::EngineApi(_)) => {
                    warn!("Engine client raised {} (try {}/{})", err, attempt, attempts);
                    match delays.next() {
                        Some(delay) if attempt < attempts => {
                            tokio::time::sleep(delay).await;
                            attempt += 1;
                        }
                        _ => return Err(err),
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_delay, Duration::from_millis(10));
        assert_eq!(policy.multiplier, 1.5);
    }

    #[test]
    fn test_delays_grow_by_multiplier() {
        let delays = RetryPolicy::default().delays();
        assert_eq!(delays, vec![Duration::from_millis(10), Duration::from_millis(15)]);
        assert!(delays.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_delays_longer_budget() {
        let policy = RetryPolicy {
            max_attempts: 5,
            ..Default::default()
        };
        let delays = policy.delays();
        assert_eq!(delays.len(), 4);
        for pair in delays.windows(2) {
            let ratio = pair[1].as_secs_f64() / pair[0].as_secs_f64();
            assert!((ratio - 1.5).abs() < 1e-6);
        }
    }

    #[tokio::test]
    async fn test_run_gives_up_after_three_attempts() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();
        let result: Result<()> = RetryPolicy::default()
            .run(|attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Err(SearchError::EngineApi(format!("attempt {}", attempt))) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(SearchError::EngineApi(msg)) => assert_eq!(msg, "attempt 3"),
            other => panic!("expected last EngineApi error, got {:?}", other),
        }
        assert!(start.elapsed() >= Duration::from_millis(25));
    }

    #[tokio::test]
    async fn test_run_succeeds_on_retry() {
        let calls = AtomicU32::new(0);
        let result = RetryPolicy::default()
            .run(|attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 2 {
                        Err(SearchError::EngineApi("flaky".into()))
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;
        let value = tokio_test::assert_ok!(result);
        assert_eq!(value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_run_does_not_retry_other_errors() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = RetryPolicy::default()
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(SearchError::Config("bad proxy".into())) }
            })
            .await;
        assert!(matches!(result, Err(SearchError::Config(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
