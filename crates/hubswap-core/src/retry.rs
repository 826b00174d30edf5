use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

use crate::config::RetryConfig;

/// Bounded exponential backoff
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: usize,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: usize, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            initial_delay,
            max_delay,
        }
    }

    /// A policy that calls the operation exactly once.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(
            config.attempts,
            Duration::from_millis(config.initial_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

/// Retry an async operation with exponential backoff.
///
/// Errors for which `should_retry` returns false are returned immediately.
/// The closure receives the 1-based attempt number.
pub async fn retry_async<F, Fut, T, E, P>(
    mut op: F,
    policy: &RetryPolicy,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut delay = policy.initial_delay;
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(v) => return Ok(v),
            Err(e) if attempt < policy.attempts && should_retry(&e) => {
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying: {}", e);
                sleep(delay).await;
                delay = delay.saturating_mul(2).min(policy.max_delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_policy(attempts: usize) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::from_millis(1), Duration::from_millis(4))
    }

    #[tokio::test]
    async fn retries_until_success() {
        let counter = AtomicUsize::new(0);
        let res: Result<u32, String> = retry_async(
            |_| {
                let current = counter.fetch_add(1, Ordering::Relaxed);
                async move {
                    if current < 2 {
                        Err("flaky".to_string())
                    } else {
                        Ok(7)
                    }
                }
            },
            &fast_policy(4),
            |_| true,
        )
        .await;

        assert_eq!(res.unwrap(), 7);
        assert_eq!(counter.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn gives_up_after_attempts() {
        let counter = AtomicUsize::new(0);
        let res: Result<u32, String> = retry_async(
            |attempt| {
                counter.fetch_add(1, Ordering::Relaxed);
                async move { Err(format!("attempt {}", attempt)) }
            },
            &fast_policy(3),
            |_| true,
        )
        .await;

        assert_eq!(res.unwrap_err(), "attempt 3");
        assert_eq!(counter.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn non_retryable_error_is_returned_at_once() {
        let counter = AtomicUsize::new(0);
        let res: Result<u32, String> = retry_async(
            |_| {
                counter.fetch_add(1, Ordering::Relaxed);
                async { Err("no liquidity".to_string()) }
            },
            &fast_policy(5),
            |e| e != "no liquidity",
        )
        .await;

        assert!(res.is_err());
        assert_eq!(counter.load(Ordering::Relaxed), 1);
    }
}
