// FlowLink - Pulse flow telemetry over LoRa
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.


//! Bounded retry policies
//!
//! Startup radio initialisation and network re-association both wait on
//! hardware that may take a while to come up. They run through
//! [`with_retry_counted`] so every wait has an upper bound and ends in a
//! `Result` that carries the number of attempts made.

use std::time::{Duration, Instant};

/// Retry strategy for operations
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RetryStrategy {
    /// No retries
    #[default]
    None,
    /// Fixed number of retries with constant delay
    Fixed {
        /// Maximum number of retry attempts
        max_retries: u32,
        /// Delay between retries
        delay: Duration,
    },
}

impl RetryStrategy {
    /// Delay before retry number `attempt` (0-indexed), or None once exhausted
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        match self {
            Self::None => None,
            Self::Fixed { max_retries, delay } => (attempt < *max_retries).then_some(*delay),
        }
    }

    /// Get maximum number of retries
    pub fn max_retries(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::Fixed { max_retries, .. } => *max_retries,
        }
    }

    /// Create a fixed retry strategy
    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self::Fixed { max_retries, delay }
    }
}

/// Result of a retry operation with metrics
#[derive(Debug, Clone)]
pub struct RetryResult<T> {
    /// The result value
    pub value: T,
    /// Number of attempts made
    pub attempts: u32,
    /// Total time spent retrying
    pub total_duration: Duration,
}

/// Final error of an exhausted retry, with the number of attempts made
#[derive(Debug, Clone)]
pub struct RetryExhausted<E> {
    /// The last error returned by the operation
    pub error: E,
    /// Number of attempts made
    pub attempts: u32,
}

/// Execute an operation with retry logic, reporting attempts on both paths
///
/// Sleeps for the strategy's delay between attempts.
///
/// # Example
///
/// ```
/// use flowlink::recovery::{with_retry_counted, RetryStrategy};
/// use std::time::Duration;
///
/// let strategy = RetryStrategy::fixed(3, Duration::from_millis(1));
/// let mut calls = 0;
/// let result = with_retry_counted(&strategy, || {
///     calls += 1;
///     if calls < 3 { Err("not yet") } else { Ok(calls) }
/// });
/// assert_eq!(result.map(|r| r.attempts).ok(), Some(3));
/// ```
pub fn with_retry_counted<T, E, F>(
    strategy: &RetryStrategy,
    mut operation: F,
) -> Result<RetryResult<T>, RetryExhausted<E>>
where
    F: FnMut() -> Result<T, E>,
{
    let start = Instant::now();
    let mut attempt: u32 = 0;
    loop {
        match operation() {
            Ok(result) => {
                return Ok(RetryResult {
                    value: result,
                    attempts: attempt.saturating_add(1),
                    total_duration: start.elapsed(),
                })
            }
            Err(e) => {
                if let Some(delay) = strategy.delay_for_attempt(attempt) {
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                    attempt += 1;
                } else {
                    return Err(RetryExhausted {
                        error: e,
                        attempts: attempt.saturating_add(1),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_strategy_none() {
        let strategy = RetryStrategy::None;
        assert_eq!(strategy.delay_for_attempt(0), None);
        assert_eq!(strategy.max_retries(), 0);
    }

    #[test]
    fn test_retry_strategy_fixed() {
        let strategy = RetryStrategy::fixed(10, Duration::from_millis(500));

        assert_eq!(strategy.delay_for_attempt(0), Some(Duration::from_millis(500)));
        assert_eq!(strategy.delay_for_attempt(9), Some(Duration::from_millis(500)));
        assert_eq!(strategy.delay_for_attempt(10), None);
        assert_eq!(strategy.max_retries(), 10);
    }

    #[test]
    fn test_with_retry_counted_first_try() {
        let result: Result<RetryResult<u8>, RetryExhausted<()>> =
            with_retry_counted(&RetryStrategy::None, || Ok(7));

        let result = result.unwrap();
        assert_eq!(result.value, 7);
        assert_eq!(result.attempts, 1);
    }

    #[test]
    fn test_with_retry_counted_success_after_failures() {
        let strategy = RetryStrategy::fixed(5, Duration::ZERO);
        let mut calls = 0;

        let result: Result<RetryResult<&str>, RetryExhausted<()>> =
            with_retry_counted(&strategy, || {
                calls += 1;
                if calls == 3 {
                    Ok("up")
                } else {
                    Err(())
                }
            });

        let result = result.unwrap();
        assert_eq!(result.value, "up");
        assert_eq!(result.attempts, 3);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_with_retry_counted_reports_exhaustion() {
        let strategy = RetryStrategy::fixed(10, Duration::ZERO);

        let result: Result<RetryResult<()>, RetryExhausted<&str>> =
            with_retry_counted(&strategy, || Err("down"));

        let exhausted = result.unwrap_err();
        assert_eq!(exhausted.error, "down");
        assert_eq!(exhausted.attempts, 11);
    }

    #[test]
    fn test_with_retry_counted_none_gives_up_at_once() {
        let mut calls = 0;
        let result: Result<RetryResult<()>, RetryExhausted<&str>> =
            with_retry_counted(&RetryStrategy::None, || {
                calls += 1;
                Err("down")
            });

        assert_eq!(result.unwrap_err().attempts, 1);
        assert_eq!(calls, 1);
    }
}
