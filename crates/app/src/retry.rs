//! Bounded retry with exponential backoff for transient storage failures.

use std::{future::Future, time::Duration};

use rand::Rng;
use tracing::{debug, warn};

/// Errors that know whether a fresh attempt could succeed.
pub trait Transient {
    /// `true` when retrying the whole operation may succeed.
    fn is_transient(&self) -> bool;
}

/// Backoff schedule for [`retry_transient`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,

    /// Delay before the second attempt.
    pub base_delay: Duration,

    /// Upper bound for any single delay.
    pub max_delay: Duration,

    /// Growth factor between consecutive delays.
    pub multiplier: f64,

    /// Spread delays by ±20% so colliding callers do not retry in lockstep.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay to wait after the given failed attempt (1-based), before jitter.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let scaled = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);

        if !scaled.is_finite() || scaled >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }

        Duration::from_secs_f64(scaled)
    }

    fn delay(&self, attempt: u32) -> Duration {
        let delay = self.backoff(attempt);

        if self.jitter {
            delay.mul_f64(rand::thread_rng().gen_range(0.8..1.2))
        } else {
            delay
        }
    }
}

/// Why [`retry_transient`] gave up.
#[derive(Debug)]
pub enum RetryError<E> {
    /// Every attempt failed with a transient error; holds the last one.
    Exhausted { attempts: u32, last: E },

    /// An attempt failed with an error that retrying cannot fix.
    Permanent(E),
}

/// Run `operation` until it succeeds, fails permanently, or the policy's
/// attempts are used up.
///
/// # Errors
///
/// Returns [`RetryError::Permanent`] for the first non-transient error and
/// [`RetryError::Exhausted`] when every attempt failed transiently.
pub async fn retry_transient<F, Fut, T, E>(
    policy: &RetryPolicy,
    operation: &str,
    mut attempt_fn: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match attempt_fn(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation, attempt, "succeeded after retry");
                }

                return Ok(value);
            }
            Err(error) if !error.is_transient() => return Err(RetryError::Permanent(error)),
            Err(error) if attempt >= max_attempts => {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: error,
                });
            }
            Err(error) => {
                let delay = policy.delay(attempt);

                warn!(
                    operation,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis(),
                    %error,
                    "transient failure, retrying"
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
