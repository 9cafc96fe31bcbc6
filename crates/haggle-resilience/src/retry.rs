// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded retry with fixed or exponential delays.

use std::future::Future;
use std::time::Duration;

use haggle_core::HaggleError;
use tracing::{debug, warn};

/// How long to wait before the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayStrategy {
    /// Same delay after every failed attempt.
    Fixed(Duration),
    /// `base * 2^attempt`, where `attempt` counts from zero.
    Exponential { base: Duration },
}

impl DelayStrategy {
    /// Delay after the failed attempt numbered `attempt` (zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self {
            DelayStrategy::Fixed(delay) => *delay,
            DelayStrategy::Exponential { base } => {
                base.saturating_mul(2u32.saturating_pow(attempt))
            }
        }
    }
}

/// Total attempt budget plus the delay between attempts.
///
/// An attempt is retried only when its error reports
/// [`HaggleError::is_retryable`]; anything else is returned immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first one. Zero is treated as one.
    pub max_attempts: u32,
    pub delay: DelayStrategy,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: DelayStrategy) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Store calls: 3 attempts, 2 s apart.
    pub fn store_default() -> Self {
        Self::new(3, DelayStrategy::Fixed(Duration::from_secs(2)))
    }

    /// Generator calls: 3 attempts with 5 s, 10 s exponential backoff.
    pub fn generator_default() -> Self {
        Self::new(
            3,
            DelayStrategy::Exponential {
                base: Duration::from_secs(5),
            },
        )
    }

    /// Run `op` until it succeeds, fails terminally, or the budget is spent.
    ///
    /// `op` receives the zero-based attempt number. The last error is returned
    /// once attempts are exhausted; no attempt is made past `max_attempts`.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, HaggleError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, HaggleError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match op(attempt).await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(label, attempt, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if err.is_retryable() && attempt + 1 < attempts => {
                    let delay = self.delay.delay_for(attempt);
                    warn!(
                        label,
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_retryable() {
                        warn!(label, attempts, error = %err, "retry budget exhausted");
                    }
                    return Err(err);
                }
            }
        }
    }
}
