//! Retry with exponential backoff for external capability calls.
//!
//! The original inline API calls had no failure handling; every network
//! call in this crate goes through [`retry`] with a bounded attempt
//! count and bounded delays, so no operation blocks indefinitely.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Errors that can distinguish transient from permanent failures.
pub trait Retryable {
    /// Whether retrying the operation could plausibly succeed.
    fn is_retryable(&self) -> bool;
}

/// Configuration for retry behavior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Base delay for exponential backoff.
    pub base_delay: Duration,
    /// Cap on any single backoff delay.
    pub max_delay: Duration,
    /// Multiplier applied per retry.
    pub backoff_multiplier: f64,
    /// Add ±25% jitter to avoid synchronized retries.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Disable retries entirely (single attempt).
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before retry `attempt` (1-indexed; attempt 0 is the first
    /// try and never waits).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let exponential = self.base_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32 - 1);
        let mut delay_ms = exponential.min(self.max_delay.as_millis() as f64) as u64;

        if self.jitter && delay_ms > 0 {
            // ±25%, seedable through fastrand for deterministic tests.
            let spread = delay_ms / 2;
            let low = delay_ms - delay_ms / 4;
            delay_ms = low + fastrand::u64(0..=spread);
        }

        Duration::from_millis(delay_ms)
    }
}

/// Run `operation` until it succeeds, fails permanently, or exhausts the
/// configured retries. Returns the last error on exhaustion.
pub async fn retry<T, E, F, Fut>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < config.max_retries => {
                attempt += 1;
                let delay = config.delay_for(attempt);
                warn!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "retrying after transient failure");
                sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
