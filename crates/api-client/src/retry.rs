//! Bounded retry for idempotent reads.
//!
//! Only recoverable failures (no response, rate limiting, 503/504) are
//! retried, and only reads go through here: writes surface their failure to
//! the caller on the first attempt.

use entrega_core::{ApiError, ApiResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, the first one included.
    pub max_attempts: usize,
    /// Delay before the first retry; doubles each attempt.
    pub base_delay: Duration,
    /// Ceiling for any single delay, server-requested waits included.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }
}

pub(crate) async fn retry_read<F, Fut, T>(config: &RetryConfig, operation: F) -> ApiResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_recoverable() && attempt < config.max_attempts => {
                let delay = delay_for(config, attempt, &error);
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "recoverable failure, retrying read"
                );
                sleep(delay).await;
            }
            Err(error) => return Err(error),
        }
    }
}

fn delay_for(config: &RetryConfig, attempt: usize, error: &ApiError) -> Duration {
    if let Some(seconds) = error.retry_after_seconds() {
        return Duration::from_secs(seconds).min(config.max_delay);
    }
    config
        .base_delay
        .saturating_mul(1u32 << (attempt - 1).min(16))
        .min(config.max_delay)
}
