//! Ledger client abstraction and the retry policy shared by its RPC calls.
use log::debug;
use std::{fmt::Display, future::Future, time::Duration};

use crate::constants::{
    DEFAULT_PROVIDER_MAX_RETRIES, DEFAULT_PROVIDER_RETRY_BASE_DELAY_MS,
    DEFAULT_PROVIDER_RETRY_MAX_DELAY_MS,
};

pub mod solana;
pub use solana::*;

/// Exponential backoff settings for transient RPC failures.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl RetryConfig {
    pub fn new(max_retries: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay_ms,
            max_delay_ms,
        }
    }

    /// Delay before retry number `attempt` (zero-based), capped at `max_delay_ms`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let delay = self.base_delay_ms.saturating_mul(factor);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_PROVIDER_MAX_RETRIES,
            DEFAULT_PROVIDER_RETRY_BASE_DELAY_MS,
            DEFAULT_PROVIDER_RETRY_MAX_DELAY_MS,
        )
    }
}

/// Runs `operation` until it succeeds, fails with a non-retriable error, or
/// exhausts `config.max_retries`.
pub async fn retry_rpc_call<T, E, F, Fut, R>(
    operation_name: &str,
    config: &RetryConfig,
    is_retriable: R,
    operation: F,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: Display,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < config.max_retries && is_retriable(&e) => {
                let delay = config.delay_for_attempt(attempt);
                debug!(
                    "RPC operation '{}' failed (attempt {}): {}. Retrying in {:?}",
                    operation_name,
                    attempt + 1,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
