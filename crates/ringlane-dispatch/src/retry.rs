// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded exponential-backoff retries for a single dispatch strategy.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ringlane_config::model::DispatchConfig;
use ringlane_core::{
    AdapterType, CallHandle, DispatchAdapter, DispatchError, HealthStatus, PluginAdapter,
    RinglaneError,
};
use tokio::time::sleep;
use tracing::{info, warn};

/// How many times to retry and how long to wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u8,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u8, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn max_retries(&self) -> u8 {
        self.max_retries
    }

    /// `attempt` is zero-based: the first failure is attempt 0.
    pub fn should_retry(&self, attempt: u8, error: &DispatchError) -> bool {
        attempt < self.max_retries && error.is_retryable()
    }

    /// Delay before retry number `attempt + 1`: `base * 2^attempt`.
    pub fn delay_for(&self, attempt: u8) -> Duration {
        let multiplier = 2u32.saturating_pow(u32::from(attempt));
        self.base_delay.saturating_mul(multiplier)
    }
}

impl From<&DispatchConfig> for RetryPolicy {
    fn from(config: &DispatchConfig) -> Self {
        Self::new(config.retry_attempts, config.retry_delay())
    }
}

/// Wraps one strategy and retries its retryable failures.
pub struct RetryingDispatcher {
    inner: Arc<dyn DispatchAdapter>,
    policy: RetryPolicy,
}

impl RetryingDispatcher {
    pub fn new(inner: Arc<dyn DispatchAdapter>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl PluginAdapter for RetryingDispatcher {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn version(&self) -> semver::Version {
        self.inner.version()
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Dispatch
    }

    async fn health_check(&self) -> Result<HealthStatus, RinglaneError> {
        self.inner.health_check().await
    }

    async fn shutdown(&self) -> Result<(), RinglaneError> {
        self.inner.shutdown().await
    }
}

#[async_trait]
impl DispatchAdapter for RetryingDispatcher {
    async fn place(&self, number: &str) -> Result<CallHandle, DispatchError> {
        let mut attempt = 0u8;
        loop {
            match self.inner.place(number).await {
                Ok(handle) => return Ok(handle),
                Err(e) if self.policy.should_retry(attempt, &e) => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        strategy = self.inner.name(),
                        attempt = attempt + 1,
                        max_attempts = self.policy.max_retries + 1,
                        error = %e,
                        "dispatch attempt failed"
                    );
                    info!(
                        strategy = self.inner.name(),
                        delay_secs = delay.as_secs(),
                        "retrying dispatch"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
