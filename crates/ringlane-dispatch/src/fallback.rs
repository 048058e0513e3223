// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Try-primary-else-secondary dispatch.

use std::sync::Arc;

use async_trait::async_trait;
use ringlane_core::{
    AdapterType, CallHandle, DispatchAdapter, DispatchError, HealthStatus, PluginAdapter,
    RinglaneError,
};
use tracing::{debug, warn};

/// Places a call through `primary`, falling back to `secondary` on any error.
///
/// When both fail the result is [`DispatchError::Exhausted`] carrying both
/// causes, and the orchestrator finalizes the entry as failed.
pub struct FallbackDispatcher {
    primary: Arc<dyn DispatchAdapter>,
    secondary: Arc<dyn DispatchAdapter>,
}

impl FallbackDispatcher {
    pub fn new(primary: Arc<dyn DispatchAdapter>, secondary: Arc<dyn DispatchAdapter>) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl PluginAdapter for FallbackDispatcher {
    fn name(&self) -> &str {
        "fallback"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Dispatch
    }

    /// Healthy while the primary is; degraded while only the fallback is.
    async fn health_check(&self) -> Result<HealthStatus, RinglaneError> {
        let primary = self.primary.health_check().await?;
        if primary == HealthStatus::Healthy {
            return Ok(HealthStatus::Healthy);
        }
        match self.secondary.health_check().await? {
            HealthStatus::Unhealthy(reason) => Ok(HealthStatus::Unhealthy(format!(
                "{} and {} unavailable: {reason}",
                self.primary.name(),
                self.secondary.name()
            ))),
            _ => Ok(HealthStatus::Degraded(format!(
                "{} unavailable, using {}",
                self.primary.name(),
                self.secondary.name()
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), RinglaneError> {
        let primary = self.primary.shutdown().await;
        self.secondary.shutdown().await?;
        primary
    }
}

#[async_trait]
impl DispatchAdapter for FallbackDispatcher {
    async fn place(&self, number: &str) -> Result<CallHandle, DispatchError> {
        let primary_err = match self.primary.place(number).await {
            Ok(handle) => {
                debug!(strategy = self.primary.name(), handle = %handle, "call placed");
                return Ok(handle);
            }
            Err(e) => e,
        };

        warn!(
            strategy = self.primary.name(),
            fallback = self.secondary.name(),
            error = %primary_err,
            "primary dispatch failed, falling back"
        );

        match self.secondary.place(number).await {
            Ok(handle) => {
                debug!(strategy = self.secondary.name(), handle = %handle, "call placed");
                Ok(handle)
            }
            Err(secondary_err) => Err(DispatchError::Exhausted {
                primary: Box::new(primary_err),
                secondary: Box::new(secondary_err),
            }),
        }
    }
}
