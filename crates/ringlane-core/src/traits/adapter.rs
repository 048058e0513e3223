// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity and lifecycle shared by every port implementation.

use async_trait::async_trait;

use crate::error::RinglaneError;
use crate::types::{AdapterType, HealthStatus};

/// Common surface of dispatch and persistence adapters.
///
/// Decorators such as the retry and fallback dispatchers forward these calls
/// to the adapters they wrap.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Name used in logs, e.g. `"primary"` or `"json-file"`.
    fn name(&self) -> &str;

    fn version(&self) -> semver::Version;

    /// Which port this adapter fills.
    fn adapter_type(&self) -> AdapterType;

    /// Reports whether the adapter can currently do its job.
    async fn health_check(&self) -> Result<HealthStatus, RinglaneError>;

    /// Releases held resources. Called once, from `Orchestrator::shutdown`.
    async fn shutdown(&self) -> Result<(), RinglaneError>;
}
