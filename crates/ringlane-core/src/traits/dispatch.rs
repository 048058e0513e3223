// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatch adapter trait for telephony integrations.

use async_trait::async_trait;

use crate::error::DispatchError;
use crate::traits::adapter::PluginAdapter;
use crate::types::CallHandle;

/// Adapter that places outbound calls.
///
/// `place` only accepts or rejects the attempt. The call's outcome is
/// delivered later, at most once per handle and possibly never, as an
/// [`OutcomeEvent`](crate::types::OutcomeEvent) fed to the orchestrator.
#[async_trait]
pub trait DispatchAdapter: PluginAdapter {
    /// Places a call to an E.164 number.
    async fn place(&self, number: &str) -> Result<CallHandle, DispatchError>;
}
