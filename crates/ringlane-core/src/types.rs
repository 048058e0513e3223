// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Ringlane engine.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(pub String);

/// Unique identifier for an entry record. Never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub String);

/// Opaque handle returned by a dispatcher for one accepted call attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallHandle(pub String);

impl CampaignId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl EntryId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl CallHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CallHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Call state of a single entry record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntryStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Declined,
}

impl EntryStatus {
    /// Terminal statuses never transition again automatically.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            EntryStatus::Completed | EntryStatus::Failed | EntryStatus::Declined
        )
    }
}

/// Outcome reported asynchronously by a dispatcher for a call handle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CallOutcome {
    /// The callee picked up. Starts the bounded phase of the session timer.
    Answered,
    Completed,
    Busy,
    NoAnswer,
    Canceled,
    Failed,
}

impl CallOutcome {
    /// Maps the outcome onto the entry status it finalizes, if any.
    ///
    /// `Answered` is a timer signal and maps to `None`.
    pub fn entry_status(self) -> Option<EntryStatus> {
        match self {
            CallOutcome::Answered => None,
            CallOutcome::Completed => Some(EntryStatus::Completed),
            CallOutcome::Busy | CallOutcome::NoAnswer | CallOutcome::Canceled => {
                Some(EntryStatus::Declined)
            }
            CallOutcome::Failed => Some(EntryStatus::Failed),
        }
    }
}

/// A dispatcher callback, decoupled from any wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeEvent {
    pub handle: CallHandle,
    pub outcome: CallOutcome,
    /// Call length as measured by the dispatcher, when it reports one.
    #[serde(default)]
    pub duration_secs: Option<u64>,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Dispatch,
    Persistence,
}
