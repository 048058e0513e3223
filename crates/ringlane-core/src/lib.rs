// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Ringlane dialer.
//!
//! This crate provides the port traits, error types, and campaign data model
//! shared by the engine and its adapters. Dispatch and persistence adapters
//! implement the traits defined here.

pub mod campaign;
pub mod error;
pub mod phone;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use campaign::{Campaign, CampaignMetrics, EntryRecord};
pub use error::{DispatchError, RinglaneError};
pub use phone::normalize_e164;
pub use types::{
    AdapterType, CallHandle, CallOutcome, CampaignId, EntryId, EntryStatus, HealthStatus,
    OutcomeEvent,
};

pub use traits::{DispatchAdapter, PersistenceAdapter, PluginAdapter};
