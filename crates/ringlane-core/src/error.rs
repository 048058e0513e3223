// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Ringlane dialer.
//!
//! Two channels are kept apart on purpose: [`RinglaneError`] is what callers of
//! the orchestrator see, while [`DispatchError`] never leaves the engine. A
//! dispatch failure is converted into an Entry finalized as `failed`.

use thiserror::Error;

/// The primary error type returned by adapter traits and orchestrator operations.
#[derive(Debug, Error)]
pub enum RinglaneError {
    /// A campaign, entry, or call handle id does not exist in current state.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The operation would break a session invariant.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A dispatch attempt failed outright.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Persistence backend errors (I/O, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RinglaneError {
    /// Shorthand for a missing campaign.
    pub fn campaign_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "campaign",
            id: id.into(),
        }
    }

    /// Shorthand for a missing entry.
    pub fn entry_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "entry",
            id: id.into(),
        }
    }

    /// Shorthand for an unknown call handle.
    pub fn handle_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "call handle",
            id: id.into(),
        }
    }

    /// Returns true for the `NotFound` variant.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors raised by a Dispatch Port's `place` call itself.
///
/// These describe the attempt being rejected, not the outcome of a call
/// that was placed. Call outcomes arrive later as [`crate::types::CallOutcome`].
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid phone number `{0}`")]
    InvalidNumber(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("dispatch request timed out")]
    Timeout,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("dispatcher rejected credentials")]
    Unauthorized,

    #[error("dispatcher rejected the call: {0}")]
    Rejected(String),

    /// Both the primary and the fallback strategy failed.
    #[error("all dispatch strategies failed (primary: {primary}; fallback: {secondary})")]
    Exhausted {
        primary: Box<DispatchError>,
        secondary: Box<DispatchError>,
    },
}

impl DispatchError {
    /// Returns true if repeating the same attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DispatchError::Network(_) | DispatchError::Timeout | DispatchError::RateLimited
        )
    }
}
