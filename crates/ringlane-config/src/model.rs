// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Ringlane dialer.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Ringlane configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RinglaneConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub dialer: DialerConfig,

    /// Per-call session timing.
    #[serde(default)]
    pub session: SessionConfig,

    /// Dispatch retry policy.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Persistence settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Process identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DialerConfig {
    /// Display name used in logs.
    #[serde(default = "default_dialer_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for DialerConfig {
    fn default() -> Self {
        Self {
            name: default_dialer_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_dialer_name() -> String {
    "ringlane".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Session timer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Seconds an answered call may run before it is completed automatically.
    #[serde(default = "default_call_duration_secs")]
    pub call_duration_secs: u64,

    /// Seconds to wait for an answer before the entry is declined.
    /// `None` waits indefinitely for the dispatcher.
    #[serde(default)]
    pub ring_timeout_secs: Option<u64>,
}

impl SessionConfig {
    pub fn call_duration(&self) -> Duration {
        Duration::from_secs(self.call_duration_secs)
    }

    pub fn ring_timeout(&self) -> Option<Duration> {
        self.ring_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            call_duration_secs: default_call_duration_secs(),
            ring_timeout_secs: None,
        }
    }
}

fn default_call_duration_secs() -> u64 {
    30
}

/// Dispatch retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Extra attempts for retryable dispatch errors, per strategy.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u8,

    /// Base delay before the first retry; doubles on each further retry.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Caller id presented to callees. `None` leaves it to the dispatcher.
    #[serde(default)]
    pub from_number: Option<String>,
}

impl DispatchConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            retry_attempts: default_retry_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
            from_number: None,
        }
    }
}

fn default_retry_attempts() -> u8 {
    2
}

fn default_retry_delay_secs() -> u64 {
    60
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the JSON state file holding campaigns and the active campaign.
    #[serde(default = "default_state_path")]
    pub state_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
        }
    }
}

fn default_state_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("ringlane").join("state.json"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "ringlane-state.json".to_string())
}
