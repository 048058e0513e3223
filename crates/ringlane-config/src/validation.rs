// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-zero durations and a parseable caller id.

use crate::diagnostic::ConfigError;
use crate::model::RinglaneConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &RinglaneConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.dialer.log_level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "dialer.log_level `{}` is not one of {}",
                config.dialer.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.session.call_duration_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "session.call_duration_secs must be at least 1".to_string(),
        });
    }

    if config.session.ring_timeout_secs == Some(0) {
        errors.push(ConfigError::Validation {
            message: "session.ring_timeout_secs must be at least 1 when set".to_string(),
        });
    }

    if config.dispatch.retry_attempts > 0 && config.dispatch.retry_delay_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "dispatch.retry_delay_secs must be at least 1 when retries are enabled"
                .to_string(),
        });
    }

    if let Some(from) = config.dispatch.from_number.as_deref() {
        if ringlane_core::normalize_e164(from).is_err() {
            errors.push(ConfigError::Validation {
                message: format!("dispatch.from_number `{from}` is not a valid phone number"),
            });
        }
    }

    if config.storage.state_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.state_path must not be empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
