// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./ringlane.toml` > `~/.config/ringlane/ringlane.toml` >
//! `/etc/ringlane/ringlane.toml`, with environment variable overrides via `RINGLANE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::RinglaneConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/ringlane/ringlane.toml`
/// 3. `~/.config/ringlane/ringlane.toml`
/// 4. `./ringlane.toml`
/// 5. `RINGLANE_*` environment variables
pub fn load_config() -> Result<RinglaneConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string on top of the defaults (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<RinglaneConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RinglaneConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<RinglaneConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RinglaneConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(RinglaneConfig::default()))
        .merge(Toml::file("/etc/ringlane/ringlane.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("ringlane/ringlane.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("ringlane.toml"))
        .merge(env_provider())
}

/// Environment provider mapping `RINGLANE_<SECTION>_<KEY>` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` so that underscore-containing
/// keys survive: `RINGLANE_SESSION_CALL_DURATION_SECS` must become
/// `session.call_duration_secs`, not `session.call.duration.secs`.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("RINGLANE_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 4] = ["dialer", "session", "dispatch", "storage"];
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(
            map_env_key("session_call_duration_secs"),
            "session.call_duration_secs"
        );
        assert_eq!(map_env_key("dialer_log_level"), "dialer.log_level");
        assert_eq!(map_env_key("storage_state_path"), "storage.state_path");
        assert_eq!(map_env_key("unrelated"), "unrelated");
    }

    #[test]
    fn env_overrides_are_applied() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("RINGLANE_SESSION_CALL_DURATION_SECS", "45");
            jail.set_env("RINGLANE_DISPATCH_RETRY_ATTEMPTS", "0");
            let config: RinglaneConfig = Figment::new()
                .merge(Serialized::defaults(RinglaneConfig::default()))
                .merge(env_provider())
                .extract()?;
            assert_eq!(config.session.call_duration_secs, 45);
            assert_eq!(config.dispatch.retry_attempts, 0);
            Ok(())
        });
    }
}
