// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Ringlane dialer.
//!
//! TOML files are layered over compiled defaults, overridden by `RINGLANE_*`
//! environment variables, rejected on unknown keys, and validated
//! semantically. Failures come back as miette diagnostics.
//!
//! ```no_run
//! let config = ringlane_config::load_and_validate().expect("config errors");
//! println!("call duration: {}s", config.session.call_duration_secs);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::{Path, PathBuf};

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::RinglaneConfig;

/// Load configuration from the XDG hierarchy and validate it.
pub fn load_and_validate() -> Result<RinglaneConfig, Vec<ConfigError>> {
    finish(loader::load_config(), collect_toml_sources)
}

/// Load configuration from an explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<RinglaneConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        read_source(path).into_iter().collect()
    })
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<RinglaneConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

fn finish(
    loaded: Result<RinglaneConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<RinglaneConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Read every config file that exists, keyed by the path figment reports.
fn collect_toml_sources() -> Vec<(String, String)> {
    let local = std::env::current_dir()
        .map(|d| d.join("ringlane.toml"))
        .unwrap_or_else(|_| PathBuf::from("ringlane.toml"));
    let user = dirs::config_dir().map(|d| d.join("ringlane/ringlane.toml"));
    let system = Some(PathBuf::from("/etc/ringlane/ringlane.toml"));

    [Some(local), user, system]
        .into_iter()
        .flatten()
        .filter_map(|path| read_source(&path))
        .collect()
}

fn read_source(path: &Path) -> Option<(String, String)> {
    std::fs::read_to_string(path)
        .ok()
        .map(|content| (path.display().to_string(), content))
}
