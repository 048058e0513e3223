// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ringlane - an outbound call campaign dialer.
//!
//! This is the binary entry point.

mod carrier;
mod simulate;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ringlane_config::RinglaneConfig;

/// Ringlane - an outbound call campaign dialer.
#[derive(Parser, Debug)]
#[command(name = "ringlane", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Show campaigns and their progress from the state file.
    Status {
        /// Output JSON for scripting.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
    /// Inspect the effective configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Dial a campaign against a simulated carrier.
    Simulate(simulate::SimulateArgs),
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the merged configuration as TOML.
    Show,
    /// Validate the configuration and exit.
    Validate,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match cli.config.as_deref() {
        Some(path) => ringlane_config::load_and_validate_path(path),
        None => ringlane_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            ringlane_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.dialer.log_level);

    let result = match cli.command {
        Some(Commands::Status { json, plain }) => status::run_status(&config, json, plain).await,
        Some(Commands::Config { action }) => {
            run_config(&config, action);
            Ok(())
        }
        Some(Commands::Simulate(args)) => simulate::run_simulate(&config, args).await,
        None => {
            println!("ringlane: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run_config(config: &RinglaneConfig, action: ConfigAction) {
    match action {
        ConfigAction::Show => match toml::to_string_pretty(config) {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => eprintln!("error: could not render configuration: {e}"),
        },
        ConfigAction::Validate => println!("ringlane: configuration is valid"),
    }
}

/// Initialize the tracing subscriber. `RUST_LOG` takes precedence over `log_level`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ringlane={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
