// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ringlane simulate`: dial a campaign end to end against the simulated carrier.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use colored::Colorize;
use ringlane_config::RinglaneConfig;
use ringlane_core::{CampaignId, PersistenceAdapter, RinglaneError};
use ringlane_dispatch::{RetryPolicy, retrying_fallback};
use ringlane_engine::{Orchestrator, SessionSettings, StartOutcome};
use ringlane_storage::{JsonFileStore, MemoryStore};
use tokio::sync::mpsc;
use tracing::info;

use crate::carrier::{Route, SimulatedCarrier};

const EVENT_BUFFER: usize = 64;
const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Number to add to the campaign. Repeat for several.
    #[arg(long = "number", value_name = "E164")]
    pub numbers: Vec<String>,

    /// Name of the campaign created for this run.
    #[arg(long, default_value = "simulation")]
    pub name: String,

    /// Dial an existing campaign from the state file instead of creating one.
    #[arg(long, value_name = "ID", conflicts_with = "numbers")]
    pub campaign: Option<String>,

    /// Override `session.call_duration_secs`.
    #[arg(long)]
    pub call_duration: Option<u64>,

    /// Keep state in memory; the state file is left untouched.
    #[arg(long)]
    pub in_memory: bool,
}

pub async fn run_simulate(config: &RinglaneConfig, args: SimulateArgs) -> Result<(), RinglaneError> {
    let cancel = ringlane_engine::shutdown::install_signal_handler();
    let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);

    let store: Arc<dyn PersistenceAdapter> = if args.in_memory {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(JsonFileStore::from_config(&config.storage))
    };

    let dispatcher = retrying_fallback(
        Arc::new(SimulatedCarrier::new(Route::Direct, events_tx.clone())),
        Arc::new(SimulatedCarrier::new(Route::Bridge, events_tx)),
        RetryPolicy::from(&config.dispatch),
    );

    let mut settings = SessionSettings::from(&config.session);
    if let Some(secs) = args.call_duration {
        settings.call_duration = Duration::from_secs(secs);
    }

    let orchestrator = Orchestrator::restore(Arc::new(dispatcher), store, settings).await?;

    let campaign_id = match args.campaign {
        Some(id) => CampaignId(id),
        None => {
            if args.numbers.is_empty() {
                return Err(RinglaneError::Config(
                    "simulate needs at least one --number or a --campaign".into(),
                ));
            }
            let id = orchestrator.create_campaign(args.name.clone(), None).await;
            orchestrator
                .import_entries(&id, args.numbers.iter().map(|n| (n.clone(), None::<String>)))
                .await?;
            id
        }
    };
    orchestrator.select_campaign(&campaign_id).await?;

    let pump = {
        let orchestrator = orchestrator.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { orchestrator.run_events(events_rx, cancel).await })
    };

    match orchestrator.start().await {
        StartOutcome::Started { entry_id } => info!(entry = %entry_id, "session started"),
        StartOutcome::Resumed => info!("session resumed"),
        StartOutcome::Exhausted => info!("every entry finalized before dialing"),
        StartOutcome::NotStarted(reason) => {
            println!("ringlane: session not started: {reason}");
        }
    }

    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("interrupted, stopping session");
                orchestrator.stop().await;
                break;
            }
            _ = ticker.tick() => {
                let snapshot = orchestrator.snapshot().await;
                if !snapshot.running && snapshot.current_entry.is_none() {
                    break;
                }
            }
        }
    }

    cancel.cancel();
    if let Err(e) = pump.await {
        tracing::warn!(error = %e, "event pump task failed");
    }
    orchestrator.shutdown().await?;

    print_summary(&orchestrator, &campaign_id).await
}

async fn print_summary(
    orchestrator: &Orchestrator,
    campaign_id: &CampaignId,
) -> Result<(), RinglaneError> {
    let view = orchestrator
        .campaign(campaign_id)
        .await
        .ok_or_else(|| RinglaneError::campaign_not_found(campaign_id.as_str()))?;

    println!(
        "{} {} ({})",
        "Campaign".bold(),
        view.campaign.name,
        view.campaign.id
    );
    for entry in &view.campaign.entries {
        let duration = entry
            .duration_secs
            .map(|s| format!("{s}s"))
            .unwrap_or_else(|| "-".into());
        println!("  {:<16} {:<12} {duration}", entry.number, entry.status.to_string());
    }
    let m = &view.metrics;
    println!(
        "  {} completed, {} failed, {} remaining of {} ({}%)",
        m.completed.to_string().green(),
        m.failed.to_string().red(),
        m.remaining,
        m.total,
        m.progress_percent()
    );
    Ok(())
}
