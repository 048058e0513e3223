// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ringlane status` command implementation.
//!
//! Reads the state file directly and prints every campaign with its
//! progress. Nothing is repaired or written.

use std::io::IsTerminal;

use ringlane_config::model::RinglaneConfig;
use ringlane_core::{Campaign, CampaignId, PersistenceAdapter, RinglaneError};
use ringlane_storage::JsonFileStore;
use serde::Serialize;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub state_path: String,
    pub active_campaign_id: Option<CampaignId>,
    pub campaigns: Vec<CampaignStatus>,
}

#[derive(Debug, Serialize)]
pub struct CampaignStatus {
    pub id: CampaignId,
    pub name: String,
    pub active: bool,
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub remaining: usize,
    pub in_progress: usize,
    pub progress_percent: u8,
}

impl CampaignStatus {
    fn new(campaign: &Campaign, active: Option<&CampaignId>) -> Self {
        let metrics = campaign.metrics();
        Self {
            id: campaign.id.clone(),
            name: campaign.name.clone(),
            active: active == Some(&campaign.id),
            total: metrics.total,
            completed: metrics.completed,
            failed: metrics.failed,
            remaining: metrics.remaining,
            in_progress: metrics.in_progress,
            progress_percent: metrics.progress_percent(),
        }
    }
}

/// Run the `ringlane status` command.
pub async fn run_status(
    config: &RinglaneConfig,
    json: bool,
    plain: bool,
) -> Result<(), RinglaneError> {
    let store = JsonFileStore::from_config(&config.storage);
    let campaigns = store.load_campaigns().await?;
    let active = store.load_active_campaign_id().await?;

    let response = StatusResponse {
        state_path: config.storage.state_path.clone(),
        campaigns: campaigns
            .iter()
            .map(|c| CampaignStatus::new(c, active.as_ref()))
            .collect(),
        active_campaign_id: active,
    };

    if json {
        let rendered = serde_json::to_string_pretty(&response)
            .map_err(|e| RinglaneError::Internal(format!("failed to render status: {e}")))?;
        println!("{rendered}");
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print_status(&response, use_color);
    }
    Ok(())
}

fn print_status(response: &StatusResponse, use_color: bool) {
    println!("state file: {}", response.state_path);
    if response.campaigns.is_empty() {
        println!("no campaigns");
        return;
    }

    for campaign in &response.campaigns {
        let marker = if campaign.active { "*" } else { " " };
        let line = format!(
            "{marker} {name}  {done}/{total} done ({pct}%)  completed={completed} failed={failed} remaining={remaining}",
            name = campaign.name,
            done = campaign.completed + campaign.failed,
            total = campaign.total,
            pct = campaign.progress_percent,
            completed = campaign.completed,
            failed = campaign.failed,
            remaining = campaign.remaining,
        );
        if use_color && campaign.active {
            use colored::Colorize;
            println!("{}", line.green());
        } else {
            println!("{line}");
        }
        println!("    id: {}", campaign.id);
    }
}
