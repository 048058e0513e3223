// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence adapter trait for campaign and session storage.

use async_trait::async_trait;

use crate::campaign::Campaign;
use crate::error::RinglaneError;
use crate::traits::adapter::PluginAdapter;
use crate::types::CampaignId;

/// Adapter for persisting the campaign set and the active campaign reference.
///
/// The orchestrator calls `save_campaigns` after every campaign or entry
/// mutation and `save_active_campaign_id` whenever the active reference
/// changes. Implementations always receive the full current snapshot.
#[async_trait]
pub trait PersistenceAdapter: PluginAdapter {
    async fn load_campaigns(&self) -> Result<Vec<Campaign>, RinglaneError>;

    async fn save_campaigns(&self, campaigns: &[Campaign]) -> Result<(), RinglaneError>;

    async fn load_active_campaign_id(&self) -> Result<Option<CampaignId>, RinglaneError>;

    async fn save_active_campaign_id(&self, id: Option<&CampaignId>) -> Result<(), RinglaneError>;
}
