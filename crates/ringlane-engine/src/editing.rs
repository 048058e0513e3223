// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign and entry list editing.
//!
//! Edits share the orchestrator's mutation lock, so they can run at any time,
//! including mid-session. Every edit is persisted before the call returns.

use ringlane_core::{Campaign, CampaignId, EntryId, EntryStatus, RinglaneError};
use tracing::info;

use crate::orchestrator::Orchestrator;

impl Orchestrator {
    /// Creates an empty campaign.
    pub async fn create_campaign(
        &self,
        name: impl Into<String>,
        description: Option<String>,
    ) -> CampaignId {
        let campaign = Campaign::new(name, description);
        let id = campaign.id.clone();

        let save = {
            let mut st = self.lock().await;
            info!(campaign = %id, name = %campaign.name, "campaign created");
            st.campaigns.push(campaign);
            st.save_campaigns()
        };
        self.write(save).await;
        id
    }

    /// Deletes a campaign. Deleting the active campaign stops the session.
    pub async fn delete_campaign(&self, id: &CampaignId) -> Result<(), RinglaneError> {
        let (campaigns, active) = {
            let mut st = self.lock().await;
            let index = st
                .campaigns
                .iter()
                .position(|c| &c.id == id)
                .ok_or_else(|| RinglaneError::campaign_not_found(id.as_str()))?;

            let was_active = st.session.active.as_ref() == Some(id);
            if was_active {
                st.session.stop();
                st.session.active = None;
                st.timer.disarm();
            }
            st.campaigns.remove(index);
            st.handles.retain(|_, (campaign_id, _)| campaign_id != id);
            info!(campaign = %id, was_active, "campaign deleted");

            let campaigns = st.save_campaigns();
            (campaigns, was_active.then(|| st.save_active()))
        };

        self.write(campaigns).await;
        if let Some(active) = active {
            self.write(active).await;
        }
        Ok(())
    }

    /// Appends one pending entry. The number is normalized when it is dialed.
    pub async fn add_entry(
        &self,
        campaign_id: &CampaignId,
        number: impl Into<String>,
        display_name: Option<String>,
    ) -> Result<EntryId, RinglaneError> {
        let (entry_id, save) = {
            let mut st = self.lock().await;
            let campaign = st
                .campaign_mut(campaign_id)
                .ok_or_else(|| RinglaneError::campaign_not_found(campaign_id.as_str()))?;
            let entry_id = campaign.push_entry(number, display_name);
            info!(campaign = %campaign_id, entry = %entry_id, "entry added");
            (entry_id, st.save_campaigns())
        };
        self.write(save).await;
        Ok(entry_id)
    }

    /// Appends a batch of pending entries with a single save.
    pub async fn import_entries<I, S>(
        &self,
        campaign_id: &CampaignId,
        entries: I,
    ) -> Result<Vec<EntryId>, RinglaneError>
    where
        I: IntoIterator<Item = (S, Option<String>)>,
        S: Into<String>,
    {
        let (ids, save) = {
            let mut st = self.lock().await;
            let campaign = st
                .campaign_mut(campaign_id)
                .ok_or_else(|| RinglaneError::campaign_not_found(campaign_id.as_str()))?;
            let ids: Vec<EntryId> = entries
                .into_iter()
                .map(|(number, display_name)| campaign.push_entry(number, display_name))
                .collect();
            info!(campaign = %campaign_id, count = ids.len(), "entries imported");
            (ids, st.save_campaigns())
        };
        self.write(save).await;
        Ok(ids)
    }

    /// Removes an entry that is not in flight.
    pub async fn remove_entry(
        &self,
        campaign_id: &CampaignId,
        entry_id: &EntryId,
    ) -> Result<(), RinglaneError> {
        let save = {
            let mut st = self.lock().await;
            let campaign = st
                .campaign_mut(campaign_id)
                .ok_or_else(|| RinglaneError::campaign_not_found(campaign_id.as_str()))?;
            let status = campaign
                .entry(entry_id)
                .map(|e| e.status)
                .ok_or_else(|| RinglaneError::entry_not_found(entry_id.as_str()))?;
            if status == EntryStatus::InProgress {
                return Err(RinglaneError::InvalidState(format!(
                    "entry {entry_id} is in flight and cannot be removed"
                )));
            }

            campaign.remove_entry(entry_id);
            st.handles.retain(|_, (_, e)| e != entry_id);
            info!(campaign = %campaign_id, entry = %entry_id, "entry removed");
            st.save_campaigns()
        };
        self.write(save).await;
        Ok(())
    }
}
