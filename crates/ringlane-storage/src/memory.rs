// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process persistence.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use ringlane_core::{
    AdapterType, Campaign, CampaignId, HealthStatus, PersistenceAdapter, PluginAdapter,
    RinglaneError,
};
use tokio::sync::Mutex;

use crate::state::StateFile;

/// Persistence adapter backed by process memory.
///
/// Counts `save_campaigns` calls and can be told to fail saves, which lets
/// callers observe how often and how robustly they persist.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StateFile>,
    campaign_saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store, as if a previous process had saved this state.
    pub fn with_state(campaigns: Vec<Campaign>, active: Option<CampaignId>) -> Self {
        Self {
            state: Mutex::new(StateFile {
                active_campaign_id: active,
                campaigns,
                ..StateFile::default()
            }),
            ..Self::default()
        }
    }

    /// Number of successful `save_campaigns` calls so far.
    pub fn campaign_saves(&self) -> usize {
        self.campaign_saves.load(Ordering::SeqCst)
    }

    /// Make every subsequent save fail with a storage error.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Copy of the stored document.
    pub async fn snapshot(&self) -> StateFile {
        self.state.lock().await.clone()
    }

    fn check_writable(&self) -> Result<(), RinglaneError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(RinglaneError::Storage {
                source: "memory store is configured to fail saves".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Persistence
    }

    async fn health_check(&self) -> Result<HealthStatus, RinglaneError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Ok(HealthStatus::Degraded("saves are failing".into()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RinglaneError> {
        Ok(())
    }
}

#[async_trait]
impl PersistenceAdapter for MemoryStore {
    async fn load_campaigns(&self) -> Result<Vec<Campaign>, RinglaneError> {
        Ok(self.state.lock().await.campaigns.clone())
    }

    async fn save_campaigns(&self, campaigns: &[Campaign]) -> Result<(), RinglaneError> {
        self.check_writable()?;
        self.state.lock().await.campaigns = campaigns.to_vec();
        self.campaign_saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load_active_campaign_id(&self) -> Result<Option<CampaignId>, RinglaneError> {
        Ok(self.state.lock().await.active_campaign_id.clone())
    }

    async fn save_active_campaign_id(&self, id: Option<&CampaignId>) -> Result<(), RinglaneError> {
        self.check_writable()?;
        self.state.lock().await.active_campaign_id = id.cloned();
        Ok(())
    }
}
