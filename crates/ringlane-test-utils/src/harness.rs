// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the production stack (retrying primary and
//! fallback dispatchers, an orchestrator, a JSON state file in a temp
//! directory) with [`MockDispatcher`]s in place of the carrier.

use std::sync::Arc;

use ringlane_config::model::RinglaneConfig;
use ringlane_core::{
    CallHandle, CallOutcome, CampaignId, CampaignMetrics, EntryId, EntryRecord, EntryStatus,
    OutcomeEvent, RinglaneError, normalize_e164,
};
use ringlane_dispatch::{RetryPolicy, retrying_fallback};
use ringlane_engine::{Orchestrator, SessionSettings};
use ringlane_storage::JsonFileStore;
use tracing::debug;

use crate::mock_dispatcher::MockDispatcher;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    numbers: Vec<String>,
    config: RinglaneConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = RinglaneConfig::default();
        config.session.call_duration_secs = 5;
        Self {
            numbers: Vec::new(),
            config,
        }
    }

    /// Numbers of the active campaign, in dialing order.
    pub fn with_numbers<S: Into<String>>(mut self, numbers: impl IntoIterator<Item = S>) -> Self {
        self.numbers = numbers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_call_duration(mut self, secs: u64) -> Self {
        self.config.session.call_duration_secs = secs;
        self
    }

    pub fn with_ring_timeout(mut self, secs: u64) -> Self {
        self.config.session.ring_timeout_secs = Some(secs);
        self
    }

    pub fn with_retries(mut self, attempts: u8, delay_secs: u64) -> Self {
        self.config.dispatch.retry_attempts = attempts;
        self.config.dispatch.retry_delay_secs = delay_secs;
        self
    }

    /// Build the harness: temp state file, mocks, orchestrator, active campaign.
    pub async fn build(self) -> Result<TestHarness, RinglaneError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| RinglaneError::Storage { source: e.into() })?;
        let state_path = temp_dir.path().join("state.json");
        let store = Arc::new(JsonFileStore::new(&state_path));

        let primary = Arc::new(MockDispatcher::new("primary"));
        let secondary = Arc::new(MockDispatcher::new("fallback"));
        let dispatch = retrying_fallback(
            primary.clone(),
            secondary.clone(),
            RetryPolicy::from(&self.config.dispatch),
        );

        let orchestrator = Orchestrator::restore(
            Arc::new(dispatch),
            store.clone(),
            SessionSettings::from(&self.config.session),
        )
        .await?;

        let campaign_id = orchestrator.create_campaign("harness", None).await;
        let entries = orchestrator
            .import_entries(&campaign_id, self.numbers.iter().map(|n| (n.as_str(), None)))
            .await?;
        orchestrator.select_campaign(&campaign_id).await?;
        debug!(campaign = %campaign_id, entries = entries.len(), "test harness ready");

        Ok(TestHarness {
            orchestrator,
            primary,
            secondary,
            store,
            campaign_id,
            entries,
            config: self.config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock dispatchers and a temp state file.
pub struct TestHarness {
    pub orchestrator: Orchestrator,
    /// The primary dispatch strategy.
    pub primary: Arc<MockDispatcher>,
    /// The fallback dispatch strategy.
    pub secondary: Arc<MockDispatcher>,
    pub store: Arc<JsonFileStore>,
    pub campaign_id: CampaignId,
    /// Entry ids of the active campaign, in dialing order.
    pub entries: Vec<EntryId>,
    pub config: RinglaneConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    pub async fn entry(&self, index: usize) -> Result<EntryRecord, RinglaneError> {
        let id = &self.entries[index];
        self.orchestrator
            .campaign(&self.campaign_id)
            .await
            .and_then(|view| view.campaign.entry(id).cloned())
            .ok_or_else(|| RinglaneError::entry_not_found(id.as_str()))
    }

    pub async fn status(&self, index: usize) -> Result<EntryStatus, RinglaneError> {
        Ok(self.entry(index).await?.status)
    }

    pub async fn statuses(&self) -> Vec<EntryStatus> {
        self.orchestrator
            .campaign(&self.campaign_id)
            .await
            .map(|view| view.campaign.entries.iter().map(|e| e.status).collect())
            .unwrap_or_default()
    }

    pub async fn metrics(&self) -> Option<CampaignMetrics> {
        self.orchestrator
            .campaign(&self.campaign_id)
            .await
            .map(|view| view.metrics)
    }

    /// The handle the dispatch stack returned for entry `index`, from either strategy.
    pub async fn handle_for(&self, index: usize) -> Result<CallHandle, RinglaneError> {
        let entry = self.entry(index).await?;
        let number = normalize_e164(&entry.number)?;
        if let Some(handle) = self.primary.handle_for(&number).await {
            return Ok(handle);
        }
        self.secondary
            .handle_for(&number)
            .await
            .ok_or_else(|| RinglaneError::handle_not_found(format!("<entry {index}>")))
    }

    /// Deliver a dispatcher callback for entry `index`.
    pub async fn deliver(
        &self,
        index: usize,
        outcome: CallOutcome,
        duration_secs: Option<u64>,
    ) -> Result<(), RinglaneError> {
        let handle = self.handle_for(index).await?;
        self.orchestrator
            .on_outcome(OutcomeEvent {
                handle,
                outcome,
                duration_secs,
            })
            .await
    }
}
