// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixtures shared by the engine's unit tests.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use ringlane_core::{
    AdapterType, CallHandle, CallOutcome, Campaign, CampaignId, DispatchAdapter, DispatchError,
    EntryId, HealthStatus, OutcomeEvent, PersistenceAdapter, PluginAdapter, RinglaneError,
};
use ringlane_storage::MemoryStore;
use tokio::sync::mpsc;

use crate::{Orchestrator, SessionSettings};

/// Accepts every call with `call-N` handles, except numbers marked failing.
#[derive(Default)]
pub(crate) struct StubDispatcher {
    counter: AtomicUsize,
    failing: Mutex<HashSet<String>>,
    placed: Mutex<Vec<String>>,
}

impl StubDispatcher {
    pub(crate) fn fail_number(&self, number: &str) {
        self.failing.lock().unwrap().insert(number.to_string());
    }

    pub(crate) fn placed(&self) -> Vec<String> {
        self.placed.lock().unwrap().clone()
    }
}

#[async_trait]
impl PluginAdapter for StubDispatcher {
    fn name(&self) -> &str {
        "stub"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Dispatch
    }

    async fn health_check(&self) -> Result<HealthStatus, RinglaneError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RinglaneError> {
        Ok(())
    }
}

#[async_trait]
impl DispatchAdapter for StubDispatcher {
    async fn place(&self, number: &str) -> Result<CallHandle, DispatchError> {
        self.placed.lock().unwrap().push(number.to_string());
        if self.failing.lock().unwrap().contains(number) {
            return Err(DispatchError::Rejected("stub refuses this number".into()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(CallHandle(format!("call-{n}")))
    }
}

/// Takes `delay` to accept each call and records how many `place` calls
/// overlapped. Optionally reports an outcome before `place` returns.
pub(crate) struct SlowDispatcher {
    delay: Duration,
    early: Option<(mpsc::Sender<OutcomeEvent>, CallOutcome)>,
    counter: AtomicUsize,
    outstanding: AtomicUsize,
    max_outstanding: AtomicUsize,
}

impl SlowDispatcher {
    pub(crate) fn new(delay: Duration) -> Self {
        Self {
            delay,
            early: None,
            counter: AtomicUsize::new(0),
            outstanding: AtomicUsize::new(0),
            max_outstanding: AtomicUsize::new(0),
        }
    }

    /// Sends `outcome` for each handle before the `place` call returns it.
    pub(crate) fn reporting_early(
        delay: Duration,
        events: mpsc::Sender<OutcomeEvent>,
        outcome: CallOutcome,
    ) -> Self {
        Self {
            early: Some((events, outcome)),
            ..Self::new(delay)
        }
    }

    pub(crate) fn placed(&self) -> usize {
        self.counter.load(Ordering::SeqCst)
    }

    pub(crate) fn max_outstanding(&self) -> usize {
        self.max_outstanding.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PluginAdapter for SlowDispatcher {
    fn name(&self) -> &str {
        "slow"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Dispatch
    }

    async fn health_check(&self) -> Result<HealthStatus, RinglaneError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RinglaneError> {
        Ok(())
    }
}

#[async_trait]
impl DispatchAdapter for SlowDispatcher {
    async fn place(&self, _number: &str) -> Result<CallHandle, DispatchError> {
        let now = self.outstanding.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_outstanding.fetch_max(now, Ordering::SeqCst);
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = CallHandle(format!("slow-{n}"));

        if let Some((events, outcome)) = &self.early {
            let event = OutcomeEvent {
                handle: handle.clone(),
                outcome: *outcome,
                duration_secs: None,
            };
            events.send(event).await.expect("event pump is running");
        }
        tokio::time::sleep(self.delay).await;

        self.outstanding.fetch_sub(1, Ordering::SeqCst);
        Ok(handle)
    }
}

/// Memory store whose saves take `delay`.
pub(crate) struct SlowStore {
    inner: MemoryStore,
    delay: Duration,
}

impl SlowStore {
    pub(crate) fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryStore::new(),
            delay,
        }
    }

    /// Number of campaigns in the last saved set.
    pub(crate) async fn saved_campaigns(&self) -> usize {
        self.inner.snapshot().await.campaigns.len()
    }
}

#[async_trait]
impl PluginAdapter for SlowStore {
    fn name(&self) -> &str {
        "slow-memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Persistence
    }

    async fn health_check(&self) -> Result<HealthStatus, RinglaneError> {
        self.inner.health_check().await
    }

    async fn shutdown(&self) -> Result<(), RinglaneError> {
        Ok(())
    }
}

#[async_trait]
impl PersistenceAdapter for SlowStore {
    async fn load_campaigns(&self) -> Result<Vec<Campaign>, RinglaneError> {
        self.inner.load_campaigns().await
    }

    async fn save_campaigns(&self, campaigns: &[Campaign]) -> Result<(), RinglaneError> {
        tokio::time::sleep(self.delay).await;
        self.inner.save_campaigns(campaigns).await
    }

    async fn load_active_campaign_id(&self) -> Result<Option<CampaignId>, RinglaneError> {
        self.inner.load_active_campaign_id().await
    }

    async fn save_active_campaign_id(&self, id: Option<&CampaignId>) -> Result<(), RinglaneError> {
        tokio::time::sleep(self.delay).await;
        self.inner.save_active_campaign_id(id).await
    }
}

pub(crate) struct Fixture<D = StubDispatcher> {
    pub(crate) orchestrator: Orchestrator,
    pub(crate) dispatcher: Arc<D>,
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) campaign_id: CampaignId,
    pub(crate) entries: Vec<EntryId>,
}

pub(crate) fn settings(call_secs: u64, ring_secs: Option<u64>) -> SessionSettings {
    SessionSettings {
        call_duration: Duration::from_secs(call_secs),
        ring_timeout: ring_secs.map(Duration::from_secs),
    }
}

/// One active campaign holding `numbers`, all pending.
pub(crate) fn fixture(numbers: &[&str]) -> Fixture {
    fixture_with(numbers, settings(5, None))
}

pub(crate) fn fixture_with(numbers: &[&str], settings: SessionSettings) -> Fixture {
    fixture_using(numbers, settings, Arc::new(StubDispatcher::default()))
}

pub(crate) fn fixture_using<D: DispatchAdapter>(
    numbers: &[&str],
    settings: SessionSettings,
    dispatcher: Arc<D>,
) -> Fixture<D> {
    let campaign = Campaign::with_entries(
        "fixture",
        None,
        numbers.iter().map(|n| (n.to_string(), None)),
    );
    let campaign_id = campaign.id.clone();
    let entries = campaign.entries.iter().map(|e| e.id.clone()).collect();

    let store = Arc::new(MemoryStore::new());
    let orchestrator = Orchestrator::new(
        dispatcher.clone(),
        store.clone(),
        settings,
        vec![campaign],
        Some(campaign_id.clone()),
    );

    Fixture {
        orchestrator,
        dispatcher,
        store,
        campaign_id,
        entries,
    }
}

impl<D> Fixture<D> {
    pub(crate) async fn status(&self, index: usize) -> ringlane_core::EntryStatus {
        self.entry(index).await.status
    }

    pub(crate) async fn entry(&self, index: usize) -> ringlane_core::EntryRecord {
        let view = self
            .orchestrator
            .campaign(&self.campaign_id)
            .await
            .expect("fixture campaign exists");
        view.campaign
            .entry(&self.entries[index])
            .cloned()
            .expect("fixture entry exists")
    }
}
