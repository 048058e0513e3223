// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The campaign orchestrator.
//!
//! [`Orchestrator`] is a cheap cloneable handle over one shared state. Every
//! mutation runs under a single async mutex, which makes `report_outcome` the
//! one serialized point where entry statuses change and where the session
//! decides whether to advance. Dispatch Port calls happen outside the lock,
//! so `pause`, `stop` and observers are never blocked behind a slow carrier.
//!
//! Persistence is best-effort: save failures are logged and the in-memory
//! state stays authoritative. Saves are copies taken under the lock and
//! written after it is released; a sequence number keeps an older copy from
//! overwriting a newer one.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use ringlane_config::model::SessionConfig;
use ringlane_core::{
    CallHandle, Campaign, CampaignId, DispatchAdapter, EntryId, EntryRecord, EntryStatus,
    OutcomeEvent, PersistenceAdapter, RinglaneError, normalize_e164,
};
use tokio::sync::{Mutex, MutexGuard, mpsc};
use tracing::{debug, info, warn};

use crate::session::{
    CampaignView, NotStartedReason, Session, SessionSnapshot, SessionState, StartOutcome,
};
use crate::timer::{ExpiryKind, SessionTimer, TimerExpiry};

/// Outcomes held while a call is being placed, before its handle is known.
const EARLY_OUTCOME_LIMIT: usize = 16;

/// Timing knobs for the session timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Maximum length of an answered call before it is completed automatically.
    pub call_duration: Duration,
    /// Maximum time to wait for an answer. `None` waits for the dispatcher.
    pub ring_timeout: Option<Duration>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

impl From<&SessionConfig> for SessionSettings {
    fn from(config: &SessionConfig) -> Self {
        Self {
            call_duration: config.call_duration(),
            ring_timeout: config.ring_timeout(),
        }
    }
}

/// An entry that has been marked `in_progress` and still has to be dialed.
#[derive(Debug)]
pub(crate) struct Claim {
    pub(crate) campaign_id: CampaignId,
    pub(crate) entry_id: EntryId,
    /// E.164 form of the entry's number.
    pub(crate) number: String,
}

/// Everything guarded by the mutation lock.
pub(crate) struct State {
    pub(crate) campaigns: Vec<Campaign>,
    pub(crate) session: Session,
    pub(crate) timer: SessionTimer,
    /// Accepted call handles and the entry each one belongs to.
    pub(crate) handles: HashMap<CallHandle, (CampaignId, EntryId)>,
    /// Entry whose `place` call has not returned yet.
    pub(crate) dialing: Option<EntryId>,
    /// The current entry finalized while it was still being dialed; the next
    /// claim waits for that `place` call to return.
    pub(crate) advance_deferred: bool,
    /// Outcomes for handles `place` has not returned yet.
    pub(crate) early: Vec<OutcomeEvent>,
    pub(crate) save_seq: u64,
}

/// A copy of persisted state, written once the lock is released.
#[must_use]
pub(crate) enum PendingSave {
    Campaigns { seq: u64, campaigns: Vec<Campaign> },
    Active { seq: u64, active: Option<CampaignId> },
}

/// Sequence numbers of the last copies handed to the persistence port.
#[derive(Default)]
pub(crate) struct Written {
    campaigns: u64,
    active: u64,
}

impl State {
    pub(crate) fn campaign(&self, id: &CampaignId) -> Option<&Campaign> {
        self.campaigns.iter().find(|c| &c.id == id)
    }

    pub(crate) fn campaign_mut(&mut self, id: &CampaignId) -> Option<&mut Campaign> {
        self.campaigns.iter_mut().find(|c| &c.id == id)
    }

    pub(crate) fn active_campaign(&self) -> Option<&Campaign> {
        self.session.active.as_ref().and_then(|id| self.campaign(id))
    }

    /// Whether any entry of the active campaign is `in_progress`, attached or not.
    pub(crate) fn call_in_flight(&self) -> bool {
        self.session.current.is_some()
            || self.dialing.is_some()
            || self
                .active_campaign()
                .is_some_and(|c| c.in_progress().next().is_some())
    }

    /// Claims the next pending entry of the active campaign.
    ///
    /// Entries whose number cannot be normalized are finalized `failed` on the
    /// spot and skipped. When nothing is left the session returns to idle.
    /// The session timer is armed only once the dispatcher accepts the call.
    pub(crate) fn claim_next(&mut self) -> Option<Claim> {
        let Some(active) = self.session.active.clone() else {
            self.session.exhausted();
            return None;
        };
        let Some(campaign) = self.campaigns.iter_mut().find(|c| c.id == active) else {
            self.session.exhausted();
            return None;
        };

        loop {
            let Some(entry) = campaign
                .entries
                .iter_mut()
                .find(|e| e.status == EntryStatus::Pending)
            else {
                info!(campaign = %active, "no pending entries left, session idle");
                self.session.exhausted();
                return None;
            };

            let now = Utc::now();
            entry.mark_in_progress(now);
            match normalize_e164(&entry.number) {
                Ok(number) => {
                    let entry_id = entry.id.clone();
                    campaign.touch();
                    info!(campaign = %active, entry = %entry_id, "entry claimed");
                    self.session.current = Some(entry_id.clone());
                    self.dialing = Some(entry_id.clone());
                    return Some(Claim {
                        campaign_id: active,
                        entry_id,
                        number,
                    });
                }
                Err(e) => {
                    warn!(entry = %entry.id, error = %e, "cannot dial entry, marking failed");
                    entry.mark_terminal(EntryStatus::Failed, now, None);
                    campaign.touch();
                }
            }
        }
    }

    /// Applies a terminal status to an entry and decides what happens next.
    ///
    /// Returns the next claim when the finalized entry was the current one and
    /// the session is running.
    pub(crate) fn finalize(
        &mut self,
        campaign_id: &CampaignId,
        entry_id: &EntryId,
        status: EntryStatus,
        duration_secs: Option<u64>,
    ) -> Result<Option<Claim>, RinglaneError> {
        if !status.is_terminal() {
            return Err(RinglaneError::InvalidState(format!(
                "`{status}` is not a terminal status"
            )));
        }

        let timed = self.timer.elapsed_secs(entry_id);
        let campaign = self
            .campaigns
            .iter_mut()
            .find(|c| &c.id == campaign_id)
            .ok_or_else(|| RinglaneError::campaign_not_found(campaign_id.as_str()))?;
        let entry = campaign
            .entry_mut(entry_id)
            .ok_or_else(|| RinglaneError::entry_not_found(entry_id.as_str()))?;

        let previous = entry.status;
        let duration = duration_secs.or(timed);
        entry.mark_terminal(status, Utc::now(), duration);
        campaign.touch();
        self.timer.disarm_for(entry_id);

        if self.session.current.as_ref() != Some(entry_id) {
            info!(
                entry = %entry_id,
                %previous,
                %status,
                "stale outcome recorded without advancing"
            );
            return Ok(None);
        }

        info!(entry = %entry_id, %status, duration_secs = ?duration, "entry finalized");
        self.session.current = None;
        if !self.session.is_running() {
            debug!(state = %self.session.state, "session not running, not advancing");
            return Ok(None);
        }
        if self.dialing.is_some() {
            debug!(entry = %entry_id, "call still being placed, advancing once it returns");
            self.advance_deferred = true;
            return Ok(None);
        }
        Ok(self.claim_next())
    }

    /// Applies a dispatcher outcome to the entry its handle belongs to.
    ///
    /// `answered` moves the session timer into its bounded phase; every other
    /// outcome finalizes the entry.
    pub(crate) fn apply_outcome(
        &mut self,
        campaign_id: &CampaignId,
        entry_id: &EntryId,
        event: &OutcomeEvent,
    ) -> Result<Option<Claim>, RinglaneError> {
        let Some(status) = event.outcome.entry_status() else {
            if self.timer.answered(entry_id) {
                info!(entry = %entry_id, handle = %event.handle, "call answered");
            } else {
                debug!(entry = %entry_id, "answer signal for an entry without a ringing timer");
            }
            return Ok(None);
        };
        self.finalize(campaign_id, entry_id, status, event.duration_secs)
    }

    /// Holds an outcome whose handle is unknown while a call is being placed.
    ///
    /// Outside a `place` call, or once the buffer is full, the handle is
    /// reported as not found.
    pub(crate) fn hold_early(&mut self, event: OutcomeEvent) -> Result<(), RinglaneError> {
        if self.dialing.is_none() {
            return Err(RinglaneError::handle_not_found(event.handle.as_str()));
        }
        if self.early.len() >= EARLY_OUTCOME_LIMIT {
            warn!(handle = %event.handle, "too many outcomes held for unplaced calls");
            return Err(RinglaneError::handle_not_found(event.handle.as_str()));
        }
        debug!(handle = %event.handle, "outcome arrived before its call was accepted, holding it");
        self.early.push(event);
        Ok(())
    }

    /// Records an accepted call, arms the session timer and replays any
    /// outcomes that arrived before `place` returned.
    ///
    /// Returns the next claim, and whether an entry changed.
    fn accept(
        &mut self,
        claim: Claim,
        handle: CallHandle,
        early: Vec<OutcomeEvent>,
        settings: &SessionSettings,
    ) -> (Option<Claim>, bool) {
        let Claim {
            campaign_id,
            entry_id,
            ..
        } = claim;
        let Some(campaign) = self.campaign(&campaign_id) else {
            warn!(handle = %handle, "campaign deleted while dialing, dropping handle");
            return (None, false);
        };
        let in_flight = campaign
            .entry(&entry_id)
            .is_some_and(|e| e.status == EntryStatus::InProgress);

        info!(entry = %entry_id, handle = %handle, "call placed");
        self.handles
            .insert(handle.clone(), (campaign_id.clone(), entry_id.clone()));
        if in_flight {
            self.timer
                .arm(entry_id.clone(), settings.call_duration, settings.ring_timeout);
        }

        let mut next = None;
        let mut changed = false;
        for event in early {
            if event.handle != handle {
                debug!(handle = %event.handle, "dropping held outcome for an unknown handle");
                continue;
            }
            changed |= event.outcome.entry_status().is_some();
            match self.apply_outcome(&campaign_id, &entry_id, &event) {
                Ok(Some(claim)) => next = Some(claim),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "could not apply held outcome"),
            }
        }
        (next, changed)
    }

    pub(crate) fn save_campaigns(&mut self) -> PendingSave {
        self.save_seq += 1;
        PendingSave::Campaigns {
            seq: self.save_seq,
            campaigns: self.campaigns.clone(),
        }
    }

    pub(crate) fn save_active(&mut self) -> PendingSave {
        self.save_seq += 1;
        PendingSave::Active {
            seq: self.save_seq,
            active: self.session.active.clone(),
        }
    }

    /// Manual transition of a pending entry into `in_progress`.
    pub(crate) fn mark_in_flight(
        &mut self,
        campaign_id: &CampaignId,
        entry_id: &EntryId,
    ) -> Result<(), RinglaneError> {
        let busy = self.call_in_flight();
        let campaign = self
            .campaign_mut(campaign_id)
            .ok_or_else(|| RinglaneError::campaign_not_found(campaign_id.as_str()))?;
        let entry = campaign
            .entry_mut(entry_id)
            .ok_or_else(|| RinglaneError::entry_not_found(entry_id.as_str()))?;

        match entry.status {
            EntryStatus::InProgress => Ok(()),
            s if s.is_terminal() => Err(RinglaneError::InvalidState(format!(
                "entry {entry_id} is already {s}"
            ))),
            _ if busy => Err(RinglaneError::InvalidState(
                "another entry is already in flight".to_string(),
            )),
            _ => {
                entry.mark_in_progress(Utc::now());
                campaign.touch();
                Ok(())
            }
        }
    }

    /// Switches the active campaign, resetting the session to idle.
    fn select(&mut self, id: &CampaignId) -> Result<Option<PendingSave>, RinglaneError> {
        if self.campaign(id).is_none() {
            return Err(RinglaneError::campaign_not_found(id.as_str()));
        }
        if self.session.active.as_ref() == Some(id) {
            return Ok(None);
        }
        if self.session.is_running() {
            return Err(RinglaneError::InvalidState(
                "cannot switch campaigns while a session is running".to_string(),
            ));
        }
        if self.call_in_flight() {
            return Err(RinglaneError::InvalidState(
                "cannot switch campaigns while a call is in flight".to_string(),
            ));
        }

        self.session = Session::new(Some(id.clone()));
        info!(campaign = %id, "campaign selected");
        Ok(Some(self.save_active()))
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.session.state,
            running: self.session.is_running(),
            active_campaign_id: self.session.active.clone(),
            current_entry: self.current_entry(),
            timer_phase: self.timer.phase(),
        }
    }

    fn current_entry(&self) -> Option<EntryRecord> {
        let current = self.session.current.as_ref()?;
        self.active_campaign()?.entry(current).cloned()
    }
}

pub(crate) struct Inner {
    pub(crate) state: Mutex<State>,
    pub(crate) dispatch: Arc<dyn DispatchAdapter>,
    pub(crate) persistence: Arc<dyn PersistenceAdapter>,
    pub(crate) settings: SessionSettings,
    /// Held while a copy is written, so saves reach the port one at a time.
    pub(crate) written: Mutex<Written>,
}

/// Handle to the campaign orchestration engine.
///
/// Constructed once per process and cloned wherever it is needed. Both
/// constructors must run inside a tokio runtime: they spawn the task that
/// turns session timer expiries into outcomes.
#[derive(Clone)]
pub struct Orchestrator {
    pub(crate) inner: Arc<Inner>,
}

impl Orchestrator {
    /// Creates an orchestrator over already-loaded state.
    pub fn new(
        dispatch: Arc<dyn DispatchAdapter>,
        persistence: Arc<dyn PersistenceAdapter>,
        settings: SessionSettings,
        campaigns: Vec<Campaign>,
        active: Option<CampaignId>,
    ) -> Self {
        let (expiry_tx, expiry_rx) = mpsc::unbounded_channel();
        let inner = Arc::new(Inner {
            state: Mutex::new(State {
                campaigns,
                session: Session::new(active),
                timer: SessionTimer::new(expiry_tx),
                handles: HashMap::new(),
                dialing: None,
                advance_deferred: false,
                early: Vec::new(),
                save_seq: 0,
            }),
            dispatch,
            persistence,
            settings,
            written: Mutex::new(Written::default()),
        });
        spawn_expiry_listener(Arc::downgrade(&inner), expiry_rx);
        Self { inner }
    }

    /// Loads persisted state and repairs what a previous process left behind.
    ///
    /// Entries still `in_progress` were interrupted and are finalized `failed`.
    /// An active campaign id that no longer resolves is cleared. The session
    /// always comes back not running.
    pub async fn restore(
        dispatch: Arc<dyn DispatchAdapter>,
        persistence: Arc<dyn PersistenceAdapter>,
        settings: SessionSettings,
    ) -> Result<Self, RinglaneError> {
        let mut campaigns = persistence.load_campaigns().await?;
        let mut active = persistence.load_active_campaign_id().await?;

        let now = Utc::now();
        let mut interrupted = 0usize;
        for campaign in &mut campaigns {
            let mut touched = false;
            for entry in campaign
                .entries
                .iter_mut()
                .filter(|e| e.status == EntryStatus::InProgress)
            {
                entry.mark_terminal(EntryStatus::Failed, now, None);
                touched = true;
                interrupted += 1;
            }
            if touched {
                campaign.touch();
            }
        }
        if interrupted > 0 {
            warn!(count = interrupted, "interrupted calls from a previous run marked failed");
            if let Err(e) = persistence.save_campaigns(&campaigns).await {
                warn!(error = %e, "failed to persist repaired campaigns");
            }
        }

        if let Some(id) = active.as_ref() {
            if !campaigns.iter().any(|c| &c.id == id) {
                warn!(campaign = %id, "active campaign no longer exists, clearing");
                active = None;
                if let Err(e) = persistence.save_active_campaign_id(None).await {
                    warn!(error = %e, "failed to persist active campaign");
                }
            }
        }

        info!(
            campaigns = campaigns.len(),
            active = ?active.as_ref().map(CampaignId::as_str),
            "orchestrator restored"
        );
        Ok(Self::new(dispatch, persistence, settings, campaigns, active))
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().await
    }

    pub(crate) fn settings(&self) -> &SessionSettings {
        &self.inner.settings
    }

    // --- session control ---

    /// Makes `id` the active campaign.
    ///
    /// Rejected with `InvalidState` while a session is running or a call of
    /// the current campaign is still in flight.
    pub async fn select_campaign(&self, id: &CampaignId) -> Result<(), RinglaneError> {
        let save = {
            let mut st = self.lock().await;
            st.select(id)?
        };
        if let Some(save) = save {
            self.write(save).await;
        }
        Ok(())
    }


    /// Starts, or resumes, dialing the active campaign.
    ///
    /// Never fails: requests that cannot be honored return
    /// [`StartOutcome::NotStarted`] and change nothing.
    pub async fn start(&self) -> StartOutcome {
        let (claim, save) = {
            let mut st = self.lock().await;
            let refusal = if st.session.is_running() {
                Some(NotStartedReason::AlreadyRunning)
            } else if st.active_campaign().is_none() {
                Some(NotStartedReason::NoActiveCampaign)
            } else {
                None
            };
            if let Some(reason) = refusal {
                debug!(%reason, "start ignored");
                return StartOutcome::NotStarted(reason);
            }

            if st.session.current.is_some() {
                st.session.state = SessionState::Running;
                info!("session resumed");
                return StartOutcome::Resumed;
            }

            let refusal = match st.active_campaign() {
                _ if st.dialing.is_some() => Some(NotStartedReason::CallInFlight),
                Some(c) if c.in_progress().next().is_some() => Some(NotStartedReason::CallInFlight),
                Some(c) if !c.has_pending() => Some(NotStartedReason::NothingPending),
                _ => None,
            };
            if let Some(reason) = refusal {
                debug!(%reason, "start ignored");
                return StartOutcome::NotStarted(reason);
            }

            st.session.state = SessionState::Running;
            info!(campaign = ?st.session.active.as_ref().map(CampaignId::as_str), "session started");
            let claim = st.claim_next();
            (claim, st.save_campaigns())
        };
        self.write(save).await;

        match claim {
            Some(claim) => {
                let entry_id = claim.entry_id.clone();
                self.drive(claim).await;
                StartOutcome::Started { entry_id }
            }
            None => StartOutcome::Exhausted,
        }
    }

    /// Suspends advancement. The in-flight call and its timer continue.
    pub async fn pause(&self) {
        let mut st = self.lock().await;
        if st.session.is_running() {
            st.session.pause();
            info!("session paused");
        }
    }

    /// Ends the session and detaches the in-flight call.
    ///
    /// The detached entry keeps its status until an outcome arrives for it;
    /// that outcome is recorded but does not advance.
    pub async fn stop(&self) {
        let mut st = self.lock().await;
        let detached = st.session.current.clone();
        st.session.stop();
        info!(detached = ?detached.as_ref().map(EntryId::as_str), "session stopped");
    }

    /// The single mutation point for an entry's status.
    ///
    /// `entry_id` must belong to the active campaign. `Pending` is never a
    /// valid report; `InProgress` is accepted only for a pending entry while
    /// nothing else is in flight.
    pub async fn report_outcome(
        &self,
        entry_id: &EntryId,
        status: EntryStatus,
        duration_secs: Option<u64>,
    ) -> Result<(), RinglaneError> {
        let (next, save) = {
            let mut st = self.lock().await;
            let active = st
                .active_campaign()
                .filter(|c| c.entry(entry_id).is_some())
                .map(|c| c.id.clone())
                .ok_or_else(|| RinglaneError::entry_not_found(entry_id.as_str()))?;

            let next = match status {
                EntryStatus::Pending => {
                    return Err(RinglaneError::InvalidState(
                        "an entry cannot be reported back to pending".to_string(),
                    ));
                }
                EntryStatus::InProgress => {
                    st.mark_in_flight(&active, entry_id)?;
                    None
                }
                _ => st.finalize(&active, entry_id, status, duration_secs)?,
            };
            (next, st.save_campaigns())
        };
        self.write(save).await;

        if let Some(claim) = next {
            self.drive(claim).await;
        }
        Ok(())
    }

    /// Stops the session and shuts down both ports.
    pub async fn shutdown(&self) -> Result<(), RinglaneError> {
        let save = {
            let mut st = self.lock().await;
            st.session.stop();
            st.timer.disarm();
            st.save_campaigns()
        };
        self.write(save).await;
        self.inner.dispatch.shutdown().await?;
        self.inner.persistence.shutdown().await?;
        info!("orchestrator shut down");
        Ok(())
    }

    // --- observer surface ---
    //
    // Observers hold the lock only long enough to copy what they return.

    /// Session state, the in-flight entry and the timer phase.
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.lock().await.snapshot()
    }

    /// Every campaign with its metrics, in creation order.
    pub async fn campaigns(&self) -> Vec<CampaignView> {
        let st = self.lock().await;
        let active = st.session.active.as_ref();
        st.campaigns
            .iter()
            .map(|c| CampaignView::new(c, active))
            .collect()
    }

    /// One campaign with its metrics, or `None` if the id is unknown.
    pub async fn campaign(&self, id: &CampaignId) -> Option<CampaignView> {
        let st = self.lock().await;
        st.campaign(id)
            .map(|c| CampaignView::new(c, st.session.active.as_ref()))
    }

    /// The entry the session is currently dialing, if any.
    pub async fn current_entry(&self) -> Option<EntryRecord> {
        self.lock().await.current_entry()
    }

    // --- internals ---

    /// Dials claims until one is accepted or the session stops advancing.
    ///
    /// Runs without the lock while the dispatcher works; failed dispatches are
    /// finalized `failed` and the next claim is dialed in the same loop. At
    /// most one `place` call is outstanding: advancement requested while it
    /// runs is deferred until it returns.
    pub(crate) async fn drive(&self, mut claim: Claim) {
        loop {
            debug!(entry = %claim.entry_id, "placing call");
            let placed = self.inner.dispatch.place(&claim.number).await;

            let (next, save) = {
                let mut st = self.lock().await;
                st.dialing = None;
                let early = std::mem::take(&mut st.early);
                let (mut next, mut changed) = match placed {
                    Ok(handle) => st.accept(claim, handle, early, self.settings()),
                    Err(e) => {
                        warn!(entry = %claim.entry_id, error = %e, "dispatch failed, marking entry failed");
                        let still_in_flight = st
                            .campaign(&claim.campaign_id)
                            .and_then(|c| c.entry(&claim.entry_id))
                            .is_some_and(|entry| entry.status == EntryStatus::InProgress);
                        if still_in_flight {
                            let next = st
                                .finalize(
                                    &claim.campaign_id,
                                    &claim.entry_id,
                                    EntryStatus::Failed,
                                    None,
                                )
                                .unwrap_or_else(|e| {
                                    warn!(error = %e, "could not finalize failed dispatch");
                                    None
                                });
                            (next, true)
                        } else {
                            (None, false)
                        }
                    }
                };

                if std::mem::take(&mut st.advance_deferred)
                    && next.is_none()
                    && st.session.is_running()
                    && st.session.current.is_none()
                {
                    next = st.claim_next();
                    changed = true;
                }
                (next, changed.then(|| st.save_campaigns()))
            };
            if let Some(save) = save {
                self.write(save).await;
            }

            match next {
                Some(n) => claim = n,
                None => return,
            }
        }
    }

    /// Applies a timer expiry if it is still current.
    pub(crate) async fn on_timer_expiry(&self, expiry: TimerExpiry) {
        let (next, save) = {
            let mut st = self.lock().await;
            if !st.timer.claim_expiry(&expiry) {
                debug!(entry = %expiry.entry_id, "ignoring stale timer expiry");
                return;
            }
            let Some(campaign_id) = st
                .campaigns
                .iter()
                .find(|c| c.entry(&expiry.entry_id).is_some())
                .map(|c| c.id.clone())
            else {
                debug!(entry = %expiry.entry_id, "timer expired for a removed entry");
                return;
            };

            let (status, duration) = match expiry.kind {
                ExpiryKind::CallDuration { max_secs } => {
                    info!(entry = %expiry.entry_id, max_secs, "call reached maximum duration");
                    (EntryStatus::Completed, Some(max_secs))
                }
                ExpiryKind::RingTimeout => {
                    info!(entry = %expiry.entry_id, "no answer before ring timeout");
                    (EntryStatus::Declined, Some(0))
                }
            };
            let next = match st.finalize(&campaign_id, &expiry.entry_id, status, duration) {
                Ok(next) => next,
                Err(e) => {
                    warn!(error = %e, "could not apply timer expiry");
                    None
                }
            };
            (next, st.save_campaigns())
        };
        self.write(save).await;

        if let Some(claim) = next {
            self.drive(claim).await;
        }
    }

    /// Hands a copy to the persistence port unless a newer one got there first.
    pub(crate) async fn write(&self, save: PendingSave) {
        let mut written = self.inner.written.lock().await;
        match save {
            PendingSave::Campaigns { seq, campaigns } => {
                if seq <= written.campaigns {
                    debug!(seq, "newer campaign set already persisted");
                    return;
                }
                written.campaigns = seq;
                match self.inner.persistence.save_campaigns(&campaigns).await {
                    Ok(()) => debug!(campaigns = campaigns.len(), "campaigns persisted"),
                    Err(e) => warn!(error = %e, "failed to persist campaigns"),
                }
            }
            PendingSave::Active { seq, active } => {
                if seq <= written.active {
                    debug!(seq, "newer active campaign already persisted");
                    return;
                }
                written.active = seq;
                let active = active.as_ref();
                match self.inner.persistence.save_active_campaign_id(active).await {
                    Ok(()) => {
                        debug!(active = ?active.map(CampaignId::as_str), "active campaign persisted")
                    }
                    Err(e) => warn!(error = %e, "failed to persist active campaign"),
                }
            }
        }
    }
}

fn spawn_expiry_listener(inner: Weak<Inner>, mut expiries: mpsc::UnboundedReceiver<TimerExpiry>) {
    tokio::spawn(async move {
        while let Some(expiry) = expiries.recv().await {
            let Some(inner) = inner.upgrade() else {
                break;
            };
            Orchestrator { inner }.on_timer_expiry(expiry).await;
        }
        debug!("timer expiry listener stopped");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TimerPhase;
    use crate::test_support::{
        SlowDispatcher, SlowStore, StubDispatcher, fixture, fixture_using, fixture_with, settings,
    };
    use ringlane_core::{CallOutcome, OutcomeEvent};
    use ringlane_storage::MemoryStore;

    const A: &str = "+1 (555) 010-0000";
    const B: &str = "+1 (555) 010-0001";
    const C: &str = "+1 (555) 010-0002";

    async fn in_progress_count(fx: &crate::test_support::Fixture) -> usize {
        fx.orchestrator
            .campaign(&fx.campaign_id)
            .await
            .unwrap()
            .metrics
            .in_progress
    }

    #[tokio::test]
    async fn start_claims_first_pending_entry() {
        let fx = fixture(&[A, B]);

        let outcome = fx.orchestrator.start().await;
        assert_eq!(
            outcome,
            StartOutcome::Started {
                entry_id: fx.entries[0].clone()
            }
        );
        assert_eq!(fx.dispatcher.placed(), vec!["+15550100000"]);

        let snap = fx.orchestrator.snapshot().await;
        assert!(snap.running);
        assert_eq!(snap.state, SessionState::Running);
        assert_eq!(snap.timer_phase, TimerPhase::Ringing);
        let current = snap.current_entry.unwrap();
        assert_eq!(current.id, fx.entries[0]);
        assert_eq!(current.status, EntryStatus::InProgress);
        assert!(current.call_started_at.is_some());
        assert_eq!(fx.status(1).await, EntryStatus::Pending);
    }

    #[tokio::test]
    async fn completing_current_entry_advances_in_order() {
        let fx = fixture(&[A, B, C]);
        fx.orchestrator.start().await;

        fx.orchestrator
            .report_outcome(&fx.entries[0], EntryStatus::Completed, Some(12))
            .await
            .unwrap();

        let a = fx.entry(0).await;
        assert_eq!(a.status, EntryStatus::Completed);
        assert_eq!(a.duration_secs, Some(12));
        assert!(a.call_ended_at.is_some());
        let current = fx.orchestrator.current_entry().await.unwrap();
        assert_eq!(current.id, fx.entries[1]);
        assert_eq!(fx.status(2).await, EntryStatus::Pending);
        assert_eq!(in_progress_count(&fx).await, 1);
    }

    #[tokio::test]
    async fn last_entry_finalized_ends_session() {
        let fx = fixture(&[A]);
        fx.orchestrator.start().await;
        fx.orchestrator
            .report_outcome(&fx.entries[0], EntryStatus::Declined, None)
            .await
            .unwrap();

        let snap = fx.orchestrator.snapshot().await;
        assert!(!snap.running);
        assert_eq!(snap.state, SessionState::Idle);
        assert!(snap.current_entry.is_none());
        assert_eq!(snap.timer_phase, TimerPhase::Disarmed);
    }

    #[tokio::test]
    async fn outcome_after_stop_is_recorded_without_advancing() {
        let fx = fixture(&[A, B]);
        fx.orchestrator.start().await;
        fx.orchestrator.stop().await;

        fx.orchestrator
            .report_outcome(&fx.entries[0], EntryStatus::Failed, None)
            .await
            .unwrap();

        assert_eq!(fx.status(0).await, EntryStatus::Failed);
        assert_eq!(fx.status(1).await, EntryStatus::Pending);
        let snap = fx.orchestrator.snapshot().await;
        assert!(!snap.running);
        assert_eq!(snap.state, SessionState::Stopped);
        assert!(snap.current_entry.is_none());
        assert_eq!(fx.dispatcher.placed().len(), 1);
    }

    #[tokio::test]
    async fn stop_and_pause_are_idempotent() {
        let fx = fixture(&[A]);
        fx.orchestrator.pause().await;
        fx.orchestrator.stop().await;
        fx.orchestrator.stop().await;
        assert_eq!(fx.orchestrator.snapshot().await.state, SessionState::Idle);

        fx.orchestrator.start().await;
        fx.orchestrator.pause().await;
        fx.orchestrator.pause().await;
        assert_eq!(fx.orchestrator.snapshot().await.state, SessionState::Paused);
    }

    #[tokio::test]
    async fn pause_suppresses_advancement_until_restart() {
        let fx = fixture(&[A, B]);
        fx.orchestrator.start().await;
        fx.orchestrator.pause().await;

        fx.orchestrator
            .report_outcome(&fx.entries[0], EntryStatus::Completed, None)
            .await
            .unwrap();
        let snap = fx.orchestrator.snapshot().await;
        assert_eq!(snap.state, SessionState::Paused);
        assert!(snap.current_entry.is_none());
        assert_eq!(fx.status(1).await, EntryStatus::Pending);

        let outcome = fx.orchestrator.start().await;
        assert_eq!(
            outcome,
            StartOutcome::Started {
                entry_id: fx.entries[1].clone()
            }
        );
    }

    #[tokio::test]
    async fn start_while_paused_resumes_in_flight_entry() {
        let fx = fixture(&[A, B]);
        fx.orchestrator.start().await;
        fx.orchestrator.pause().await;

        assert_eq!(fx.orchestrator.start().await, StartOutcome::Resumed);
        assert_eq!(fx.dispatcher.placed().len(), 1);

        fx.orchestrator
            .report_outcome(&fx.entries[0], EntryStatus::Completed, None)
            .await
            .unwrap();
        assert_eq!(
            fx.orchestrator.current_entry().await.map(|e| e.id),
            Some(fx.entries[1].clone())
        );
    }

    #[tokio::test]
    async fn start_after_stop_waits_for_detached_entry() {
        let fx = fixture(&[A, B]);
        fx.orchestrator.start().await;
        fx.orchestrator.stop().await;

        assert_eq!(
            fx.orchestrator.start().await,
            StartOutcome::NotStarted(NotStartedReason::CallInFlight)
        );

        fx.orchestrator
            .report_outcome(&fx.entries[0], EntryStatus::Completed, None)
            .await
            .unwrap();
        assert_eq!(
            fx.orchestrator.start().await,
            StartOutcome::Started {
                entry_id: fx.entries[1].clone()
            }
        );
    }

    #[tokio::test]
    async fn start_refusals_change_nothing() {
        let fx = fixture(&[]);
        assert_eq!(
            fx.orchestrator.start().await,
            StartOutcome::NotStarted(NotStartedReason::NothingPending)
        );
        assert!(!fx.orchestrator.snapshot().await.running);

        let fx = fixture(&[A]);
        fx.orchestrator.start().await;
        assert_eq!(
            fx.orchestrator.start().await,
            StartOutcome::NotStarted(NotStartedReason::AlreadyRunning)
        );
        assert_eq!(fx.dispatcher.placed().len(), 1);
    }

    #[tokio::test]
    async fn start_without_active_campaign_is_a_no_op() {
        let store = Arc::new(MemoryStore::new());
        let dispatcher = Arc::new(crate::test_support::StubDispatcher::default());
        let orchestrator =
            Orchestrator::new(dispatcher, store, SessionSettings::default(), Vec::new(), None);
        assert_eq!(
            orchestrator.start().await,
            StartOutcome::NotStarted(NotStartedReason::NoActiveCampaign)
        );
    }

    #[tokio::test]
    async fn failed_dispatch_marks_entry_failed_and_moves_on() {
        let fx = fixture(&[A, B]);
        fx.dispatcher.fail_number("+15550100000");

        fx.orchestrator.start().await;

        assert_eq!(fx.status(0).await, EntryStatus::Failed);
        assert_eq!(fx.status(1).await, EntryStatus::InProgress);
        assert_eq!(fx.dispatcher.placed(), vec!["+15550100000", "+15550100001"]);
        assert_eq!(
            fx.orchestrator.current_entry().await.map(|e| e.id),
            Some(fx.entries[1].clone())
        );
    }

    #[tokio::test]
    async fn unnormalizable_number_fails_without_dialing() {
        let fx = fixture(&["call me maybe", B]);
        fx.orchestrator.start().await;

        assert_eq!(fx.status(0).await, EntryStatus::Failed);
        assert!(fx.entry(0).await.call_started_at.is_some());
        assert_eq!(fx.dispatcher.placed(), vec!["+15550100001"]);
    }

    #[tokio::test]
    async fn only_unnormalizable_numbers_exhaust_immediately() {
        let fx = fixture(&["n/a"]);
        assert_eq!(fx.orchestrator.start().await, StartOutcome::Exhausted);
        assert_eq!(fx.orchestrator.snapshot().await.state, SessionState::Idle);
        assert!(fx.dispatcher.placed().is_empty());
    }

    #[tokio::test]
    async fn report_outcome_rejects_invalid_reports() {
        let fx = fixture(&[A, B]);
        fx.orchestrator.start().await;

        let err = fx
            .orchestrator
            .report_outcome(&EntryId("missing".into()), EntryStatus::Completed, None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = fx
            .orchestrator
            .report_outcome(&fx.entries[0], EntryStatus::Pending, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RinglaneError::InvalidState(_)));

        // B is pending but A is in flight.
        let err = fx
            .orchestrator
            .report_outcome(&fx.entries[1], EntryStatus::InProgress, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RinglaneError::InvalidState(_)));

        fx.orchestrator
            .report_outcome(&fx.entries[0], EntryStatus::Completed, None)
            .await
            .unwrap();
        let err = fx
            .orchestrator
            .report_outcome(&fx.entries[0], EntryStatus::InProgress, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RinglaneError::InvalidState(_)));
        assert_eq!(fx.status(0).await, EntryStatus::Completed);
    }

    #[tokio::test]
    async fn terminal_entry_can_be_corrected_without_advancing() {
        let fx = fixture(&[A, B, C]);
        fx.orchestrator.start().await;
        fx.orchestrator
            .report_outcome(&fx.entries[0], EntryStatus::Completed, None)
            .await
            .unwrap();

        fx.orchestrator
            .report_outcome(&fx.entries[0], EntryStatus::Failed, None)
            .await
            .unwrap();

        assert_eq!(fx.status(0).await, EntryStatus::Failed);
        assert_eq!(
            fx.orchestrator.current_entry().await.map(|e| e.id),
            Some(fx.entries[1].clone())
        );
        assert_eq!(fx.status(2).await, EntryStatus::Pending);
    }

    #[tokio::test]
    async fn campaign_switch_is_rejected_mid_session() {
        let fx = fixture(&[A]);
        let other = fx.orchestrator.create_campaign("other", None).await;
        fx.orchestrator.start().await;

        let err = fx.orchestrator.select_campaign(&other).await.unwrap_err();
        assert!(matches!(err, RinglaneError::InvalidState(_)));

        fx.orchestrator.stop().await;
        // Stopped, but the detached call has not reported yet.
        let err = fx.orchestrator.select_campaign(&other).await.unwrap_err();
        assert!(matches!(err, RinglaneError::InvalidState(_)));

        fx.orchestrator
            .report_outcome(&fx.entries[0], EntryStatus::Completed, None)
            .await
            .unwrap();
        fx.orchestrator.select_campaign(&other).await.unwrap();
        let snap = fx.orchestrator.snapshot().await;
        assert_eq!(snap.active_campaign_id, Some(other.clone()));
        assert_eq!(snap.state, SessionState::Idle);
        assert_eq!(
            fx.store.load_active_campaign_id().await.unwrap(),
            Some(other)
        );
    }

    #[tokio::test]
    async fn selecting_unknown_campaign_is_not_found() {
        let fx = fixture(&[A]);
        let err = fx
            .orchestrator
            .select_campaign(&CampaignId("nope".into()))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test(start_paused = true)]
    async fn answered_call_completes_at_max_duration() {
        let fx = fixture_with(&[A, B], settings(5, None));
        fx.orchestrator.start().await;
        fx.orchestrator
            .on_outcome(OutcomeEvent {
                handle: CallHandle("call-1".into()),
                outcome: CallOutcome::Answered,
                duration_secs: None,
            })
            .await
            .unwrap();
        assert_eq!(
            fx.orchestrator.snapshot().await.timer_phase,
            TimerPhase::Answered
        );

        tokio::time::sleep(Duration::from_secs(6)).await;

        let a = fx.entry(0).await;
        assert_eq!(a.status, EntryStatus::Completed);
        assert_eq!(a.duration_secs, Some(5));
        assert_eq!(
            fx.orchestrator.current_entry().await.map(|e| e.id),
            Some(fx.entries[1].clone())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_call_never_times_out_without_ring_timeout() {
        let fx = fixture_with(&[A], settings(5, None));
        fx.orchestrator.start().await;

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(fx.status(0).await, EntryStatus::InProgress);
    }

    #[tokio::test(start_paused = true)]
    async fn ring_timeout_declines_unanswered_call() {
        let fx = fixture_with(&[A, B], settings(30, Some(20)));
        fx.orchestrator.start().await;

        tokio::time::sleep(Duration::from_secs(21)).await;

        let a = fx.entry(0).await;
        assert_eq!(a.status, EntryStatus::Declined);
        assert_eq!(a.duration_secs, Some(0));
        assert_eq!(fx.status(1).await, EntryStatus::InProgress);
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_duration_wins_over_timer() {
        let fx = fixture_with(&[A, B], settings(60, None));
        fx.orchestrator.start().await;
        let answered = |handle: &str| OutcomeEvent {
            handle: CallHandle(handle.into()),
            outcome: CallOutcome::Answered,
            duration_secs: None,
        };

        fx.orchestrator.on_outcome(answered("call-1")).await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        fx.orchestrator
            .on_outcome(OutcomeEvent {
                handle: CallHandle("call-1".into()),
                outcome: CallOutcome::Completed,
                duration_secs: Some(42),
            })
            .await
            .unwrap();
        assert_eq!(fx.entry(0).await.duration_secs, Some(42));

        // Without a reported duration the timer's elapsed time is used.
        fx.orchestrator.on_outcome(answered("call-2")).await.unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;
        fx.orchestrator
            .on_outcome(OutcomeEvent {
                handle: CallHandle("call-2".into()),
                outcome: CallOutcome::Completed,
                duration_secs: None,
            })
            .await
            .unwrap();
        assert_eq!(fx.entry(1).await.duration_secs, Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn timer_expiry_after_stop_completes_detached_entry() {
        let fx = fixture_with(&[A, B], settings(5, None));
        fx.orchestrator.start().await;
        fx.orchestrator
            .on_outcome(OutcomeEvent {
                handle: CallHandle("call-1".into()),
                outcome: CallOutcome::Answered,
                duration_secs: None,
            })
            .await
            .unwrap();
        fx.orchestrator.stop().await;

        tokio::time::sleep(Duration::from_secs(6)).await;

        assert_eq!(fx.status(0).await, EntryStatus::Completed);
        assert_eq!(fx.status(1).await, EntryStatus::Pending);
        assert!(!fx.orchestrator.snapshot().await.running);
    }

    #[tokio::test]
    async fn restore_fails_interrupted_entries_and_clears_dangling_active() {
        let mut campaign = Campaign::with_entries("restored", None, [(A, None), (B, None)]);
        campaign.entries[0].mark_in_progress(Utc::now());
        let store = Arc::new(MemoryStore::with_state(
            vec![campaign.clone()],
            Some(CampaignId("gone".into())),
        ));
        let dispatcher = Arc::new(crate::test_support::StubDispatcher::default());

        let orchestrator =
            Orchestrator::restore(dispatcher, store.clone(), SessionSettings::default())
                .await
                .unwrap();

        let view = orchestrator.campaign(&campaign.id).await.unwrap();
        assert_eq!(view.campaign.entries[0].status, EntryStatus::Failed);
        assert!(view.campaign.entries[0].call_ended_at.is_some());
        assert_eq!(view.campaign.entries[1].status, EntryStatus::Pending);

        let snap = orchestrator.snapshot().await;
        assert_eq!(snap.active_campaign_id, None);
        assert!(!snap.running);

        let saved = store.snapshot().await;
        assert_eq!(saved.active_campaign_id, None);
        assert_eq!(saved.campaigns[0].entries[0].status, EntryStatus::Failed);
    }

    #[tokio::test]
    async fn restore_keeps_valid_active_campaign() {
        let campaign = Campaign::with_entries("restored", None, [(A, None)]);
        let store = Arc::new(MemoryStore::with_state(
            vec![campaign.clone()],
            Some(campaign.id.clone()),
        ));
        let dispatcher = Arc::new(crate::test_support::StubDispatcher::default());

        let orchestrator = Orchestrator::restore(dispatcher, store, SessionSettings::default())
            .await
            .unwrap();
        assert_eq!(
            orchestrator.snapshot().await.active_campaign_id,
            Some(campaign.id)
        );
        assert!(matches!(
            orchestrator.start().await,
            StartOutcome::Started { .. }
        ));
    }

    #[tokio::test]
    async fn persistence_failures_do_not_block_the_session() {
        let fx = fixture(&[A, B]);
        fx.store.set_fail_saves(true);

        fx.orchestrator.start().await;
        fx.orchestrator
            .report_outcome(&fx.entries[0], EntryStatus::Completed, None)
            .await
            .unwrap();

        assert_eq!(fx.status(0).await, EntryStatus::Completed);
        assert_eq!(fx.status(1).await, EntryStatus::InProgress);
        assert_eq!(fx.store.campaign_saves(), 0);
    }

    #[tokio::test]
    async fn every_mutation_is_persisted() {
        let fx = fixture(&[A]);
        fx.orchestrator.start().await;
        let after_start = fx.store.campaign_saves();
        assert!(after_start >= 1);

        fx.orchestrator
            .report_outcome(&fx.entries[0], EntryStatus::Completed, Some(3))
            .await
            .unwrap();
        assert_eq!(fx.store.campaign_saves(), after_start + 1);
        let saved = fx.store.snapshot().await;
        assert_eq!(saved.campaigns[0].entries[0].status, EntryStatus::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn ring_timeout_counts_from_acceptance() {
        let dispatcher = Arc::new(SlowDispatcher::new(Duration::from_secs(30)));
        let fx = fixture_using(&[A, B], settings(30, Some(5)), dispatcher);

        fx.orchestrator.start().await;
        assert_eq!(fx.status(0).await, EntryStatus::InProgress);
        assert_eq!(
            fx.orchestrator.snapshot().await.timer_phase,
            TimerPhase::Ringing
        );

        tokio::time::sleep(Duration::from_secs(60)).await;

        let a = fx.entry(0).await;
        assert_eq!(a.status, EntryStatus::Declined);
        assert_eq!(a.duration_secs, Some(0));
        assert_eq!(fx.status(1).await, EntryStatus::Declined);
        assert_eq!(fx.dispatcher.placed(), 2);
        assert_eq!(fx.dispatcher.max_outstanding(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn report_during_slow_place_defers_the_next_claim() {
        let dispatcher = Arc::new(SlowDispatcher::new(Duration::from_secs(30)));
        let fx = fixture_using(&[A, B], settings(30, None), dispatcher);
        let starting = {
            let orchestrator = fx.orchestrator.clone();
            tokio::spawn(async move { orchestrator.start().await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;

        fx.orchestrator
            .report_outcome(&fx.entries[0], EntryStatus::Failed, None)
            .await
            .unwrap();
        assert_eq!(fx.status(0).await, EntryStatus::Failed);
        assert_eq!(fx.status(1).await, EntryStatus::Pending);
        assert_eq!(fx.dispatcher.placed(), 1);
        assert_eq!(
            fx.orchestrator.start().await,
            StartOutcome::NotStarted(NotStartedReason::AlreadyRunning)
        );

        assert!(matches!(
            starting.await.unwrap(),
            StartOutcome::Started { .. }
        ));
        assert_eq!(fx.status(1).await, EntryStatus::InProgress);
        assert_eq!(fx.dispatcher.placed(), 2);
        assert_eq!(fx.dispatcher.max_outstanding(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_duplicate_reports_advance_once() {
        let fx = fixture(&[A, B, C]);
        fx.orchestrator.start().await;

        let sampler = {
            let orchestrator = fx.orchestrator.clone();
            let campaign_id = fx.campaign_id.clone();
            tokio::spawn(async move {
                let mut max = 0;
                for _ in 0..200 {
                    let view = orchestrator.campaign(&campaign_id).await.unwrap();
                    max = max.max(view.metrics.in_progress);
                    tokio::task::yield_now().await;
                }
                max
            })
        };
        let reports: Vec<_> = (0..16)
            .map(|i| {
                let orchestrator = fx.orchestrator.clone();
                let entry_id = fx.entries[0].clone();
                tokio::spawn(async move {
                    if i % 2 == 0 {
                        orchestrator
                            .report_outcome(&entry_id, EntryStatus::Completed, None)
                            .await
                    } else {
                        orchestrator
                            .on_outcome(OutcomeEvent {
                                handle: CallHandle("call-1".into()),
                                outcome: CallOutcome::Completed,
                                duration_secs: None,
                            })
                            .await
                    }
                })
            })
            .collect();
        for report in reports {
            report.await.unwrap().unwrap();
        }

        assert!(sampler.await.unwrap() <= 1);
        assert_eq!(fx.status(0).await, EntryStatus::Completed);
        assert_eq!(fx.status(1).await, EntryStatus::InProgress);
        assert_eq!(fx.status(2).await, EntryStatus::Pending);
        assert_eq!(in_progress_count(&fx).await, 1);
        assert_eq!(fx.dispatcher.placed().len(), 2);
        assert_eq!(
            fx.orchestrator.current_entry().await.map(|e| e.id),
            Some(fx.entries[1].clone())
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_starts_claim_one_entry() {
        let fx = fixture(&[A, B]);

        let starts: Vec<_> = (0..8)
            .map(|_| {
                let orchestrator = fx.orchestrator.clone();
                tokio::spawn(async move { orchestrator.start().await })
            })
            .collect();
        let mut started = 0;
        for start in starts {
            match start.await.unwrap() {
                StartOutcome::Started { .. } => started += 1,
                StartOutcome::NotStarted(NotStartedReason::AlreadyRunning) => {}
                other => panic!("unexpected start outcome {other:?}"),
            }
        }

        assert_eq!(started, 1);
        assert_eq!(in_progress_count(&fx).await, 1);
        assert_eq!(fx.dispatcher.placed().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn observers_do_not_wait_for_slow_saves() {
        let store = Arc::new(SlowStore::new(Duration::from_secs(10)));
        let orchestrator = Orchestrator::new(
            Arc::new(StubDispatcher::default()),
            store.clone(),
            settings(5, None),
            Vec::new(),
            None,
        );

        let first = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.create_campaign("first", None).await })
        };
        let second = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.create_campaign("second", None).await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;

        let views = tokio::time::timeout(Duration::from_millis(10), orchestrator.campaigns())
            .await
            .expect("observer waited behind a save");
        assert_eq!(views.len(), 2);

        first.await.unwrap();
        second.await.unwrap();
        assert_eq!(store.saved_campaigns().await, 2);
    }
}
