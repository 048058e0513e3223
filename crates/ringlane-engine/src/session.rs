// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session lifecycle state and the read-only views handed to observers.

use ringlane_core::{Campaign, CampaignId, CampaignMetrics, EntryId, EntryRecord};
use serde::Serialize;

use crate::timer::TimerPhase;

/// States in the session FSM.
///
/// `Idle -> Running -> (Paused | Stopped) -> Running -> ... -> Idle`.
/// A running session that runs out of pending entries returns to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No session in progress.
    Idle,
    /// Dialing; terminal outcomes advance to the next pending entry.
    Running,
    /// Advancement suspended; the in-flight call, if any, continues.
    Paused,
    /// Session ended by the operator; the in-flight call was detached.
    Stopped,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Running => write!(f, "running"),
            SessionState::Paused => write!(f, "paused"),
            SessionState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Mutable session bookkeeping, owned by the orchestrator's state.
#[derive(Debug)]
pub(crate) struct Session {
    pub(crate) state: SessionState,
    pub(crate) active: Option<CampaignId>,
    /// The entry whose outcome drives advancement. Always `in_progress` when set.
    pub(crate) current: Option<EntryId>,
}

impl Session {
    pub(crate) fn new(active: Option<CampaignId>) -> Self {
        Self {
            state: SessionState::Idle,
            active,
            current: None,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub(crate) fn pause(&mut self) {
        if self.state == SessionState::Running {
            self.state = SessionState::Paused;
        }
    }

    pub(crate) fn stop(&mut self) {
        if self.state != SessionState::Idle {
            self.state = SessionState::Stopped;
        }
        self.current = None;
    }

    /// Natural end of a session: nothing left to dial.
    pub(crate) fn exhausted(&mut self) {
        self.state = SessionState::Idle;
        self.current = None;
    }
}

/// Point-in-time copy of the session, safe to hold without the lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub running: bool,
    pub active_campaign_id: Option<CampaignId>,
    pub current_entry: Option<EntryRecord>,
    pub timer_phase: TimerPhase,
}

/// A campaign together with its derived metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CampaignView {
    pub campaign: Campaign,
    pub metrics: CampaignMetrics,
    pub active: bool,
}

impl CampaignView {
    pub(crate) fn new(campaign: &Campaign, active: Option<&CampaignId>) -> Self {
        Self {
            metrics: campaign.metrics(),
            active: active == Some(&campaign.id),
            campaign: campaign.clone(),
        }
    }
}

/// Result of a `start` request. Refusals are not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// A fresh session claimed this entry first.
    Started { entry_id: EntryId },
    /// A paused session with a call still in flight was resumed.
    Resumed,
    /// Every pending entry was finalized before dialing; the session is idle.
    Exhausted,
    /// Nothing changed.
    NotStarted(NotStartedReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotStartedReason {
    NoActiveCampaign,
    AlreadyRunning,
    NothingPending,
    /// A call detached by `stop` has not reported its outcome yet.
    CallInFlight,
}

impl std::fmt::Display for NotStartedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotStartedReason::NoActiveCampaign => write!(f, "no active campaign"),
            NotStartedReason::AlreadyRunning => write!(f, "session already running"),
            NotStartedReason::NothingPending => write!(f, "no pending entries"),
            NotStartedReason::CallInFlight => write!(f, "previous call still in flight"),
        }
    }
}
