// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Two-phase countdown for the in-flight call.
//!
//! Phase 1 (ringing) lasts until the callee answers, optionally bounded by a
//! ring timeout. Phase 2 (answered) is bounded by the maximum call duration.
//! Expiries are delivered as [`TimerExpiry`] messages on a channel; the
//! receiver must call [`SessionTimer::claim_expiry`] before acting on one, so
//! a countdown that fired just as it was disarmed or re-armed is ignored.

use std::time::Duration;

use ringlane_core::EntryId;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Where the armed countdown currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    Disarmed,
    Ringing,
    Answered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryKind {
    /// No answer within the ring timeout.
    RingTimeout,
    /// An answered call reached the maximum duration.
    CallDuration { max_secs: u64 },
}

/// A countdown that ran out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerExpiry {
    pub entry_id: EntryId,
    pub generation: u64,
    pub kind: ExpiryKind,
}

#[derive(Debug)]
struct Armed {
    entry_id: EntryId,
    generation: u64,
    max: Duration,
    phase: TimerPhase,
    answered_at: Option<Instant>,
    cancel: CancellationToken,
}

/// One countdown at a time; arming replaces whatever was armed before.
#[derive(Debug)]
pub struct SessionTimer {
    expiries: mpsc::UnboundedSender<TimerExpiry>,
    armed: Option<Armed>,
    generation: u64,
}

impl SessionTimer {
    pub fn new(expiries: mpsc::UnboundedSender<TimerExpiry>) -> Self {
        Self {
            expiries,
            armed: None,
            generation: 0,
        }
    }

    /// Arms the timer for `entry_id` in the ringing phase and returns its generation.
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm(&mut self, entry_id: EntryId, max: Duration, ring_timeout: Option<Duration>) -> u64 {
        self.disarm();
        self.generation += 1;

        let cancel = CancellationToken::new();
        if let Some(limit) = ring_timeout {
            spawn_countdown(
                self.expiries.clone(),
                cancel.clone(),
                limit,
                TimerExpiry {
                    entry_id: entry_id.clone(),
                    generation: self.generation,
                    kind: ExpiryKind::RingTimeout,
                },
            );
        }

        debug!(entry = %entry_id, generation = self.generation, "session timer armed");
        self.armed = Some(Armed {
            entry_id,
            generation: self.generation,
            max,
            phase: TimerPhase::Ringing,
            answered_at: None,
            cancel,
        });
        self.generation
    }

    /// Moves the timer for `entry_id` into the answered phase.
    ///
    /// Returns false if the timer is not armed for that entry or was already answered.
    pub fn answered(&mut self, entry_id: &EntryId) -> bool {
        let Some(armed) = self
            .armed
            .as_mut()
            .filter(|a| &a.entry_id == entry_id && a.phase == TimerPhase::Ringing)
        else {
            return false;
        };

        armed.cancel.cancel();
        armed.cancel = CancellationToken::new();
        armed.phase = TimerPhase::Answered;
        armed.answered_at = Some(Instant::now());

        spawn_countdown(
            self.expiries.clone(),
            armed.cancel.clone(),
            armed.max,
            TimerExpiry {
                entry_id: armed.entry_id.clone(),
                generation: armed.generation,
                kind: ExpiryKind::CallDuration {
                    max_secs: armed.max.as_secs(),
                },
            },
        );
        true
    }

    pub fn disarm(&mut self) {
        if let Some(armed) = self.armed.take() {
            armed.cancel.cancel();
            debug!(entry = %armed.entry_id, "session timer disarmed");
        }
    }

    /// Disarms only if the timer belongs to `entry_id`.
    pub fn disarm_for(&mut self, entry_id: &EntryId) -> bool {
        if self.armed_entry() == Some(entry_id) {
            self.disarm();
            true
        } else {
            false
        }
    }

    /// Accepts an expiry if it still matches the armed countdown, disarming it.
    pub fn claim_expiry(&mut self, expiry: &TimerExpiry) -> bool {
        let current = self.armed.as_ref().is_some_and(|a| {
            a.generation == expiry.generation
                && a.entry_id == expiry.entry_id
                && match expiry.kind {
                    ExpiryKind::RingTimeout => a.phase == TimerPhase::Ringing,
                    ExpiryKind::CallDuration { .. } => a.phase == TimerPhase::Answered,
                }
        });
        if current {
            self.armed = None;
        }
        current
    }

    pub fn phase(&self) -> TimerPhase {
        self.armed
            .as_ref()
            .map_or(TimerPhase::Disarmed, |a| a.phase)
    }

    pub fn armed_entry(&self) -> Option<&EntryId> {
        self.armed.as_ref().map(|a| &a.entry_id)
    }

    /// Whole seconds since `entry_id` was answered, if it was.
    pub fn elapsed_secs(&self, entry_id: &EntryId) -> Option<u64> {
        self.armed
            .as_ref()
            .filter(|a| &a.entry_id == entry_id)
            .and_then(|a| a.answered_at)
            .map(|at| at.elapsed().as_secs())
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.disarm();
    }
}

fn spawn_countdown(
    expiries: mpsc::UnboundedSender<TimerExpiry>,
    cancel: CancellationToken,
    after: Duration,
    expiry: TimerExpiry,
) {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(after) => {
                // The receiver is gone once the orchestrator is dropped.
                let _ = expiries.send(expiry);
            }
        }
    });
}
