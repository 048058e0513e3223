// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign orchestration engine for the Ringlane dialer.
//!
//! The [`Orchestrator`] owns campaign selection, the session lifecycle, the
//! single in-flight entry, and the advance/fallback/timeout algorithm. It is
//! the only component that changes an entry's status.
//!
//! - [`session`]: session FSM states and observer views
//! - [`timer`]: two-phase countdown that completes stuck calls
//! - [`shutdown`]: SIGINT/SIGTERM handling

mod editing;
mod events;
pub mod orchestrator;
pub mod session;
pub mod shutdown;
pub mod timer;

pub use orchestrator::{Orchestrator, SessionSettings};
pub use session::{
    CampaignView, NotStartedReason, SessionSnapshot, SessionState, StartOutcome,
};
pub use timer::{SessionTimer, TimerPhase};

#[cfg(test)]
pub(crate) mod test_support;
