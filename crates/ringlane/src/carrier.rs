// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Simulated carrier for `ringlane simulate`.
//!
//! The outcome of every call is derived from the last digit of the dialed
//! number, so a run is reproducible:
//!
//! | last digit | behavior                                               |
//! |------------|--------------------------------------------------------|
//! | 0-5        | answered after the ring delay, hangs up after `2*(d+1)` s |
//! | 6          | busy                                                   |
//! | 7          | no answer                                              |
//! | 8          | answered, never hangs up (the session timer ends it)   |
//! | 9          | refused by the direct route, accepted by the bridge    |
//!
//! Numbers ending in `99` are refused by both routes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use ringlane_core::{
    AdapterType, CallHandle, CallOutcome, DispatchAdapter, DispatchError, HealthStatus,
    OutcomeEvent, PluginAdapter, RinglaneError,
};
use tokio::sync::mpsc;
use tracing::debug;

const RING_DELAY: Duration = Duration::from_secs(1);

/// Which route this carrier instance plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Direct,
    Bridge,
}

pub struct SimulatedCarrier {
    route: Route,
    events: mpsc::Sender<OutcomeEvent>,
    counter: AtomicUsize,
}

impl SimulatedCarrier {
    pub fn new(route: Route, events: mpsc::Sender<OutcomeEvent>) -> Self {
        Self {
            route,
            events,
            counter: AtomicUsize::new(0),
        }
    }

    fn refuses(&self, number: &str) -> bool {
        match self.route {
            Route::Direct => number.ends_with('9'),
            Route::Bridge => number.ends_with("99"),
        }
    }
}

/// The scripted callbacks for a number, with the delay before each.
pub fn script_for(number: &str) -> Vec<(Duration, CallOutcome, Option<u64>)> {
    let digit = number
        .chars()
        .last()
        .and_then(|c| c.to_digit(10))
        .unwrap_or(0);
    match digit {
        0..=5 => {
            let talk = u64::from(2 * (digit + 1));
            vec![
                (RING_DELAY, CallOutcome::Answered, None),
                (Duration::from_secs(talk), CallOutcome::Completed, Some(talk)),
            ]
        }
        6 => vec![(RING_DELAY, CallOutcome::Busy, None)],
        7 => vec![(RING_DELAY * 3, CallOutcome::NoAnswer, None)],
        8 => vec![(RING_DELAY, CallOutcome::Answered, None)],
        _ => vec![
            (RING_DELAY, CallOutcome::Answered, None),
            (Duration::from_secs(4), CallOutcome::Completed, Some(4)),
        ],
    }
}

#[async_trait]
impl PluginAdapter for SimulatedCarrier {
    fn name(&self) -> &str {
        match self.route {
            Route::Direct => "simulated-direct",
            Route::Bridge => "simulated-bridge",
        }
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Dispatch
    }

    async fn health_check(&self) -> Result<HealthStatus, RinglaneError> {
        if self.events.is_closed() {
            return Ok(HealthStatus::Unhealthy("event channel closed".into()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RinglaneError> {
        Ok(())
    }
}

#[async_trait]
impl DispatchAdapter for SimulatedCarrier {
    async fn place(&self, number: &str) -> Result<CallHandle, DispatchError> {
        if self.refuses(number) {
            return Err(DispatchError::Rejected(format!(
                "{} route refuses {number}",
                self.name()
            )));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = CallHandle(format!("{}-{n}", self.name()));
        let events = self.events.clone();
        let script = script_for(number);
        let task_handle = handle.clone();
        tokio::spawn(async move {
            for (delay, outcome, duration_secs) in script {
                tokio::time::sleep(delay).await;
                let event = OutcomeEvent {
                    handle: task_handle.clone(),
                    outcome,
                    duration_secs,
                };
                if events.send(event).await.is_err() {
                    debug!(handle = %task_handle, "event pump gone, dropping simulated outcome");
                    return;
                }
            }
        });
        Ok(handle)
    }
}
