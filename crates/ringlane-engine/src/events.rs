// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatcher callbacks: resolving call handles and pumping outcome events.

use ringlane_core::{OutcomeEvent, RinglaneError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::orchestrator::Orchestrator;

impl Orchestrator {
    /// Applies one dispatcher callback.
    ///
    /// `answered` moves the session timer into its bounded phase; every other
    /// outcome finalizes the entry through the same path as `report_outcome`.
    /// The dispatcher's duration wins over the timer's when both exist.
    ///
    /// A callback can overtake the `place` call that issued its handle. While
    /// a call is being placed, outcomes for unknown handles are held and
    /// applied once the handle is recorded.
    pub async fn on_outcome(&self, event: OutcomeEvent) -> Result<(), RinglaneError> {
        let (next, save) = {
            let mut st = self.lock().await;
            let Some((campaign_id, entry_id)) = st.handles.get(&event.handle).cloned() else {
                return st.hold_early(event);
            };

            let terminal = event.outcome.entry_status().is_some();
            let next = st.apply_outcome(&campaign_id, &entry_id, &event)?;
            (next, terminal.then(|| st.save_campaigns()))
        };
        if let Some(save) = save {
            self.write(save).await;
        }

        if let Some(claim) = next {
            self.drive(claim).await;
        }
        Ok(())
    }

    /// Drains outcome events until the channel closes or `cancel` fires.
    ///
    /// Errors for individual events are logged and skipped.
    pub async fn run_events(&self, mut events: mpsc::Receiver<OutcomeEvent>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("outcome event pump cancelled");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => {
                        let handle = event.handle.clone();
                        if let Err(e) = self.on_outcome(event).await {
                            warn!(handle = %handle, error = %e, "outcome event rejected");
                        }
                    }
                    None => {
                        debug!("outcome event channel closed");
                        break;
                    }
                },
            }
        }
    }
}
