// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock Dispatch Port for deterministic testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use ringlane_core::{
    AdapterType, CallHandle, DispatchAdapter, DispatchError, HealthStatus, PluginAdapter,
    RinglaneError,
};
use tokio::sync::Mutex;

/// A dispatcher that accepts calls unless told otherwise.
///
/// Scripted failures are consumed in FIFO order, one per `place` call. Once
/// the script is empty every call is accepted with a `<name>-call-N` handle.
pub struct MockDispatcher {
    name: String,
    script: Mutex<VecDeque<DispatchError>>,
    placed: Mutex<Vec<(String, Option<CallHandle>)>>,
    counter: AtomicUsize,
}

impl MockDispatcher {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(VecDeque::new()),
            placed: Mutex::new(Vec::new()),
            counter: AtomicUsize::new(0),
        }
    }

    /// Queue a failure for an upcoming `place` call.
    pub async fn fail_next(&self, error: DispatchError) {
        self.script.lock().await.push_back(error);
    }

    /// Numbers dialed so far, in order, including rejected attempts.
    pub async fn placed_numbers(&self) -> Vec<String> {
        self.placed
            .lock()
            .await
            .iter()
            .map(|(number, _)| number.clone())
            .collect()
    }

    /// The most recent handle issued for `number`, if any attempt was accepted.
    pub async fn handle_for(&self, number: &str) -> Option<CallHandle> {
        self.placed
            .lock()
            .await
            .iter()
            .rev()
            .filter(|(n, _)| n == number)
            .find_map(|(_, handle)| handle.clone())
    }

    pub async fn accepted(&self) -> usize {
        self.placed
            .lock()
            .await
            .iter()
            .filter(|(_, handle)| handle.is_some())
            .count()
    }
}

#[async_trait]
impl PluginAdapter for MockDispatcher {
    fn name(&self) -> &str {
        &self.name
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
impl DispatchAdapter for MockDispatcher {
    async fn place(&self, number: &str) -> Result<CallHandle, DispatchError> {
        let scripted = self.script.lock().await.pop_front();
        let result = match scripted {
            Some(error) => Err(error),
            None => {
                let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(CallHandle(format!("{}-call-{n}", self.name)))
            }
        };
        self.placed
            .lock()
            .await
            .push((number.to_string(), result.as_ref().ok().cloned()));
        result
    }
}
