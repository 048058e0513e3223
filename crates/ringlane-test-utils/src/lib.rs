// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Ringlane integration tests.
//!
//! - [`MockDispatcher`]: scripted Dispatch Port that records every placement
//! - [`TestHarness`]: a full orchestrator stack over mocks and temp storage

pub mod harness;
pub mod mock_dispatcher;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_dispatcher::MockDispatcher;
