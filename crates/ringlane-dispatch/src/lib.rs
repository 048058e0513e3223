// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatch Port decorators.
//!
//! Both types implement [`DispatchAdapter`](ringlane_core::DispatchAdapter)
//! themselves, so they compose freely: the usual production stack is a
//! [`FallbackDispatcher`] whose two strategies are each wrapped in a
//! [`RetryingDispatcher`].

pub mod fallback;
pub mod retry;

use std::sync::Arc;

use ringlane_core::DispatchAdapter;

pub use fallback::FallbackDispatcher;
pub use retry::{RetryPolicy, RetryingDispatcher};

/// Builds the standard stack: each strategy retried per `policy`, primary first.
pub fn retrying_fallback(
    primary: Arc<dyn DispatchAdapter>,
    secondary: Arc<dyn DispatchAdapter>,
    policy: RetryPolicy,
) -> FallbackDispatcher {
    FallbackDispatcher::new(
        Arc::new(RetryingDispatcher::new(primary, policy)),
        Arc::new(RetryingDispatcher::new(secondary, policy)),
    )
}
