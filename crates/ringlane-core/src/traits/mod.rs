// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Port trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod dispatch;
pub mod persistence;

pub use adapter::PluginAdapter;
pub use dispatch::DispatchAdapter;
pub use persistence::PersistenceAdapter;
