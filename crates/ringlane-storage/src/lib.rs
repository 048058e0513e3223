// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence adapters for the Ringlane dialer.
//!
//! [`JsonFileStore`] keeps campaigns and the active campaign reference in a
//! single JSON document on disk. [`MemoryStore`] keeps them in process and is
//! what tests and dry runs use.

pub mod json;
pub mod memory;
pub mod state;

pub use json::JsonFileStore;
pub use memory::MemoryStore;
pub use state::StateFile;
