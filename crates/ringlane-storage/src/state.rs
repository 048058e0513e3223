// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk document layout shared by the stores.

use ringlane_core::{Campaign, CampaignId};
use serde::{Deserialize, Serialize};

/// Current document format. Bumped on incompatible layout changes.
pub const FORMAT_VERSION: u32 = 1;

/// Everything the orchestrator persists, as one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFile {
    pub format_version: u32,
    #[serde(default)]
    pub active_campaign_id: Option<CampaignId>,
    #[serde(default)]
    pub campaigns: Vec<Campaign>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            active_campaign_id: None,
            campaigns: Vec::new(),
        }
    }
}
