// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign and entry record model.
//!
//! These are plain data with derived metrics. Status transitions go through
//! [`EntryRecord::mark_in_progress`] and [`EntryRecord::mark_terminal`], which
//! only the orchestrator calls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CampaignId, EntryId, EntryStatus};

/// Call state for one destination number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub id: EntryId,
    pub number: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub status: EntryStatus,
    /// Set once, on the first transition into `in_progress`.
    #[serde(default)]
    pub call_started_at: Option<DateTime<Utc>>,
    /// Set on every transition into a terminal status.
    #[serde(default)]
    pub call_ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_secs: Option<u64>,
}

impl EntryRecord {
    pub fn new(number: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            id: EntryId::generate(),
            number: number.into(),
            display_name,
            status: EntryStatus::Pending,
            call_started_at: None,
            call_ended_at: None,
            duration_secs: None,
        }
    }

    /// Moves the entry into `in_progress`.
    ///
    /// A re-entry keeps the original `call_started_at`.
    pub fn mark_in_progress(&mut self, now: DateTime<Utc>) {
        self.status = EntryStatus::InProgress;
        self.call_started_at.get_or_insert(now);
        self.call_ended_at = None;
    }

    /// Moves the entry into a terminal status.
    ///
    /// A correction reported without a duration keeps the recorded one.
    pub fn mark_terminal(
        &mut self,
        status: EntryStatus,
        now: DateTime<Utc>,
        duration_secs: Option<u64>,
    ) {
        debug_assert!(status.is_terminal(), "mark_terminal called with {status}");
        self.status = status;
        self.call_ended_at = Some(now);
        if duration_secs.is_some() {
            self.duration_secs = duration_secs;
        }
    }
}

/// An ordered, named list of entries dialed as a unit.
///
/// Insertion order is dialing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub entries: Vec<EntryRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Creates an empty campaign.
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: CampaignId::generate(),
            name: name.into(),
            description,
            entries: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a campaign with an initial batch of pending entries.
    pub fn with_entries<I, S>(name: impl Into<String>, description: Option<String>, numbers: I) -> Self
    where
        I: IntoIterator<Item = (S, Option<String>)>,
        S: Into<String>,
    {
        let mut campaign = Self::new(name, description);
        campaign.entries = numbers
            .into_iter()
            .map(|(number, display_name)| EntryRecord::new(number, display_name))
            .collect();
        campaign
    }

    pub fn entry(&self, id: &EntryId) -> Option<&EntryRecord> {
        self.entries.iter().find(|e| &e.id == id)
    }

    pub fn entry_mut(&mut self, id: &EntryId) -> Option<&mut EntryRecord> {
        self.entries.iter_mut().find(|e| &e.id == id)
    }

    /// First pending entry in list order.
    pub fn next_pending(&self) -> Option<&EntryRecord> {
        self.entries
            .iter()
            .find(|e| e.status == EntryStatus::Pending)
    }

    pub fn has_pending(&self) -> bool {
        self.next_pending().is_some()
    }

    /// Entries currently marked `in_progress`.
    pub fn in_progress(&self) -> impl Iterator<Item = &EntryRecord> {
        self.entries
            .iter()
            .filter(|e| e.status == EntryStatus::InProgress)
    }

    /// Appends a pending entry and returns its id.
    pub fn push_entry(&mut self, number: impl Into<String>, display_name: Option<String>) -> EntryId {
        let entry = EntryRecord::new(number, display_name);
        let id = entry.id.clone();
        self.entries.push(entry);
        self.touch();
        id
    }

    /// Removes an entry, returning it if it existed.
    pub fn remove_entry(&mut self, id: &EntryId) -> Option<EntryRecord> {
        let index = self.entries.iter().position(|e| &e.id == id)?;
        let removed = self.entries.remove(index);
        self.touch();
        Some(removed)
    }

    /// Bumps `updated_at`.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn metrics(&self) -> CampaignMetrics {
        CampaignMetrics::from_entries(&self.entries)
    }
}

/// Progress counters, always derived from the entries on read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignMetrics {
    pub total: usize,
    pub completed: usize,
    /// Failed and declined entries together.
    pub failed: usize,
    pub remaining: usize,
    pub in_progress: usize,
}

impl CampaignMetrics {
    pub fn from_entries(entries: &[EntryRecord]) -> Self {
        entries.iter().fold(
            Self {
                total: entries.len(),
                ..Self::default()
            },
            |mut m, entry| {
                match entry.status {
                    EntryStatus::Completed => m.completed += 1,
                    EntryStatus::Failed | EntryStatus::Declined => m.failed += 1,
                    EntryStatus::Pending => m.remaining += 1,
                    EntryStatus::InProgress => m.in_progress += 1,
                }
                m
            },
        )
    }

    /// Entries that reached a terminal status.
    pub fn finished(&self) -> usize {
        self.completed + self.failed
    }

    /// Whole-number percentage of finished entries; 0 for an empty campaign.
    pub fn progress_percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = (self.finished() as f64 / self.total as f64 * 100.0).round();
        pct.clamp(0.0, 100.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign_with_statuses(statuses: &[EntryStatus]) -> Campaign {
        let mut campaign = Campaign::new("test", None);
        for (i, status) in statuses.iter().enumerate() {
            let mut entry = EntryRecord::new(format!("+1555000{i:04}"), None);
            entry.status = *status;
            campaign.entries.push(entry);
        }
        campaign
    }

    #[test]
    fn metrics_fold_declined_into_failed() {
        let campaign = campaign_with_statuses(&[
            EntryStatus::Completed,
            EntryStatus::Completed,
            EntryStatus::Failed,
            EntryStatus::Declined,
            EntryStatus::Pending,
        ]);
        let m = campaign.metrics();
        assert_eq!(m.total, 5);
        assert_eq!(m.completed, 2);
        assert_eq!(m.failed, 2);
        assert_eq!(m.remaining, 1);
        assert_eq!(m.in_progress, 0);
        assert_eq!(m.progress_percent(), 80);
    }

    #[test]
    fn empty_campaign_has_zero_progress() {
        let m = Campaign::new("empty", None).metrics();
        assert_eq!(m, CampaignMetrics::default());
        assert_eq!(m.progress_percent(), 0);
    }

    #[test]
    fn next_pending_follows_insertion_order() {
        let mut campaign = campaign_with_statuses(&[
            EntryStatus::Completed,
            EntryStatus::Pending,
            EntryStatus::Pending,
        ]);
        let second = campaign.entries[1].id.clone();
        assert_eq!(campaign.next_pending().map(|e| &e.id), Some(&second));

        campaign.entries[1].status = EntryStatus::Failed;
        let third = campaign.entries[2].id.clone();
        assert_eq!(campaign.next_pending().map(|e| &e.id), Some(&third));
    }

    #[test]
    fn in_progress_keeps_first_start_time() {
        let mut entry = EntryRecord::new("+15550000001", Some("Ada".into()));
        let first = Utc::now();
        entry.mark_in_progress(first);
        let later = first + chrono::TimeDelta::seconds(10);
        entry.mark_in_progress(later);
        assert_eq!(entry.call_started_at, Some(first));
        assert_eq!(entry.status, EntryStatus::InProgress);
    }

    #[test]
    fn terminal_sets_end_time_and_duration() {
        let mut entry = EntryRecord::new("+15550000001", None);
        let now = Utc::now();
        entry.mark_in_progress(now);
        entry.mark_terminal(EntryStatus::Declined, now, Some(7));
        assert_eq!(entry.status, EntryStatus::Declined);
        assert_eq!(entry.call_ended_at, Some(now));
        assert_eq!(entry.duration_secs, Some(7));
        assert_eq!(entry.call_started_at, Some(now));
    }

    #[test]
    fn correction_without_duration_keeps_recorded_one() {
        let mut entry = EntryRecord::new("+15550000001", None);
        let now = Utc::now();
        entry.mark_in_progress(now);
        entry.mark_terminal(EntryStatus::Completed, now, Some(42));
        entry.mark_terminal(EntryStatus::Failed, now, None);
        assert_eq!(entry.status, EntryStatus::Failed);
        assert_eq!(entry.duration_secs, Some(42));

        entry.mark_terminal(EntryStatus::Completed, now, Some(40));
        assert_eq!(entry.duration_secs, Some(40));
    }

    #[test]
    fn push_and_remove_bump_updated_at() {
        let mut campaign = Campaign::new("list", Some("desc".into()));
        let created = campaign.updated_at;
        let id = campaign.push_entry("+15550000001", None);
        assert!(campaign.updated_at >= created);
        assert_eq!(campaign.entries.len(), 1);

        let removed = campaign.remove_entry(&id).expect("entry should exist");
        assert_eq!(removed.id, id);
        assert!(campaign.entries.is_empty());
        assert!(campaign.remove_entry(&id).is_none());
    }

    #[test]
    fn campaign_serializes_round_trip() {
        let campaign = Campaign::with_entries(
            "round trip",
            None,
            [("+15550000001", Some("Ada".to_string())), ("+15550000002", None)],
        );
        let json = serde_json::to_string(&campaign).unwrap();
        let back: Campaign = serde_json::from_str(&json).unwrap();
        assert_eq!(back, campaign);
    }
}
