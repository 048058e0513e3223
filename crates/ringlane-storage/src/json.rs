// SPDX-FileCopyrightText: 2026 Ringlane Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON-file persistence adapter.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ringlane_config::model::StorageConfig;
use ringlane_core::{
    AdapterType, Campaign, CampaignId, HealthStatus, PersistenceAdapter, PluginAdapter,
    RinglaneError,
};
use tokio::sync::Mutex;
use tracing::debug;

use crate::state::{FORMAT_VERSION, StateFile};

/// Stores the whole [`StateFile`] as one JSON document.
///
/// The document is read lazily on first access and cached. Every save
/// rewrites the file through a sibling temp file and a rename, so a crash
/// mid-write leaves the previous document intact.
pub struct JsonFileStore {
    path: PathBuf,
    cache: Mutex<Option<StateFile>>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.state_path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<StateFile, RinglaneError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no state file yet, starting empty");
                return Ok(StateFile::default());
            }
            Err(e) => return Err(storage_err(e)),
        };
        let doc: StateFile = serde_json::from_slice(&bytes).map_err(storage_err)?;
        if doc.format_version > FORMAT_VERSION {
            return Err(RinglaneError::Storage {
                source: format!(
                    "state file {} has format version {}, newest supported is {FORMAT_VERSION}",
                    self.path.display(),
                    doc.format_version
                )
                .into(),
            });
        }
        debug!(
            path = %self.path.display(),
            campaigns = doc.campaigns.len(),
            "state file loaded"
        );
        Ok(doc)
    }

    async fn write_document(&self, doc: &StateFile) -> Result<(), RinglaneError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(storage_err)?;
        }
        let body = serde_json::to_vec_pretty(doc).map_err(storage_err)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await.map_err(storage_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(storage_err)?;
        debug!(path = %self.path.display(), "state file written");
        Ok(())
    }

    /// Apply `update` to the cached document and write it out.
    async fn update<F>(&self, update: F) -> Result<(), RinglaneError>
    where
        F: FnOnce(&mut StateFile),
    {
        let mut cache = self.cache.lock().await;
        let mut doc = match cache.take() {
            Some(doc) => doc,
            None => self.read_document().await?,
        };
        update(&mut doc);
        let written = self.write_document(&doc).await;
        *cache = Some(doc);
        written
    }

    async fn read<T>(&self, f: impl FnOnce(&StateFile) -> T) -> Result<T, RinglaneError> {
        let mut cache = self.cache.lock().await;
        if cache.is_none() {
            *cache = Some(self.read_document().await?);
        }
        match cache.as_ref() {
            Some(doc) => Ok(f(doc)),
            None => Err(RinglaneError::Internal("state cache unavailable".into())),
        }
    }
}

fn storage_err(e: impl std::error::Error + Send + Sync + 'static) -> RinglaneError {
    RinglaneError::Storage {
        source: Box::new(e),
    }
}

#[async_trait]
impl PluginAdapter for JsonFileStore {
    fn name(&self) -> &str {
        "json-file"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Persistence
    }

    async fn health_check(&self) -> Result<HealthStatus, RinglaneError> {
        match self.read(|_| ()).await {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), RinglaneError> {
        Ok(())
    }
}

#[async_trait]
impl PersistenceAdapter for JsonFileStore {
    async fn load_campaigns(&self) -> Result<Vec<Campaign>, RinglaneError> {
        self.read(|doc| doc.campaigns.clone()).await
    }

    async fn save_campaigns(&self, campaigns: &[Campaign]) -> Result<(), RinglaneError> {
        self.update(|doc| doc.campaigns = campaigns.to_vec()).await
    }

    async fn load_active_campaign_id(&self) -> Result<Option<CampaignId>, RinglaneError> {
        self.read(|doc| doc.active_campaign_id.clone()).await
    }

    async fn save_active_campaign_id(&self, id: Option<&CampaignId>) -> Result<(), RinglaneError> {
        self.update(|doc| doc.active_campaign_id = id.cloned()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringlane_core::EntryStatus;

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));
        assert!(store.load_campaigns().await.unwrap().is_empty());
        assert_eq!(store.load_active_campaign_id().await.unwrap(), None);
    }

    #[tokio::test]
    async fn state_survives_a_new_store_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/state.json");

        let mut campaign = Campaign::with_entries(
            "renewals",
            Some("Q3 renewals".into()),
            [("+15550100", Some("Ada".to_string())), ("+15550101", None)],
        );
        campaign.entries[0].status = EntryStatus::Completed;

        let store = JsonFileStore::new(&path);
        store.save_campaigns(&[campaign.clone()]).await.unwrap();
        store.save_active_campaign_id(Some(&campaign.id)).await.unwrap();

        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.load_campaigns().await.unwrap(), vec![campaign.clone()]);
        assert_eq!(
            reopened.load_active_campaign_id().await.unwrap(),
            Some(campaign.id)
        );
    }

    #[tokio::test]
    async fn clearing_active_id_keeps_campaigns() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));
        let campaign = Campaign::new("solo", None);

        store.save_campaigns(&[campaign.clone()]).await.unwrap();
        store.save_active_campaign_id(Some(&campaign.id)).await.unwrap();
        store.save_active_campaign_id(None).await.unwrap();

        let reopened = JsonFileStore::new(store.path());
        assert_eq!(reopened.load_active_campaign_id().await.unwrap(), None);
        assert_eq!(reopened.load_campaigns().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn corrupt_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = JsonFileStore::new(&path);
        let err = store.load_campaigns().await.unwrap_err();
        assert!(matches!(err, RinglaneError::Storage { .. }));
        assert!(matches!(
            store.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }

    #[tokio::test]
    async fn newer_format_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, br#"{"format_version": 99}"#).unwrap();

        let store = JsonFileStore::new(&path);
        assert!(store.load_campaigns().await.is_err());
    }
}
