use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use tokio::sync::Mutex;

use super::{DeploymentStore, StoreError, check_key};
use crate::types::DeploymentRecord;

type Records = BTreeMap<String, DeploymentRecord>;

/// Store backed by a single pretty-printed JSON file mapping asset identifiers to records.
///
/// Writes go to a sibling temporary file which is then renamed over the store, so a
/// crash never leaves a half-written file behind. Access from one process is serialized
/// by an internal lock; concurrent writers in other processes are not coordinated.
#[derive(Debug)]
pub struct FileDeploymentStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileDeploymentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    async fn load(&self) -> Result<Records, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Records::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        if content.trim().is_empty() {
            return Ok(Records::new());
        }

        serde_json::from_str(&content).map_err(|source| StoreError::Serialization {
            path: self.path.clone(),
            source,
        })
    }

    async fn save(&self, records: &Records) -> Result<(), StoreError> {
        let json =
            serde_json::to_string_pretty(records).map_err(|source| StoreError::Serialization {
                path: self.path.clone(),
                source,
            })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        Ok(())
    }
}

impl DeploymentStore for FileDeploymentStore {
    async fn upsert(&self, record: DeploymentRecord) -> Result<(), StoreError> {
        check_key(&record)?;

        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        tracing::debug!(
            property_id = %record.property_id,
            status = %record.status,
            path = %self.path.display(),
            "Writing deployment record"
        );
        records.insert(record.property_id.clone(), record);
        self.save(&records).await
    }

    async fn get(&self, property_id: &str) -> Result<Option<DeploymentRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(property_id))
    }

    async fn list(&self) -> Result<Vec<DeploymentRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.into_values().collect())
    }
}
