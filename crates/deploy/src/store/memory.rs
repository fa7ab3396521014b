use std::collections::BTreeMap;

use tokio::sync::RwLock;

use super::{DeploymentStore, StoreError, check_key};
use crate::types::DeploymentRecord;

/// Process-local store. Records are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryDeploymentStore {
    records: RwLock<BTreeMap<String, DeploymentRecord>>,
}

impl MemoryDeploymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeploymentStore for MemoryDeploymentStore {
    async fn upsert(&self, record: DeploymentRecord) -> Result<(), StoreError> {
        check_key(&record)?;
        self.records
            .write()
            .await
            .insert(record.property_id.clone(), record);
        Ok(())
    }

    async fn get(&self, property_id: &str) -> Result<Option<DeploymentRecord>, StoreError> {
        Ok(self.records.read().await.get(property_id).cloned())
    }

    async fn list(&self) -> Result<Vec<DeploymentRecord>, StoreError> {
        Ok(self.records.read().await.values().cloned().collect())
    }
}
