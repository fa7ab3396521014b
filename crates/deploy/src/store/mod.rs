//! Durable projection of deployment attempts, keyed by asset identifier.

use std::{future::Future, path::PathBuf};

use crate::types::DeploymentRecord;

mod file;
mod memory;

pub use file::FileDeploymentStore;
pub use memory::MemoryDeploymentStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("deployment record key is empty")]
    EmptyKey,

    #[error("failed to access deployment store at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("deployment store at {} is corrupt: {source}", .path.display())]
    Serialization {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Key-value storage for [`DeploymentRecord`]s.
///
/// `upsert` is a full replace of the record stored under `record.property_id`; nothing
/// from the previous record is merged in.
pub trait DeploymentStore: Send + Sync {
    fn upsert(
        &self,
        record: DeploymentRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn get(
        &self,
        property_id: &str,
    ) -> impl Future<Output = Result<Option<DeploymentRecord>, StoreError>> + Send;

    /// Every stored record, ordered by asset identifier.
    fn list(&self) -> impl Future<Output = Result<Vec<DeploymentRecord>, StoreError>> + Send;
}

fn check_key(record: &DeploymentRecord) -> Result<(), StoreError> {
    if record.property_id.trim().is_empty() {
        return Err(StoreError::EmptyKey);
    }
    Ok(())
}
