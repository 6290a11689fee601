//! Provisioning-store lookup boundary
//!
//! The ingestion path asks this collaborator whether a cluster name that is
//! not yet in the pool was ever provisioned. Read-only from the controller's
//! perspective.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;

#[async_trait]
pub trait ProvisionStore: Send + Sync {
    /// Whether `name` was previously provisioned through the control plane
    async fn cluster_was_provisioned(&self, name: &str) -> Result<bool>;
}

/// Provision store backed by a JSON file holding the provisioned names.
///
/// The file is re-read on every lookup so names added by an external
/// provisioning flow are picked up without a restart.
pub struct FileProvisionStore {
    path: PathBuf,
}

impl FileProvisionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ProvisionStore for FileProvisionStore {
    async fn cluster_was_provisioned(&self, name: &str) -> Result<bool> {
        let data = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Failed to read provision store {:?}", self.path))?;
        let names: Vec<String> =
            serde_json::from_slice(&data).context("Failed to parse provision store")?;
        Ok(names.iter().any(|n| n == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_file_store_lookup() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["alpha", "beta"]"#).unwrap();

        let store = FileProvisionStore::new(file.path());
        assert!(store.cluster_was_provisioned("alpha").await.unwrap());
        assert!(!store.cluster_was_provisioned("gamma").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let store = FileProvisionStore::new("/nonexistent/provisioned.json");
        assert!(store.cluster_was_provisioned("alpha").await.is_err());
    }
}
