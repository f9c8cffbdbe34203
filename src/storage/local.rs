//! Local filesystem storage implementation.
//!
//! Each snapshot is written to `{root}/{banner}_{key}.json` as the
//! snapshot's topics map. Writes go to a temporary file first and are then
//! renamed into place.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::models::Snapshot;
use crate::storage::{SnapshotStorage, WriteMetadata};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &PathBuf {
        &self.root_dir
    }

    /// Create the root directory if it is missing.
    pub async fn prepare(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root_dir).await?;
        Ok(())
    }

    /// File name for a snapshot.
    pub fn file_name(banner: &str, key: &str) -> String {
        format!("{banner}_{key}.json")
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(path)
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<PathBuf> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }
}

#[async_trait]
impl SnapshotStorage for LocalStorage {
    async fn persist(&self, banner: &str, snapshots: &[&Snapshot]) -> Result<WriteMetadata> {
        let mut locations = Vec::with_capacity(snapshots.len());

        for snapshot in snapshots {
            let name = Self::file_name(banner, snapshot.key());
            let path = self.write_json(&name, &snapshot.document()).await?;
            log::debug!(
                "Wrote snapshot {} ({} topics) to {}",
                snapshot.key(),
                snapshot.len(),
                path.display()
            );
            locations.push(path.display().to_string());
        }

        Ok(WriteMetadata {
            locations,
            timestamp: Utc::now(),
        })
    }
}
