// src/testing.rs

//! In-memory collaborators shared by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::Snapshot;
use crate::storage::{SnapshotStorage, WriteMetadata};
use crate::utils::PageFetcher;

/// Serves fixed pages by URL; unknown URLs fail.
#[derive(Default)]
pub struct StubFetcher {
    pages: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.requests.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::fetch(url, "no stub page"))
    }
}

/// Records persisted snapshot keys per call.
#[derive(Default)]
pub struct MemoryStorage {
    calls: Mutex<Vec<Vec<String>>>,
}

impl MemoryStorage {
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SnapshotStorage for MemoryStorage {
    async fn persist(&self, banner: &str, snapshots: &[&Snapshot]) -> Result<WriteMetadata> {
        let keys: Vec<String> = snapshots.iter().map(|s| s.key().to_string()).collect();
        let locations = keys.iter().map(|k| format!("{banner}_{k}")).collect();
        self.calls.lock().unwrap().push(keys);
        Ok(WriteMetadata {
            locations,
            timestamp: Utc::now(),
        })
    }
}
