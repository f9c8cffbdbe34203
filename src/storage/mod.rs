//! Snapshot retention and persistence.
//!
//! - [`history`]: the in-memory, capacity-bounded snapshot history
//! - [`local`]: JSON files on the local filesystem
//!
//! ## Directory Structure
//!
//! ```text
//! {output_dir}/
//! ├── {banner}_20261017-120000.json
//! └── {banner}_20261017-121000.json
//! ```

pub mod history;
pub mod local;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::Snapshot;

// Re-export for convenience
pub use history::{BoundedHistory, Latest, SnapshotHistory};
pub use local::LocalStorage;

/// Metadata about a storage write operation.
#[derive(Debug, Clone)]
pub struct WriteMetadata {
    /// Where each snapshot went, in the order they were given
    pub locations: Vec<String>,
    /// Timestamp of the write
    pub timestamp: DateTime<Utc>,
}

/// Outcome of persisting the most recent snapshots.
#[derive(Debug, Clone)]
pub struct PersistReport {
    /// Snapshots asked for
    pub requested: usize,
    /// Locations actually written, newest first
    pub locations: Vec<String>,
}

impl PersistReport {
    /// Whether fewer snapshots existed than were asked for.
    pub fn is_short(&self) -> bool {
        self.locations.len() < self.requested
    }

    /// Human-readable status line.
    pub fn status(&self) -> String {
        if self.is_short() {
            return format!(
                "FAIL: only have {} of {} requested snapshots",
                self.locations.len(),
                self.requested
            );
        }
        match self.locations.last() {
            Some(last) => format!("DONE: saved {last}"),
            None => "DONE: nothing requested".to_string(),
        }
    }
}

/// Trait for snapshot storage backends.
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// Persist snapshots, given newest first.
    async fn persist(&self, banner: &str, snapshots: &[&Snapshot]) -> Result<WriteMetadata>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persist_report_status() {
        let done = PersistReport {
            requested: 1,
            locations: vec!["out/a.json".into()],
        };
        assert!(!done.is_short());
        assert_eq!(done.status(), "DONE: saved out/a.json");

        let short = PersistReport {
            requested: 3,
            locations: vec!["out/a.json".into()],
        };
        assert!(short.is_short());
        assert_eq!(short.status(), "FAIL: only have 1 of 3 requested snapshots");
    }
}
