// src/models/mod.rs

//! Domain models for the trend crawler.

mod config;
mod snapshot;
mod topic;

// Re-export all public types
pub use config::{Config, CrawlerConfig, ScheduleConfig, SourceConfig, StorageConfig};
pub use snapshot::{SNAPSHOT_KEY_FORMAT, Snapshot, TopicsDocument};
pub use topic::{Post, TopicEntry};

/// Replace the first item matching `item` in place, or append it.
pub(crate) fn upsert<T>(items: &mut Vec<T>, item: T, same: impl Fn(&T, &T) -> bool) {
    match items.iter_mut().find(|existing| same(&**existing, &item)) {
        Some(slot) => *slot = item,
        None => items.push(item),
    }
}
