//! One pipeline cycle's result set.

use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};

use super::{TopicEntry, upsert};

/// Layout of snapshot keys; lexical order follows time at one-second granularity.
pub const SNAPSHOT_KEY_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Topics captured by one cycle, keyed by topic name in extraction order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    key: String,
    topics: Vec<TopicEntry>,
}

impl Snapshot {
    /// Start an empty snapshot under an explicit key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            topics: Vec::new(),
        }
    }

    /// Start an empty snapshot keyed by the given time.
    pub fn at(time: DateTime<Local>) -> Self {
        Self::new(time.format(SNAPSHOT_KEY_FORMAT).to_string())
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn topics(&self) -> &[TopicEntry] {
        &self.topics
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Look up a topic by name.
    pub fn topic(&self, name: &str) -> Option<&TopicEntry> {
        self.topics.iter().find(|t| t.name == name)
    }

    /// Insert a completed topic; a repeated name replaces the earlier entry in place.
    pub fn insert_topic(&mut self, entry: TopicEntry) {
        upsert(&mut self.topics, entry, |a, b| a.name == b.name);
    }

    /// The persisted document: the topics map, keyed by name.
    pub fn document(&self) -> TopicsDocument<'_> {
        TopicsDocument(&self.topics)
    }
}

/// Serializes a snapshot's topics as a name-keyed map.
pub struct TopicsDocument<'a>(&'a [TopicEntry]);

impl Serialize for TopicsDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|topic| (&topic.name, topic)))
    }
}
