// src/storage/history.rs

//! Bounded, insertion-ordered history of snapshots.
//!
//! Entries are kept oldest-first in a `VecDeque`. Once the history is full,
//! inserting a new key evicts the oldest-inserted key. Re-inserting a key
//! that is still present replaces its value without moving it, so eviction
//! order is strictly FIFO and never depends on access or updates.

use std::collections::VecDeque;
use std::collections::vec_deque;
use std::iter::{Rev, Take};

use crate::error::{AppError, Result};
use crate::models::Snapshot;

/// Snapshot history keyed by snapshot key.
pub type SnapshotHistory = BoundedHistory<String, Snapshot>;

/// A capacity-limited map with FIFO eviction.
#[derive(Debug, Clone)]
pub struct BoundedHistory<K, V> {
    entries: VecDeque<(K, V)>,
    capacity: usize,
}

impl<K: PartialEq, V> BoundedHistory<K, V> {
    /// Create an empty history. A zero capacity is a configuration error.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(AppError::config("history capacity must be > 0"));
        }
        Ok(Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Insert or update `key`.
    ///
    /// Returns the evicted entry when a new key pushed the oldest one out.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some((_, slot)) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            *slot = value;
            return None;
        }

        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back((key, value));
        evicted
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The `n` most recently inserted entries, newest first.
    ///
    /// Each call starts a fresh walk from the back of the history.
    pub fn latest(&self, n: usize) -> Latest<'_, K, V> {
        let available = n.min(self.entries.len());
        Latest {
            inner: self.entries.iter().rev().take(n),
            requested: n,
            available,
        }
    }

    /// Keys in insertion order, oldest first.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }
}

/// Lazy newest-first walk over a history.
///
/// Asking for more entries than the history holds is not an error; the walk
/// yields what exists and [`Latest::shortfall`] reports the difference.
#[derive(Debug, Clone)]
pub struct Latest<'a, K, V> {
    inner: Take<Rev<vec_deque::Iter<'a, (K, V)>>>,
    requested: usize,
    available: usize,
}

impl<K, V> Latest<'_, K, V> {
    /// Number of entries asked for.
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Number of entries this walk yields in total.
    pub fn available(&self) -> usize {
        self.available
    }

    /// How many requested entries do not exist.
    pub fn shortfall(&self) -> usize {
        self.requested - self.available
    }
}

impl<'a, K, V> Iterator for Latest<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Latest<'_, K, V> {}
