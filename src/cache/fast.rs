//! Fast Tier Module
//!
//! Process-local entry map with lazy TTL expiry and an optional LRU bound.

use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::{CacheEntry, Clock, LruTracker, SystemClock};

// == Fast Tier ==
/// In-memory tier. Values are stored as-is and handed out by clone.
#[derive(Debug)]
pub struct FastTier<V> {
    entries: HashMap<String, CacheEntry<V>>,
    lru: LruTracker,
    /// `None` = unbounded; only expiry reclaims space
    max_entries: Option<usize>,
    clock: Arc<dyn Clock>,
    /// Entries dropped by the capacity bound since creation
    evictions: u64,
}

impl<V: Clone> FastTier<V> {
    /// Creates an unbounded tier on the system clock.
    pub fn new() -> Self {
        Self::with_clock(None, Arc::new(SystemClock))
    }

    pub fn with_clock(max_entries: Option<usize>, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            max_entries: max_entries.filter(|&n| n > 0),
            clock,
            evictions: 0,
        }
    }

    // == Set ==
    /// Inserts or replaces `key`, stamped now.
    pub fn set(&mut self, key: &str, value: V, ttl_ms: u64) {
        let entry = CacheEntry::new(value, self.clock.now_ms(), ttl_ms);
        self.insert_entry(key, entry);
    }

    // == Insert Entry ==
    /// Inserts an entry keeping its own `stored_at` and `ttl`.
    pub fn insert_entry(&mut self, key: &str, entry: CacheEntry<V>) {
        if !self.entries.contains_key(key) {
            self.make_room();
        }
        self.entries.insert(key.to_string(), entry);
        self.lru.touch(key);
    }

    // == Get ==
    /// Returns the value if live. An expired entry is removed first.
    pub fn get(&mut self, key: &str) -> Option<V> {
        if !self.check_live(key) {
            return None;
        }
        self.lru.touch(key);
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Same liveness check as `get`, without touching recency.
    pub fn has(&mut self, key: &str) -> bool {
        self.check_live(key)
    }

    pub fn delete(&mut self, key: &str) -> bool {
        self.lru.remove(key);
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
    }

    /// Physically stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    // == Collect Expired ==
    /// Removes every expired entry; returns how many were removed.
    pub fn collect_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.entries.remove(key);
            self.lru.remove(key);
        }
        expired.len()
    }

    fn check_live(&mut self, key: &str) -> bool {
        let now = self.clock.now_ms();
        let live = match self.entries.get(key) {
            Some(entry) => entry.is_live(now),
            None => return false,
        };
        if !live {
            self.delete(key);
        }
        live
    }

    fn make_room(&mut self) {
        let Some(max) = self.max_entries else {
            return;
        };
        while self.entries.len() >= max {
            match self.lru.evict_oldest() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                    self.evictions += 1;
                }
                None => break,
            }
        }
    }
}

impl<V: Clone> Default for FastTier<V> {
    fn default() -> Self {
        Self::new()
    }
}
