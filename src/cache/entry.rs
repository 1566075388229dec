//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// A stored value together with when it was written and how long it lives.
///
/// The serde field names are the durable record format:
/// `{"data": .., "timestamp": .., "ttl": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    /// The stored value
    #[serde(rename = "data")]
    pub value: V,
    /// Write timestamp (Unix milliseconds)
    #[serde(rename = "timestamp")]
    pub stored_at: u64,
    /// Time-to-live in milliseconds
    pub ttl: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry stamped at `now`.
    pub fn new(value: V, now: u64, ttl: u64) -> Self {
        Self {
            value,
            stored_at: now,
            ttl,
        }
    }

    // == Is Live ==
    /// An entry is live while `now - stored_at <= ttl`.
    ///
    /// The boundary is inclusive: with `ttl = 5000` the entry is still live
    /// at exactly +5000 ms and gone at +5001 ms. A `stored_at` ahead of
    /// `now` (clock skew between writers) counts as live.
    pub fn is_live(&self, now: u64) -> bool {
        now.saturating_sub(self.stored_at) <= self.ttl
    }

    pub fn is_expired(&self, now: u64) -> bool {
        !self.is_live(now)
    }

    // == Time To Live ==
    /// Milliseconds left before the entry expires, 0 once expired.
    pub fn ttl_remaining_ms(&self, now: u64) -> u64 {
        self.stored_at
            .saturating_add(self.ttl)
            .saturating_sub(now)
    }
}

// == Entry Header ==
/// The timing fields of a durable record, parsed without touching `data`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct EntryHeader {
    pub timestamp: u64,
    pub ttl: u64,
}

impl EntryHeader {
    pub fn is_live(&self, now: u64) -> bool {
        now.saturating_sub(self.timestamp) <= self.ttl
    }
}
