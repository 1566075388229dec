//! Cache Statistics Module
//!
//! Tracks hits per tier, misses, evictions and expirations.

use serde::Serialize;

// == Tier ==
/// Which tier answered a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Fast,
    Durable,
}

// == Cache Stats ==
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Reads answered by the fast tier
    pub fast_hits: u64,
    /// Reads answered by the durable tier (and promoted)
    pub durable_hits: u64,
    /// Reads that found nothing live in either tier
    pub misses: u64,
    /// Fast-tier entries dropped by the capacity bound
    pub evictions: u64,
    /// Fast-tier entries removed by a sweep
    pub expirations: u64,
    /// Current number of physically stored fast-tier entries
    pub fast_entries: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hits(&self) -> u64 {
        self.fast_hits + self.durable_hits
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits() + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self, tier: Tier) {
        match tier {
            Tier::Fast => self.fast_hits += 1,
            Tier::Durable => self.durable_hits += 1,
        }
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_expirations(&mut self, count: u64) {
        self.expirations += count;
    }
}
