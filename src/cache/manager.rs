//! Tiered Cache Module
//!
//! Read-through / write-through composition of the fast and durable tiers.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::cache::{
    CacheStats, Clock, DurableTier, FastTier, Slot, SystemClock, Tier, DEFAULT_NAMESPACE,
    DEFAULT_TTL_MS, MAX_KEY_LENGTH,
};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::medium::StorageMedium;

// == Cache Options ==
/// Construction parameters for [`TieredCache`].
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Durable key prefix
    pub namespace: String,
    /// TTL applied when `set` is called without one
    pub default_ttl: Duration,
    /// Fast-tier capacity; `None` leaves it unbounded
    pub max_entries: Option<usize>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            default_ttl: Duration::from_millis(DEFAULT_TTL_MS),
            max_entries: None,
        }
    }
}

impl From<&Config> for CacheOptions {
    fn from(config: &Config) -> Self {
        Self {
            namespace: config.namespace.clone(),
            default_ttl: Duration::from_millis(config.default_ttl_ms),
            max_entries: (config.max_entries > 0).then_some(config.max_entries),
        }
    }
}

// == Tiered Cache ==
/// Two-tier TTL cache.
///
/// Writes go to the fast tier and then the durable tier. Reads try the fast
/// tier, then the durable tier, promoting durable hits with their original
/// stamp so a promotion never extends an entry's life.
#[derive(Debug)]
pub struct TieredCache<V, M> {
    fast: FastTier<V>,
    durable: DurableTier<M>,
    default_ttl_ms: u64,
    stats: CacheStats,
}

impl<V, M> TieredCache<V, M>
where
    V: Clone + Serialize + DeserializeOwned,
    M: StorageMedium,
{
    // == Constructor ==
    pub fn new(medium: M, options: CacheOptions) -> Self {
        Self::with_clock(medium, options, Arc::new(SystemClock))
    }

    /// Both tiers share `clock`.
    pub fn with_clock(medium: M, options: CacheOptions, clock: Arc<dyn Clock>) -> Self {
        Self {
            fast: FastTier::with_clock(options.max_entries, clock.clone()),
            durable: DurableTier::with_clock(medium, options.namespace, clock),
            default_ttl_ms: duration_ms(options.default_ttl),
            stats: CacheStats::new(),
        }
    }

    // == Set ==
    /// Stores `value` in both tiers.
    ///
    /// Only an empty or oversized key, or a zero TTL, is an error. A durable
    /// write failure leaves the fast-tier write in place and is only logged.
    pub fn set(&mut self, key: &str, value: V, ttl: Option<Duration>) -> Result<()> {
        validate_key(key)?;
        let ttl_ms = match ttl {
            Some(ttl) => duration_ms(ttl),
            None => self.default_ttl_ms,
        };
        if ttl_ms == 0 {
            return Err(CacheError::InvalidTtl(
                "TTL must be at least 1 millisecond".to_string(),
            ));
        }

        self.fast.set(key, value.clone(), ttl_ms);
        self.durable.set(key, &value, ttl_ms);
        Ok(())
    }

    // == Get ==
    pub fn get(&mut self, key: &str) -> Option<V> {
        self.lookup(key).map(|(value, _)| value)
    }

    // == Lookup ==
    /// Like `get`, also reporting which tier answered.
    pub fn lookup(&mut self, key: &str) -> Option<(V, Tier)> {
        if let Some(value) = self.fast.get(key) {
            self.stats.record_hit(Tier::Fast);
            return Some((value, Tier::Fast));
        }

        match self.durable.get_entry::<V>(key) {
            Some(entry) => {
                debug!(key, ttl_ms = entry.ttl, "Promoting durable cache entry");
                let value = entry.value.clone();
                self.fast.insert_entry(key, entry);
                self.stats.record_hit(Tier::Durable);
                Some((value, Tier::Durable))
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// True if either tier holds a live entry for `key`.
    pub fn has(&mut self, key: &str) -> bool {
        self.fast.has(key) || self.durable.has(key)
    }

    // == Delete ==
    /// Removes `key` from both tiers; true if either had it.
    pub fn delete(&mut self, key: &str) -> bool {
        let in_fast = self.fast.delete(key);
        let in_durable = self.durable.delete(key);
        in_fast || in_durable
    }

    pub fn clear(&mut self) {
        self.fast.clear();
        let removed = self.durable.clear();
        debug!(removed, "Cleared durable cache namespace");
    }

    // == Collect Expired ==
    /// Sweeps the fast tier. Durable records expire lazily on access.
    pub fn collect_expired(&mut self) -> usize {
        let removed = self.fast.collect_expired();
        self.stats.record_expirations(removed as u64);
        removed
    }

    // == Get Or Insert With ==
    /// Cache-aside read: `fetch` runs only on a miss and its value is stored
    /// with `ttl`. A fetch error is returned as-is and nothing is cached.
    pub fn get_or_insert_with<E, F>(
        &mut self,
        key: &str,
        ttl: Option<Duration>,
        fetch: F,
    ) -> std::result::Result<V, E>
    where
        F: FnOnce() -> std::result::Result<V, E>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = fetch()?;
        if let Err(e) = self.set(key, value.clone(), ttl) {
            debug!(key, error = %e, "Fetched value not cached");
        }
        Ok(value)
    }

    /// Binds `key` to a handle that falls back to `initial`.
    pub fn slot(&mut self, key: impl Into<String>, initial: V) -> Slot<'_, V, M> {
        Slot::new(self, key.into(), initial)
    }

    /// Physically stored fast-tier entries.
    pub fn len(&self) -> usize {
        self.fast.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fast.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.evictions = self.fast.evictions();
        stats.fast_entries = self.fast.len();
        stats
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    pub fn fast_tier(&mut self) -> &mut FastTier<V> {
        &mut self.fast
    }

    pub fn durable_tier(&self) -> &DurableTier<M> {
        &self.durable
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidKey(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}

fn duration_ms(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)
}
