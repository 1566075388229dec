//! Key-bound handle over a [`TieredCache`].

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::TieredCache;
use crate::error::Result;
use crate::medium::StorageMedium;

/// One cache key plus the value to show when nothing is cached.
///
/// Writes use the cache's default TTL.
pub struct Slot<'a, V, M> {
    cache: &'a mut TieredCache<V, M>,
    key: String,
    initial: V,
}

impl<'a, V, M> Slot<'a, V, M>
where
    V: Clone + Serialize + DeserializeOwned,
    M: StorageMedium,
{
    pub(crate) fn new(cache: &'a mut TieredCache<V, M>, key: String, initial: V) -> Self {
        Self {
            cache,
            key,
            initial,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Cached value, or the initial value on a miss.
    pub fn get(&mut self) -> V {
        self.cache
            .get(&self.key)
            .unwrap_or_else(|| self.initial.clone())
    }

    pub fn set(&mut self, value: V) -> Result<()> {
        self.cache.set(&self.key, value, None)
    }

    pub fn set_with_ttl(&mut self, value: V, ttl: Duration) -> Result<()> {
        self.cache.set(&self.key, value, Some(ttl))
    }
}
