//! Async fetch-through over a shared cache.

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::TieredCache;
use crate::medium::StorageMedium;

/// Returns the cached value for `key`, or awaits `fetch` and caches its
/// result for `ttl`.
///
/// The lock is released while `fetch` runs. Two callers missing at the same
/// time both fetch; the later write wins. A fetch error is returned and
/// nothing is cached.
pub async fn fetch_through<V, M, F, Fut, E>(
    cache: &RwLock<TieredCache<V, M>>,
    key: &str,
    ttl: Option<Duration>,
    fetch: F,
) -> Result<V, E>
where
    V: Clone + Serialize + DeserializeOwned,
    M: StorageMedium,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, E>>,
{
    // Write lock: a read may remove expired entries or promote.
    if let Some(value) = cache.write().await.get(key) {
        return Ok(value);
    }

    debug!(key, "Cache miss, fetching");
    let value = fetch().await?;

    if let Err(e) = cache.write().await.set(key, value.clone(), ttl) {
        debug!(key, error = %e, "Fetched value not cached");
    }
    Ok(value)
}
