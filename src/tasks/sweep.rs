//! Expiry Sweep Task
//!
//! Background task that periodically removes expired fast-tier entries.
//! The cache never schedules this itself; whoever owns the cache does.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::TieredCache;
use crate::medium::StorageMedium;

/// Spawns a task calling [`TieredCache::collect_expired`] every
/// `sweep_interval_secs` seconds.
///
/// The returned handle is aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(RwLock::new(TieredCache::new(medium, CacheOptions::default())));
/// let sweep_handle = spawn_sweep_task(cache.clone(), 60);
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task<V, M>(
    cache: Arc<RwLock<TieredCache<V, M>>>,
    sweep_interval_secs: u64,
) -> JoinHandle<()>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    M: StorageMedium + 'static,
{
    let interval = Duration::from_secs(sweep_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.write().await.collect_expired();

            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    })
}
