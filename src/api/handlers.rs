//! API Handlers
//!
//! HTTP request handlers for each cache service endpoint.

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use tracing::warn;

use crate::cache::{CacheOptions, TieredCache};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::medium::{FileMedium, MemoryMedium, StorageMedium};
use crate::models::{
    DeleteResponse, GetResponse, HealthResponse, SetRequest, SetResponse, StatsResponse,
    SweepResponse,
};

/// The cache the service hosts: JSON values on a medium picked at startup.
pub type ServiceCache = TieredCache<Value, Box<dyn StorageMedium>>;

/// Application state shared across all handlers.
///
/// Contains the cache wrapped in Arc<RwLock<>> for thread-safe access.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<RwLock<ServiceCache>>,
}

impl AppState {
    pub fn new(cache: ServiceCache) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// The durable tier lives in `config.cache_dir`, else the platform cache
    /// directory. With neither available it falls back to an in-process
    /// medium, so nothing survives a restart.
    pub fn from_config(config: &Config) -> Self {
        let medium: Box<dyn StorageMedium> = match &config.cache_dir {
            Some(dir) => Box::new(FileMedium::with_dir(dir)),
            None => match FileMedium::for_app(&config.namespace) {
                Some(file) => Box::new(file),
                None => {
                    warn!("No cache directory available, durable tier will not persist");
                    Box::new(MemoryMedium::new())
                }
            },
        };
        Self::new(TieredCache::new(medium, CacheOptions::from(config)))
    }
}

/// Runs `op` on the blocking pool with the cache write-locked.
///
/// Anything that reaches the durable tier goes through here, since a
/// `FileMedium` does synchronous filesystem I/O.
async fn with_cache<T, F>(state: &AppState, op: F) -> Result<T>
where
    F: FnOnce(&mut ServiceCache) -> T + Send + 'static,
    T: Send + 'static,
{
    let cache = state.cache.clone();
    tokio::task::spawn_blocking(move || op(&mut cache.blocking_write()))
        .await
        .map_err(|e| CacheError::Internal(format!("cache task failed: {}", e)))
}

/// Handler for GET /cache/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    // Write lock: reads may drop expired entries or promote durable ones
    let lookup_key = key.clone();
    let (value, tier) = with_cache(&state, move |cache| cache.lookup(&lookup_key))
        .await?
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value, tier)))
}

/// Handler for PUT /cache/:key
pub async fn set_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    let ttl = req.ttl();
    let set_key = key.clone();
    with_cache(&state, move |cache| cache.set(&set_key, req.value, ttl)).await??;

    Ok(Json(SetResponse::new(key)))
}

/// Handler for DELETE /cache/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let delete_key = key.clone();
    if !with_cache(&state, move |cache| cache.delete(&delete_key)).await? {
        return Err(CacheError::NotFound(key));
    }

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for DELETE /cache
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<Value>> {
    with_cache(&state, |cache| cache.clear()).await?;
    Ok(Json(serde_json::json!({ "message": "Cache cleared" })))
}

/// Handler for POST /cache/sweep
pub async fn sweep_handler(State(state): State<AppState>) -> Json<SweepResponse> {
    let removed = state.cache.write().await.collect_expired();
    Json(SweepResponse { removed })
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache.read().await;
    Json(StatsResponse::from(cache.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Tier;
    use serde_json::json;

    fn test_state() -> AppState {
        let medium: Box<dyn StorageMedium> = Box::new(MemoryMedium::new());
        AppState::new(TieredCache::new(medium, CacheOptions::default()))
    }

    fn set_request(value: Value) -> Json<SetRequest> {
        Json(SetRequest {
            value,
            ttl_ms: None,
        })
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state();

        let result = set_handler(
            State(state.clone()),
            Path("camera:1".to_string()),
            set_request(json!({"id": 1})),
        )
        .await;
        assert!(result.is_ok());

        let response = get_handler(State(state), Path("camera:1".to_string()))
            .await
            .unwrap();
        assert_eq!(response.value, json!({"id": 1}));
        assert_eq!(response.tier, Tier::Fast);
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let result = get_handler(State(test_state()), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = test_state();
        set_handler(
            State(state.clone()),
            Path("to_delete".to_string()),
            set_request(json!("v")),
        )
        .await
        .unwrap();

        assert!(delete_handler(State(state.clone()), Path("to_delete".to_string()))
            .await
            .is_ok());
        assert!(delete_handler(State(state), Path("to_delete".to_string()))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_set_rejects_zero_ttl() {
        let req = Json(SetRequest {
            value: json!(1),
            ttl_ms: Some(0),
        });
        let result = set_handler(State(test_state()), Path("k".to_string()), req).await;
        assert!(matches!(result, Err(CacheError::InvalidTtl(_))));
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = test_state();
        let _ = get_handler(State(state.clone()), Path("missing".to_string())).await;

        let response = stats_handler(State(state)).await;
        assert_eq!(response.misses, 1);
        assert_eq!(response.fast_hits, 0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_handlers_over_file_medium() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = Config {
            cache_dir: Some(temp_dir.path().to_path_buf()),
            ..Config::default()
        };
        let state = AppState::from_config(&config);
        let key = "k".repeat(crate::cache::MAX_KEY_LENGTH);

        set_handler(State(state.clone()), Path(key.clone()), set_request(json!(7)))
            .await
            .unwrap();

        let restarted = AppState::from_config(&config);
        let response = get_handler(State(restarted.clone()), Path(key.clone()))
            .await
            .unwrap();
        assert_eq!(response.value, json!(7));
        assert_eq!(response.tier, Tier::Durable);

        clear_handler(State(restarted.clone())).await.unwrap();
        assert!(delete_handler(State(restarted), Path(key)).await.is_err());
    }

    #[tokio::test]
    async fn test_failed_cache_task_is_internal_error() {
        let state = test_state();

        let result: Result<()> = with_cache(&state, |_| panic!("cache task panicked")).await;

        assert!(matches!(result, Err(CacheError::Internal(_))));
        // The lock is released once the task unwinds.
        assert!(state.cache.try_write().is_ok());
    }

    #[test]
    fn test_from_config_with_dir() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = Config {
            cache_dir: Some(temp_dir.path().to_path_buf()),
            ..Config::default()
        };

        let state = AppState::from_config(&config);
        state
            .cache
            .try_write()
            .unwrap()
            .set("k", json!(1), None)
            .unwrap();

        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }
}
