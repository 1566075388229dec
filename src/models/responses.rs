//! Response DTOs for the cache service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::{CacheStats, Tier};

/// Response body for `GET /cache/:key`
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: Value,
    /// Which tier answered
    pub tier: Tier,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, value: Value, tier: Tier) -> Self {
        Self {
            key: key.into(),
            value,
            tier,
        }
    }
}

/// Response body for `PUT /cache/:key`
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
}

impl SetResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }
}

/// Response body for `DELETE /cache/:key`
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for `POST /cache/sweep`
#[derive(Debug, Clone, Serialize)]
pub struct SweepResponse {
    /// Expired fast-tier entries removed by this sweep
    pub removed: usize,
}

/// Response body for `GET /stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub fast_hits: u64,
    pub durable_hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    /// Entries physically held by the fast tier
    pub fast_entries: usize,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            fast_hits: stats.fast_hits,
            durable_hits: stats.durable_hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            fast_entries: stats.fast_entries,
        }
    }
}

/// Response body for `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
