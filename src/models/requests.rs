//! Request DTOs for the cache service API
//!
//! Defines the structure of incoming HTTP request bodies.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

/// Request body for `PUT /cache/:key`
///
/// # Fields
/// - `value`: Any JSON value to store
/// - `ttl_ms`: Optional TTL in milliseconds (uses the default if omitted)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The value to store
    pub value: Value,
    /// Optional TTL in milliseconds
    #[serde(default)]
    pub ttl_ms: Option<u64>,
}

impl SetRequest {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_ms.map(Duration::from_millis)
    }
}
