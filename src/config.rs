//! Configuration Module
//!
//! Handles loading and managing cache service configuration from environment
//! variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::cache::{DEFAULT_NAMESPACE, DEFAULT_TTL_MS};

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default TTL in milliseconds for entries written without one
    pub default_ttl_ms: u64,
    /// Fast-tier capacity; 0 disables the bound
    pub max_entries: usize,
    /// Prefix for durable keys
    pub namespace: String,
    /// Directory for the durable tier; `None` = platform cache dir
    pub cache_dir: Option<PathBuf>,
    /// HTTP server port
    pub server_port: u16,
    /// Fast-tier sweep interval in seconds
    pub sweep_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `MAX_ENTRIES` - Fast-tier capacity, 0 = unbounded (default: 1000)
    /// - `CACHE_NAMESPACE` - Durable key prefix (default: insightcore)
    /// - `CACHE_DIR` - Durable tier directory (default: platform cache dir)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SWEEP_INTERVAL` - Sweep frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_ttl_ms: parse_var("DEFAULT_TTL_MS").unwrap_or(defaults.default_ttl_ms),
            max_entries: parse_var("MAX_ENTRIES").unwrap_or(defaults.max_entries),
            namespace: env::var("CACHE_NAMESPACE")
                .ok()
                .filter(|ns| !ns.is_empty())
                .unwrap_or(defaults.namespace),
            cache_dir: env::var_os("CACHE_DIR").map(PathBuf::from),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            sweep_interval: parse_var("SWEEP_INTERVAL").unwrap_or(defaults.sweep_interval),
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl_ms: DEFAULT_TTL_MS,
            max_entries: 1000,
            namespace: DEFAULT_NAMESPACE.to_string(),
            cache_dir: None,
            server_port: 3000,
            sweep_interval: 60,
        }
    }
}
