//! InsightCore Cache - a two-tier read-through cache with TTL expiry
//!
//! A process-local fast tier sits in front of a durable tier that survives
//! restarts. Reads fall through fast → durable and promote durable hits;
//! writes go to both tiers.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod medium;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{fetch_through, CacheOptions, TieredCache};
pub use config::Config;
pub use error::{CacheError, MediumError};
pub use medium::{FileMedium, MemoryMedium, StorageMedium};
pub use tasks::spawn_sweep_task;
