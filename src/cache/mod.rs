//! Cache Module
//!
//! Two-tier TTL cache: a process-local fast tier in front of a durable tier
//! on a [`StorageMedium`](crate::medium::StorageMedium).

mod clock;
mod durable;
mod entry;
mod fast;
mod fetch;
mod lru;
mod manager;
mod slot;
mod stats;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use durable::DurableTier;
pub use entry::CacheEntry;
pub use fast::FastTier;
pub use fetch::fetch_through;
pub use lru::LruTracker;
pub use manager::{CacheOptions, TieredCache};
pub use slot::Slot;
pub use stats::{CacheStats, Tier};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Namespace prefix for durable keys when none is configured
pub const DEFAULT_NAMESPACE: &str = "insightcore";

/// Default TTL: 5 minutes
pub const DEFAULT_TTL_MS: u64 = 300_000;
