//! Durable Tier Module
//!
//! Namespaced, JSON-serialized entries on a [`StorageMedium`]. Every medium
//! or serialization failure is logged and degraded to a no-op or a miss.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::entry::EntryHeader;
use crate::cache::{CacheEntry, Clock, SystemClock, DEFAULT_NAMESPACE};
use crate::medium::StorageMedium;

// == Durable Tier ==
#[derive(Debug)]
pub struct DurableTier<M> {
    medium: M,
    namespace: String,
    clock: Arc<dyn Clock>,
}

impl<M: StorageMedium> DurableTier<M> {
    /// Creates a tier under the default namespace on the system clock.
    pub fn new(medium: M) -> Self {
        Self::with_clock(medium, DEFAULT_NAMESPACE, Arc::new(SystemClock))
    }

    pub fn with_namespace(medium: M, namespace: impl Into<String>) -> Self {
        Self::with_clock(medium, namespace, Arc::new(SystemClock))
    }

    pub fn with_clock(medium: M, namespace: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            medium,
            namespace: namespace.into(),
            clock,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn medium(&self) -> &M {
        &self.medium
    }

    /// Medium key for `key`: `"<namespace>:<key>"`.
    pub fn storage_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    // == Set ==
    /// Writes `value` stamped now. Failures are logged, never returned.
    pub fn set<V: Serialize>(&self, key: &str, value: &V, ttl_ms: u64) {
        let entry = CacheEntry::new(value, self.clock.now_ms(), ttl_ms);
        let record = match serde_json::to_string(&entry) {
            Ok(record) => record,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize durable cache entry");
                return;
            }
        };

        if let Err(e) = self.medium.set_item(&self.storage_key(key), &record) {
            warn!(key, error = %e, "Failed to write durable cache entry");
        }
    }

    // == Get ==
    pub fn get<V: DeserializeOwned>(&self, key: &str) -> Option<V> {
        self.get_entry(key).map(|entry| entry.value)
    }

    // == Get Entry ==
    /// Reads the full record so callers can honor its original stamp.
    ///
    /// Missing, expired and corrupt records all read as `None`; expired and
    /// corrupt ones are removed from the medium on the way.
    pub fn get_entry<V: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<V>> {
        let storage_key = self.storage_key(key);
        let raw = self.read_raw(&storage_key)?;

        let entry: CacheEntry<V> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "Discarding corrupt durable cache entry");
                self.remove_quietly(&storage_key);
                return None;
            }
        };

        if entry.is_expired(self.clock.now_ms()) {
            debug!(key, "Durable cache entry expired");
            self.remove_quietly(&storage_key);
            return None;
        }
        Some(entry)
    }

    // == Has ==
    /// Liveness check that only parses the record's timing fields.
    pub fn has(&self, key: &str) -> bool {
        let storage_key = self.storage_key(key);
        let Some(raw) = self.read_raw(&storage_key) else {
            return false;
        };

        match serde_json::from_str::<EntryHeader>(&raw) {
            Ok(header) if header.is_live(self.clock.now_ms()) => true,
            Ok(_) => {
                self.remove_quietly(&storage_key);
                false
            }
            Err(e) => {
                warn!(key, error = %e, "Discarding corrupt durable cache entry");
                self.remove_quietly(&storage_key);
                false
            }
        }
    }

    // == Delete ==
    /// Returns whether a record was present. A medium failure reads as `false`.
    pub fn delete(&self, key: &str) -> bool {
        match self.medium.remove_item(&self.storage_key(key)) {
            Ok(removed) => removed,
            Err(e) => {
                warn!(key, error = %e, "Failed to delete durable cache entry");
                false
            }
        }
    }

    // == Clear ==
    /// Removes every record in this namespace and nothing else.
    ///
    /// Returns the number of records removed.
    pub fn clear(&self) -> usize {
        let keys = match self.medium.keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!(namespace = %self.namespace, error = %e, "Failed to list durable cache keys");
                return 0;
            }
        };

        let prefix = format!("{}:", self.namespace);
        let mut removed = 0;
        for key in keys.iter().filter(|k| k.starts_with(&prefix)) {
            match self.medium.remove_item(key) {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => warn!(key = %key, error = %e, "Failed to clear durable cache entry"),
            }
        }
        removed
    }

    fn read_raw(&self, storage_key: &str) -> Option<String> {
        match self.medium.get_item(storage_key) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %storage_key, error = %e, "Failed to read durable cache entry");
                None
            }
        }
    }

    fn remove_quietly(&self, storage_key: &str) {
        if let Err(e) = self.medium.remove_item(storage_key) {
            warn!(key = %storage_key, error = %e, "Failed to remove durable cache entry");
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::medium::MemoryMedium;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Camera {
        id: u32,
        status: String,
    }

    fn tier(namespace: &str) -> (DurableTier<MemoryMedium>, MemoryMedium, ManualClock) {
        let medium = MemoryMedium::new();
        let clock = ManualClock::new(1_700_000_000_000);
        let tier = DurableTier::with_clock(medium.clone(), namespace, Arc::new(clock.clone()));
        (tier, medium, clock)
    }

    fn camera() -> Camera {
        Camera {
            id: 1,
            status: "active".to_string(),
        }
    }

    #[test]
    fn test_storage_key_format() {
        let (tier, _, _) = tier("insightcore");
        assert_eq!(tier.storage_key("camera:1"), "insightcore:camera:1");
    }

    #[test]
    fn test_set_writes_record_format() {
        let (tier, medium, clock) = tier("insightcore");

        tier.set("camera:1", &camera(), 5_000);

        let raw = medium.get_item("insightcore:camera:1").unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["data"]["status"], "active");
        assert_eq!(json["timestamp"], clock.now_ms());
        assert_eq!(json["ttl"], 5_000);
    }

    #[test]
    fn test_get_roundtrip_and_expiry() {
        let (tier, medium, clock) = tier("insightcore");

        tier.set("camera:1", &camera(), 5_000);
        clock.advance(5_000);
        assert_eq!(tier.get::<Camera>("camera:1"), Some(camera()));

        clock.advance(1);
        assert_eq!(tier.get::<Camera>("camera:1"), None);
        assert!(!medium.contains("insightcore:camera:1"));
    }

    #[test]
    fn test_has_expired_removes_record() {
        let (tier, medium, clock) = tier("ns");

        tier.set("k", &1u32, 100);
        assert!(tier.has("k"));

        clock.advance(101);
        assert!(!tier.has("k"));
        assert!(!medium.contains("ns:k"));
    }

    #[test]
    fn test_corrupt_record_is_absent_and_removed() {
        let (tier, medium, _) = tier("ns");
        medium.insert_raw("ns:broken", "{not json");

        assert_eq!(tier.get::<Camera>("broken"), None);
        assert!(!medium.contains("ns:broken"));
        assert!(!tier.has("broken"));
    }

    #[test]
    fn test_wrong_shape_is_treated_as_corrupt() {
        let (tier, medium, _) = tier("ns");
        medium.insert_raw("ns:old", r#"{"value": 1, "expires": 2}"#);

        assert!(!tier.has("old"));
        assert!(!medium.contains("ns:old"));
    }

    #[test]
    fn test_delete_reports_presence() {
        let (tier, _, _) = tier("ns");

        assert!(!tier.delete("k"));
        tier.set("k", &"v", 1_000);
        assert!(tier.delete("k"));
        assert_eq!(tier.get::<String>("k"), None);
    }

    #[test]
    fn test_clear_respects_namespace() {
        let medium = MemoryMedium::new();
        let a = DurableTier::with_namespace(medium.clone(), "A");
        let ab = DurableTier::with_namespace(medium.clone(), "AB");
        let b = DurableTier::with_namespace(medium.clone(), "B");
        medium.insert_raw("unrelated", "keep me");

        a.set("k1", &1u8, 60_000);
        a.set("k2", &2u8, 60_000);
        ab.set("k1", &3u8, 60_000);
        b.set("k1", &4u8, 60_000);

        assert_eq!(a.clear(), 2);

        assert_eq!(a.get::<u8>("k1"), None);
        assert_eq!(ab.get::<u8>("k1"), Some(3));
        assert_eq!(b.get::<u8>("k1"), Some(4));
        assert!(medium.contains("unrelated"));
    }

    #[test]
    fn test_unavailable_medium_degrades() {
        let (tier, medium, _) = tier("ns");
        tier.set("k", &"v", 1_000);
        medium.set_unavailable(true);

        tier.set("other", &"v", 1_000);
        assert_eq!(tier.get::<String>("k"), None);
        assert!(!tier.has("k"));
        assert!(!tier.delete("k"));
        assert_eq!(tier.clear(), 0);

        medium.set_unavailable(false);
        assert_eq!(tier.get::<String>("k"), Some("v".to_string()));
        assert!(!medium.contains("ns:other"));
    }

    #[test]
    fn test_quota_exceeded_is_silent() {
        let medium = MemoryMedium::with_quota(16);
        let tier = DurableTier::with_namespace(medium.clone(), "ns");

        tier.set("big", &"x".repeat(64), 1_000);

        assert_eq!(tier.get::<String>("big"), None);
    }
}
