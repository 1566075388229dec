//! In-process storage medium.
//!
//! Stands in for persistent storage in tests and embedded use. Clones share
//! the same underlying map, the way two caches in one host share a store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::MediumError;
use crate::medium::StorageMedium;

#[derive(Debug, Default)]
struct Shared {
    items: Mutex<HashMap<String, String>>,
    /// Byte budget over keys + values; `None` = unlimited
    quota: Option<usize>,
    unavailable: AtomicBool,
    reads: AtomicU64,
}

/// Shared in-memory medium with optional quota and outage simulation.
#[derive(Debug, Clone, Default)]
pub struct MemoryMedium {
    shared: Arc<Shared>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// A medium that rejects writes once keys + values exceed `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                quota: Some(bytes),
                ..Shared::default()
            }),
        }
    }

    /// Makes every subsequent call fail with `Unavailable` (or recover).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.shared.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `get_item` calls served so far.
    pub fn reads(&self) -> u64 {
        self.shared.reads.load(Ordering::SeqCst)
    }

    /// Raw write that bypasses quota and outage checks.
    pub fn insert_raw(&self, key: &str, value: &str) {
        if let Ok(mut items) = self.shared.items.lock() {
            items.insert(key.to_string(), value.to_string());
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.shared
            .items
            .lock()
            .map(|items| items.contains_key(key))
            .unwrap_or(false)
    }

    fn items(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, MediumError> {
        if self.shared.unavailable.load(Ordering::SeqCst) {
            return Err(MediumError::Unavailable("medium disabled".to_string()));
        }
        self.shared
            .items
            .lock()
            .map_err(|_| MediumError::Unavailable("medium lock poisoned".to_string()))
    }
}

fn used_bytes(items: &HashMap<String, String>) -> usize {
    items.iter().map(|(k, v)| k.len() + v.len()).sum()
}

impl StorageMedium for MemoryMedium {
    fn get_item(&self, key: &str) -> Result<Option<String>, MediumError> {
        let items = self.items()?;
        self.shared.reads.fetch_add(1, Ordering::SeqCst);
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), MediumError> {
        let mut items = self.items()?;

        if let Some(quota) = self.shared.quota {
            let replaced = items.get(key).map(|old| key.len() + old.len()).unwrap_or(0);
            let available = quota.saturating_sub(used_bytes(&items) - replaced);
            let needed = key.len() + value.len();
            if needed > available {
                return Err(MediumError::QuotaExceeded { needed, available });
            }
        }

        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<bool, MediumError> {
        Ok(self.items()?.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>, MediumError> {
        Ok(self.items()?.keys().cloned().collect())
    }
}
