//! Normalized client-side cache shared across client recreations.
//!
//! The cache is a flat object store keyed by entity identity. It is handed
//! out by value (cheap `Arc` clone) so every client produced over the life
//! of a session writes into the same underlying map; recreating a client
//! on token change deliberately does not recreate the cache. Last write
//! wins at the entry level; the cache itself provides no cross-entry
//! transactionality.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;

pub mod persist;
pub mod store;

pub use persist::{cache_key, persist, spawn_hydration};
pub use store::{FileStore, MemoryStore, PersistentStore, StoreError, StoreResult};

/// A point-in-time copy of the cache contents.
///
/// Ordered so snapshots serialize deterministically.
pub type CacheSnapshot = BTreeMap<String, Value>;

/// Shared normalized entity store.
#[derive(Debug, Clone, Default)]
pub struct Cache {
    entries: Arc<Mutex<BTreeMap<String, Value>>>,
}

impl Cache {
    /// Construct an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read one entry by entity key.
    ///
    /// # Panics
    ///
    /// Panics if the entry mutex has been poisoned.
    #[must_use]
    pub fn read(&self, key: &str) -> Option<Value> {
        self.entries
            .lock()
            .expect("cache mutex poisoned")
            .get(key)
            .cloned()
    }

    /// Write one entry, replacing any previous value under the key.
    ///
    /// # Panics
    ///
    /// Panics if the entry mutex has been poisoned.
    pub fn write(&self, key: impl Into<String>, value: Value) {
        self.entries
            .lock()
            .expect("cache mutex poisoned")
            .insert(key.into(), value);
    }

    /// Remove one entry.
    ///
    /// # Panics
    ///
    /// Panics if the entry mutex has been poisoned.
    pub fn evict(&self, key: &str) {
        self.entries
            .lock()
            .expect("cache mutex poisoned")
            .remove(key);
    }

    /// Copy out the full cache contents.
    ///
    /// # Panics
    ///
    /// Panics if the entry mutex has been poisoned.
    #[must_use]
    pub fn extract(&self) -> CacheSnapshot {
        self.entries.lock().expect("cache mutex poisoned").clone()
    }

    /// Overlay a snapshot onto the cache; incoming entries win on key
    /// collision, existing entries without a counterpart are preserved.
    ///
    /// # Panics
    ///
    /// Panics if the entry mutex has been poisoned.
    pub fn merge(&self, snapshot: CacheSnapshot) {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        for (key, value) in snapshot {
            entries.insert(key, value);
        }
    }

    /// Fill gaps from a snapshot; entries already present keep their value.
    ///
    /// Used by hydration so data fetched while the durable store was still
    /// loading beats what was on disk.
    ///
    /// # Panics
    ///
    /// Panics if the entry mutex has been poisoned.
    pub fn backfill(&self, snapshot: CacheSnapshot) {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        for (key, value) in snapshot {
            entries.entry(key).or_insert(value);
        }
    }

    /// Number of cached entries.
    ///
    /// # Panics
    ///
    /// Panics if the entry mutex has been poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache mutex poisoned").len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether two handles point at the same underlying store.
    #[must_use]
    pub fn same_store(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn merge_prefers_incoming_entries() {
        let cache = Cache::new();
        cache.write("A", json!(0));
        cache.write("B", json!(2));

        cache.merge(CacheSnapshot::from([("A".to_string(), json!(1))]));

        assert_eq!(cache.read("A"), Some(json!(1)));
        assert_eq!(cache.read("B"), Some(json!(2)));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn backfill_prefers_existing_entries() {
        let cache = Cache::new();
        cache.write("A", json!("live"));

        cache.backfill(CacheSnapshot::from([
            ("A".to_string(), json!("stale")),
            ("B".to_string(), json!("restored")),
        ]));

        assert_eq!(cache.read("A"), Some(json!("live")));
        assert_eq!(cache.read("B"), Some(json!("restored")));
    }

    #[test]
    fn clones_share_one_store() {
        let cache = Cache::new();
        let handle = cache.clone();
        handle.write("comment:1", json!({"likes": 3}));

        assert!(cache.same_store(&handle));
        assert_eq!(cache.read("comment:1"), Some(json!({"likes": 3})));
        assert!(!cache.same_store(&Cache::new()));
    }

    #[test]
    fn evict_removes_entries() {
        let cache = Cache::new();
        cache.write("comment:1", json!(1));
        cache.evict("comment:1");
        assert!(cache.is_empty());
        assert_eq!(cache.read("comment:1"), None);
    }
}
