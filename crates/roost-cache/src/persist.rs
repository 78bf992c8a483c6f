//! Cache hydration and write-back against a durable store.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::store::{PersistentStore, StoreResult};
use crate::{Cache, CacheSnapshot};

/// Storage key for the persisted cache snapshot, namespaced by app name.
#[must_use]
pub fn cache_key(app_name: &str) -> String {
    format!("{app_name}GraphqlCache")
}

/// Load a persisted snapshot into the cache in the background.
///
/// Fire-and-forget: the cache is usable immediately and filled in once the
/// load completes. Entries written while the load was in flight are kept
/// over what was on disk. A missing or corrupt payload hydrates nothing,
/// diagnostic log only, never an error.
pub fn spawn_hydration(cache: &Cache, store: Arc<dyn PersistentStore>, key: impl Into<String>) {
    let cache = cache.clone();
    let key = key.into();
    tokio::spawn(async move {
        let payload = match store.load(&key).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                debug!(key = %key, "no persisted cache to hydrate");
                return;
            }
            Err(error) => {
                warn!(key = %key, %error, "failed to read persisted cache");
                return;
            }
        };
        match serde_json::from_str::<CacheSnapshot>(&payload) {
            Ok(snapshot) => {
                let restored = snapshot.len();
                cache.backfill(snapshot);
                debug!(key = %key, restored, "cache hydrated from durable store");
            }
            Err(error) => {
                warn!(key = %key, %error, "discarding corrupt persisted cache");
            }
        }
    });
}

/// Serialize the current cache contents under `key`.
///
/// # Errors
///
/// Returns an error if the store write fails. Snapshot serialization itself
/// cannot fail; the cache only holds JSON values.
pub async fn persist(cache: &Cache, store: &dyn PersistentStore, key: &str) -> StoreResult<()> {
    let snapshot = cache.extract();
    let payload =
        serde_json::to_string(&snapshot).expect("a map of JSON values serializes to JSON");
    store.save(key, &payload).await
}
