//! Durable key-value storage behind the cache.
//!
//! The store contract is raw strings; serialization is the caller's
//! concern. Keys are opaque and already namespaced by the caller.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by durable store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An underlying filesystem operation failed.
    #[error("store operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Source IO error.
        source: io::Error,
    },
}

/// Convenience alias for store results.
pub type StoreResult<T> = Result<T, StoreError>;

/// Asynchronous durable key-value store.
#[async_trait]
pub trait PersistentStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn load(&self, key: &str) -> StoreResult<Option<String>>;
    /// Write `value` under `key`, replacing any previous value.
    async fn save(&self, key: &str, value: &str) -> StoreResult<()>;
    /// Remove `key` from the store.
    async fn remove(&self, key: &str) -> StoreResult<()>;
}

/// In-memory store; state lives only as long as the process.
///
/// Primarily a test double, also the fallback when an embedder has no
/// durable storage to offer.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Construct an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistentStore for MemoryStore {
    async fn load(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self
            .entries
            .lock()
            .expect("store mutex poisoned")
            .get(key)
            .cloned())
    }

    async fn save(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries
            .lock()
            .expect("store mutex poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries
            .lock()
            .expect("store mutex poisoned")
            .remove(key);
        Ok(())
    }
}

/// Filesystem-backed store; one file per key under a root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Construct a store rooted at `root`. The directory is created lazily
    /// on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys may contain separators or other characters unfit for file
        // names; flatten them before touching the filesystem.
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        self.root.join(format!("{name}.json"))
    }
}

#[async_trait]
impl PersistentStore for FileStore {
    async fn load(&self, key: &str) -> StoreResult<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                operation: "store.file.load",
                source,
            }),
        }
    }

    async fn save(&self, key: &str, value: &str) -> StoreResult<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StoreError::Io {
                operation: "store.file.create_root",
                source,
            })?;
        tokio::fs::write(self.path_for(key), value)
            .await
            .map_err(|source| StoreError::Io {
                operation: "store.file.save",
                source,
            })
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                operation: "store.file.remove",
                source,
            }),
        }
    }
}

impl AsRef<Path> for FileStore {
    fn as_ref(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trips() {
        let store = MemoryStore::new();
        assert_eq!(store.load("k").await.expect("load"), None);

        store.save("k", "v").await.expect("save");
        assert_eq!(store.load("k").await.expect("load"), Some("v".to_string()));

        store.remove("k").await.expect("remove");
        assert_eq!(store.load("k").await.expect("load"), None);
    }

    #[tokio::test]
    async fn file_store_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());

        assert_eq!(store.load("roostGraphqlCache").await.expect("load"), None);

        store
            .save("roostGraphqlCache", r#"{"a":1}"#)
            .await
            .expect("save");
        assert_eq!(
            store.load("roostGraphqlCache").await.expect("load"),
            Some(r#"{"a":1}"#.to_string())
        );

        store.remove("roostGraphqlCache").await.expect("remove");
        assert_eq!(store.load("roostGraphqlCache").await.expect("load"), None);
        // Removing a missing key is not an error.
        store.remove("roostGraphqlCache").await.expect("remove");
    }

    #[tokio::test]
    async fn file_store_flattens_hostile_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());

        store.save("a/b:c", "x").await.expect("save");
        assert_eq!(store.load("a/b:c").await.expect("load"), Some("x".into()));
        assert!(dir.path().join("a_b_c.json").exists());
    }
}
