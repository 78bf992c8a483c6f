//! Composer draft autosave.
//!
//! Drafts live in the same durable store as the persisted cache, one entry
//! per comment thread. Losing a draft is annoying, not fatal: reads never
//! fail, they degrade to "no draft" with a diagnostic.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use roost_cache::{PersistentStore, StoreResult};

/// One saved composer draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    /// Composer content, serialized by the editor.
    pub body: String,
    /// When the draft was last written.
    pub saved_at: DateTime<Utc>,
}

/// Per-thread draft persistence on top of the durable store.
pub struct DraftStore {
    store: Arc<dyn PersistentStore>,
    app_name: String,
}

impl DraftStore {
    /// Build a draft store namespaced under `app_name`.
    #[must_use]
    pub fn new(store: Arc<dyn PersistentStore>, app_name: impl Into<String>) -> Self {
        Self {
            store,
            app_name: app_name.into(),
        }
    }

    fn key(&self, thread_id: &str) -> String {
        format!("{}Draft:{thread_id}", self.app_name)
    }

    /// Save the draft for `thread_id`, stamping the write time.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub async fn save(&self, thread_id: &str, body: impl Into<String>) -> StoreResult<()> {
        let draft = Draft {
            body: body.into(),
            saved_at: Utc::now(),
        };
        let payload = serde_json::to_string(&draft).expect("drafts are plain data and serialize");
        self.store.save(&self.key(thread_id), &payload).await
    }

    /// Load the draft for `thread_id`, if a readable one exists.
    pub async fn load(&self, thread_id: &str) -> Option<Draft> {
        let key = self.key(thread_id);
        let payload = match self.store.load(&key).await {
            Ok(payload) => payload?,
            Err(error) => {
                warn!(key = %key, %error, "failed to read draft");
                return None;
            }
        };
        match serde_json::from_str(&payload) {
            Ok(draft) => Some(draft),
            Err(error) => {
                warn!(key = %key, %error, "discarding corrupt draft");
                None
            }
        }
    }

    /// Drop the draft for `thread_id` (after posting, typically).
    ///
    /// # Errors
    ///
    /// Returns an error if the store removal fails.
    pub async fn clear(&self, thread_id: &str) -> StoreResult<()> {
        self.store.remove(&self.key(thread_id)).await
    }
}
