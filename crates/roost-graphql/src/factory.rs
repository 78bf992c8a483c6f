//! Token-keyed client construction with a factory-scoped cache.

use std::sync::{Arc, Mutex};

use once_cell::sync::OnceCell;

use roost_cache::{Cache, CacheSnapshot, PersistentStore, cache_key, spawn_hydration};
use roost_config::{ExecutionContext, Settings, anonymous_token};

use crate::client::Client;

/// Produces the session-bound client for whatever credential is current.
///
/// One factory is constructed at application bootstrap and owned by
/// whatever owns the widget tree; a server-rendering embedder constructs
/// one per request instead. The factory keeps exactly one live client per
/// credential value: asking again with the same token returns the same
/// client, asking with a different token builds a replacement. The cache
/// is created once per factory and shared by every client it ever builds;
/// a token change deliberately does not wipe it.
pub struct ClientFactory {
    settings: Settings,
    context: ExecutionContext,
    store: Option<Arc<dyn PersistentStore>>,
    cache: OnceCell<Cache>,
    current: Mutex<Option<CurrentClient>>,
}

struct CurrentClient {
    bearer: String,
    client: Arc<Client>,
}

impl ClientFactory {
    /// Build a factory for the given settings and execution context.
    #[must_use]
    pub fn new(settings: Settings, context: ExecutionContext) -> Self {
        Self {
            settings,
            context,
            store: None,
            cache: OnceCell::new(),
            current: Mutex::new(None),
        }
    }

    /// Attach a durable store backing cache persistence.
    ///
    /// Hydration only ever runs outside the server context, and only on
    /// first cache construction.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn PersistentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Produce the client for `token`, substituting the anonymous
    /// credential when none is supplied.
    ///
    /// Never fails and performs no I/O of its own; the only side effect is
    /// the background hydration task spawned the first time the cache comes
    /// into existence (which is why a durable-store-backed factory must be
    /// driven from within the embedder's async runtime). When
    /// `initial_state` is supplied (server-rendered seed data, typically)
    /// it is merged over the current cache contents with the supplied
    /// entries winning on collision.
    ///
    /// # Panics
    ///
    /// Panics if the factory mutex has been poisoned.
    pub fn client(
        &self,
        token: Option<&str>,
        initial_state: Option<CacheSnapshot>,
    ) -> Arc<Client> {
        let bearer = match token {
            Some(token) if !token.is_empty() => token.to_string(),
            _ => anonymous_token().to_string(),
        };
        let cache = self
            .cache
            .get_or_init(|| {
                let cache = Cache::new();
                if !self.context.is_server()
                    && let Some(store) = &self.store
                {
                    spawn_hydration(&cache, store.clone(), cache_key(&self.settings.app_name));
                }
                cache
            })
            .clone();
        if let Some(state) = initial_state {
            cache.merge(state);
        }

        let mut current = self.current.lock().expect("factory mutex poisoned");
        if let Some(entry) = current.as_ref()
            && entry.bearer == bearer
        {
            return Arc::clone(&entry.client);
        }
        let client = Arc::new(Client::new(
            bearer.clone(),
            &self.settings.endpoints,
            self.context,
            cache,
        ));
        *current = Some(CurrentClient {
            bearer,
            client: Arc::clone(&client),
        });
        client
    }
}
