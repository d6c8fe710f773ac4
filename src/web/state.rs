//! Shared state for the web server.

use std::sync::Arc;

use crate::config::Config;
use crate::replay::ReplayRegistry;
use crate::scenario::ScenarioStore;
use crate::search::{SearchClient, SearchError};

use super::error::WebError;

struct Inner {
    config: Config,
    search: SearchClient,
    store: ScenarioStore,
    replays: ReplayRegistry,
}

/// State handed to every request handler. Cheap to clone.
#[derive(Clone)]
pub struct WebAppState {
    inner: Arc<Inner>,
}

impl WebAppState {
    pub fn new(config: Config, store: ScenarioStore) -> Result<Self, SearchError> {
        let search = SearchClient::new(&config.search)?;
        let replays = ReplayRegistry::new(config.replay);
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                search,
                store,
                replays,
            }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn search(&self) -> &SearchClient {
        &self.inner.search
    }

    pub fn store(&self) -> &ScenarioStore {
        &self.inner.store
    }

    pub fn replays(&self) -> &ReplayRegistry {
        &self.inner.replays
    }

    /// Run a filesystem operation on the store from the blocking pool so
    /// request handlers never stall a runtime worker on disk I/O.
    pub async fn with_store<T, E, F>(&self, op: F) -> Result<T, WebError>
    where
        F: FnOnce(&ScenarioStore) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
        WebError: From<E>,
    {
        let store = self.inner.store.clone();
        let result = tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| WebError::Internal(format!("store task failed: {e}")))?;
        Ok(result?)
    }
}
