// Application state module
// Holds the loaded configuration together with the store and session map

use std::sync::Arc;

use super::types::Config;
use crate::session::SessionStore;
use crate::store::{SharedStore, Store, StoreError};

/// Application state
pub struct AppState {
    pub config: Config,
    pub store: SharedStore,
    pub sessions: SessionStore,
}

impl AppState {
    /// Create `AppState`, loading the data snapshot if one is configured
    pub fn new(config: &Config) -> Result<Self, StoreError> {
        let store = Store::open(config.storage.data_file.as_deref())?;
        Ok(Self::with_store(config, Arc::new(store)))
    }

    pub fn with_store(config: &Config, store: SharedStore) -> Self {
        Self {
            config: config.clone(),
            store,
            sessions: SessionStore::new(config.session.max_age()),
        }
    }

    pub const fn access_log_enabled(&self) -> bool {
        self.config.logging.access_log
    }
}
