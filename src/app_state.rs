//! Application State Management
//!
//! This module provides the application state that contains the object
//! store and configuration, following the dependency injection pattern.

use log::info;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::storage::{memory_store::MemoryObjectStore, ObjectStore};

/// Application state shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
    pub config: AppConfig,
}

impl AppState {
    /// Create application state from configuration
    pub fn from_config(config: AppConfig) -> Self {
        info!("Initializing application state with configuration");
        let store: Arc<dyn ObjectStore> =
            Arc::new(MemoryObjectStore::from_config(&config.storage));
        info!("Application state initialized successfully");
        Self { store, config }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;

    #[test]
    fn test_from_config_wires_buckets() {
        let config = AppConfig {
            storage: StorageConfig {
                buckets: vec!["photos".to_string()],
                protected_buckets: Vec::new(),
            },
            ..AppConfig::default()
        };
        let state = AppState::from_config(config);
        assert!(state.store.bucket_exists("photos"));
        assert!(!state.store.bucket_exists("default"));
    }
}
