//! Application state
//!
//! Shared handles for the HTTP handlers: the log store, the config store,
//! the listener supervisor, the module registry, and the server counters.

use std::sync::Arc;

use siphon_config::ConfigStore;
use siphon_modules::ModuleRegistry;
use siphon_server::{Pipeline, ServerStats, Supervisor};
use siphon_store::LogStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<LogStore>,
    pub config: Arc<ConfigStore>,
    pub supervisor: Arc<Supervisor>,
    pub registry: Arc<ModuleRegistry>,
    pub stats: Arc<ServerStats>,
}

impl AppState {
    /// Assemble state around an existing supervisor (production path).
    pub fn new(
        store: Arc<LogStore>,
        config: Arc<ConfigStore>,
        supervisor: Arc<Supervisor>,
        registry: Arc<ModuleRegistry>,
        stats: Arc<ServerStats>,
    ) -> Self {
        Self {
            store,
            config,
            supervisor,
            registry,
            stats,
        }
    }

    /// Build a full stack over the given stores (tests, embedding): one
    /// pipeline, one supervisor, fresh counters.
    pub fn with_stores(
        store: Arc<LogStore>,
        config: Arc<ConfigStore>,
        registry: Arc<ModuleRegistry>,
    ) -> Self {
        let stats = Arc::new(ServerStats::new());
        let pipeline = Arc::new(Pipeline::new(
            Arc::clone(&store),
            Arc::clone(&config),
            Arc::clone(&registry),
            Arc::clone(&stats),
        ));
        let supervisor = Arc::new(Supervisor::new(pipeline));

        Self {
            store,
            config,
            supervisor,
            registry,
            stats,
        }
    }
}
