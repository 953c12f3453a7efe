//! Shared application state passed to every handler via Axum's `State` extractor.

use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::registry::ConnectionRegistry;
use crate::sessions::SessionStore;

/// Shared application state for the pairpad server.
#[derive(Clone)]
pub struct AppState {
    /// Immutable configuration loaded at startup.
    pub config: Arc<Config>,
    /// Monotonic instant when the server started (for uptime calculation).
    pub start_time: Instant,
    /// Owns every live collaborative session.
    pub sessions: SessionStore,
    /// Tracks which WebSocket connections are bound to which session and
    /// fans broadcasts out to them.
    pub registry: ConnectionRegistry,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            start_time: Instant::now(),
            sessions: SessionStore::new(),
            registry: ConnectionRegistry::new(),
        }
    }
}
