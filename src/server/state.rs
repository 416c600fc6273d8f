//! Application State
//!
//! Shared state accessible by all handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;

use crate::config::ServerConfig;
use crate::relay::RelayHub;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Relay core: registry, router and lifecycle manager
    pub hub: RelayHub,
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_hub(RelayHub::new(), config)
    }

    /// Create state around an existing hub
    pub fn with_hub(hub: RelayHub, config: ServerConfig) -> Self {
        Self {
            hub,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Number of connected clients
    pub fn connection_count(&self) -> usize {
        self.hub.connection_count()
    }
}
