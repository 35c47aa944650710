//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;

use crate::config::ServerConfig;
use crate::websocket::{Broadcaster, ConnectionHub, HubConfig};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// WebSocket sessions and topic subscriptions
    pub hub: Arc<ConnectionHub>,
    /// Fan-out of topic updates to subscribers
    pub broadcaster: Broadcaster,
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState with its own connection hub
    pub fn new(config: ServerConfig, hub_config: HubConfig) -> Self {
        Self::with_hub(Arc::new(ConnectionHub::new(hub_config)), config)
    }

    /// Create AppState around an existing hub
    pub fn with_hub(hub: Arc<ConnectionHub>, config: ServerConfig) -> Self {
        Self {
            broadcaster: Broadcaster::new(Arc::clone(&hub)),
            hub,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
