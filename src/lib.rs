//! # Pollcast
//!
//! Real-time poll update server. Clients hold a WebSocket open, subscribe to
//! one poll (a topic) and get a `topic_update` frame every time the poll's
//! results change.
//!
//! ## Modules
//!
//! - [`websocket`]: Topic registry, connection hub, sessions and broadcast fan-out
//! - [`api`]: HTTP server with Axum (publish endpoint, stats, health, `/ws`)
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pollcast::websocket::{Broadcaster, ConnectionHub, HubConfig, UpdateEvent};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let hub = Arc::new(ConnectionHub::new(HubConfig::default()));
//!     let broadcaster = Broadcaster::new(Arc::clone(&hub));
//!
//!     // After a vote is recorded, push the new results
//!     let results = serde_json::json!({"options": [{"text": "Yes", "votes": 5}]});
//!     let summary = broadcaster
//!         .broadcast(&UpdateEvent::new("poll-1", results))
//!         .await;
//!
//!     println!("delivered={} failed={}", summary.delivered, summary.failed);
//! }
//! ```

pub mod api;
pub mod config;
pub mod websocket;

pub use api::{build_router, serve, ApiError, AppState};

pub use websocket::{
    BroadcastSummary, Broadcaster, ClientMessage, ConnectionHub, ConnectionStats, HubConfig,
    HubError, ServerMessage, TopicRegistry, UpdateEvent, websocket_handler,
};

pub use config::{Config, ConfigError, LoggingConfig, ServerConfig};
