//! Data Transfer Objects
//!
//! Response types for the HTTP endpoints.

use serde::Serialize;

/// Response to an accepted topic update
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    /// Always "accepted"; fan-out runs after the response is sent
    pub status: String,
    pub topic_id: String,
}

/// Full health status
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy
    pub status: String,
    /// Open WebSocket sessions
    pub connections: usize,
    /// Topics with at least one subscriber
    pub topics: usize,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Application version
    pub version: String,
}
