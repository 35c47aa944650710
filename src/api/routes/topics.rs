//! Topic Routes
//!
//! Entry points for the services that own poll records.
//!
//! - POST /api/v1/topics/:topic_id/updates - Broadcast a new result snapshot
//! - GET /api/v1/stats - Connection and subscription counts

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use crate::api::dto::PublishResponse;
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::websocket::{validate_topic_id, ConnectionStats, UpdateEvent};

/// POST /api/v1/topics/:topic_id/updates
///
/// Called after a vote is recorded. The body is the recomputed result
/// snapshot and is forwarded to subscribers untouched. Responds before
/// fan-out runs.
pub async fn publish_update(
    State(state): State<Arc<AppState>>,
    Path(topic_id): Path<String>,
    Json(payload): Json<Value>,
) -> ApiResult<(StatusCode, Json<PublishResponse>)> {
    validate_topic_id(&topic_id)?;

    // Detached; the summary is only logged
    state
        .broadcaster
        .publish(UpdateEvent::new(topic_id.clone(), payload));

    Ok((
        StatusCode::ACCEPTED,
        Json(PublishResponse {
            status: "accepted".to_string(),
            topic_id,
        }),
    ))
}

/// GET /api/v1/stats
pub async fn connection_stats(State(state): State<Arc<AppState>>) -> Json<ConnectionStats> {
    Json(state.hub.stats().await)
}
