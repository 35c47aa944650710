//! Topic Broadcaster
//!
//! Fans an [`UpdateEvent`] out to every live subscriber of its topic.
//! Delivery is best-effort: peers whose channel is gone are pruned from the
//! hub and counted, never reported as an error.

use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;

use super::hub::ConnectionHub;
use super::messages::UpdateEvent;
use super::registry::TopicId;

/// Outcome of one fan-out
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastSummary {
    pub topic_id: TopicId,
    pub delivered: usize,
    pub failed: usize,
}

/// Delivers update events to topic subscribers
#[derive(Clone)]
pub struct Broadcaster {
    hub: Arc<ConnectionHub>,
}

impl Broadcaster {
    pub fn new(hub: Arc<ConnectionHub>) -> Self {
        Self { hub }
    }

    /// Deliver `event` to every subscriber of its topic and prune dead ones.
    ///
    /// Sends are non-blocking channel pushes, so a slow peer only grows its
    /// own queue and never holds up the rest of the set.
    pub async fn broadcast(&self, event: &UpdateEvent) -> BroadcastSummary {
        let topic_id = event.topic_id.as_str();
        let subscribers = self.hub.subscriber_handles(topic_id).await;

        if subscribers.is_empty() {
            tracing::debug!(topic_id = %topic_id, "No active subscribers for topic");
            return BroadcastSummary {
                topic_id: topic_id.to_string(),
                delivered: 0,
                failed: 0,
            };
        }

        let message = event.to_message();
        let mut delivered = 0;
        let mut stale = Vec::new();

        for (session_id, sender) in subscribers {
            // Closing and closed peers share one failure path with send errors
            let sent = match sender {
                Some(sender) if !sender.is_closed() => sender.send(message.clone()).is_ok(),
                _ => false,
            };

            if sent {
                delivered += 1;
            } else {
                tracing::debug!(
                    session_id = %session_id,
                    topic_id = %topic_id,
                    "Subscriber not sendable, dropping"
                );
                stale.push(session_id);
            }
        }

        let failed = stale.len();
        self.hub.prune(topic_id, &stale).await;

        tracing::info!(
            topic_id = %topic_id,
            delivered,
            failed,
            "Broadcast topic update"
        );

        BroadcastSummary {
            topic_id: topic_id.to_string(),
            delivered,
            failed,
        }
    }

    /// Fire-and-forget broadcast.
    ///
    /// Runs on its own task so the caller's request never waits on, or fails
    /// because of, fan-out. The handle may be dropped.
    pub fn publish(&self, event: UpdateEvent) -> JoinHandle<BroadcastSummary> {
        let broadcaster = self.clone();
        tokio::spawn(async move { broadcaster.broadcast(&event).await })
    }
}
