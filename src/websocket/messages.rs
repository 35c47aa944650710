//! WebSocket Message Types
//!
//! Defines the control messages clients send over `/ws` and the frames the
//! server pushes back. Discriminators are snake_case, fields camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Subscribe to a topic, leaving any previous one
    SubscribeTopic {
        #[serde(default)]
        topic_id: Option<String>,
    },
    /// Leave a topic
    UnsubscribeTopic {
        #[serde(default)]
        topic_id: Option<String>,
    },
    /// Application-level liveness check
    Ping,
    /// Any `type` this server does not understand
    #[serde(other)]
    Unknown,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Sent once, right after the socket is accepted
    ConnectionEstablished {
        session_id: String,
        message: String,
        timestamp: DateTime<Utc>,
    },
    /// Subscription confirmed
    TopicSubscribed {
        topic_id: String,
        message: String,
        timestamp: DateTime<Utc>,
    },
    /// Unsubscription confirmed
    TopicUnsubscribed {
        #[serde(skip_serializing_if = "Option::is_none")]
        topic_id: Option<String>,
        message: String,
        timestamp: DateTime<Utc>,
    },
    /// A topic's aggregate state changed
    TopicUpdate {
        topic_id: String,
        payload: Value,
        timestamp: DateTime<Utc>,
    },
    /// Reply to `ping`
    Pong { timestamp: DateTime<Utc> },
    /// Error message; the session stays open
    Error {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl ServerMessage {
    pub fn connection_established(session_id: &str) -> Self {
        Self::ConnectionEstablished {
            session_id: session_id.to_string(),
            message: "Connected to poll update server".to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn topic_subscribed(topic_id: &str) -> Self {
        Self::TopicSubscribed {
            topic_id: topic_id.to_string(),
            message: format!("Subscribed to topic {}", topic_id),
            timestamp: Utc::now(),
        }
    }

    pub fn topic_unsubscribed(topic_id: Option<String>) -> Self {
        let message = match &topic_id {
            Some(topic) => format!("Unsubscribed from topic {}", topic),
            None => "Not subscribed to any topic".to_string(),
        };
        Self::TopicUnsubscribed {
            topic_id,
            message,
            timestamp: Utc::now(),
        }
    }

    pub fn pong() -> Self {
        Self::Pong {
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// An externally computed change to a topic, waiting to be fanned out
#[derive(Debug, Clone)]
pub struct UpdateEvent {
    /// Topic (poll id) the update belongs to
    pub topic_id: String,
    /// Result snapshot; forwarded as-is
    pub payload: Value,
}

impl UpdateEvent {
    pub fn new(topic_id: impl Into<String>, payload: Value) -> Self {
        Self {
            topic_id: topic_id.into(),
            payload,
        }
    }

    /// Build the frame delivered to each subscriber
    pub fn to_message(&self) -> ServerMessage {
        ServerMessage::TopicUpdate {
            topic_id: self.topic_id.clone(),
            payload: self.payload.clone(),
            timestamp: Utc::now(),
        }
    }
}
