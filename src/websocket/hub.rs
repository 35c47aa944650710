//! WebSocket Connection Hub
//!
//! Owns the session-metadata table and the topic registry. Both live behind
//! a single lock so a subscribe, an unsubscribe, a teardown and a broadcast
//! snapshot never observe each other half-applied.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use super::messages::ServerMessage;
use super::registry::{SessionId, TopicId, TopicRegistry};

/// Outbound channel feeding a connection's writer task
pub type SessionSender = mpsc::UnboundedSender<ServerMessage>;

/// Longest topic id accepted from subscribers and publishers
pub const MAX_TOPIC_ID_LEN: usize = 200;

/// Check a topic id before it reaches the registry
pub fn validate_topic_id(topic_id: &str) -> Result<(), HubError> {
    if topic_id.trim().is_empty() {
        return Err(HubError::InvalidTopic("Topic ID cannot be empty".to_string()));
    }

    if topic_id.len() > MAX_TOPIC_ID_LEN {
        return Err(HubError::InvalidTopic(format!(
            "Topic ID exceeds maximum length of {} characters",
            MAX_TOPIC_ID_LEN
        )));
    }

    Ok(())
}

/// Configuration for the connection hub
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Maximum number of concurrent connections
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

fn default_max_connections() -> usize {
    1000
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
        }
    }
}

/// Server-side state of one connected peer
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    sender: SessionSender,
    /// The single topic this session listens to, if any
    pub topic: Option<TopicId>,
    pub connected_at: DateTime<Utc>,
}

/// Connection and subscription counts exposed to collaborators
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStats {
    pub total_connections: usize,
    pub total_topics: usize,
    pub subscribers_per_topic: BTreeMap<TopicId, usize>,
}

#[derive(Default)]
struct HubState {
    sessions: HashMap<SessionId, Session>,
    registry: TopicRegistry,
}

impl HubState {
    /// Drop a session and every registry trace of it
    fn remove_session(&mut self, id: &str) -> Option<Session> {
        let session = self.sessions.remove(id)?;
        if let Some(topic) = &session.topic {
            self.registry.remove(id, topic);
        }
        Some(session)
    }
}

/// Manages all WebSocket sessions and their topic subscriptions
pub struct ConnectionHub {
    state: RwLock<HubState>,
    config: HubConfig,
}

impl ConnectionHub {
    /// Create a new connection hub
    pub fn new(config: HubConfig) -> Self {
        Self {
            state: RwLock::new(HubState::default()),
            config,
        }
    }

    /// Register a new WebSocket connection
    ///
    /// Returns the session ID on success, or an error if the connection
    /// limit has been reached.
    pub async fn register(&self, sender: SessionSender) -> Result<SessionId, HubError> {
        let mut state = self.state.write().await;
        if state.sessions.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections(self.config.max_connections));
        }

        let id = Uuid::new_v4().to_string();
        state.sessions.insert(
            id.clone(),
            Session {
                id: id.clone(),
                sender,
                topic: None,
                connected_at: Utc::now(),
            },
        );

        tracing::info!(session_id = %id, "WebSocket connected");
        Ok(id)
    }

    /// Remove a session and its subscription.
    ///
    /// Safe to call more than once; returns true only for the call that
    /// actually removed the session.
    pub async fn unregister(&self, id: &str) -> bool {
        let removed = self.state.write().await.remove_session(id);

        match removed {
            Some(session) => {
                tracing::info!(
                    session_id = %id,
                    topic_id = ?session.topic,
                    connected_for_secs = (Utc::now() - session.connected_at).num_seconds(),
                    "WebSocket disconnected"
                );
                true
            }
            None => false,
        }
    }

    /// Move a session onto `topic_id`, leaving its previous topic first.
    ///
    /// This is the only place a session gains a topic. Returns the topic it
    /// left, if any.
    pub async fn switch_topic(
        &self,
        id: &str,
        topic_id: &str,
    ) -> Result<Option<TopicId>, HubError> {
        validate_topic_id(topic_id)?;

        let mut state = self.state.write().await;
        let HubState { sessions, registry } = &mut *state;

        let session = sessions.get_mut(id).ok_or(HubError::SessionNotFound)?;

        let previous = session.topic.take();
        if let Some(old) = &previous {
            registry.remove(id, old);
        }

        registry.add(id, topic_id);
        session.topic = Some(topic_id.to_string());

        debug_assert!(registry.topics_of(id).len() == 1);

        tracing::debug!(
            session_id = %id,
            topic_id = %topic_id,
            previous = ?previous,
            "Subscribed to topic"
        );

        Ok(previous)
    }

    /// Remove a session from a topic.
    ///
    /// With `None` the session leaves whatever topic it is on. Leaving a
    /// topic the session is not a member of changes nothing. Returns the
    /// topic actually left.
    pub async fn leave_topic(
        &self,
        id: &str,
        topic_id: Option<&str>,
    ) -> Result<Option<TopicId>, HubError> {
        let mut state = self.state.write().await;
        let HubState { sessions, registry } = &mut *state;

        let session = sessions.get_mut(id).ok_or(HubError::SessionNotFound)?;

        let target = match topic_id {
            Some(topic) if session.topic.as_deref() == Some(topic) => session.topic.take(),
            Some(_) => None,
            None => session.topic.take(),
        };

        if let Some(topic) = &target {
            registry.remove(id, topic);
            tracing::debug!(session_id = %id, topic_id = %topic, "Unsubscribed from topic");
        }

        Ok(target)
    }

    /// Send a message directly to a specific session
    pub async fn send_to(&self, id: &str, message: ServerMessage) -> Result<(), HubError> {
        let state = self.state.read().await;
        let session = state.sessions.get(id).ok_or(HubError::SessionNotFound)?;

        session.sender.send(message).map_err(|_| HubError::SendFailed)
    }

    /// Snapshot of every subscriber of a topic with its outbound sender.
    ///
    /// The lock is released before the caller sends anything. A registry
    /// entry without metadata comes back with `None`.
    pub(crate) async fn subscriber_handles(
        &self,
        topic_id: &str,
    ) -> Vec<(SessionId, Option<SessionSender>)> {
        let state = self.state.read().await;

        state
            .registry
            .subscribers_of(topic_id)
            .into_iter()
            .map(|id| {
                let sender = state.sessions.get(&id).map(|s| s.sender.clone());
                (id, sender)
            })
            .collect()
    }

    /// Remove sessions found dead while fanning out on `topic_id`
    pub(crate) async fn prune(&self, topic_id: &str, ids: &[SessionId]) {
        if ids.is_empty() {
            return;
        }

        let mut state = self.state.write().await;
        for id in ids {
            if state.remove_session(id).is_some() {
                tracing::debug!(session_id = %id, topic_id = %topic_id, "Pruned stale session");
            }
            // Registry entry may outlive its metadata
            state.registry.remove(id, topic_id);
        }
    }

    /// The topic a session is subscribed to
    pub async fn session_topic(&self, id: &str) -> Option<TopicId> {
        self.state
            .read()
            .await
            .sessions
            .get(id)
            .and_then(|s| s.topic.clone())
    }

    /// Whether a session is still registered
    pub async fn contains_session(&self, id: &str) -> bool {
        self.state.read().await.sessions.contains_key(id)
    }

    /// Get the current connection count
    pub async fn connection_count(&self) -> usize {
        self.state.read().await.sessions.len()
    }

    /// True once `max_connections` sessions are registered
    pub async fn is_at_capacity(&self) -> bool {
        self.state.read().await.sessions.len() >= self.config.max_connections
    }

    /// Get subscriber count for a topic
    pub async fn subscription_count(&self, topic_id: &str) -> usize {
        self.state.read().await.registry.subscriber_count(topic_id)
    }

    /// Connection and per-topic subscriber counts
    pub async fn stats(&self) -> ConnectionStats {
        let state = self.state.read().await;

        ConnectionStats {
            total_connections: state.sessions.len(),
            total_topics: state.registry.topic_count(),
            subscribers_per_topic: state.registry.subscriber_counts(),
        }
    }

    #[cfg(test)]
    pub(crate) async fn assert_invariants(&self) {
        let state = self.state.read().await;
        state.registry.assert_invariants();

        for (id, session) in &state.sessions {
            let topics = state.registry.topics_of(id);
            match &session.topic {
                Some(topic) => assert_eq!(topics, vec![topic.as_str()]),
                None => assert!(
                    topics.is_empty(),
                    "session {} has no topic but is in {:?}",
                    id,
                    topics
                ),
            }
        }
    }
}

/// Errors that can occur in the connection hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {0})")]
    TooManyConnections(usize),

    #[error("Session not found")]
    SessionNotFound,

    #[error("Failed to send message")]
    SendFailed,

    #[error("Invalid topic: {0}")]
    InvalidTopic(String),
}
