//! Topic Registry
//!
//! Pure in-memory bookkeeping of which sessions listen to which topic.
//! A topic key exists only while its subscriber set is non-empty.
//! Callers provide the locking; see [`ConnectionHub`](super::ConnectionHub).

use std::collections::{BTreeMap, HashMap, HashSet};

/// Unique identifier for a WebSocket session
pub type SessionId = String;

/// Topic identifier (a poll id)
pub type TopicId = String;

/// Topic → subscriber set mapping
#[derive(Debug, Default)]
pub struct TopicRegistry {
    topics: HashMap<TopicId, HashSet<SessionId>>,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a session to a topic, creating the topic on its first subscriber.
    ///
    /// Returns false if the session was already a member.
    pub fn add(&mut self, session_id: &str, topic_id: &str) -> bool {
        self.topics
            .entry(topic_id.to_string())
            .or_default()
            .insert(session_id.to_string())
    }

    /// Remove a session from a topic, dropping the topic once it is empty.
    ///
    /// Removing a non-member is a no-op and returns false.
    pub fn remove(&mut self, session_id: &str, topic_id: &str) -> bool {
        let Some(subscribers) = self.topics.get_mut(topic_id) else {
            return false;
        };

        let removed = subscribers.remove(session_id);
        if subscribers.is_empty() {
            self.topics.remove(topic_id);
        }
        removed
    }

    /// Snapshot of a topic's subscribers (empty if the topic is unknown)
    pub fn subscribers_of(&self, topic_id: &str) -> Vec<SessionId> {
        self.topics
            .get(topic_id)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn subscriber_count(&self, topic_id: &str) -> usize {
        self.topics.get(topic_id).map(|s| s.len()).unwrap_or(0)
    }

    pub fn contains_topic(&self, topic_id: &str) -> bool {
        self.topics.contains_key(topic_id)
    }

    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    /// Subscriber count per topic, ordered by topic id
    pub fn subscriber_counts(&self) -> BTreeMap<TopicId, usize> {
        self.topics
            .iter()
            .map(|(topic, subs)| (topic.clone(), subs.len()))
            .collect()
    }

    /// Topics a session is a member of. At most one under the hub's rules.
    pub fn topics_of(&self, session_id: &str) -> Vec<&str> {
        self.topics
            .iter()
            .filter(|(_, subs)| subs.contains(session_id))
            .map(|(topic, _)| topic.as_str())
            .collect()
    }

    /// Panics if an empty set lingers or a session sits in two topics.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let mut seen: HashMap<&str, &str> = HashMap::new();
        for (topic, subs) in &self.topics {
            assert!(!subs.is_empty(), "topic {} has an empty subscriber set", topic);
            for session in subs {
                if let Some(other) = seen.insert(session.as_str(), topic.as_str()) {
                    panic!(
                        "session {} subscribed to both {} and {}",
                        session, other, topic
                    );
                }
            }
        }
    }
}
