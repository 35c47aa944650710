//! WebSocket Real-Time Poll Updates
//!
//! Pushes topic (poll) updates to connected clients over WebSocket.
//!
//! ## Architecture
//!
//! - **TopicRegistry**: Topic → subscriber set bookkeeping
//! - **ConnectionHub**: Session metadata plus the registry, behind one lock
//! - **Broadcaster**: Best-effort fan-out of update events
//! - **Session**: WebSocket upgrade and per-connection message handling
//! - **Messages**: Client and server message formats
//!
//! ## Usage
//!
//! Clients connect to `/ws` and listen to one topic at a time. Subscribing
//! to a second topic leaves the first.
//!
//! ## Example
//!
//! ```javascript
//! // Browser
//! const ws = new WebSocket('ws://localhost:3000/ws');
//!
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({type: 'subscribe_topic', topicId: 'poll-1'}));
//! };
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   if (msg.type === 'topic_update') console.log(msg.payload);
//! };
//! ```

mod broadcast;
mod hub;
mod messages;
mod registry;
mod session;

pub use broadcast::{BroadcastSummary, Broadcaster};
pub use hub::{
    validate_topic_id, ConnectionHub, ConnectionStats, HubConfig, HubError, Session,
    SessionSender, MAX_TOPIC_ID_LEN,
};
pub use messages::{ClientMessage, ServerMessage, UpdateEvent};
pub use registry::{SessionId, TopicId, TopicRegistry};
pub use session::websocket_handler;
