//! The seam between the conversation logic and whatever chat network carries
//! the messages.

use std::fmt;

use async_trait::async_trait;

/// Opaque identifier of a chat/thread.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<i64> for ConversationId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

/// Inbound events delivered by a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundEvent {
    Message {
        conversation: ConversationId,
        text: String,
        /// Set for messages the bot itself sent, echoed back by the network.
        is_outgoing_echo: bool,
    },
    /// The transport reconnected or logged out: every pending confirmation
    /// is dropped.
    SessionReset,
}

impl InboundEvent {
    pub fn message(conversation: impl Into<ConversationId>, text: impl Into<String>) -> Self {
        Self::Message {
            conversation: conversation.into(),
            text: text.into(),
            is_outgoing_echo: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("send failed: {0}")]
    Send(String),
    #[error("transport closed")]
    Closed,
}

/// Outbound side of a chat network.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Human-readable transport name, used in logs.
    fn name(&self) -> &str;

    async fn send_text(&self, conversation: &ConversationId, text: &str)
    -> Result<(), TransportError>;
}
