//! Chat message types.

use crate::status::MessageStatus;
use chrono::{DateTime, Utc};
use clinic_relay_core::{MessageId, RoomId, UserId};
use serde::{Deserialize, Serialize};

/// Marker appended when message content is cut at the configured bound.
pub const TRUNCATION_MARKER: &str = " [truncated]";

/// The kind of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    /// Ordinary user-authored text.
    Text,
    /// System notice injected by the platform.
    System,
    /// Assistant-authored reply.
    Bot,
}

/// An inbound message envelope, as handed over by the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// The room the message belongs to.
    pub room: RoomId,
    /// The sending user.
    pub sender: UserId,
    /// The receiving user.
    pub receiver: UserId,
    /// Raw message text; truncated to the configured bound on persistence.
    pub content: String,
    /// Message kind.
    pub kind: MessageKind,
}

/// A persisted chat message.
///
/// Immutable once persisted except for `status`, which only advances
/// through the delivery state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier.
    pub id: MessageId,
    /// Owning room.
    pub room: RoomId,
    /// Sending user.
    pub sender: UserId,
    /// Receiving user.
    pub receiver: UserId,
    /// Message text, already bounded.
    pub content: String,
    /// Server-assigned persistence timestamp.
    pub timestamp: DateTime<Utc>,
    /// Current delivery status.
    pub status: MessageStatus,
    /// Message kind.
    pub kind: MessageKind,
}

impl Message {
    /// Creates a new message in the initial `Sent` state with a server
    /// timestamp.
    #[must_use]
    pub fn new(
        room: RoomId,
        sender: UserId,
        receiver: UserId,
        content: impl Into<String>,
        kind: MessageKind,
    ) -> Self {
        Self {
            id: MessageId::new(),
            room,
            sender,
            receiver,
            content: content.into(),
            timestamp: Utc::now(),
            status: MessageStatus::Sent,
            kind,
        }
    }
}

/// Bounds message content to `max_len` characters, appending the
/// truncation marker when content was cut.
#[must_use]
pub fn truncate_content(content: &str, max_len: usize) -> String {
    if content.chars().count() <= max_len {
        return content.to_string();
    }
    let kept: String = content.chars().take(max_len).collect();
    format!("{kept}{TRUNCATION_MARKER}")
}
