//! Outbound broadcast boundary.
//!
//! The transport layer subscribes here and fans events out to connected
//! clients. Message content and status changes travel on logically
//! separate channels; presence changes are published by the presence
//! registry itself.

use crate::message::{Message, MessageKind};
use crate::status::MessageStatus;
use crate::user::ChatUser;
use chrono::{DateTime, Utc};
use clinic_relay_core::{MessageId, RoomId, UserId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default capacity of the outbound channels.
const CHANNEL_CAPACITY: usize = 256;

/// Participant info attached to an outbound message envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    /// User identifier.
    pub id: UserId,
    /// Login name.
    pub username: String,
}

impl From<&ChatUser> for ParticipantInfo {
    fn from(user: &ChatUser) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

/// An outbound message envelope, keyed by room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Room the message belongs to.
    pub room: RoomId,
    /// Message identifier.
    pub message: MessageId,
    /// Sender info.
    pub from: ParticipantInfo,
    /// Receiver info.
    pub to: ParticipantInfo,
    /// Message text.
    pub content: String,
    /// Persistence timestamp.
    pub timestamp: DateTime<Utc>,
    /// Delivery status at broadcast time.
    pub status: MessageStatus,
    /// Message kind.
    pub kind: MessageKind,
}

impl OutgoingMessage {
    /// Builds an outbound envelope from a persisted message and its
    /// resolved participants.
    #[must_use]
    pub fn from_parts(message: &Message, sender: &ChatUser, receiver: &ChatUser) -> Self {
        Self {
            room: message.room,
            message: message.id,
            from: ParticipantInfo::from(sender),
            to: ParticipantInfo::from(receiver),
            content: message.content.clone(),
            timestamp: message.timestamp,
            status: message.status,
            kind: message.kind,
        }
    }
}

/// An outbound status change event, keyed by room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    /// Room the message belongs to.
    pub room: RoomId,
    /// The message whose status changed.
    pub message: MessageId,
    /// The new status.
    pub status: MessageStatus,
}

/// Trait for the outbound broadcast boundary.
pub trait Broadcaster: Send + Sync {
    /// Broadcasts a delivered message to the room's subscribers.
    fn broadcast_message(&self, message: &OutgoingMessage);

    /// Broadcasts a status change to the room's subscribers.
    fn broadcast_status(&self, update: &StatusUpdate);
}

/// Broadcast implementation over tokio broadcast channels.
#[derive(Debug)]
pub struct ChannelBroadcaster {
    messages: broadcast::Sender<OutgoingMessage>,
    statuses: broadcast::Sender<StatusUpdate>,
}

impl ChannelBroadcaster {
    /// Creates a broadcaster with default channel capacity.
    #[must_use]
    pub fn new() -> Self {
        let (messages, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (statuses, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { messages, statuses }
    }

    /// Subscribes to outbound message envelopes.
    #[must_use]
    pub fn subscribe_messages(&self) -> broadcast::Receiver<OutgoingMessage> {
        self.messages.subscribe()
    }

    /// Subscribes to outbound status events.
    #[must_use]
    pub fn subscribe_statuses(&self) -> broadcast::Receiver<StatusUpdate> {
        self.statuses.subscribe()
    }
}

impl Default for ChannelBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn broadcast_message(&self, message: &OutgoingMessage) {
        // A send error only means there are no subscribers right now.
        let _ = self.messages.send(message.clone());
    }

    fn broadcast_status(&self, update: &StatusUpdate) {
        let _ = self.statuses.send(*update);
    }
}

/// A broadcaster that records everything it is asked to send. For tests.
#[derive(Debug, Default)]
pub struct RecordingBroadcaster {
    messages: std::sync::Mutex<Vec<OutgoingMessage>>,
    statuses: std::sync::Mutex<Vec<StatusUpdate>>,
}

impl RecordingBroadcaster {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded message broadcasts.
    #[must_use]
    pub fn messages(&self) -> Vec<OutgoingMessage> {
        self.messages.lock().expect("recorder lock poisoned").clone()
    }

    /// Returns the recorded status broadcasts.
    #[must_use]
    pub fn statuses(&self) -> Vec<StatusUpdate> {
        self.statuses.lock().expect("recorder lock poisoned").clone()
    }
}

impl Broadcaster for RecordingBroadcaster {
    fn broadcast_message(&self, message: &OutgoingMessage) {
        self.messages
            .lock()
            .expect("recorder lock poisoned")
            .push(message.clone());
    }

    fn broadcast_status(&self, update: &StatusUpdate) {
        self.statuses
            .lock()
            .expect("recorder lock poisoned")
            .push(*update);
    }
}
