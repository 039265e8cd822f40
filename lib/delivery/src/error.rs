//! Error types for the delivery crate.

use crate::status::MessageStatus;
use clinic_relay_core::{MessageId, RoomId, UserId};
use std::fmt;

/// Errors from storage operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Record not found.
    NotFound { entity: &'static str, id: String },
    /// Storage operation failed.
    StorageFailed { reason: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::StorageFailed { reason } => write!(f, "storage failed: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors from message routing.
///
/// Only precondition failures abort an inbound message; everything behind
/// the assistant seam is converted to reply text before it reaches the
/// router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// Referenced room does not exist; nothing was persisted.
    RoomNotFound { room: RoomId },
    /// Sending user does not exist; nothing was persisted.
    SenderNotFound { user: UserId },
    /// Receiving user does not exist; nothing was persisted.
    ReceiverNotFound { user: UserId },
    /// Status update referenced an unknown message.
    MessageNotFound { message: MessageId },
    /// Status update would move a message backward.
    InvalidTransition {
        message: MessageId,
        from: MessageStatus,
        to: MessageStatus,
    },
    /// Storage operation failed mid-route.
    Store(StoreError),
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoomNotFound { room } => write!(f, "room not found: {room}"),
            Self::SenderNotFound { user } => write!(f, "sender not found: {user}"),
            Self::ReceiverNotFound { user } => write!(f, "receiver not found: {user}"),
            Self::MessageNotFound { message } => write!(f, "message not found: {message}"),
            Self::InvalidTransition { message, from, to } => {
                write!(f, "invalid status transition for {message}: {from} -> {to}")
            }
            Self::Store(e) => write!(f, "store error: {e}"),
        }
    }
}

impl std::error::Error for RouterError {}

impl From<StoreError> for RouterError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display() {
        let err = StoreError::NotFound {
            entity: "message",
            id: "msg_123".to_string(),
        };
        assert!(err.to_string().contains("message not found"));
    }

    #[test]
    fn router_error_display() {
        let room = RoomId::new();
        let err = RouterError::RoomNotFound { room };
        assert!(err.to_string().contains("room not found"));
        assert!(err.to_string().contains(&room.to_string()));
    }

    #[test]
    fn invalid_transition_display_names_both_states() {
        let err = RouterError::InvalidTransition {
            message: MessageId::new(),
            from: MessageStatus::Read,
            to: MessageStatus::Delivered,
        };
        let text = err.to_string();
        assert!(text.contains("READ"));
        assert!(text.contains("DELIVERED"));
    }
}
