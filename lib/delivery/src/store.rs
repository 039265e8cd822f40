//! Message persistence boundary.
//!
//! Status transitions are applied inside the store, under its write lock,
//! through the state machine. That keeps transitions for a single message
//! linearizable: a reader never observes a status regress.

use crate::error::StoreError;
use crate::message::Message;
use crate::status::{self, MessageStatus, Transition};
use async_trait::async_trait;
use clinic_relay_core::{MessageId, RoomId};
use std::collections::HashMap;
use std::sync::RwLock;

/// Result of applying a status request to a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    /// The transition outcome.
    pub transition: Transition,
    /// The message's status after the request was processed. Unchanged
    /// unless the transition advanced.
    pub status: MessageStatus,
}

/// Trait for message storage.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persists a new message.
    async fn insert(&self, message: Message) -> Result<(), StoreError>;

    /// Gets a message by id.
    async fn get(&self, id: MessageId) -> Result<Message, StoreError>;

    /// Applies a requested status through the state machine, atomically
    /// with respect to concurrent requests for the same message.
    async fn apply_status(
        &self,
        id: MessageId,
        requested: MessageStatus,
    ) -> Result<StatusChange, StoreError>;

    /// Returns the most recent `limit` messages of a room, ascending by
    /// persistence timestamp. Used for reconnect catch-up.
    async fn find_recent(&self, room: RoomId, limit: usize) -> Result<Vec<Message>, StoreError>;
}

/// In-memory message store.
#[derive(Debug, Default)]
pub struct InMemoryMessageStore {
    inner: RwLock<MessageStoreInner>,
}

#[derive(Debug, Default)]
struct MessageStoreInner {
    messages: HashMap<MessageId, Message>,
    // Per-room insertion order; insertion order equals timestamp order
    // because timestamps are assigned at persistence time.
    by_room: HashMap<RoomId, Vec<MessageId>>,
}

impl InMemoryMessageStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .expect("message store lock poisoned")
            .messages
            .len()
    }

    /// Returns whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn insert(&self, message: Message) -> Result<(), StoreError> {
        let mut inner = self.inner.write().expect("message store lock poisoned");
        inner.by_room.entry(message.room).or_default().push(message.id);
        inner.messages.insert(message.id, message);
        Ok(())
    }

    async fn get(&self, id: MessageId) -> Result<Message, StoreError> {
        self.inner
            .read()
            .expect("message store lock poisoned")
            .messages
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "message",
                id: id.to_string(),
            })
    }

    async fn apply_status(
        &self,
        id: MessageId,
        requested: MessageStatus,
    ) -> Result<StatusChange, StoreError> {
        let mut inner = self.inner.write().expect("message store lock poisoned");
        let message = inner
            .messages
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "message",
                id: id.to_string(),
            })?;

        let transition = status::apply(message.status, requested);
        if transition == Transition::Advanced {
            message.status = requested;
        }

        Ok(StatusChange {
            transition,
            status: message.status,
        })
    }

    async fn find_recent(&self, room: RoomId, limit: usize) -> Result<Vec<Message>, StoreError> {
        let inner = self.inner.read().expect("message store lock poisoned");
        let ids = inner.by_room.get(&room).map(Vec::as_slice).unwrap_or(&[]);
        let skip = ids.len().saturating_sub(limit);
        Ok(ids[skip..]
            .iter()
            .filter_map(|id| inner.messages.get(id).cloned())
            .collect())
    }
}
