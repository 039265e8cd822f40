//! Chat room bookkeeping.
//!
//! A room is unique per unordered participant pair: the same two users
//! always resolve to the same room regardless of lookup order. Rooms are
//! created on first contact and never deleted by this engine.

use crate::error::StoreError;
use async_trait::async_trait;
use clinic_relay_core::{RoomId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// A chat room between two participants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRoom {
    /// Unique room identifier.
    pub id: RoomId,
    /// First participant.
    pub user_a: UserId,
    /// Second participant.
    pub user_b: UserId,
}

impl ChatRoom {
    /// Creates a room for a participant pair.
    #[must_use]
    pub fn new(user_a: UserId, user_b: UserId) -> Self {
        Self {
            id: RoomId::new(),
            user_a,
            user_b,
        }
    }

    /// Returns true if the user participates in this room.
    #[must_use]
    pub fn has_participant(&self, user: UserId) -> bool {
        self.user_a == user || self.user_b == user
    }
}

/// Normalizes a participant pair so lookup order does not matter.
fn pair_key(a: UserId, b: UserId) -> (UserId, UserId) {
    if a.as_ulid() <= b.as_ulid() { (a, b) } else { (b, a) }
}

/// Trait for room storage.
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Gets a room by id.
    async fn get(&self, id: RoomId) -> Result<ChatRoom, StoreError>;

    /// Resolves the room for a participant pair, creating it on first
    /// contact. `(a, b)` and `(b, a)` resolve to the same room.
    async fn get_or_create(&self, a: UserId, b: UserId) -> Result<ChatRoom, StoreError>;
}

/// In-memory room store.
#[derive(Debug, Default)]
pub struct InMemoryRoomStore {
    inner: RwLock<RoomStoreInner>,
}

#[derive(Debug, Default)]
struct RoomStoreInner {
    rooms: HashMap<RoomId, ChatRoom>,
    by_pair: HashMap<(UserId, UserId), RoomId>,
}

impl InMemoryRoomStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomStore for InMemoryRoomStore {
    async fn get(&self, id: RoomId) -> Result<ChatRoom, StoreError> {
        self.inner
            .read()
            .expect("room store lock poisoned")
            .rooms
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "room",
                id: id.to_string(),
            })
    }

    async fn get_or_create(&self, a: UserId, b: UserId) -> Result<ChatRoom, StoreError> {
        let key = pair_key(a, b);
        let mut inner = self.inner.write().expect("room store lock poisoned");

        if let Some(id) = inner.by_pair.get(&key) {
            // Index and room table are updated together below.
            return Ok(inner.rooms[id].clone());
        }

        let room = ChatRoom::new(a, b);
        tracing::debug!(room = %room.id, "created room on first contact");
        inner.by_pair.insert(key, room.id);
        inner.rooms.insert(room.id, room.clone());
        Ok(room)
    }
}
