//! User directory boundary.
//!
//! The router only needs to resolve sender/receiver identities and to
//! recognize the assistant identity; account management itself lives
//! outside this engine.

use crate::error::StoreError;
use async_trait::async_trait;
use clinic_relay_core::UserId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// A resolvable chat participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatUser {
    /// Unique user identifier.
    pub id: UserId,
    /// Login name, unique within the directory.
    pub username: String,
    /// Display name shown in conversation.
    pub display_name: String,
    /// Whether this identity is the automated assistant.
    pub is_assistant: bool,
}

impl ChatUser {
    /// Creates a human participant.
    #[must_use]
    pub fn human(username: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            display_name: display_name.into(),
            is_assistant: false,
        }
    }

    /// Creates the assistant identity.
    #[must_use]
    pub fn assistant(username: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            display_name: display_name.into(),
            is_assistant: true,
        }
    }
}

/// Trait for user lookup.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolves a user by id.
    async fn find(&self, id: UserId) -> Result<ChatUser, StoreError>;

    /// Resolves a user by username.
    async fn find_by_username(&self, username: &str) -> Result<ChatUser, StoreError>;
}

/// In-memory user directory.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<UserId, ChatUser>>,
}

impl InMemoryUserDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user, replacing any existing record with the same id.
    pub fn register(&self, user: ChatUser) {
        self.users
            .write()
            .expect("user directory lock poisoned")
            .insert(user.id, user);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find(&self, id: UserId) -> Result<ChatUser, StoreError> {
        self.users
            .read()
            .expect("user directory lock poisoned")
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "user",
                id: id.to_string(),
            })
    }

    async fn find_by_username(&self, username: &str) -> Result<ChatUser, StoreError> {
        self.users
            .read()
            .expect("user directory lock poisoned")
            .values()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "user",
                id: username.to_string(),
            })
    }
}
