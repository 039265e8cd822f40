//! Process-wide presence registry.
//!
//! Records which users currently have an active connection and publishes
//! a change notification for every mark operation. Notifications are
//! at-least-once: marking a user online twice publishes two events, and
//! subscribers are expected to tolerate duplicates.

use clinic_relay_core::UserId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::RwLock;
use tokio::sync::broadcast;

/// Default capacity of the presence notification channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A presence change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceEvent {
    /// The user whose presence changed.
    pub user: UserId,
    /// The new presence state.
    pub online: bool,
}

/// Tracks which users are currently connected.
///
/// Membership defaults to offline for unknown users. Concurrent marks for
/// the same user resolve last-write-wins; there is no per-connection
/// reference counting, so a user with two open connections who closes one
/// is marked offline.
#[derive(Debug)]
pub struct PresenceRegistry {
    online: RwLock<HashSet<UserId>>,
    events: broadcast::Sender<PresenceEvent>,
}

impl PresenceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            online: RwLock::new(HashSet::new()),
            events,
        }
    }

    /// Marks a user as online and publishes a presence event.
    pub fn mark_online(&self, user: UserId) {
        self.online
            .write()
            .expect("presence lock poisoned")
            .insert(user);
        tracing::debug!(%user, "user marked online");
        self.publish(PresenceEvent { user, online: true });
    }

    /// Marks a user as offline and publishes a presence event.
    pub fn mark_offline(&self, user: UserId) {
        self.online
            .write()
            .expect("presence lock poisoned")
            .remove(&user);
        tracing::debug!(%user, "user marked offline");
        self.publish(PresenceEvent {
            user,
            online: false,
        });
    }

    /// Returns whether a user is currently online.
    #[must_use]
    pub fn is_online(&self, user: UserId) -> bool {
        self.online
            .read()
            .expect("presence lock poisoned")
            .contains(&user)
    }

    /// Subscribes to presence change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PresenceEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: PresenceEvent) {
        // A send error only means there are no subscribers right now.
        let _ = self.events.send(event);
    }
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
