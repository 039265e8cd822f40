//! In-memory, per-room conversation store.

use crate::turn::ConversationTurn;
use clinic_relay_core::RoomId;
use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

/// Default maximum number of turns retained per room.
///
/// The source system this replaces kept history unbounded; the cap bounds
/// both process memory and provider context size. Oldest turns are dropped
/// first.
pub const DEFAULT_MAX_TURNS: usize = 50;

/// Keyed, bounded store of per-room conversation histories.
///
/// A room with no history yields an empty sequence. Turns within a room
/// keep arrival order; rooms are fully independent.
#[derive(Debug)]
pub struct ConversationStore {
    rooms: RwLock<HashMap<RoomId, VecDeque<ConversationTurn>>>,
    max_turns: usize,
}

impl ConversationStore {
    /// Creates a store with the default per-room cap.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_turns(DEFAULT_MAX_TURNS)
    }

    /// Creates a store with a custom per-room cap.
    #[must_use]
    pub fn with_max_turns(max_turns: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            max_turns,
        }
    }

    /// Appends a turn to a room's history, evicting the oldest turn if the
    /// room is at capacity.
    pub fn append(&self, room: RoomId, turn: ConversationTurn) {
        let mut rooms = self.rooms.write().expect("conversation lock poisoned");
        let history = rooms.entry(room).or_default();
        if history.len() >= self.max_turns {
            history.pop_front();
        }
        history.push_back(turn);
    }

    /// Returns a room's history in arrival order.
    #[must_use]
    pub fn history(&self, room: RoomId) -> Vec<ConversationTurn> {
        self.rooms
            .read()
            .expect("conversation lock poisoned")
            .get(&room)
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the number of turns recorded for a room.
    #[must_use]
    pub fn len(&self, room: RoomId) -> usize {
        self.rooms
            .read()
            .expect("conversation lock poisoned")
            .get(&room)
            .map_or(0, VecDeque::len)
    }

    /// Returns whether a room has no recorded turns.
    #[must_use]
    pub fn is_empty(&self, room: RoomId) -> bool {
        self.len(room) == 0
    }

    /// Clears a room's history.
    pub fn clear(&self, room: RoomId) {
        self.rooms
            .write()
            .expect("conversation lock poisoned")
            .remove(&room);
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turn::TurnRole;

    #[test]
    fn unknown_room_has_empty_history() {
        let store = ConversationStore::new();
        assert!(store.history(RoomId::new()).is_empty());
    }

    #[test]
    fn append_preserves_arrival_order() {
        let store = ConversationStore::new();
        let room = RoomId::new();

        store.append(room, ConversationTurn::user("first"));
        store.append(room, ConversationTurn::assistant("second"));
        store.append(room, ConversationTurn::user("third"));

        let history = store.history(room);
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].content, "first");
        assert_eq!(history[1].content, "second");
        assert_eq!(history[2].content, "third");
    }

    #[test]
    fn rooms_are_independent() {
        let store = ConversationStore::new();
        let room_a = RoomId::new();
        let room_b = RoomId::new();

        store.append(room_a, ConversationTurn::user("for a"));
        store.append(room_b, ConversationTurn::user("for b"));

        assert_eq!(store.len(room_a), 1);
        assert_eq!(store.len(room_b), 1);
        assert_eq!(store.history(room_b)[0].content, "for b");
    }

    #[test]
    fn cap_evicts_oldest_turn() {
        let store = ConversationStore::with_max_turns(3);
        let room = RoomId::new();

        for i in 0..5 {
            store.append(room, ConversationTurn::user(format!("turn {i}")));
        }

        let history = store.history(room);
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].content, "turn 2");
        assert_eq!(history[2].content, "turn 4");
    }

    #[test]
    fn clear_removes_history() {
        let store = ConversationStore::new();
        let room = RoomId::new();

        store.append(room, ConversationTurn::assistant("hi"));
        assert!(!store.is_empty(room));

        store.clear(room);
        assert!(store.is_empty(room));
        assert!(store.history(room).is_empty());
    }

    #[test]
    fn mixed_roles_survive_roundtrip() {
        let store = ConversationStore::new();
        let room = RoomId::new();

        store.append(room, ConversationTurn::user("book me in"));
        store.append(
            room,
            ConversationTurn::assistant_call("book_appointment", "{}"),
        );
        store.append(room, ConversationTurn::function("book_appointment", "ok"));

        let history = store.history(room);
        assert_eq!(history[0].role, TurnRole::User);
        assert!(history[1].is_call());
        assert_eq!(history[2].role, TurnRole::Function);
    }
}
