//! Per-room conversation history for clinic-relay.
//!
//! The assistant dispatcher replays this history to the completion
//! provider on every turn, so turns for a single room must stay in
//! arrival order. Rooms are independent of each other.

pub mod store;
pub mod turn;

pub use store::ConversationStore;
pub use turn::{ConversationTurn, IssuedCall, TurnRole};
