//! Message delivery engine for clinic-relay.
//!
//! Persists inbound chat messages, drives their delivery status through
//! the forward-only status state machine, and routes messages addressed
//! to the assistant identity into the bot dispatcher.

pub mod broadcast;
pub mod error;
pub mod message;
pub mod room;
pub mod router;
pub mod status;
pub mod store;
pub mod user;

pub use broadcast::{Broadcaster, ChannelBroadcaster, OutgoingMessage, StatusUpdate};
pub use error::{RouterError, StoreError};
pub use message::{IncomingMessage, Message, MessageKind};
pub use room::{ChatRoom, InMemoryRoomStore, RoomStore};
pub use router::{AssistantHandler, MessageRouter, RouterConfig};
pub use status::{MessageStatus, Transition};
pub use store::{InMemoryMessageStore, MessageStore, StatusChange};
pub use user::{ChatUser, InMemoryUserDirectory, UserDirectory};
