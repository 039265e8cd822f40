//! Connection presence tracking for clinic-relay.
//!
//! Tracks which user identities currently have an active transport
//! connection, and notifies subscribers of presence changes.

pub mod registry;

pub use registry::{PresenceEvent, PresenceRegistry};
