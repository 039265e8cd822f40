//! Presence-aware message routing.
//!
//! The router is the single entry point for inbound messages: it resolves
//! its preconditions, persists, consults presence to decide delivery vs.
//! queuing, and hands assistant-addressed messages to the bot dispatcher.

use crate::broadcast::{Broadcaster, OutgoingMessage, StatusUpdate};
use crate::error::RouterError;
use crate::message::{truncate_content, IncomingMessage, Message, MessageKind};
use crate::room::{ChatRoom, RoomStore};
use crate::status::{MessageStatus, Transition};
use crate::store::MessageStore;
use crate::user::{ChatUser, UserDirectory};
use async_trait::async_trait;
use clinic_relay_core::{MessageId, RoomId};
use clinic_relay_presence::PresenceRegistry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Default bound on persisted message content, in characters.
pub const DEFAULT_MAX_CONTENT_LEN: usize = 4096;

/// Seam to the bot dispatcher.
///
/// Implementations must not fail: every internal error is converted into
/// reply text before it crosses this boundary.
#[async_trait]
pub trait AssistantHandler: Send + Sync {
    /// Produces the assistant's reply for one user turn.
    async fn handle_turn(&self, user_text: &str, room: RoomId, sender_name: &str) -> String;
}

/// Router configuration.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Maximum persisted content length, in characters.
    pub max_content_len: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_content_len: DEFAULT_MAX_CONTENT_LEN,
        }
    }
}

/// Routes inbound messages through persistence, presence, and the
/// assistant seam.
pub struct MessageRouter {
    users: Arc<dyn UserDirectory>,
    rooms: Arc<dyn RoomStore>,
    messages: Arc<dyn MessageStore>,
    presence: Arc<PresenceRegistry>,
    broadcaster: Arc<dyn Broadcaster>,
    assistant: Arc<dyn AssistantHandler>,
    config: RouterConfig,
    // One mutex per room so concurrent inbound messages for the same room
    // cannot interleave conversation turns; unrelated rooms stay parallel.
    room_locks: Mutex<HashMap<RoomId, Arc<tokio::sync::Mutex<()>>>>,
}

impl MessageRouter {
    /// Creates a router.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserDirectory>,
        rooms: Arc<dyn RoomStore>,
        messages: Arc<dyn MessageStore>,
        presence: Arc<PresenceRegistry>,
        broadcaster: Arc<dyn Broadcaster>,
        assistant: Arc<dyn AssistantHandler>,
        config: RouterConfig,
    ) -> Self {
        Self {
            users,
            rooms,
            messages,
            presence,
            broadcaster,
            assistant,
            config,
            room_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Processes one inbound message.
    ///
    /// Preconditions are resolved before anything is persisted: an
    /// unresolvable room, sender, or receiver aborts the call with the
    /// matching `RouterError` and no side effects.
    ///
    /// Returns the original message as persisted, with its routed status.
    pub async fn process_incoming(
        &self,
        incoming: IncomingMessage,
    ) -> Result<Message, RouterError> {
        let room = self
            .rooms
            .get(incoming.room)
            .await
            .map_err(|_| RouterError::RoomNotFound {
                room: incoming.room,
            })?;
        let sender =
            self.users
                .find(incoming.sender)
                .await
                .map_err(|_| RouterError::SenderNotFound {
                    user: incoming.sender,
                })?;
        let receiver =
            self.users
                .find(incoming.receiver)
                .await
                .map_err(|_| RouterError::ReceiverNotFound {
                    user: incoming.receiver,
                })?;

        let room_lock = self.room_lock(room.id);
        let _turn_guard = room_lock.lock().await;

        let content = truncate_content(&incoming.content, self.config.max_content_len);
        let mut message = Message::new(room.id, sender.id, receiver.id, content, incoming.kind);
        self.messages.insert(message.clone()).await?;
        tracing::debug!(
            message = %message.id,
            room = %room.id,
            "inbound message persisted"
        );

        if receiver.is_assistant {
            self.dispatch_assistant(&message, &room, &sender, &receiver)
                .await?;
        }

        // Delivery of the original message is decided independently of
        // any assistant turn.
        if self.presence.is_online(receiver.id) {
            self.messages
                .apply_status(message.id, MessageStatus::Delivered)
                .await?;
            message.status = MessageStatus::Delivered;
            self.broadcaster
                .broadcast_message(&OutgoingMessage::from_parts(&message, &sender, &receiver));
        } else {
            self.messages
                .apply_status(message.id, MessageStatus::Pending)
                .await?;
            message.status = MessageStatus::Pending;
            tracing::debug!(
                message = %message.id,
                receiver = %receiver.id,
                "receiver offline, message queued pending"
            );
        }

        Ok(message)
    }

    /// Applies a transport-acknowledged status change to a message.
    ///
    /// Idempotent re-acknowledgments are accepted silently; regressions
    /// are rejected. Advances are persisted and broadcast.
    pub async fn update_status(
        &self,
        message_id: MessageId,
        requested: MessageStatus,
    ) -> Result<(), RouterError> {
        let message =
            self.messages
                .get(message_id)
                .await
                .map_err(|_| RouterError::MessageNotFound {
                    message: message_id,
                })?;

        let change = self.messages.apply_status(message_id, requested).await?;
        match change.transition {
            Transition::Advanced => {
                self.broadcaster.broadcast_status(&StatusUpdate {
                    room: message.room,
                    message: message_id,
                    status: requested,
                });
                Ok(())
            }
            Transition::NoOp => Ok(()),
            Transition::Rejected => Err(RouterError::InvalidTransition {
                message: message_id,
                from: change.status,
                to: requested,
            }),
        }
    }

    /// Runs the bot turn and routes the reply back to the original
    /// sender. The assistant is always online, so the reply is persisted
    /// directly as delivered and broadcast.
    async fn dispatch_assistant(
        &self,
        original: &Message,
        room: &ChatRoom,
        sender: &ChatUser,
        assistant: &ChatUser,
    ) -> Result<(), RouterError> {
        let reply_text = self
            .assistant
            .handle_turn(&original.content, room.id, &sender.display_name)
            .await;

        let mut reply = Message::new(
            room.id,
            assistant.id,
            sender.id,
            reply_text,
            MessageKind::Bot,
        );
        reply.status = MessageStatus::Delivered;
        self.messages.insert(reply.clone()).await?;
        self.broadcaster
            .broadcast_message(&OutgoingMessage::from_parts(&reply, assistant, sender));
        tracing::debug!(
            message = %reply.id,
            room = %room.id,
            "assistant reply routed"
        );
        Ok(())
    }

    fn room_lock(&self, room: RoomId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.room_locks.lock().expect("room lock table poisoned");
        Arc::clone(locks.entry(room).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::RecordingBroadcaster;
    use crate::room::InMemoryRoomStore;
    use crate::store::InMemoryMessageStore;
    use crate::user::InMemoryUserDirectory;

    /// Assistant stub that replies with a fixed string.
    struct FixedAssistant(&'static str);

    #[async_trait]
    impl AssistantHandler for FixedAssistant {
        async fn handle_turn(&self, _user_text: &str, _room: RoomId, _sender_name: &str) -> String {
            self.0.to_string()
        }
    }

    struct Fixture {
        users: Arc<InMemoryUserDirectory>,
        rooms: Arc<InMemoryRoomStore>,
        messages: Arc<InMemoryMessageStore>,
        presence: Arc<PresenceRegistry>,
        broadcaster: Arc<RecordingBroadcaster>,
        router: MessageRouter,
        alice: ChatUser,
        bob: ChatUser,
        assistant: ChatUser,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserDirectory::new());
        let rooms = Arc::new(InMemoryRoomStore::new());
        let messages = Arc::new(InMemoryMessageStore::new());
        let presence = Arc::new(PresenceRegistry::new());
        let broadcaster = Arc::new(RecordingBroadcaster::new());

        let alice = ChatUser::human("alice", "Alice");
        let bob = ChatUser::human("bob", "Bob");
        let assistant = ChatUser::assistant("DoctorAssistant", "Doctor Assistant");
        users.register(alice.clone());
        users.register(bob.clone());
        users.register(assistant.clone());

        let router = MessageRouter::new(
            Arc::clone(&users) as Arc<dyn UserDirectory>,
            Arc::clone(&rooms) as Arc<dyn RoomStore>,
            Arc::clone(&messages) as Arc<dyn MessageStore>,
            Arc::clone(&presence),
            Arc::clone(&broadcaster) as Arc<dyn Broadcaster>,
            Arc::new(FixedAssistant("How can I help?")),
            RouterConfig::default(),
        );

        Fixture {
            users,
            rooms,
            messages,
            presence,
            broadcaster,
            router,
            alice,
            bob,
            assistant,
        }
    }

    fn incoming(room: RoomId, from: &ChatUser, to: &ChatUser, content: &str) -> IncomingMessage {
        IncomingMessage {
            room,
            sender: from.id,
            receiver: to.id,
            content: content.to_string(),
            kind: MessageKind::Text,
        }
    }

    #[tokio::test]
    async fn online_receiver_gets_delivered_and_broadcast_once() {
        let fx = fixture();
        let room = fx
            .rooms
            .get_or_create(fx.alice.id, fx.bob.id)
            .await
            .expect("room");
        fx.presence.mark_online(fx.bob.id);

        let routed = fx
            .router
            .process_incoming(incoming(room.id, &fx.alice, &fx.bob, "hi bob"))
            .await
            .expect("route");

        assert_eq!(routed.status, MessageStatus::Delivered);
        let broadcasts = fx.broadcaster.messages();
        assert_eq!(broadcasts.len(), 1);
        assert_eq!(broadcasts[0].content, "hi bob");
        assert_eq!(broadcasts[0].to.username, "bob");

        let stored = fx.messages.get(routed.id).await.expect("stored");
        assert_eq!(stored.status, MessageStatus::Delivered);
    }

    #[tokio::test]
    async fn offline_receiver_leaves_message_pending_without_broadcast() {
        let fx = fixture();
        let room = fx
            .rooms
            .get_or_create(fx.alice.id, fx.bob.id)
            .await
            .expect("room");

        let routed = fx
            .router
            .process_incoming(incoming(room.id, &fx.alice, &fx.bob, "hi bob"))
            .await
            .expect("route");

        assert_eq!(routed.status, MessageStatus::Pending);
        assert!(fx.broadcaster.messages().is_empty());
    }

    #[tokio::test]
    async fn unknown_room_aborts_before_persistence() {
        let fx = fixture();

        let result = fx
            .router
            .process_incoming(incoming(RoomId::new(), &fx.alice, &fx.bob, "hi"))
            .await;

        assert!(matches!(result, Err(RouterError::RoomNotFound { .. })));
        assert!(fx.messages.is_empty());
    }

    #[tokio::test]
    async fn unknown_sender_and_receiver_abort_before_persistence() {
        let fx = fixture();
        let room = fx
            .rooms
            .get_or_create(fx.alice.id, fx.bob.id)
            .await
            .expect("room");

        let ghost = ChatUser::human("ghost", "Ghost");
        let result = fx
            .router
            .process_incoming(incoming(room.id, &ghost, &fx.bob, "boo"))
            .await;
        assert!(matches!(result, Err(RouterError::SenderNotFound { .. })));

        let result = fx
            .router
            .process_incoming(incoming(room.id, &fx.alice, &ghost, "boo"))
            .await;
        assert!(matches!(result, Err(RouterError::ReceiverNotFound { .. })));

        assert!(fx.messages.is_empty());
    }

    #[tokio::test]
    async fn content_is_truncated_to_configured_bound() {
        let users = Arc::new(InMemoryUserDirectory::new());
        let rooms = Arc::new(InMemoryRoomStore::new());
        let messages = Arc::new(InMemoryMessageStore::new());
        let alice = ChatUser::human("alice", "Alice");
        let bob = ChatUser::human("bob", "Bob");
        users.register(alice.clone());
        users.register(bob.clone());

        let router = MessageRouter::new(
            Arc::clone(&users) as Arc<dyn UserDirectory>,
            Arc::clone(&rooms) as Arc<dyn RoomStore>,
            Arc::clone(&messages) as Arc<dyn MessageStore>,
            Arc::new(PresenceRegistry::new()),
            Arc::new(RecordingBroadcaster::new()),
            Arc::new(FixedAssistant("")),
            RouterConfig {
                max_content_len: 8,
            },
        );

        let room = rooms.get_or_create(alice.id, bob.id).await.expect("room");
        let routed = router
            .process_incoming(incoming(room.id, &alice, &bob, "0123456789abcdef"))
            .await
            .expect("route");

        assert!(routed.content.starts_with("01234567"));
        assert!(routed.content.ends_with(crate::message::TRUNCATION_MARKER));
    }

    #[tokio::test]
    async fn assistant_receiver_yields_one_delivered_bot_reply() {
        let fx = fixture();
        let room = fx
            .rooms
            .get_or_create(fx.alice.id, fx.assistant.id)
            .await
            .expect("room");

        fx.router
            .process_incoming(incoming(room.id, &fx.alice, &fx.assistant, "hello bot"))
            .await
            .expect("route");

        // Exactly one broadcast: the bot reply. The original message sits
        // pending because the assistant identity has no presence entry.
        let broadcasts = fx.broadcaster.messages();
        assert_eq!(broadcasts.len(), 1);
        assert_eq!(broadcasts[0].content, "How can I help?");
        assert_eq!(broadcasts[0].kind, MessageKind::Bot);
        assert_eq!(broadcasts[0].status, MessageStatus::Delivered);
        assert_eq!(broadcasts[0].to.username, "alice");

        let history = fx
            .messages
            .find_recent(room.id, 10)
            .await
            .expect("history");
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].kind, MessageKind::Bot);
        assert_eq!(history[1].status, MessageStatus::Delivered);
    }

    #[tokio::test]
    async fn human_receiver_never_triggers_the_assistant() {
        let fx = fixture();
        let room = fx
            .rooms
            .get_or_create(fx.alice.id, fx.bob.id)
            .await
            .expect("room");
        fx.presence.mark_online(fx.bob.id);

        fx.router
            .process_incoming(incoming(room.id, &fx.alice, &fx.bob, "hi"))
            .await
            .expect("route");

        let history = fx.messages.find_recent(room.id, 10).await.expect("history");
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn status_ack_advances_and_broadcasts() {
        let fx = fixture();
        let room = fx
            .rooms
            .get_or_create(fx.alice.id, fx.bob.id)
            .await
            .expect("room");

        let routed = fx
            .router
            .process_incoming(incoming(room.id, &fx.alice, &fx.bob, "hi"))
            .await
            .expect("route");
        assert_eq!(routed.status, MessageStatus::Pending);

        fx.router
            .update_status(routed.id, MessageStatus::Delivered)
            .await
            .expect("ack");

        let statuses = fx.broadcaster.statuses();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].status, MessageStatus::Delivered);

        // Re-acknowledging is a silent no-op, no second broadcast.
        fx.router
            .update_status(routed.id, MessageStatus::Delivered)
            .await
            .expect("duplicate ack");
        assert_eq!(fx.broadcaster.statuses().len(), 1);
    }

    #[tokio::test]
    async fn status_regression_is_reported() {
        let fx = fixture();
        let room = fx
            .rooms
            .get_or_create(fx.alice.id, fx.bob.id)
            .await
            .expect("room");

        let routed = fx
            .router
            .process_incoming(incoming(room.id, &fx.alice, &fx.bob, "hi"))
            .await
            .expect("route");
        fx.router
            .update_status(routed.id, MessageStatus::Read)
            .await
            .expect("read ack");

        let result = fx
            .router
            .update_status(routed.id, MessageStatus::Pending)
            .await;
        assert!(matches!(
            result,
            Err(RouterError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn unknown_message_status_ack_is_reported() {
        let fx = fixture();
        let result = fx
            .router
            .update_status(MessageId::new(), MessageStatus::Read)
            .await;
        assert!(matches!(result, Err(RouterError::MessageNotFound { .. })));
    }

    #[tokio::test]
    async fn concurrent_messages_to_one_room_both_land() {
        let fx = fixture();
        let room = fx
            .rooms
            .get_or_create(fx.alice.id, fx.bob.id)
            .await
            .expect("room");
        let router = Arc::new(fx.router);

        let first = {
            let router = Arc::clone(&router);
            let msg = incoming(room.id, &fx.alice, &fx.bob, "one");
            tokio::spawn(async move { router.process_incoming(msg).await })
        };
        let second = {
            let router = Arc::clone(&router);
            let msg = incoming(room.id, &fx.bob, &fx.alice, "two");
            tokio::spawn(async move { router.process_incoming(msg).await })
        };

        first.await.expect("join").expect("route one");
        second.await.expect("join").expect("route two");

        let history = fx.messages.find_recent(room.id, 10).await.expect("history");
        assert_eq!(history.len(), 2);
    }
}
