//! Clinic Relay server.
//!
//! Wires the delivery engine, the scheduling domain, and the assistant
//! together, seeds the clinic, and runs until interrupted. A transport
//! layer embeds the engine through [`Engine::router`] and the broadcast
//! subscriptions on [`Engine::broadcaster`].

mod config;
mod seed;

use async_trait::async_trait;
use clinic_relay_assistant::{BotDispatcher, OpenAiProvider};
use clinic_relay_conversation::ConversationStore;
use clinic_relay_delivery::{
    Broadcaster, ChannelBroadcaster, ChatUser, InMemoryMessageStore, InMemoryRoomStore,
    InMemoryUserDirectory, MessageRouter, RouterConfig, UserDirectory,
};
use clinic_relay_presence::PresenceRegistry;
use clinic_relay_scheduling::{
    AccountLookup, AccountRef, AgentStore, AppointmentStore, DoctorStore, InMemoryAgentStore,
    InMemoryAppointmentStore, InMemoryDoctorStore, InMemorySlotStore, SchedulingService, SlotStore,
};
use config::ServerConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// The wired chat engine, held together for the lifetime of the process.
struct Engine {
    router: Arc<MessageRouter>,
    broadcaster: Arc<ChannelBroadcaster>,
    presence: Arc<PresenceRegistry>,
}

impl Engine {
    /// Logs engine events until the corresponding channels close.
    fn spawn_event_loggers(&self) {
        let mut messages = self.broadcaster.subscribe_messages();
        tokio::spawn(async move {
            while let Ok(outgoing) = messages.recv().await {
                tracing::info!(
                    room = %outgoing.room,
                    message = %outgoing.message,
                    status = %outgoing.status,
                    "message broadcast"
                );
            }
        });

        let mut statuses = self.broadcaster.subscribe_statuses();
        tokio::spawn(async move {
            while let Ok(update) = statuses.recv().await {
                tracing::info!(
                    room = %update.room,
                    message = %update.message,
                    status = %update.status,
                    "status broadcast"
                );
            }
        });

        let mut presence = self.presence.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = presence.recv().await {
                tracing::info!(user = %event.user, online = event.online, "presence change");
            }
        });
    }
}

/// Adapts the user directory to the scheduling account lookup, so bookings
/// under a registered username link to that account.
struct DirectoryAccounts {
    users: Arc<InMemoryUserDirectory>,
}

#[async_trait]
impl AccountLookup for DirectoryAccounts {
    async fn find_account(&self, username: &str) -> Option<AccountRef> {
        self.users
            .find_by_username(username)
            .await
            .ok()
            .map(|user| AccountRef {
                id: user.id,
                username: user.username,
            })
    }
}

async fn build_engine(config: &ServerConfig) -> Engine {
    let users = Arc::new(InMemoryUserDirectory::new());
    let rooms = Arc::new(InMemoryRoomStore::new());
    let messages = Arc::new(InMemoryMessageStore::new());
    let presence = Arc::new(PresenceRegistry::new());
    let broadcaster = Arc::new(ChannelBroadcaster::new());

    let assistant_user = ChatUser::assistant("DoctorAssistant", "Doctor Assistant");
    tracing::info!(user = %assistant_user.id, "registered assistant identity");
    users.register(assistant_user);

    let doctors = Arc::new(InMemoryDoctorStore::new());
    let slots = Arc::new(InMemorySlotStore::new());
    let appointments = Arc::new(InMemoryAppointmentStore::new());
    let agents = Arc::new(InMemoryAgentStore::new());

    seed::seed_doctors(doctors.as_ref(), slots.as_ref())
        .await
        .expect("failed to seed doctors");
    seed::seed_agents(agents.as_ref())
        .await
        .expect("failed to seed agents");

    let scheduling = Arc::new(SchedulingService::new(
        Arc::clone(&doctors) as Arc<dyn DoctorStore>,
        Arc::clone(&slots) as Arc<dyn SlotStore>,
        Arc::clone(&appointments) as Arc<dyn AppointmentStore>,
        Arc::clone(&agents) as Arc<dyn AgentStore>,
        Arc::new(DirectoryAccounts {
            users: Arc::clone(&users),
        }),
    ));

    let history = Arc::new(ConversationStore::with_max_turns(
        config.chat.history_max_turns,
    ));
    let provider = Arc::new(OpenAiProvider::new(
        &config.provider.api_key,
        &config.provider.base_url,
        &config.provider.model,
    ));
    let dispatcher = Arc::new(
        BotDispatcher::new(provider, scheduling, history)
            .with_provider_timeout(Duration::from_secs(config.provider.timeout_seconds))
            .with_horizon_days(config.chat.availability_horizon_days),
    );

    let router = Arc::new(MessageRouter::new(
        Arc::clone(&users) as Arc<dyn UserDirectory>,
        rooms,
        messages,
        Arc::clone(&presence),
        Arc::clone(&broadcaster) as Arc<dyn Broadcaster>,
        dispatcher,
        RouterConfig {
            max_content_len: config.chat.max_content_len,
        },
    ));

    Engine {
        router,
        broadcaster,
        presence,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!(
        model = %config.provider.model,
        horizon_days = config.chat.availability_horizon_days,
        "loaded configuration"
    );

    let engine = build_engine(&config).await;
    engine.spawn_event_loggers();
    tracing::info!("clinic relay engine ready");

    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for shutdown signal");
    tracing::info!("shutting down");
    drop(engine.router);
}
