//! The bot dispatcher.
//!
//! Drives one conversation turn end to end. The dispatcher never returns
//! an error to the router: provider failures, timeouts, and uninterpretable
//! calls all collapse into apologetic reply text, and the failure is logged.

use crate::action::AssistantAction;
use crate::error::ActionError;
use crate::prompt;
use crate::provider::{CompletionOutcome, CompletionProvider, CompletionRequest, function_specs};
use async_trait::async_trait;
use chrono::Utc;
use clinic_relay_conversation::{ConversationStore, ConversationTurn};
use clinic_relay_core::RoomId;
use clinic_relay_delivery::AssistantHandler;
use clinic_relay_scheduling::{BookingRequest, SchedulingService};
use std::sync::Arc;
use std::time::Duration;

/// Default bound on each provider call.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Default availability horizon embedded in the system prompt, in days.
pub const DEFAULT_HORIZON_DAYS: u32 = 30;

const TURN_APOLOGY: &str = "I apologize, but I encountered an error. Please try again.";
const CALL_APOLOGY: &str = "I encountered an error processing your request. Please try again.";
const UNKNOWN_FUNCTION_REPLY: &str =
    "I'm not sure how to handle that request. Could you please rephrase?";

/// Executes assistant turns against the scheduling domain.
pub struct BotDispatcher {
    provider: Arc<dyn CompletionProvider>,
    scheduling: Arc<SchedulingService>,
    history: Arc<ConversationStore>,
    provider_timeout: Duration,
    horizon_days: u32,
}

impl BotDispatcher {
    /// Creates a dispatcher with default timeout and horizon.
    #[must_use]
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        scheduling: Arc<SchedulingService>,
        history: Arc<ConversationStore>,
    ) -> Self {
        Self {
            provider,
            scheduling,
            history,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            horizon_days: DEFAULT_HORIZON_DAYS,
        }
    }

    /// Sets the per-call provider timeout.
    #[must_use]
    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// Sets the availability horizon embedded in the system prompt.
    #[must_use]
    pub fn with_horizon_days(mut self, horizon_days: u32) -> Self {
        self.horizon_days = horizon_days;
        self
    }

    /// Runs one turn and returns the assistant's reply.
    pub async fn run_turn(&self, user_text: &str, room: RoomId, sender_name: &str) -> String {
        let prior = self.history.history(room);
        self.history.append(room, ConversationTurn::user(user_text));

        let system_prompt = self.build_system_prompt().await;

        let first = self
            .complete(CompletionRequest {
                system_prompt: system_prompt.clone(),
                history: prior,
                user_text: user_text.to_string(),
                functions: function_specs(),
            })
            .await;

        let call = match first {
            Ok(CompletionOutcome::Text(reply)) => {
                self.history.append(room, ConversationTurn::assistant(&reply));
                return reply;
            }
            Ok(CompletionOutcome::Call(call)) => call,
            Err(error) => {
                tracing::error!(%error, room = %room, "completion failed");
                return TURN_APOLOGY.to_string();
            }
        };

        tracing::debug!(room = %room, function = %call.name, "assistant issued a call");
        let action = match AssistantAction::parse(&call) {
            Ok(action) => action,
            Err(ActionError::UnknownFunction { name }) => {
                tracing::warn!(room = %room, function = %name, "unknown function call");
                self.history
                    .append(room, ConversationTurn::assistant(UNKNOWN_FUNCTION_REPLY));
                return UNKNOWN_FUNCTION_REPLY.to_string();
            }
            Err(error @ ActionError::InvalidArguments { .. }) => {
                tracing::warn!(%error, room = %room, "uninterpretable function call");
                self.history
                    .append(room, ConversationTurn::assistant(CALL_APOLOGY));
                return CALL_APOLOGY.to_string();
            }
        };

        let result = self.execute(action, room, sender_name).await;

        self.history
            .append(room, ConversationTurn::assistant_call(&call.name, &call.arguments));
        self.history
            .append(room, ConversationTurn::function(&call.name, &result));

        let follow_up = format!(
            "Function result: {result}\nPlease respond naturally to the user based on this result."
        );
        let second = self
            .complete(CompletionRequest {
                system_prompt,
                history: self.history.history(room),
                user_text: follow_up,
                functions: Vec::new(),
            })
            .await;

        match second {
            Ok(CompletionOutcome::Text(reply)) => {
                self.history.append(room, ConversationTurn::assistant(&reply));
                reply
            }
            Ok(CompletionOutcome::Call(call)) => {
                // The follow-up offers no functions; a call here is protocol
                // breakage on the provider side.
                tracing::error!(room = %room, function = %call.name, "unsolicited function call");
                TURN_APOLOGY.to_string()
            }
            Err(error) => {
                tracing::error!(%error, room = %room, "follow-up completion failed");
                TURN_APOLOGY.to_string()
            }
        }
    }

    /// Returns true if the text asks for a human agent.
    #[must_use]
    pub fn detect_handover(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        lower.contains("human")
            || lower.contains("agent")
            || lower.contains("speak to someone")
            || lower.contains("talk to a person")
    }

    /// Drops a room's conversation history.
    pub fn clear_history(&self, room: RoomId) {
        self.history.clear(room);
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionOutcome, crate::error::ProviderError> {
        match tokio::time::timeout(self.provider_timeout, self.provider.complete(request)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(crate::error::ProviderError::RequestFailed {
                reason: format!("timed out after {:?}", self.provider_timeout),
            }),
        }
    }

    async fn build_system_prompt(&self) -> String {
        let availability = self.scheduling.list_all_slots(self.horizon_days).await;
        let doctor_names = self.scheduling.doctor_names().await;
        prompt::system_prompt(Utc::now().date_naive(), &availability, &doctor_names)
    }

    async fn execute(&self, action: AssistantAction, room: RoomId, sender_name: &str) -> String {
        match action {
            AssistantAction::SearchDoctorsBySpecialty { specialty } => {
                self.scheduling.search_by_specialty(&specialty).await
            }
            AssistantAction::CheckDoctorAvailability {
                doctor_name,
                date,
                time,
            } => {
                self.scheduling
                    .check_availability(&doctor_name, date, time)
                    .await
            }
            AssistantAction::BookAppointment {
                doctor_name,
                date,
                time,
                patient_name,
                patient_phone,
                patient_email,
            } => {
                self.scheduling
                    .book(BookingRequest {
                        doctor_name,
                        date,
                        time,
                        patient_name: patient_name.unwrap_or_else(|| sender_name.to_string()),
                        patient_phone,
                        patient_email,
                        room,
                    })
                    .await
            }
            AssistantAction::FindDoctorsAvailableOnDate { date } => {
                self.scheduling.find_available_on_date(date).await
            }
            AssistantAction::GetAllAvailableSlots => {
                self.scheduling.list_all_slots(self.horizon_days).await
            }
            AssistantAction::CheckAppointmentsByPatientName { patient_name } => {
                let name = patient_name.unwrap_or_else(|| sender_name.to_string());
                self.scheduling.appointments_for(&name).await
            }
            AssistantAction::TransferToHumanAgent => self.scheduling.request_handover(room).await,
        }
    }
}

#[async_trait]
impl AssistantHandler for BotDispatcher {
    async fn handle_turn(&self, user_text: &str, room: RoomId, sender_name: &str) -> String {
        self.run_turn(user_text, room, sender_name).await
    }
}
