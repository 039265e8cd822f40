//! Completion provider boundary.
//!
//! Providers speak the OpenAI-compatible chat completion protocol: a system
//! prompt, conversation history, the current user text, and an optional set
//! of callable functions. The outcome is either plain text or a request to
//! call one of the offered functions.

use crate::error::ProviderError;
use async_trait::async_trait;
use clinic_relay_conversation::{ConversationTurn, TurnRole};
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use std::collections::VecDeque;
use std::sync::Mutex;

const DEFAULT_TEMPERATURE: f32 = 0.7;

/// One callable function offered to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSpec {
    /// Wire name of the function.
    pub name: &'static str,
    /// What the function does, for the model.
    pub description: &'static str,
    /// JSON schema of the arguments object.
    pub parameters: JsonValue,
}

/// A function call issued by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the function to call.
    pub name: String,
    /// Arguments as raw JSON text, exactly as the model produced them.
    pub arguments: String,
}

/// A completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System prompt.
    pub system_prompt: String,
    /// Prior conversation turns, oldest first.
    pub history: Vec<ConversationTurn>,
    /// The current user text.
    pub user_text: String,
    /// Functions offered to the model. Empty means plain completion.
    pub functions: Vec<FunctionSpec>,
}

/// What the model produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// A plain text reply.
    Text(String),
    /// A request to call one of the offered functions.
    Call(FunctionCall),
}

/// Trait for completion providers.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Requests one completion.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionOutcome, ProviderError>;
}

/// The closed set of functions the assistant offers on every turn.
#[must_use]
pub fn function_specs() -> Vec<FunctionSpec> {
    vec![
        FunctionSpec {
            name: "search_doctors_by_specialty",
            description: "Search for doctors by their specialty or department",
            parameters: json!({
                "type": "object",
                "properties": {
                    "specialty": {
                        "type": "string",
                        "description": "The medical specialty (e.g., Cardiology, Dermatology, Orthopedics)"
                    }
                },
                "required": ["specialty"]
            }),
        },
        FunctionSpec {
            name: "check_doctor_availability",
            description: "Check if a doctor is available on a specific date and time",
            parameters: json!({
                "type": "object",
                "properties": {
                    "doctor_name": { "type": "string", "description": "Name of the doctor" },
                    "date": { "type": "string", "description": "Date in YYYY-MM-DD format" },
                    "time": { "type": "string", "description": "Time in HH:mm format (optional)" }
                },
                "required": ["doctor_name", "date"]
            }),
        },
        FunctionSpec {
            name: "book_appointment",
            description: "Book an appointment with a doctor",
            parameters: json!({
                "type": "object",
                "properties": {
                    "doctor_name": { "type": "string", "description": "Name of the doctor" },
                    "date": { "type": "string", "description": "Date in YYYY-MM-DD format" },
                    "time": { "type": "string", "description": "Time in HH:mm format" },
                    "patient_name": { "type": "string", "description": "Patient name (optional)" },
                    "patient_phone": { "type": "string", "description": "Patient phone (optional)" },
                    "patient_email": { "type": "string", "description": "Patient email (optional)" }
                },
                "required": ["doctor_name", "date", "time"]
            }),
        },
        FunctionSpec {
            name: "find_doctors_available_on_date",
            description: "Find all doctors who have available slots on a specific date",
            parameters: json!({
                "type": "object",
                "properties": {
                    "date": { "type": "string", "description": "Date in YYYY-MM-DD format" }
                },
                "required": ["date"]
            }),
        },
        FunctionSpec {
            name: "get_all_available_slots",
            description: "Get all available appointment slots across all doctors and dates",
            parameters: json!({ "type": "object", "properties": {} }),
        },
        FunctionSpec {
            name: "check_appointments_by_patient_name",
            description: "Check all appointments booked under a patient's name",
            parameters: json!({
                "type": "object",
                "properties": {
                    "patient_name": {
                        "type": "string",
                        "description": "Patient name to search for (optional, defaults to logged-in user)"
                    }
                }
            }),
        },
        FunctionSpec {
            name: "transfer_to_human_agent",
            description: "Transfer the chat to a human agent when the user requests it",
            parameters: json!({ "type": "object", "properties": {} }),
        },
    ]
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    functions: Option<&'a [FunctionSpec]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<&'a str>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct WireChoiceMessage {
    content: Option<String>,
    function_call: Option<FunctionCall>,
}

fn wire_message(turn: &ConversationTurn) -> WireMessage {
    match turn.role {
        TurnRole::User => WireMessage {
            role: "user",
            content: Some(turn.content.clone()),
            name: None,
            function_call: None,
        },
        TurnRole::Assistant => WireMessage {
            role: "assistant",
            content: if turn.issued_call.is_some() {
                None
            } else {
                Some(turn.content.clone())
            },
            name: None,
            function_call: turn.issued_call.as_ref().map(|call| FunctionCall {
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            }),
        },
        TurnRole::Function => WireMessage {
            role: "function",
            content: Some(turn.content.clone()),
            name: turn.function_name.clone(),
            function_call: None,
        },
    }
}

/// Provider speaking to an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl OpenAiProvider {
    /// Creates a provider for the given API base URL and model.
    #[must_use]
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let base = base_url.into();
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            endpoint: format!("{}/chat/completions", base.trim_end_matches('/')),
            model: model.into(),
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionOutcome, ProviderError> {
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        messages.push(WireMessage {
            role: "system",
            content: Some(request.system_prompt),
            name: None,
            function_call: None,
        });
        messages.extend(request.history.iter().map(wire_message));
        messages.push(WireMessage {
            role: "user",
            content: Some(request.user_text),
            name: None,
            function_call: None,
        });

        let offers_functions = !request.functions.is_empty();
        let body = WireRequest {
            model: &self.model,
            messages,
            functions: offers_functions.then_some(request.functions.as_slice()),
            function_call: offers_functions.then_some("auto"),
            temperature: DEFAULT_TEMPERATURE,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::RequestFailed {
                reason: format!("status {status}"),
            });
        }

        let parsed: WireResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::UnexpectedResponse {
                    reason: e.to_string(),
                })?;
        let Some(choice) = parsed.choices.into_iter().next() else {
            return Err(ProviderError::UnexpectedResponse {
                reason: "no choices".to_string(),
            });
        };

        if let Some(call) = choice.message.function_call {
            return Ok(CompletionOutcome::Call(call));
        }
        match choice.message.content {
            Some(content) => Ok(CompletionOutcome::Text(content)),
            None => Err(ProviderError::UnexpectedResponse {
                reason: "choice had neither content nor function_call".to_string(),
            }),
        }
    }
}

/// Deterministic provider for tests: replays a fixed script of outcomes and
/// records every request it saw.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<CompletionOutcome, ProviderError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    /// Creates a provider with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an outcome to the script.
    pub fn push(&self, outcome: CompletionOutcome) {
        self.script
            .lock()
            .expect("script lock poisoned")
            .push_back(Ok(outcome));
    }

    /// Appends a failure to the script.
    pub fn push_error(&self, error: ProviderError) {
        self.script
            .lock()
            .expect("script lock poisoned")
            .push_back(Err(error));
    }

    /// Returns the requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().expect("request lock poisoned").clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionOutcome, ProviderError> {
        self.requests
            .lock()
            .expect("request lock poisoned")
            .push(request);
        self.script
            .lock()
            .expect("script lock poisoned")
            .pop_front()
            .unwrap_or_else(|| {
                Err(ProviderError::UnexpectedResponse {
                    reason: "script exhausted".to_string(),
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_function_set_is_closed_and_complete() {
        let specs = function_specs();
        let names: Vec<&str> = specs.iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec![
                "search_doctors_by_specialty",
                "check_doctor_availability",
                "book_appointment",
                "find_doctors_available_on_date",
                "get_all_available_slots",
                "check_appointments_by_patient_name",
                "transfer_to_human_agent",
            ]
        );
    }

    #[test]
    fn booking_schema_requires_doctor_date_and_time() {
        let specs = function_specs();
        let booking = specs
            .iter()
            .find(|s| s.name == "book_appointment")
            .expect("book_appointment spec");
        assert_eq!(
            booking.parameters["required"],
            json!(["doctor_name", "date", "time"])
        );
    }

    #[test]
    fn assistant_call_turns_carry_the_call_not_content() {
        let turn = ConversationTurn::assistant_call("get_all_available_slots", "{}");
        let wire = wire_message(&turn);
        assert_eq!(wire.role, "assistant");
        assert!(wire.content.is_none());
        assert_eq!(
            wire.function_call.expect("call").name,
            "get_all_available_slots"
        );
    }

    #[test]
    fn function_turns_carry_their_name() {
        let turn = ConversationTurn::function("book_appointment", "booked");
        let wire = wire_message(&turn);
        assert_eq!(wire.role, "function");
        assert_eq!(wire.name.as_deref(), Some("book_appointment"));
        assert_eq!(wire.content.as_deref(), Some("booked"));
    }

    #[tokio::test]
    async fn scripted_provider_replays_in_order() {
        let provider = ScriptedProvider::new();
        provider.push(CompletionOutcome::Text("first".to_string()));
        provider.push(CompletionOutcome::Text("second".to_string()));

        let request = CompletionRequest {
            system_prompt: String::new(),
            history: Vec::new(),
            user_text: "hi".to_string(),
            functions: Vec::new(),
        };

        let first = provider.complete(request.clone()).await.expect("first");
        assert_eq!(first, CompletionOutcome::Text("first".to_string()));
        let second = provider.complete(request.clone()).await.expect("second");
        assert_eq!(second, CompletionOutcome::Text("second".to_string()));

        let exhausted = provider.complete(request).await;
        assert!(exhausted.is_err());
        assert_eq!(provider.requests().len(), 3);
    }
}
