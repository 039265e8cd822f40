//! The clinic's function-calling assistant.
//!
//! A [`CompletionProvider`] abstracts the language model behind an
//! OpenAI-compatible chat completion call. The [`BotDispatcher`] drives one
//! conversation turn: it offers the model a closed set of scheduling
//! functions, executes whichever one the model calls, and asks the model to
//! phrase the result for the user.

pub mod action;
pub mod dispatcher;
pub mod error;
pub mod prompt;
pub mod provider;

pub use action::AssistantAction;
pub use dispatcher::BotDispatcher;
pub use error::{ActionError, ProviderError};
pub use provider::{
    CompletionOutcome, CompletionProvider, CompletionRequest, FunctionCall, FunctionSpec,
    OpenAiProvider, ScriptedProvider, function_specs,
};
