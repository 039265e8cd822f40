//! Error types for the assistant crate.
//!
//! Provider and action errors never reach the router; the dispatcher
//! converts them into reply text at the boundary.

use std::fmt;

/// Errors from the completion provider.
#[derive(Debug)]
pub enum ProviderError {
    /// The HTTP request failed.
    RequestFailed {
        /// Failure description.
        reason: String,
    },
    /// The provider answered with something we cannot interpret.
    UnexpectedResponse {
        /// What was wrong with the response.
        reason: String,
    },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { reason } => write!(f, "completion request failed: {reason}"),
            Self::UnexpectedResponse { reason } => {
                write!(f, "unexpected completion response: {reason}")
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// Errors from interpreting an issued function call.
#[derive(Debug)]
pub enum ActionError {
    /// The model called a function outside the offered set.
    UnknownFunction {
        /// The name the model used.
        name: String,
    },
    /// The arguments were missing or malformed.
    InvalidArguments {
        /// The function whose arguments failed to parse.
        function: String,
        /// What was wrong.
        reason: String,
    },
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFunction { name } => write!(f, "unknown function: {name}"),
            Self::InvalidArguments { function, reason } => {
                write!(f, "invalid arguments for {function}: {reason}")
            }
        }
    }
}

impl std::error::Error for ActionError {}
