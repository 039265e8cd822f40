//! Turn types for conversation histories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// User/human utterance.
    User,
    /// Assistant reply or assistant-issued function call.
    Assistant,
    /// Textual result of an executed function.
    Function,
}

/// A function call issued by the assistant, as recorded in history.
///
/// Arguments are kept as the raw JSON text the provider produced, so the
/// history replayed to the provider matches what it originally emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedCall {
    /// The function name.
    pub name: String,
    /// The raw JSON arguments text.
    pub arguments: String,
}

/// One role-tagged utterance in a room's conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Turn role.
    pub role: TurnRole,
    /// Turn text. Empty for assistant turns that only issue a call.
    pub content: String,
    /// Function name, set on function-result turns.
    pub function_name: Option<String>,
    /// The call an assistant turn issued, if any.
    pub issued_call: Option<IssuedCall>,
    /// When the turn arrived.
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            function_name: None,
            issued_call: None,
            timestamp: Utc::now(),
        }
    }

    /// Creates a user turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    /// Creates an assistant text turn.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }

    /// Creates an assistant turn that issued a function call.
    #[must_use]
    pub fn assistant_call(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        let mut turn = Self::new(TurnRole::Assistant, "");
        turn.issued_call = Some(IssuedCall {
            name: name.into(),
            arguments: arguments.into(),
        });
        turn
    }

    /// Creates a function-result turn.
    #[must_use]
    pub fn function(name: impl Into<String>, result: impl Into<String>) -> Self {
        let mut turn = Self::new(TurnRole::Function, result);
        turn.function_name = Some(name.into());
        turn
    }

    /// Returns true if this turn issued a function call.
    #[must_use]
    pub fn is_call(&self) -> bool {
        self.issued_call.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_turn() {
        let turn = ConversationTurn::user("Hello!");
        assert_eq!(turn.role, TurnRole::User);
        assert_eq!(turn.content, "Hello!");
        assert!(!turn.is_call());
    }

    #[test]
    fn assistant_call_turn() {
        let turn = ConversationTurn::assistant_call("book_appointment", r#"{"date":"2026-09-01"}"#);
        assert_eq!(turn.role, TurnRole::Assistant);
        assert!(turn.content.is_empty());
        assert!(turn.is_call());
        assert_eq!(
            turn.issued_call.as_ref().map(|c| c.name.as_str()),
            Some("book_appointment")
        );
    }

    #[test]
    fn function_turn_carries_name() {
        let turn = ConversationTurn::function("check_doctor_availability", "10:00 - 12:00");
        assert_eq!(turn.role, TurnRole::Function);
        assert_eq!(
            turn.function_name.as_deref(),
            Some("check_doctor_availability")
        );
        assert_eq!(turn.content, "10:00 - 12:00");
    }

    #[test]
    fn turn_serde_roundtrip() {
        let turn = ConversationTurn::assistant("Here you go.");
        let json = serde_json::to_string(&turn).expect("serialize");
        let parsed: ConversationTurn = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.role, TurnRole::Assistant);
        assert_eq!(parsed.content, "Here you go.");
    }
}
