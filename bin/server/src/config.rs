//! Centralized server configuration.
//!
//! Strongly-typed configuration loaded via the `config` crate from
//! environment variables, e.g. `PROVIDER__API_KEY` or
//! `CHAT__MAX_CONTENT_LEN`.

use serde::Deserialize;

/// Server configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Completion provider configuration.
    pub provider: ProviderConfig,

    /// Chat engine tunables.
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Completion provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// API key for the OpenAI-compatible endpoint.
    pub api_key: String,

    /// Base URL of the API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Per-call timeout, in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// Chat engine tunables.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Maximum persisted message content length, in characters.
    #[serde(default = "default_max_content_len")]
    pub max_content_len: usize,

    /// Conversation turns retained per room.
    #[serde(default = "default_history_max_turns")]
    pub history_max_turns: usize,

    /// Availability horizon embedded in the system prompt, in days.
    #[serde(default = "default_horizon_days")]
    pub availability_horizon_days: u32,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_content_len() -> usize {
    4096
}

fn default_history_max_turns() -> usize {
    50
}

fn default_horizon_days() -> u32 {
    30
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_content_len: default_max_content_len(),
            history_max_turns: default_history_max_turns(),
            availability_horizon_days: default_horizon_days(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_config_has_correct_defaults() {
        let config = ChatConfig::default();
        assert_eq!(config.max_content_len, 4096);
        assert_eq!(config.history_max_turns, 50);
        assert_eq!(config.availability_horizon_days, 30);
    }
}
