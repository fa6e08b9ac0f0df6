use super::error::ConfigError;
use crate::constants::{
    DEFAULT_API_KEY_ENV, DEFAULT_CHAT_PATH, DEFAULT_HANDSHAKE_TIMEOUT_SECS, DEFAULT_HISTORY_LIMIT,
    DEFAULT_MAX_RETRIES, DEFAULT_MAX_STEPS, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
    DEFAULT_MODEL_ENDPOINT, DEFAULT_MODEL_TIMEOUT_SECS, DEFAULT_PROVIDER_ID, DEFAULT_QUIT_WORDS,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SHUTDOWN_GRACE_MS,
};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Application configuration loaded from toolrelay.toml and the environment
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub session: SessionConfig,
    pub agent: AgentConfig,
    pub interactive: InteractiveConfig,
}

impl AppConfig {
    /// Load configuration from a file path (or default path if None)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        super::loader::load_config(path)
    }
}

/// Language-model backend settings
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub provider: String,
    pub endpoint: String,
    pub api_path: String,
    pub api_key_env: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_retries: u32,
    pub timeout: Duration,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER_ID.to_string(),
            endpoint: DEFAULT_MODEL_ENDPOINT.to_string(),
            api_path: DEFAULT_CHAT_PATH.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: DEFAULT_MAX_TOKENS,
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS),
        }
    }
}

impl ModelConfig {
    /// Reads the API key from the configured environment variable.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        env::var(&self.api_key_env)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey {
                env_var: self.api_key_env.clone(),
            })
    }
}

/// Child-process session timing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub handshake_timeout: Duration,
    pub request_timeout: Duration,
    pub shutdown_grace: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(DEFAULT_HANDSHAKE_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            shutdown_grace: Duration::from_millis(DEFAULT_SHUTDOWN_GRACE_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub max_steps: usize,
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            system_prompt: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractiveConfig {
    pub history_limit: usize,
    pub quit_words: Vec<String>,
}

impl Default for InteractiveConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            quit_words: DEFAULT_QUIT_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}
