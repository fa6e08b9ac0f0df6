//! Model types - Request, Response, and Error types

use crate::domain::types::{ChatMessage, MessageRole};
use std::time::Duration;
use thiserror::Error;

/// Chat completion request
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Model response from LLM
#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub message: ChatMessage,
    pub finish_reason: Option<String>,
}

impl ModelResponse {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            message: ChatMessage::new(MessageRole::Assistant, content),
            finish_reason: None,
        }
    }

    pub fn content(&self) -> &str {
        &self.message.content
    }
}

/// Model errors
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("provider '{provider}' requires an API key")]
    MissingApiKey { provider: String },
    #[error("network error calling provider '{provider}': {source}")]
    Network {
        provider: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("provider '{provider}' answered HTTP {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },
    #[error("provider '{provider}' rate limit exceeded (HTTP {status}): {message}")]
    RateLimited {
        provider: String,
        status: u16,
        code: Option<String>,
        retry_after: Option<Duration>,
        message: String,
    },
    #[error("provider '{provider}' returned invalid response: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

impl ModelError {
    pub fn missing_api_key(provider: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
        }
    }

    pub fn network(provider: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            provider: provider.into(),
            source,
        }
    }

    pub fn invalid_response(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ModelError::RateLimited { .. })
    }

    /// Failures worth retrying after a short pause.
    pub fn is_transient(&self) -> bool {
        match self {
            ModelError::Network { source, .. } => {
                source.is_connect() || source.is_timeout() || source.is_request()
            }
            ModelError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// User-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            ModelError::MissingApiKey { provider } => {
                format!("Provider '{provider}' requires an API key.")
            }
            ModelError::Network { provider, source } => {
                if source.is_connect() {
                    format!("Could not connect to model provider '{provider}'.")
                } else if source.is_timeout() {
                    format!("The request to '{provider}' timed out.")
                } else {
                    format!("Network error while talking to '{provider}'.")
                }
            }
            ModelError::Status {
                provider, status, ..
            } => match *status {
                404 => format!("Endpoint of '{provider}' was not found."),
                401 | 403 => format!("Provider '{provider}' rejected the API key."),
                502 | 503 => format!("Provider '{provider}' is temporarily unavailable."),
                other => format!("Request to '{provider}' failed: HTTP {other}"),
            },
            ModelError::RateLimited {
                provider,
                retry_after,
                ..
            } => match retry_after {
                Some(wait) => format!(
                    "Provider '{provider}' is rate limiting requests; retry in {}s.",
                    wait.as_secs().max(1)
                ),
                None => format!("Provider '{provider}' is rate limiting requests."),
            },
            ModelError::InvalidResponse { provider, .. } => {
                format!("The response from '{provider}' was not valid.")
            }
        }
    }
}
