//! OpenAI-compatible client implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::base::HttpClientBase;
use crate::config::ModelConfig;
use crate::domain::types::ChatMessage;
use crate::model::traits::ModelProvider;
use crate::model::types::{ModelError, ModelRequest, ModelResponse};

const RETRY_BACKOFF_STEP: Duration = Duration::from_millis(500);

/// OpenAI-compatible client (works with Groq, OpenAI, Mistral, etc.)
#[derive(Clone)]
pub struct OpenAIClient {
    base: HttpClientBase,
    api_path: String,
    max_retries: u32,
}

impl OpenAIClient {
    pub fn from_config(config: &ModelConfig, api_key: String) -> Result<Self, ModelError> {
        Ok(Self {
            base: HttpClientBase::new(
                config.provider.clone(),
                config.endpoint.clone(),
                Some(api_key),
                config.timeout,
            )?,
            api_path: config.api_path.clone(),
            max_retries: config.max_retries,
        })
    }

    async fn send_once(&self, url: &str, payload: &OpenAIRequest<'_>) -> Result<String, ModelError> {
        let response: OpenAIResponse = self.base.post_with_bearer(url, payload).await?;
        debug!(provider = %self.base.id, "Received response from OpenAI-compatible provider");

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| ModelError::invalid_response(&self.base.id, "missing content"))
    }
}

#[async_trait]
impl ModelProvider for OpenAIClient {
    fn id(&self) -> &str {
        &self.base.id
    }

    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let url = self.base.build_url(&self.api_path);

        let payload = OpenAIRequest {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: false,
        };

        info!(
            provider = self.base.id.as_str(),
            model = request.model.as_str(),
            messages = request.messages.len(),
            "Sending request to OpenAI-compatible provider"
        );

        let mut attempt = 0u32;
        loop {
            match self.send_once(&url, &payload).await {
                Ok(content) => return Ok(ModelResponse::new(content)),
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = RETRY_BACKOFF_STEP * attempt;
                    warn!(
                        provider = %self.base.id,
                        attempt,
                        max_retries = self.max_retries,
                        error = %err,
                        "Transient model failure, retrying in {delay:?}"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: Option<OpenAIMessage>,
}

#[derive(Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}
