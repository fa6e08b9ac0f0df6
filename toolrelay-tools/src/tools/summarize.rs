use super::{Tool, ToolFailure, required_str};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use toolrelay_core::config::ModelConfig;
use toolrelay_core::model::{ModelProvider, ModelRequest};
use toolrelay_core::types::ChatMessage;
use tracing::debug;

const SYSTEM_PROMPT: &str = "You are a concise summarizer. Keep the key facts and drop the rest.";

/// Summarizes text through the configured chat-completions backend.
pub struct SummarizeTool {
    provider: Box<dyn ModelProvider>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl SummarizeTool {
    pub fn new(provider: impl ModelProvider + 'static, config: &ModelConfig) -> Self {
        Self {
            provider: Box::new(provider),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

#[async_trait]
impl Tool for SummarizeTool {
    fn name(&self) -> &'static str {
        "summarize_text"
    }

    fn description(&self) -> &'static str {
        "Summarize a piece of text"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"text": {"type": "string"}},
            "required": ["text"]
        })
    }

    async fn call(&self, args: &Map<String, Value>) -> Result<String, ToolFailure> {
        let text = required_str(args, "text")?;
        if text.trim().is_empty() {
            return Err(ToolFailure::InvalidParams("'text' must not be empty".into()));
        }
        debug!(provider = self.provider.id(), chars = text.len(), "Summarizing text");

        let response = self
            .provider
            .chat(ModelRequest {
                model: self.model.clone(),
                messages: vec![
                    ChatMessage::system(SYSTEM_PROMPT),
                    ChatMessage::user(format!("Summarize the following text:\n\n{text}")),
                ],
                max_tokens: self.max_tokens,
                temperature: self.temperature,
            })
            .await
            .map_err(|err| ToolFailure::Failed(err.user_message()))?;
        Ok(response.content().trim().to_string())
    }
}
