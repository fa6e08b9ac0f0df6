use super::directive::{AgentDirective, parse_directive};
use super::errors::AgentError;
use super::instructions::{CORRECTION_MESSAGE, compose_system_instructions, tool_result_message};
use super::models::{AgentResponse, AgentStatus, MessageEntry, ToolCallEntry};
use crate::config::{AgentConfig, ModelConfig};
use crate::domain::types::{ChatMessage, Query};
use crate::model::{ModelProvider, ModelRequest};
use crate::tooling::ToolInvoker;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Maximum correction round-trips for a malformed directive
const MAX_JSON_RETRIES: u8 = 3;

/// Produces an answer to a query, calling tools through the invoker as needed.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Model name reported in user-facing advisories.
    fn model_name(&self) -> &str;

    async fn run(
        &self,
        query: &Query,
        tools: &mut ToolInvoker<'_>,
        history: &[ChatMessage],
    ) -> Result<AgentResponse, AgentError>;
}

/// Agent that asks the model for JSON `call_tool` / `final` directives.
pub struct DirectiveAgent<P: ModelProvider> {
    provider: P,
    model: String,
    max_tokens: u32,
    temperature: f32,
    max_steps: usize,
    system_prompt: Option<String>,
}

impl<P: ModelProvider> DirectiveAgent<P> {
    pub fn new(provider: P, model: &ModelConfig, agent: &AgentConfig) -> Self {
        Self {
            provider,
            model: model.model.clone(),
            max_tokens: model.max_tokens,
            temperature: model.temperature,
            max_steps: agent.max_steps,
            system_prompt: agent.system_prompt.clone(),
        }
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AgentError> {
        debug!(
            provider = self.provider.id(),
            messages = messages.len(),
            "Submitting agent turn to model provider"
        );
        let response = self
            .provider
            .chat(ModelRequest {
                model: self.model.clone(),
                messages: messages.to_vec(),
                max_tokens: self.max_tokens,
                temperature: self.temperature,
            })
            .await?;
        Ok(response.message.content)
    }

    /// Parses the reply, asking the model to correct malformed directives.
    async fn parse_with_retry(
        &self,
        messages: &mut Vec<ChatMessage>,
        content: String,
    ) -> Result<(AgentDirective, String), AgentError> {
        let mut retry_count = 0u8;
        let mut current = content;

        loop {
            match parse_directive(&current) {
                Ok(directive) => return Ok((directive, current)),
                Err(reason) if retry_count < MAX_JSON_RETRIES => {
                    retry_count += 1;
                    warn!(
                        attempt = retry_count,
                        max_attempts = MAX_JSON_RETRIES,
                        error = %reason,
                        "Directive parse failed, requesting correction from model"
                    );
                    messages.push(ChatMessage::assistant(current));
                    messages.push(ChatMessage::user(format!(
                        "{CORRECTION_MESSAGE}\n\nError details: {reason}"
                    )));
                    current = self.complete(messages).await?;
                }
                Err(reason) => {
                    warn!(error = %reason, "Model never produced a valid directive");
                    return Err(AgentError::InvalidResponse(reason));
                }
            }
        }
    }
}

#[async_trait]
impl<P: ModelProvider> Agent for DirectiveAgent<P> {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn run(
        &self,
        query: &Query,
        tools: &mut ToolInvoker<'_>,
        history: &[ChatMessage],
    ) -> Result<AgentResponse, AgentError> {
        info!(origin = ?query.origin, "Agent run started");

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(compose_system_instructions(
            tools.registry(),
            self.system_prompt.as_deref(),
        )));
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(query.text.clone()));

        let mut transcript = vec![MessageEntry::Human(query.text.clone())];

        for step in 0..self.max_steps {
            let reply = self.complete(&messages).await?;
            let (directive, raw) = self.parse_with_retry(&mut messages, reply).await?;

            match directive {
                AgentDirective::Final { response } => {
                    info!(steps = step, "Agent returned final response");
                    transcript.push(MessageEntry::Ai {
                        content: response,
                        tool_calls: Vec::new(),
                    });
                    return Ok(AgentResponse {
                        messages: transcript,
                        status: AgentStatus::Completed,
                    });
                }
                AgentDirective::CallTool { tool, input } => {
                    info!(tool = %tool, step, "Agent requested tool execution");
                    transcript.push(MessageEntry::Ai {
                        content: String::new(),
                        tool_calls: vec![ToolCallEntry {
                            name: tool.clone(),
                            arguments: input.clone(),
                        }],
                    });
                    messages.push(ChatMessage::assistant(raw));

                    let (output, success) = match tools.call(&tool, input.clone()).await {
                        Ok(result) => (result.to_value(), true),
                        Err(err) if err.is_recoverable() => {
                            debug!(tool = %tool, error = %err, "Tool failure returned to the model");
                            (Value::String(err.to_string()), false)
                        }
                        Err(err) => return Err(err.into()),
                    };

                    transcript.push(MessageEntry::Tool {
                        tool: tool.clone(),
                        content: output.clone(),
                        is_error: !success,
                    });
                    messages.push(ChatMessage::user(tool_result_message(
                        &tool, &input, &output, success,
                    )));
                }
            }
        }

        warn!(max_steps = self.max_steps, "Agent exceeded max tool interactions");
        transcript.push(MessageEntry::System(format!(
            "Stopped after {} tool steps without a final answer.",
            self.max_steps
        )));
        Ok(AgentResponse {
            messages: transcript,
            status: AgentStatus::StepLimitReached,
        })
    }
}
