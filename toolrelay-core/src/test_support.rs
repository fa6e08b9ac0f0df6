//! Test doubles for the channel and model seams.

use crate::domain::types::ChatMessage;
use crate::model::{ModelError, ModelProvider, ModelRequest, ModelResponse};
use crate::session::{SessionError, SessionState, ToolChannel};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Channel double that replays canned replies and records every request.
pub(crate) struct ScriptedChannel {
    state: SessionState,
    replies: VecDeque<Result<Value, SessionError>>,
    requests: Vec<(String, Value)>,
}

impl ScriptedChannel {
    pub(crate) fn new(state: SessionState, replies: Vec<Result<Value, SessionError>>) -> Self {
        Self {
            state,
            replies: replies.into(),
            requests: Vec::new(),
        }
    }

    pub(crate) fn ready(replies: Vec<Result<Value, SessionError>>) -> Self {
        Self::new(SessionState::Ready, replies)
    }

    pub(crate) fn requests(&self) -> &[(String, Value)] {
        &self.requests
    }
}

#[async_trait]
impl ToolChannel for ScriptedChannel {
    fn server_name(&self) -> &str {
        "scripted"
    }

    fn state(&self) -> SessionState {
        self.state
    }

    async fn request(&mut self, method: &str, params: Value) -> Result<Value, SessionError> {
        self.requests.push((method.to_string(), params));
        self.replies.pop_front().unwrap_or_else(|| {
            Err(SessionError::Transport {
                server: "scripted".into(),
                reason: "no scripted reply left".into(),
            })
        })
    }
}

/// Model double that replays scripted replies and records every request.
#[derive(Clone)]
pub(crate) struct ScriptedProvider {
    responses: Arc<Mutex<VecDeque<Result<String, ModelError>>>>,
    recordings: Arc<Mutex<Vec<ModelRequest>>>,
}

impl ScriptedProvider {
    pub(crate) fn new(responses: Vec<&str>) -> Self {
        Self::with_results(responses.into_iter().map(|r| Ok(r.to_string())).collect())
    }

    pub(crate) fn with_results(responses: Vec<Result<String, ModelError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            recordings: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) async fn requests(&self) -> Vec<ModelRequest> {
        self.recordings.lock().await.clone()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn id(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        self.recordings.lock().await.push(request);
        let next = self.responses.lock().await.pop_front();
        match next {
            Some(Ok(content)) => Ok(ModelResponse {
                message: ChatMessage::assistant(content),
                finish_reason: Some("stop".into()),
            }),
            Some(Err(err)) => Err(err),
            None => Err(ModelError::invalid_response("scripted", "no scripted reply left")),
        }
    }
}
