use crate::model::ModelError;
use crate::tooling::ToolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Model(#[from] ModelError),
    /// Tool failures the agent cannot treat as data (the session itself broke).
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error("invalid agent response: {0}")]
    InvalidResponse(String),
}

impl AgentError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AgentError::Model(err) if err.is_rate_limited())
    }

    pub fn user_message(&self) -> String {
        match self {
            AgentError::Model(err) => err.user_message(),
            AgentError::Tool(err) => err.user_message(),
            AgentError::InvalidResponse(_) => {
                "The model kept answering in a format that could not be understood. Try rephrasing the request."
                    .to_string()
            }
        }
    }
}
