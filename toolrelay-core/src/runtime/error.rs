use crate::agent::AgentError;
use crate::session::SessionError;
use crate::tooling::ToolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoopError {
    #[error("tool server initialization failed: {0}")]
    Initialize(#[source] SessionError),
    #[error("tool discovery failed: {0}")]
    Discovery(#[source] ToolError),
    #[error("query failed: {0}")]
    Fatal(#[source] AgentError),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl LoopError {
    pub fn user_message(&self) -> String {
        match self {
            LoopError::Initialize(err) => err.user_message(),
            LoopError::Discovery(err) => err.user_message(),
            LoopError::Fatal(err) => err.user_message(),
            LoopError::Io(err) => format!("Terminal input/output failed: {err}"),
        }
    }
}
