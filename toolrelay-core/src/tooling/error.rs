use crate::session::SessionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool discovery on '{server}' failed: {reason}")]
    Discovery { server: String, reason: String },
    #[error("unknown tool requested: {0}")]
    UnknownTool(String),
    #[error("invalid arguments for tool '{tool}': {reason}")]
    ArgumentValidation { tool: String, reason: String },
    #[error("tool '{tool}' failed: {message}")]
    Execution { tool: String, message: String },
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ToolError {
    /// Whether the failure is something the agent can reason about and retry.
    ///
    /// Timeouts and protocol hiccups leave the session usable, so they count.
    /// A dead pipe does not.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ToolError::UnknownTool(_)
            | ToolError::ArgumentValidation { .. }
            | ToolError::Execution { .. } => true,
            ToolError::Session(err) => !matches!(
                err,
                SessionError::Transport { .. } | SessionError::Spawn { .. }
            ),
            ToolError::Discovery { .. } => false,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            ToolError::Discovery { server, .. } => {
                format!("Could not list the tools offered by '{server}'.")
            }
            ToolError::UnknownTool(name) => {
                format!("Tool \"{name}\" is not offered by the connected server.")
            }
            ToolError::ArgumentValidation { tool, reason } => {
                format!("Tool \"{tool}\" was called with invalid arguments: {reason}")
            }
            ToolError::Execution { tool, message } => {
                format!("Tool \"{tool}\" failed: {message}")
            }
            ToolError::Session(err) => err.user_message(),
        }
    }
}
