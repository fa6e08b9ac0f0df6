use super::state::SessionState;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to spawn tool server '{server}': {source}")]
    Spawn {
        server: String,
        #[source]
        source: std::io::Error,
    },
    #[error("tool server '{server}' protocol error: {reason}")]
    Protocol { server: String, reason: String },
    #[error("tool server '{server}' transport error: {reason}")]
    Transport { server: String, reason: String },
    #[error("tool server '{server}' did not answer '{method}' within {timeout:?}")]
    Timeout {
        server: String,
        method: String,
        timeout: Duration,
    },
    #[error("tool server '{server}' returned JSON-RPC error {code}: {message}")]
    Rpc {
        server: String,
        code: i64,
        message: String,
        data: Option<Value>,
    },
    #[error("tool server '{server}' is {actual}, expected {expected}")]
    InvalidState {
        server: String,
        actual: SessionState,
        expected: SessionState,
    },
}

impl SessionError {
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Spawn { server, source } => format!(
                "Could not start tool server '{server}' ({source}). Check the launch target path and interpreter."
            ),
            SessionError::Protocol { server, .. } => {
                format!("Tool server '{server}' sent a reply that could not be understood.")
            }
            SessionError::Transport { server, .. } => {
                format!("Lost connection to tool server '{server}'.")
            }
            SessionError::Timeout { server, method, .. } => {
                format!("Tool server '{server}' did not respond to '{method}' in time.")
            }
            SessionError::Rpc {
                server, message, ..
            } => format!("Tool server '{server}' rejected the request: {message}"),
            SessionError::InvalidState {
                server, actual, ..
            } => format!("Tool server '{server}' is not available (session {actual})."),
        }
    }
}
