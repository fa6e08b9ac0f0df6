use super::error::SessionError;
use super::state::SessionState;
use async_trait::async_trait;
use serde_json::Value;

/// One request/response exchange against a tool server.
///
/// Taking `&mut self` keeps a single request in flight per channel.
#[async_trait]
pub trait ToolChannel: Send {
    fn server_name(&self) -> &str;

    fn state(&self) -> SessionState;

    async fn request(&mut self, method: &str, params: Value) -> Result<Value, SessionError>;
}
