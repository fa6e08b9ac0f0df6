use super::descriptor::ToolDescriptor;
use super::error::ToolError;
use super::registry::ToolRegistry;
use super::result::{CallReply, ToolCallResult, reply_text};
use crate::session::{SessionError, ToolChannel};
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

/// Borrows the session channel for the duration of a query and routes
/// tool calls through the registry.
pub struct ToolInvoker<'s> {
    channel: &'s mut dyn ToolChannel,
    registry: &'s ToolRegistry,
}

impl<'s> ToolInvoker<'s> {
    pub fn new(channel: &'s mut dyn ToolChannel, registry: &'s ToolRegistry) -> Self {
        Self { channel, registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        self.registry
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        self.registry.tools()
    }

    /// Resolves `name` and invokes it.
    pub async fn call(&mut self, name: &str, arguments: Value) -> Result<ToolCallResult, ToolError> {
        let registry = self.registry;
        let stub = registry.resolve(name)?;
        stub.call(&mut *self.channel, arguments).await
    }

    pub async fn invoke(
        &mut self,
        descriptor: &ToolDescriptor,
        arguments: Value,
    ) -> Result<ToolCallResult, ToolError> {
        invoke_tool(&mut *self.channel, descriptor, arguments).await
    }
}

/// Validates `arguments` against the descriptor, then performs one
/// `tools/call` exchange.
pub(super) async fn invoke_tool(
    channel: &mut dyn ToolChannel,
    descriptor: &ToolDescriptor,
    arguments: Value,
) -> Result<ToolCallResult, ToolError> {
    let tool = descriptor.name.as_str();
    let arguments = match arguments {
        Value::Null => Map::new(),
        Value::Object(map) => map,
        other => {
            return Err(ToolError::ArgumentValidation {
                tool: tool.to_string(),
                reason: format!("arguments must be an object, got {other}"),
            });
        }
    };

    descriptor
        .schema
        .validate(&arguments)
        .map_err(|reason| {
            debug!(tool = %tool, %reason, "Rejected tool arguments before dispatch");
            ToolError::ArgumentValidation {
                tool: tool.to_string(),
                reason,
            }
        })?;

    info!(server = %channel.server_name(), tool = %tool, "Invoking tool");
    let params = json!({ "name": tool, "arguments": arguments });
    let raw = match channel.request("tools/call", params).await {
        Ok(raw) => raw,
        Err(SessionError::Rpc { message, code, .. }) => {
            warn!(tool = %tool, code, %message, "Tool call rejected by server");
            return Err(ToolError::Execution {
                tool: tool.to_string(),
                message,
            });
        }
        Err(err) => return Err(err.into()),
    };

    let reply: CallReply =
        serde_json::from_value(raw.clone()).map_err(|err| ToolError::Execution {
            tool: tool.to_string(),
            message: format!("malformed tool result: {err}"),
        })?;

    if reply.is_error {
        let message = reply_text(&reply.content);
        warn!(tool = %tool, %message, "Tool reported failure");
        return Err(ToolError::Execution {
            tool: tool.to_string(),
            message: if message.is_empty() {
                "tool reported an error".into()
            } else {
                message
            },
        });
    }

    Ok(ToolCallResult::from_reply(reply, raw))
}
