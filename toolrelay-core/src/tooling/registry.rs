use super::descriptor::ToolDescriptor;
use super::error::ToolError;
use super::invoker::invoke_tool;
use super::result::ToolCallResult;
use crate::session::{SessionState, ToolChannel};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Tools discovered on one ready session. Fixed for the session's lifetime.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    server: String,
    instructions: Option<String>,
    tools: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Lists every tool the server offers, following `nextCursor` pages.
    pub async fn discover(channel: &mut dyn ToolChannel) -> Result<Self, ToolError> {
        let server = channel.server_name().to_string();
        if channel.state() != SessionState::Ready {
            return Err(ToolError::Discovery {
                reason: format!("session is {}, expected ready", channel.state()),
                server,
            });
        }

        let mut registry = Self {
            server: server.clone(),
            ..Self::default()
        };
        let mut cursor: Option<String> = None;
        let mut seen_cursors = HashSet::new();

        loop {
            let params = match &cursor {
                Some(cursor) => json!({ "cursor": cursor }),
                None => json!({}),
            };
            let page = channel.request("tools/list", params).await?;

            let entries = page
                .get("tools")
                .and_then(Value::as_array)
                .ok_or_else(|| ToolError::Discovery {
                    server: server.clone(),
                    reason: "reply has no 'tools' array".into(),
                })?;
            debug!(server = %server, count = entries.len(), "Received tool listing page");

            for entry in entries {
                let descriptor =
                    ToolDescriptor::from_listing(entry).map_err(|reason| ToolError::Discovery {
                        server: server.clone(),
                        reason,
                    })?;
                registry.insert(descriptor);
            }

            cursor = page
                .get("nextCursor")
                .and_then(Value::as_str)
                .filter(|next| !next.is_empty())
                .map(str::to_string);
            match &cursor {
                Some(next) if !seen_cursors.insert(next.clone()) => {
                    return Err(ToolError::Discovery {
                        server,
                        reason: format!("pagination cursor '{next}' repeated"),
                    });
                }
                Some(_) => continue,
                None => break,
            }
        }

        info!(
            server = %registry.server,
            tools = registry.tools.len(),
            "Tool discovery complete"
        );
        Ok(registry)
    }

    fn insert(&mut self, descriptor: ToolDescriptor) {
        if self.index.contains_key(&descriptor.name) {
            warn!(
                server = %self.server,
                tool = %descriptor.name,
                "Server advertised a duplicate tool; keeping the first"
            );
            return;
        }
        self.index
            .insert(descriptor.name.clone(), self.tools.len());
        self.tools.push(descriptor);
    }

    /// Binds a discovered tool name to an invocable stub.
    pub fn resolve(&self, name: &str) -> Result<ToolStub<'_>, ToolError> {
        self.index
            .get(name)
            .map(|&position| ToolStub {
                descriptor: &self.tools[position],
            })
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    /// Attaches the usage guidance the server sent during the handshake.
    pub fn with_instructions(mut self, instructions: Option<&str>) -> Self {
        self.instructions = instructions.map(str::to_string);
        self
    }

    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// A resolved tool, ready to be called over a channel.
#[derive(Debug, Clone, Copy)]
pub struct ToolStub<'r> {
    descriptor: &'r ToolDescriptor,
}

impl<'r> ToolStub<'r> {
    pub fn descriptor(&self) -> &'r ToolDescriptor {
        self.descriptor
    }

    pub fn name(&self) -> &'r str {
        &self.descriptor.name
    }

    pub async fn call(
        &self,
        channel: &mut dyn ToolChannel,
        arguments: Value,
    ) -> Result<ToolCallResult, ToolError> {
        invoke_tool(channel, self.descriptor, arguments).await
    }
}
