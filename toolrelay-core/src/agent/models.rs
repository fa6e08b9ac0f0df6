use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// A tool call requested by the model within an AI turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCallEntry {
    pub name: String,
    pub arguments: Value,
}

/// One entry of an agent transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageEntry {
    Human(String),
    Ai {
        content: String,
        tool_calls: Vec<ToolCallEntry>,
    },
    Tool {
        tool: String,
        content: Value,
        is_error: bool,
    },
    System(String),
    /// Entries of a kind this client does not model; kept as opaque text.
    Other {
        type_name: String,
        rendering: String,
    },
}

impl MessageEntry {
    /// Stable kind name, or `None` for opaque entries.
    pub fn kind(&self) -> Option<&'static str> {
        match self {
            MessageEntry::Human(_) => Some("HumanMessage"),
            MessageEntry::Ai { .. } => Some("AIMessage"),
            MessageEntry::Tool { .. } => Some("ToolMessage"),
            MessageEntry::System(_) => Some("SystemMessage"),
            MessageEntry::Other { .. } => None,
        }
    }

    pub fn content(&self) -> Option<Value> {
        match self {
            MessageEntry::Human(text) | MessageEntry::System(text) => {
                Some(Value::String(text.clone()))
            }
            MessageEntry::Ai { content, .. } => Some(Value::String(content.clone())),
            MessageEntry::Tool { content, .. } => Some(content.clone()),
            MessageEntry::Other { .. } => None,
        }
    }
}

impl fmt::Display for MessageEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageEntry::Human(text) => write!(f, "human: {text}"),
            MessageEntry::Ai {
                content,
                tool_calls,
            } => {
                write!(f, "ai: {content}")?;
                for call in tool_calls {
                    write!(f, " [call {} {}]", call.name, call.arguments)?;
                }
                Ok(())
            }
            MessageEntry::Tool {
                tool,
                content,
                is_error,
            } => {
                let label = if *is_error { "tool error" } else { "tool" };
                match content {
                    Value::String(text) => write!(f, "{label} {tool}: {text}"),
                    other => write!(f, "{label} {tool}: {other}"),
                }
            }
            MessageEntry::System(text) => write!(f, "system: {text}"),
            MessageEntry::Other {
                type_name,
                rendering,
            } => write!(f, "{type_name}: {rendering}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AgentStatus {
    Completed,
    StepLimitReached,
}

/// Ordered transcript of one agent run.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentResponse {
    pub messages: Vec<MessageEntry>,
    pub status: AgentStatus,
}

impl AgentResponse {
    /// Text of the last AI turn, if any.
    pub fn final_text(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|entry| match entry {
            MessageEntry::Ai { content, .. } if !content.is_empty() => Some(content.as_str()),
            _ => None,
        })
    }

    pub fn tool_calls(&self) -> impl Iterator<Item = &ToolCallEntry> {
        self.messages.iter().flat_map(|entry| match entry {
            MessageEntry::Ai { tool_calls, .. } => tool_calls.as_slice(),
            _ => &[],
        })
    }
}

impl fmt::Display for AgentResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, entry) in self.messages.iter().enumerate() {
            if position > 0 {
                writeln!(f)?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}
