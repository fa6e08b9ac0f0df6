use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of the `content` array of a `tools/call` reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Image {
        #[serde(rename = "mimeType", default)]
        mime_type: String,
        #[serde(default)]
        data: String,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CallReply {
    #[serde(default)]
    pub content: Vec<Value>,
    #[serde(default)]
    pub structured_content: Option<Value>,
    #[serde(default)]
    pub is_error: bool,
}

/// Successful payload of a tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallResult {
    pub content: Vec<ContentBlock>,
    pub structured: Option<Value>,
    /// The reply exactly as received.
    pub raw: Value,
}

impl ToolCallResult {
    pub(super) fn from_reply(reply: CallReply, raw: Value) -> Self {
        let content = reply
            .content
            .into_iter()
            .map(|block| serde_json::from_value(block).unwrap_or(ContentBlock::Unsupported))
            .collect();
        Self {
            content,
            structured: reply.structured_content,
            raw,
        }
    }

    /// Concatenated text blocks, unmodified.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The structured value if present, otherwise the text as a JSON string.
    pub fn to_value(&self) -> Value {
        match &self.structured {
            Some(value) => value.clone(),
            None => Value::String(self.text()),
        }
    }
}

pub(super) fn reply_text(content: &[Value]) -> String {
    content
        .iter()
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("\n")
}
