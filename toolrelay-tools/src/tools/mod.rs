//! Tools served over stdio.
//!
//! Each tool validates its own arguments. Bad arguments surface as JSON-RPC
//! `-32602`; failures while running a tool become `isError` results so the
//! calling agent can read them.

mod command;
mod summarize;
mod weather;
mod workspace;

pub use command::RunCommandTool;
pub use summarize::SummarizeTool;
pub use weather::WeatherTool;
pub use workspace::{CreateFileTool, ReadFileTool, Workspace, WriteFileTool};

use crate::rpc::RpcError;
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ToolFailure {
    #[error("invalid arguments: {0}")]
    InvalidParams(String),
    #[error("{0}")]
    Failed(String),
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn input_schema(&self) -> Value;
    async fn call(&self, args: &Map<String, Value>) -> Result<String, ToolFailure>;

    fn listing(&self) -> Value {
        json!({
            "name": self.name(),
            "description": self.description(),
            "inputSchema": self.input_schema(),
        })
    }
}

/// Registered tools in listing order.
#[derive(Default)]
pub struct ToolSet {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shell, weather and workspace file tools, plus summarization when a
    /// model backend is available.
    pub fn standard(
        weather: WeatherTool,
        workspace: Arc<Workspace>,
        summarizer: Option<SummarizeTool>,
    ) -> Self {
        let mut set = Self::new()
            .with(RunCommandTool::new(workspace.clone()))
            .with(weather)
            .with(CreateFileTool::new(workspace.clone()))
            .with(WriteFileTool::new(workspace.clone()))
            .with(ReadFileTool::new(workspace));
        if let Some(summarizer) = summarizer {
            set = set.with(summarizer);
        }
        set
    }

    pub fn with(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.push(Box::new(tool));
        self
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tools.iter().map(|tool| tool.name())
    }

    pub fn list(&self) -> Value {
        json!({ "tools": self.tools.iter().map(|tool| tool.listing()).collect::<Vec<_>>() })
    }

    /// Result of a `tools/call` request: `{content, isError}` or a JSON-RPC
    /// error for unknown tools and invalid arguments.
    pub async fn call(&self, params: Option<&Value>) -> Result<Value, RpcError> {
        let Some(Value::Object(params)) = params else {
            return Err(RpcError::invalid_params(
                "params must be an object with name and arguments",
            ));
        };
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return Err(RpcError::invalid_params("params.name must be a string"));
        };
        let empty = Map::new();
        let args = match params.get("arguments") {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(args)) => args,
            Some(_) => {
                return Err(RpcError::invalid_params(
                    "params.arguments must be an object",
                ));
            }
        };
        let Some(tool) = self.tools.iter().find(|tool| tool.name() == name) else {
            warn!(tool = %name, "Call for unknown tool");
            return Err(RpcError::invalid_params(format!("Unknown tool: {name}")));
        };

        debug!(tool = %name, "Running tool");
        match tool.call(args).await {
            Ok(text) => Ok(text_result(text, false)),
            Err(ToolFailure::InvalidParams(reason)) => Err(RpcError::invalid_params(format!(
                "Invalid arguments for tool {name}: {reason}"
            ))),
            Err(ToolFailure::Failed(message)) => {
                warn!(tool = %name, error = %message, "Tool failed");
                Ok(text_result(message, true))
            }
        }
    }
}

fn text_result(text: String, is_error: bool) -> Value {
    json!({
        "content": [{"type": "text", "text": text}],
        "isError": is_error,
    })
}

pub(crate) fn required_str<'a>(
    args: &'a Map<String, Value>,
    key: &str,
) -> Result<&'a str, ToolFailure> {
    match args.get(key) {
        Some(Value::String(value)) => Ok(value),
        Some(other) => Err(ToolFailure::InvalidParams(format!(
            "'{key}' must be a string, got {other}"
        ))),
        None => Err(ToolFailure::InvalidParams(format!("missing '{key}'"))),
    }
}

pub(crate) fn optional_str<'a>(
    args: &'a Map<String, Value>,
    key: &str,
    default: &'a str,
) -> Result<&'a str, ToolFailure> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(_) => required_str(args, key),
    }
}

pub(crate) fn optional_bool(
    args: &Map<String, Value>,
    key: &str,
    default: bool,
) -> Result<bool, ToolFailure> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(value)) => Ok(*value),
        Some(other) => Err(ToolFailure::InvalidParams(format!(
            "'{key}' must be a boolean, got {other}"
        ))),
    }
}

pub(crate) fn optional_usize(
    args: &Map<String, Value>,
    key: &str,
    default: usize,
) -> Result<usize, ToolFailure> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(value) => value
            .as_u64()
            .and_then(|number| usize::try_from(number).ok())
            .ok_or_else(|| {
                ToolFailure::InvalidParams(format!(
                    "'{key}' must be a non-negative integer, got {value}"
                ))
            }),
    }
}
