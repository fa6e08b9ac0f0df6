use crate::rpc::{JSONRPC_VERSION, RpcRequest, RpcResponse};
use crate::tools::ToolSet;
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use toolrelay_core::constants::PROTOCOL_VERSION;
use tracing::{debug, error, info, warn};

const INSTRUCTIONS: &str = "Weather lookups, file tools confined to a workspace folder, and text summarization. \
File paths are relative to the workspace.";

/// Line-delimited JSON-RPC tool server.
pub struct ToolServer {
    name: String,
    version: String,
    tools: ToolSet,
}

impl ToolServer {
    pub fn new(name: impl Into<String>, tools: ToolSet) -> Self {
        Self {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            tools,
        }
    }

    /// Reads requests until end of input, writing one response line per
    /// request. Notifications get no answer.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some(response) = self.handle_line(line).await else {
                continue;
            };
            let mut encoded = serde_json::to_vec(&response)?;
            encoded.push(b'\n');
            writer.write_all(&encoded).await?;
            writer.flush().await?;
        }
        info!("Input closed; tool server exiting");
        Ok(())
    }

    pub async fn handle_line(&self, line: &str) -> Option<RpcResponse> {
        match serde_json::from_str::<RpcRequest>(line) {
            Ok(request) => self.handle(request).await,
            Err(err) => {
                warn!(error = %err, "Unparseable request line");
                Some(RpcResponse::parse_error(format!("Invalid JSON-RPC message: {err}")))
            }
        }
    }

    pub async fn handle(&self, request: RpcRequest) -> Option<RpcResponse> {
        debug!(method = %request.method, "Received JSON-RPC message");

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(RpcResponse::invalid_request(
                request.id,
                "Unsupported jsonrpc version (expected 2.0)",
            ));
        }
        if request.is_notification() {
            debug!(method = %request.method, "Notification acknowledged");
            return None;
        }

        let id = request.id.clone();
        let response = match request.method.as_str() {
            "initialize" => RpcResponse::success(id, self.initialize_result(request.params.as_ref())),
            "ping" => RpcResponse::success(id, json!({})),
            "tools/list" => RpcResponse::success(id, self.tools.list()),
            "tools/call" => match self.tools.call(request.params.as_ref()).await {
                Ok(result) => RpcResponse::success(id, result),
                Err(err) => RpcResponse::failure(id, err),
            },
            other => {
                error!(method = other, "Unknown JSON-RPC method");
                RpcResponse::method_not_found(id, other)
            }
        };
        Some(response)
    }

    fn initialize_result(&self, params: Option<&Value>) -> Value {
        let client = params
            .and_then(|params| params.get("clientInfo"))
            .and_then(|info| info.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        let protocol = params
            .and_then(|params| params.get("protocolVersion"))
            .and_then(Value::as_str)
            .unwrap_or(PROTOCOL_VERSION);
        info!(client, protocol, tools = self.tools.len(), "Client initialized session");

        json!({
            "protocolVersion": protocol,
            "capabilities": {"tools": {"listChanged": false}},
            "serverInfo": {"name": self.name, "version": self.version},
            "instructions": INSTRUCTIONS,
        })
    }
}
