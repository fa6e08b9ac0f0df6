use serde::Deserialize;
use serde_json::{Value, json};

pub(super) const JSONRPC_VERSION: &str = "2.0";
pub(super) const METHOD_NOT_FOUND: i64 = -32601;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// The parts of an `initialize` reply the client relies on.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct InitializeResult {
    pub protocol_version: String,
    #[serde(default)]
    pub server_info: Option<ServerInfo>,
    #[serde(default)]
    pub instructions: Option<String>,
}

pub(super) fn request(id: u64, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "method": method,
        "params": params,
    })
}

pub(super) fn notification(method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "method": method,
        "params": params,
    })
}

pub(super) fn response(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "result": result,
    })
}

pub(super) fn error_response(id: Value, code: i64, message: impl Into<String>) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "error": { "code": code, "message": message.into() },
    })
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct RpcFailure {
    pub code: i64,
    pub message: String,
    pub data: Option<Value>,
}

/// A decoded line read from the server's stdout.
#[derive(Debug, PartialEq)]
pub(super) enum Inbound {
    Response {
        id: Value,
        outcome: Result<Value, RpcFailure>,
    },
    Request {
        id: Value,
        method: String,
    },
    Notification {
        method: String,
    },
    /// Anything that is not a JSON object: server log output and the like.
    Noise,
    Malformed(String),
}

pub(super) fn decode_line(line: &str) -> Inbound {
    let trimmed = line.trim();
    if !trimmed.starts_with('{') {
        return Inbound::Noise;
    }

    let value = match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return Inbound::Malformed("message is not a JSON object".into()),
        Err(err) => return Inbound::Malformed(format!("invalid JSON: {err}")),
    };

    let method = value
        .get("method")
        .and_then(Value::as_str)
        .map(str::to_string);

    match (value.get("id").cloned(), method) {
        (Some(id), Some(method)) => Inbound::Request { id, method },
        (None, Some(method)) => Inbound::Notification { method },
        (Some(id), None) => {
            if let Some(error) = value.get("error") {
                let failure = RpcFailure {
                    code: error.get("code").and_then(Value::as_i64).unwrap_or(-32000),
                    message: error
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error")
                        .to_string(),
                    data: error.get("data").cloned(),
                };
                Inbound::Response {
                    id,
                    outcome: Err(failure),
                }
            } else if let Some(result) = value.get("result") {
                Inbound::Response {
                    id,
                    outcome: Ok(result.clone()),
                }
            } else {
                Inbound::Malformed("response carries neither result nor error".into())
            }
        }
        (None, None) => Inbound::Malformed("message has neither id nor method".into()),
    }
}

/// Ids are compared numerically or textually; servers may echo either form.
pub(super) fn id_matches(id: &Value, expected: u64) -> bool {
    match id {
        Value::Number(number) => number.as_u64() == Some(expected),
        Value::String(text) => text.parse::<u64>().ok() == Some(expected),
        _ => false,
    }
}
