// Scripted stdio tool server used by the integration tests.
//
// The first argument picks a behaviour:
//   weather        handshake, paginated listing, get_weather/get_forecast calls
//   bad-handshake  answers initialize with a broken JSON line
//   exit-early     exits as soon as initialize arrives
//   stubborn       never answers tools/call and ignores end of input
//   exit-on-call   exits as soon as tools/call arrives
//   environment    reports FAKE_GREETING and its working directory as instructions

use serde_json::{Value, json};
use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;

fn send(out: &mut impl Write, message: &Value) {
    writeln!(out, "{message}").expect("write stdout");
    out.flush().expect("flush stdout");
}

fn reply(out: &mut impl Write, id: &Value, result: Value) {
    send(out, &json!({"jsonrpc": "2.0", "id": id, "result": result}));
}

fn fail(out: &mut impl Write, id: &Value, code: i64, message: &str) {
    send(
        out,
        &json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message}}),
    );
}

fn text(value: impl Into<String>) -> Value {
    json!({"content": [{"type": "text", "text": value.into()}]})
}

fn tools_page(cursor: Option<&str>) -> Value {
    match cursor {
        None => json!({
            "tools": [{
                "name": "get_weather",
                "description": "Current weather for a city",
                "inputSchema": {
                    "type": "object",
                    "properties": {"location": {"type": "string"}},
                    "required": ["location"]
                }
            }],
            "nextCursor": "page-2"
        }),
        Some(_) => json!({
            "tools": [{
                "name": "get_forecast",
                "description": "Forecast for the next days",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "location": {"type": "string"},
                        "days": {"type": "integer"}
                    },
                    "required": ["location"]
                }
            }]
        }),
    }
}

fn sleep_forever() -> ! {
    loop {
        thread::sleep(Duration::from_secs(60));
    }
}

fn main() {
    let mode = std::env::args().nth(1).unwrap_or_else(|| "weather".to_string());
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut out = io::stdout().lock();

    writeln!(out, "fake tool server booting in {mode} mode").expect("write stdout");
    out.flush().expect("flush stdout");

    while let Some(Ok(line)) = lines.next() {
        let Ok(message) = serde_json::from_str::<Value>(&line) else {
            continue;
        };
        let Some(id) = message.get("id").cloned() else {
            continue;
        };
        let method = message["method"].as_str().unwrap_or_default().to_string();
        let params = message.get("params").cloned().unwrap_or(Value::Null);

        match (mode.as_str(), method.as_str()) {
            ("bad-handshake", "initialize") => {
                writeln!(out, "{{\"jsonrpc\":\"2.0\",\"id\":").expect("write stdout");
                out.flush().expect("flush stdout");
            }
            ("exit-early", "initialize") => std::process::exit(3),
            ("environment", "initialize") => {
                let greeting = std::env::var("FAKE_GREETING").unwrap_or_default();
                let cwd = std::env::current_dir().expect("current dir");
                reply(
                    &mut out,
                    &id,
                    json!({
                        "protocolVersion": params["protocolVersion"],
                        "capabilities": {"tools": {}},
                        "serverInfo": {"name": "fake-environment", "version": "0.0.1"},
                        "instructions": format!("greeting={greeting} cwd={}", cwd.display())
                    }),
                )
            }
            (_, "initialize") => reply(
                &mut out,
                &id,
                json!({
                    "protocolVersion": params["protocolVersion"],
                    "capabilities": {"tools": {}},
                    "serverInfo": {"name": "fake-weather", "version": "0.0.1"},
                    "instructions": "Locations are city names."
                }),
            ),
            (_, "ping") => reply(&mut out, &id, json!({})),
            (_, "tools/list") => {
                send(
                    &mut out,
                    &json!({"jsonrpc": "2.0", "method": "notifications/message",
                            "params": {"level": "info", "data": "listing tools"}}),
                );
                reply(&mut out, &id, tools_page(params["cursor"].as_str()));
            }
            ("stubborn", "tools/call") => sleep_forever(),
            ("exit-on-call", "tools/call") => std::process::exit(4),
            (_, "tools/call") => {
                let location = params["arguments"]["location"].as_str().unwrap_or("nowhere");
                match params["name"].as_str() {
                    Some("get_weather") => {
                        // The client must answer our ping before it sees the result.
                        send(&mut out, &json!({"jsonrpc": "2.0", "id": "srv-1", "method": "ping"}));
                        let pong = lines
                            .next()
                            .and_then(Result::ok)
                            .and_then(|line| serde_json::from_str::<Value>(&line).ok());
                        match pong {
                            Some(pong) if pong["id"] == "srv-1" && pong["result"] == json!({}) => {
                                reply(&mut out, &id, text(format!("{location}: ⛅️ +18°C")));
                            }
                            other => fail(&mut out, &id, -32000, &format!("bad pong: {other:?}")),
                        }
                    }
                    Some("get_forecast") => {
                        let days = params["arguments"]["days"].as_u64().unwrap_or(3);
                        reply(&mut out, &id, text(format!("{location}: sunny for {days} days")));
                    }
                    other => fail(&mut out, &id, -32602, &format!("Unknown tool: {other:?}")),
                }
            }
            (_, other) => fail(&mut out, &id, -32601, &format!("Method not found: {other}")),
        }
    }

    if mode == "stubborn" {
        sleep_forever();
    }
}
