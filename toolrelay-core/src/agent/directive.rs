use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum AgentDirective {
    Final { response: String },
    CallTool { tool: String, input: Value },
}

/// Reads the model's reply as a directive.
///
/// Replies with no JSON object at all are plain prose and count as the final
/// answer. A JSON reply that is not a valid directive is an error the caller
/// can ask the model to correct.
pub fn parse_directive(content: &str) -> Result<AgentDirective, String> {
    match extract_json(content) {
        Some(value) => parse_action_value(value),
        None => {
            let response = content.trim();
            if response.is_empty() {
                Err("empty response".into())
            } else {
                Ok(AgentDirective::Final {
                    response: response.to_string(),
                })
            }
        }
    }
}

fn parse_action_value(value: Value) -> Result<AgentDirective, String> {
    match value {
        Value::Object(map) => {
            let action = map
                .get("action")
                .and_then(Value::as_str)
                .ok_or("missing action field in agent response")?;
            match action {
                "call_tool" => {
                    let tool = map
                        .get("tool")
                        .and_then(Value::as_str)
                        .map(str::trim)
                        .filter(|tool| !tool.is_empty())
                        .ok_or("call_tool action missing tool field")?;
                    let input = map.get("input").cloned().unwrap_or(Value::Null);
                    Ok(AgentDirective::CallTool {
                        tool: tool.to_string(),
                        input,
                    })
                }
                "final" => {
                    let response = map
                        .get("response")
                        .and_then(Value::as_str)
                        .ok_or("final action missing response field")?;
                    Ok(AgentDirective::Final {
                        response: response.to_string(),
                    })
                }
                other => Err(format!("unknown action value: {other}")),
            }
        }
        Value::String(text) => parse_directive(&text),
        other => Err(format!("unsupported response type: {other}")),
    }
}

fn extract_json(content: &str) -> Option<Value> {
    let trimmed = content.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    if trimmed.starts_with("```") {
        let stripped = trimmed.trim_start_matches("```json");
        let stripped = stripped.trim_start_matches("```JSON");
        let stripped = stripped.trim_start_matches("```");
        if let Some(end) = stripped.rfind("```") {
            if let Ok(value) = serde_json::from_str::<Value>(stripped[..end].trim()) {
                return Some(value);
            }
        }
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => {
            serde_json::from_str::<Value>(&trimmed[start..=end]).ok()
        }
        _ => None,
    }
}
