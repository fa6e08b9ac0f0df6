use crate::tooling::ToolRegistry;
use serde_json::{Value, json};

pub(super) const CORRECTION_MESSAGE: &str = "Your previous reply was not a valid directive. \
Respond with exactly one JSON object: either {\"action\":\"call_tool\",\"tool\":\"tool_name\",\"input\":{...}} \
or {\"action\":\"final\",\"response\":\"...\"}.";

const TOOL_RESULT_INSTRUCTION: &str = "Use this result to continue. Call another tool if needed, \
otherwise answer the user with a final directive.";

pub(super) fn compose_system_instructions(registry: &ToolRegistry, extra: Option<&str>) -> String {
    let mut lines = Vec::new();
    if let Some(extra) = extra {
        lines.push(extra.trim().to_string());
    }
    lines.extend([
        "You are an assistant that can call tools to solve user requests.".to_string(),
        "When you need to invoke a tool, respond with: {\"action\":\"call_tool\",\"tool\":\"tool_name\",\"input\":{...}}."
            .to_string(),
        "When you are ready to give the final answer to the user, respond with: {\"action\":\"final\",\"response\":\"...\"}."
            .to_string(),
        "Respond with a single JSON object and nothing else.".to_string(),
        "Answer in the language the user writes in.".to_string(),
    ]);

    if let Some(guidance) = registry.instructions() {
        lines.push(format!("Server '{}' guidance: {}", registry.server(), guidance.trim()));
    }

    if registry.is_empty() {
        lines.push("No tools are available; answer directly.".to_string());
        return lines.join("\n");
    }

    lines.push("Available tools:".to_string());
    for descriptor in registry.tools() {
        let mut line = format!("- {}", descriptor.name);
        if !descriptor.description.is_empty() {
            line.push_str(&format!(": {}", descriptor.description));
        }
        if !descriptor.schema.params.is_empty() {
            let compact = serde_json::to_string(&descriptor.schema.params).unwrap_or_default();
            line.push_str(&format!(" Parameters: {compact}"));
        }
        lines.push(line);
    }

    lines.join("\n")
}

pub(super) fn tool_result_message(tool: &str, input: &Value, outcome: &Value, success: bool) -> String {
    json!({
        "tool_result": {
            "tool": tool,
            "input": input,
            "success": success,
            "output": outcome,
        },
        "instruction": TOOL_RESULT_INSTRUCTION,
    })
    .to_string()
}
