use super::{Tool, ToolFailure, Workspace, optional_usize, required_str};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

pub const DEFAULT_COMMAND_TIMEOUT_SECS: usize = 60;

#[cfg(windows)]
const SHELL: (&str, &str) = ("cmd", "/C");
#[cfg(not(windows))]
const SHELL: (&str, &str) = ("sh", "-c");

/// Runs a shell command with the workspace as its working directory.
pub struct RunCommandTool {
    workspace: Arc<Workspace>,
}

impl RunCommandTool {
    pub fn new(workspace: Arc<Workspace>) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for RunCommandTool {
    fn name(&self) -> &'static str {
        "run_command"
    }

    fn description(&self) -> &'static str {
        "Run a shell command in the workspace and return its output"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {"type": "string", "description": "Shell command line"},
                "timeout_secs": {"type": "integer", "default": DEFAULT_COMMAND_TIMEOUT_SECS}
            },
            "required": ["command"]
        })
    }

    async fn call(&self, args: &Map<String, Value>) -> Result<String, ToolFailure> {
        let command = required_str(args, "command")?;
        if command.trim().is_empty() {
            return Err(ToolFailure::InvalidParams("'command' must not be empty".into()));
        }
        let timeout_secs = optional_usize(args, "timeout_secs", DEFAULT_COMMAND_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(ToolFailure::InvalidParams(
                "'timeout_secs' must be at least 1".into(),
            ));
        }

        info!(command, cwd = %self.workspace.root().display(), "Running shell command");
        let (shell, flag) = SHELL;
        let child = Command::new(shell)
            .arg(flag)
            .arg(command)
            .current_dir(self.workspace.root())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let limit = Duration::from_secs(timeout_secs as u64);
        let output = match tokio::time::timeout(limit, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                return Err(ToolFailure::Failed(format!("Cannot run command: {err}")));
            }
            Err(_) => {
                warn!(command, timeout_secs, "Shell command timed out");
                return Err(ToolFailure::Failed(format!(
                    "Command timed out after {timeout_secs}s"
                )));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let text = if !stdout.trim().is_empty() {
            stdout.trim_end()
        } else {
            stderr.trim_end()
        };
        if text.is_empty() {
            return Ok(format!("Command finished with {}", output.status));
        }
        Ok(text.to_string())
    }
}
