//! Bash tool — run a command in the working directory.
//!
//! Supports an optional first-word allowlist.

use std::path::PathBuf;

use async_trait::async_trait;
use tasksmith_core::error::ToolError;
use tasksmith_core::tool::{Tool, ToolArguments};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::required_str;

const DIGEST_CHARS: usize = 100;

/// Execute bash commands scoped to a working directory.
pub struct BashTool {
    working_dir: PathBuf,
    /// If non-empty, only these commands are allowed.
    allowed_commands: Vec<String>,
}

impl BashTool {
    pub fn new(working_dir: impl Into<PathBuf>, allowed_commands: Vec<String>) -> Self {
        Self {
            working_dir: working_dir.into(),
            allowed_commands,
        }
    }

    fn is_command_allowed(&self, command: &str) -> bool {
        if self.allowed_commands.is_empty() {
            return true;
        }

        let base_cmd = command.split_whitespace().next().unwrap_or("");
        self.allowed_commands.iter().any(|a| a == base_cmd)
    }
}

#[async_trait]
impl Tool for BashTool {
    fn name(&self) -> &str {
        "bash"
    }

    fn description(&self) -> &str {
        "Execute bash commands in the working directory"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The bash command to execute"
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, arguments: &ToolArguments) -> Result<String, ToolError> {
        let command = required_str(arguments, "command", "bash")?;

        if !self.is_command_allowed(command) {
            return Err(ToolError::PermissionDenied {
                tool_name: "bash".into(),
                reason: format!(
                    "Command '{}' not in allowlist",
                    command.split_whitespace().next().unwrap_or("")
                ),
            });
        }

        debug!(command = %command, dir = %self.working_dir.display(), "Executing bash command");

        let output = Command::new("bash")
            .arg("-c")
            .arg(command)
            .current_dir(&self.working_dir)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "bash".into(),
                reason: e.to_string(),
            })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.stderr.is_empty() {
            text.push_str("\nSTDERR:\n");
            text.push_str(&String::from_utf8_lossy(&output.stderr));
        }

        // A failing command that printed something is still useful output
        if !output.status.success() && text.is_empty() {
            let code = output.status.code().unwrap_or(-1);
            warn!(command = %command, exit_code = code, "Command failed");
            return Err(ToolError::ExecutionFailed {
                tool_name: "bash".into(),
                reason: format!("command failed with exit code {code}"),
            });
        }

        Ok(text)
    }

    fn describe(&self, arguments: &ToolArguments) -> String {
        let Some(command) = arguments.get("command").and_then(|v| v.as_str()) else {
            return String::new();
        };
        match command.char_indices().nth(DIGEST_CHARS) {
            Some((cut, _)) => format!("{}...", &command[..cut]),
            None => command.to_string(),
        }
    }
}
