//! Write file tool — create or overwrite files, making parent directories.

use async_trait::async_trait;
use tasksmith_core::error::ToolError;
use tasksmith_core::tool::{Tool, ToolArguments};

use crate::path::PathPolicy;
use crate::{denied, path_digest, required_str};

pub struct WriteFileTool {
    paths: PathPolicy,
}

impl WriteFileTool {
    pub fn new(paths: PathPolicy) -> Self {
        Self { paths }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The path to the file to write"
                },
                "content": {
                    "type": "string",
                    "description": "The content to write to the file"
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, arguments: &ToolArguments) -> Result<String, ToolError> {
        let path = required_str(arguments, "path", "write_file")?;
        let content = required_str(arguments, "content", "write_file")?;
        let resolved = self.paths.resolve(path).map_err(|e| denied("write_file", e))?;

        if let Some(parent) = resolved.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ToolError::ExecutionFailed {
                    tool_name: "write_file".into(),
                    reason: format!("failed to create directory: {e}"),
                })?;
        }

        tokio::fs::write(&resolved, content)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "write_file".into(),
                reason: format!("failed to write file: {e}"),
            })?;

        Ok(format!("File written successfully to {}", resolved.display()))
    }

    fn describe(&self, arguments: &ToolArguments) -> String {
        path_digest(arguments)
    }
}
