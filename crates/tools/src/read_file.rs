//! Read file tool.

use async_trait::async_trait;
use tasksmith_core::error::ToolError;
use tasksmith_core::tool::{Tool, ToolArguments};

use crate::path::PathPolicy;
use crate::{denied, path_digest, required_str};

pub struct ReadFileTool {
    paths: PathPolicy,
}

impl ReadFileTool {
    pub fn new(paths: PathPolicy) -> Self {
        Self { paths }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The path to the file to read"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, arguments: &ToolArguments) -> Result<String, ToolError> {
        let path = required_str(arguments, "path", "read_file")?;
        let resolved = self.paths.resolve(path).map_err(|e| denied("read_file", e))?;

        let bytes = tokio::fs::read(&resolved)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "read_file".into(),
                reason: format!("failed to read file: {e}"),
            })?;

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn describe(&self, arguments: &ToolArguments) -> String {
        path_digest(arguments)
    }
}
