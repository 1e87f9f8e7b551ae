//! List files tool — one line per directory entry, sorted by name.

use std::fmt::Write as _;

use async_trait::async_trait;
use tasksmith_core::error::ToolError;
use tasksmith_core::tool::{Tool, ToolArguments};

use crate::denied;
use crate::path::PathPolicy;

pub struct ListFilesTool {
    paths: PathPolicy,
}

impl ListFilesTool {
    pub fn new(paths: PathPolicy) -> Self {
        Self { paths }
    }
}

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &str {
        "list_files"
    }

    fn description(&self) -> &str {
        "List files and directories in a given path"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The directory path to list (optional, defaults to working directory)"
                }
            }
        })
    }

    async fn execute(&self, arguments: &ToolArguments) -> Result<String, ToolError> {
        let path = arguments.get("path").and_then(|v| v.as_str());
        let dir = self
            .paths
            .resolve_or_root(path)
            .map_err(|e| denied("list_files", e))?;

        let failed = |e: std::io::Error| ToolError::ExecutionFailed {
            tool_name: "list_files".into(),
            reason: format!("failed to list directory: {e}"),
        };

        let mut entries = Vec::new();
        let mut read_dir = tokio::fs::read_dir(&dir).await.map_err(failed)?;
        while let Some(entry) = read_dir.next_entry().await.map_err(failed)? {
            let name = entry.file_name().to_string_lossy().into_owned();
            // Entries can vanish between listing and stat; report them as empty files
            let (is_dir, size) = match entry.metadata().await {
                Ok(meta) => (meta.is_dir(), meta.len()),
                Err(_) => (false, 0),
            };
            entries.push((name, is_dir, size));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut listing = String::new();
        for (name, is_dir, size) in entries {
            if is_dir {
                let _ = writeln!(listing, "[DIR]  {name}");
            } else {
                let _ = writeln!(listing, "[FILE] {name} ({size} bytes)");
            }
        }
        Ok(listing)
    }

    fn describe(&self, arguments: &ToolArguments) -> String {
        arguments
            .get("path")
            .and_then(|v| v.as_str())
            .map_or_else(|| "current directory".to_string(), str::to_string)
    }
}
