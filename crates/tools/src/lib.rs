//! Built-in action executor for Tasksmith.
//!
//! Tools give the agent its hands in the target directory: run bash
//! commands, read and write files, list directories, search text.
//! Every tool is scoped to the working directory and runs under a deadline.

pub mod bash;
pub mod list_files;
pub mod path;
pub mod read_file;
pub mod search;
pub mod write_file;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tasksmith_config::ToolsConfig;
use tasksmith_core::error::ToolError;
use tasksmith_core::tool::{Tool, ToolArguments, ToolRegistry};

pub use bash::BashTool;
pub use list_files::ListFilesTool;
pub use path::{PathPolicy, PathValidationError};
pub use read_file::ReadFileTool;
pub use search::SearchTool;
pub use write_file::WriteFileTool;

/// Create the registry of the five built-in tools, scoped to `working_dir`.
///
/// Registration order is the order the schemas are offered to the model.
pub fn default_registry(working_dir: &Path, config: &ToolsConfig) -> ToolRegistry {
    let paths = PathPolicy::new(working_dir, config.forbidden_paths.clone());
    let timeout = Duration::from_secs(config.command_timeout_secs);

    let mut registry = ToolRegistry::new();
    registry.register(Box::new(WithDeadline::new(
        BashTool::new(working_dir, config.allowed_commands.clone()),
        timeout,
    )));
    registry.register(Box::new(WithDeadline::new(ReadFileTool::new(paths.clone()), timeout)));
    registry.register(Box::new(WithDeadline::new(WriteFileTool::new(paths.clone()), timeout)));
    registry.register(Box::new(WithDeadline::new(ListFilesTool::new(paths.clone()), timeout)));
    registry.register(Box::new(WithDeadline::new(SearchTool::new(paths), timeout)));
    registry
}

/// Wraps a tool so each invocation fails with [`ToolError::Timeout`] once
/// the deadline passes. Child processes are killed when the future drops.
pub struct WithDeadline<T> {
    inner: T,
    timeout: Duration,
}

impl<T: Tool> WithDeadline<T> {
    pub fn new(inner: T, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<T: Tool> Tool for WithDeadline<T> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn description(&self) -> &str {
        self.inner.description()
    }

    fn parameters_schema(&self) -> serde_json::Value {
        self.inner.parameters_schema()
    }

    async fn execute(&self, arguments: &ToolArguments) -> Result<String, ToolError> {
        match tokio::time::timeout(self.timeout, self.inner.execute(arguments)).await {
            Ok(result) => result,
            Err(_) => Err(ToolError::Timeout {
                tool_name: self.inner.name().to_string(),
                timeout_secs: self.timeout.as_secs(),
            }),
        }
    }

    fn describe(&self, arguments: &ToolArguments) -> String {
        self.inner.describe(arguments)
    }
}

/// Fetch a required string argument.
pub(crate) fn required_str<'a>(
    arguments: &'a ToolArguments,
    key: &str,
    tool: &str,
) -> Result<&'a str, ToolError> {
    arguments
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::InvalidArguments(format!("{tool} requires '{key}' parameter")))
}

pub(crate) fn denied(tool: &str, e: PathValidationError) -> ToolError {
    ToolError::PermissionDenied {
        tool_name: tool.into(),
        reason: e.to_string(),
    }
}

/// Digest for file tools: the path as given.
pub(crate) fn path_digest(arguments: &ToolArguments) -> String {
    arguments
        .get("path")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tasksmith_core::tool::ToolCall;

    fn call(name: &str, args: serde_json::Value) -> ToolCall {
        ToolCall {
            id: "toolu_1".into(),
            name: name.into(),
            arguments: args.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn default_registry_offers_five_tools_in_order() {
        let registry = default_registry(Path::new("."), &ToolsConfig::default());
        assert_eq!(
            registry.names(),
            vec!["bash", "read_file", "write_file", "list_files", "search"]
        );
        let defs = registry.definitions();
        assert_eq!(defs[0].input_schema["required"], serde_json::json!(["command"]));
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let registry = default_registry(Path::new("."), &ToolsConfig::default());
        let err = registry.execute(&call("deploy", serde_json::json!({}))).await.unwrap_err();
        assert_eq!(err.to_string(), "unknown tool: deploy");
    }

    #[tokio::test]
    async fn deadline_turns_into_timeout_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = ToolsConfig {
            command_timeout_secs: 1,
            ..ToolsConfig::default()
        };
        let registry = default_registry(dir.path(), &config);
        let err = registry
            .execute(&call("bash", serde_json::json!({"command": "sleep 5"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timeout { timeout_secs: 1, .. }));
    }

    #[tokio::test]
    async fn write_then_read_through_registry() {
        let dir = tempfile::tempdir().unwrap();
        let registry = default_registry(dir.path(), &ToolsConfig::default());

        registry
            .execute(&call(
                "write_file",
                serde_json::json!({"path": "notes/todo.md", "content": "- ship it\n"}),
            ))
            .await
            .unwrap();
        let content = registry
            .execute(&call("read_file", serde_json::json!({"path": "notes/todo.md"})))
            .await
            .unwrap();
        assert_eq!(content, "- ship it\n");
    }

    #[test]
    fn registry_describes_calls() {
        let registry = default_registry(Path::new("."), &ToolsConfig::default());
        assert_eq!(
            registry.describe(&call("write_file", serde_json::json!({"path": "a/b.go"}))),
            "a/b.go"
        );
        assert_eq!(
            registry.describe(&call("search", serde_json::json!({"pattern": "fn main"}))),
            "'fn main'"
        );
        assert_eq!(registry.describe(&call("list_files", serde_json::json!({}))), "current directory");
    }
}
