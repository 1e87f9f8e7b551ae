//! Search tool — ripgrep with a grep fallback.

use std::path::Path;
use std::process::Output;

use async_trait::async_trait;
use tasksmith_core::error::ToolError;
use tasksmith_core::tool::{Tool, ToolArguments};
use tokio::process::Command;
use tracing::debug;

use crate::path::PathPolicy;
use crate::{denied, required_str};

const NO_MATCHES: &str = "No matches found";

pub struct SearchTool {
    paths: PathPolicy,
}

impl SearchTool {
    pub fn new(paths: PathPolicy) -> Self {
        Self { paths }
    }
}

/// stdout followed by stderr, like a terminal would show them.
fn combined(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text
}

async fn run(program: &str, args: &[&str], pattern: &str, target: &Path) -> std::io::Result<Output> {
    Command::new(program)
        .args(args)
        .arg("-e")
        .arg(pattern)
        .arg(target)
        .kill_on_drop(true)
        .output()
        .await
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search for a pattern in files using grep/ripgrep"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "The pattern to search for"
                },
                "path": {
                    "type": "string",
                    "description": "The path to search in (optional, defaults to working directory)"
                }
            },
            "required": ["pattern"]
        })
    }

    async fn execute(&self, arguments: &ToolArguments) -> Result<String, ToolError> {
        let pattern = required_str(arguments, "pattern", "search")?;
        let path = arguments.get("path").and_then(|v| v.as_str());
        let target = self
            .paths
            .resolve_or_root(path)
            .map_err(|e| denied("search", e))?;

        // rg exits 1 on no matches and fails to spawn when absent; grep covers both
        if let Ok(out) = run("rg", &["--no-heading", "--line-number"], pattern, &target).await
            && out.status.success()
        {
            return Ok(combined(&out));
        }

        debug!(pattern = %pattern, "ripgrep unavailable or found nothing, trying grep");
        match run("grep", &["-r", "-n"], pattern, &target).await {
            Ok(out) => {
                let text = combined(&out);
                if !out.status.success() && text.is_empty() {
                    Ok(NO_MATCHES.into())
                } else {
                    Ok(text)
                }
            }
            Err(_) => Ok(NO_MATCHES.into()),
        }
    }

    fn describe(&self, arguments: &ToolArguments) -> String {
        arguments
            .get("pattern")
            .and_then(|v| v.as_str())
            .map(|p| format!("'{p}'"))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: serde_json::Value) -> ToolArguments {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn finds_matches_with_line_numbers() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.go"), "package main\nfunc healthHandler() {}\n").unwrap();

        let tool = SearchTool::new(PathPolicy::new(dir.path(), vec![]));
        let output = tool
            .execute(&args(serde_json::json!({"pattern": "healthHandler"})))
            .await
            .unwrap();
        assert!(output.contains("2:func healthHandler"));
    }

    #[tokio::test]
    async fn no_matches_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "alpha\n").unwrap();

        let tool = SearchTool::new(PathPolicy::new(dir.path(), vec![]));
        let output = tool
            .execute(&args(serde_json::json!({"pattern": "zeta-not-present"})))
            .await
            .unwrap();
        assert_eq!(output, NO_MATCHES);
    }

    #[tokio::test]
    async fn pattern_starting_with_dash_is_not_a_flag() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "--verbose flag\n").unwrap();

        let tool = SearchTool::new(PathPolicy::new(dir.path(), vec![]));
        let output = tool
            .execute(&args(serde_json::json!({"pattern": "--verbose"})))
            .await
            .unwrap();
        assert!(output.contains("--verbose flag"));
    }

    #[test]
    fn digest_quotes_pattern() {
        let tool = SearchTool::new(PathPolicy::new(".", vec![]));
        assert_eq!(tool.describe(&args(serde_json::json!({"pattern": "TODO"}))), "'TODO'");
    }
}
