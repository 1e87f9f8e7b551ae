//! Configuration loading, validation, and management for Tasksmith.
//!
//! Loads configuration from `~/.tasksmith/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.tasksmith/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Anthropic API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model used for both planning and execution
    #[serde(default = "default_model")]
    pub model: String,

    /// Max tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Completion service endpoint settings
    #[serde(default)]
    pub provider: ProviderSettings,

    /// Planner and executor loop bounds
    #[serde(default)]
    pub agent: AgentSettings,

    /// Action executor settings
    #[serde(default)]
    pub tools: ToolsConfig,
}

fn default_model() -> String {
    "claude-3-5-sonnet-20241022".into()
}
fn default_max_tokens() -> u32 {
    8192
}
fn default_temperature() -> f32 {
    0.7
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("provider", &self.provider)
            .field("agent", &self.agent)
            .field("tools", &self.tools)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Deadline per completion request, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.anthropic.com".into()
}
fn default_request_timeout() -> u64 {
    300
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Exploration rounds before the planner forces a plan
    #[serde(default = "default_planning_rounds")]
    pub planning_rounds: u32,

    /// Action rounds per task
    #[serde(default = "default_execution_rounds")]
    pub execution_rounds: u32,

    /// Max chars of tool output fed back during planning
    #[serde(default = "default_planning_output_limit")]
    pub planning_output_limit: usize,

    /// Max chars of tool output fed back during execution
    #[serde(default = "default_execution_output_limit")]
    pub execution_output_limit: usize,

    /// Case-insensitive substrings that mark a task as done
    #[serde(default = "default_completion_phrases")]
    pub completion_phrases: Vec<String>,

    /// 0 = no limit
    #[serde(default)]
    pub max_plan_tasks: usize,
}

fn default_planning_rounds() -> u32 {
    5
}
fn default_execution_rounds() -> u32 {
    15
}
fn default_planning_output_limit() -> usize {
    5000
}
fn default_execution_output_limit() -> usize {
    10000
}
fn default_completion_phrases() -> Vec<String> {
    vec![
        "task completed".into(),
        "task complete".into(),
        "successfully completed".into(),
        "done".into(),
    ]
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            planning_rounds: default_planning_rounds(),
            execution_rounds: default_execution_rounds(),
            planning_output_limit: default_planning_output_limit(),
            execution_output_limit: default_execution_output_limit(),
            completion_phrases: default_completion_phrases(),
            max_plan_tasks: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// First words a bash command may start with. Empty = allow any.
    #[serde(default)]
    pub allowed_commands: Vec<String>,

    #[serde(default = "default_forbidden_paths")]
    pub forbidden_paths: Vec<String>,

    /// Deadline per action, in seconds
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
}

fn default_forbidden_paths() -> Vec<String> {
    vec!["~/.ssh".into(), "~/.gnupg".into(), "~/.aws".into()]
}
fn default_command_timeout() -> u64 {
    120
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            allowed_commands: vec![],
            forbidden_paths: default_forbidden_paths(),
            command_timeout_secs: default_command_timeout(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.tasksmith/config.toml).
    ///
    /// Also checks environment variables:
    /// - `TASKSMITH_API_KEY` (highest priority), then `ANTHROPIC_API_KEY`
    /// - `TASKSMITH_MODEL`
    /// - `TASKSMITH_BASE_URL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides on top of file values.
    pub fn apply_env_overrides(&mut self) {
        if self.api_key.is_none() {
            self.api_key = std::env::var("TASKSMITH_API_KEY")
                .ok()
                .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
                .filter(|k| !k.is_empty());
        }

        if let Ok(model) = std::env::var("TASKSMITH_MODEL") {
            self.model = model;
        }

        if let Ok(url) = std::env::var("TASKSMITH_BASE_URL") {
            self.provider.base_url = url;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".tasksmith")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.planning_rounds == 0 || self.agent.execution_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "planning_rounds and execution_rounds must be > 0".into(),
            ));
        }

        if self.agent.planning_output_limit == 0 || self.agent.execution_output_limit == 0 {
            return Err(ConfigError::ValidationError(
                "tool output limits must be > 0".into(),
            ));
        }

        // An empty phrase would match every reply
        if self.agent.completion_phrases.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "completion_phrases must not contain empty entries".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            provider: ProviderSettings::default(),
            agent: AgentSettings::default(),
            tools: ToolsConfig::default(),
        }
    }
}

/// Get the user's home directory.
pub fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.model, "claude-3-5-sonnet-20241022");
        assert_eq!(config.max_tokens, 8192);
        assert_eq!(config.agent.planning_rounds, 5);
        assert_eq!(config.agent.execution_rounds, 15);
        assert_eq!(config.agent.planning_output_limit, 5000);
        assert_eq!(config.agent.execution_output_limit, 10000);
        assert_eq!(config.agent.max_plan_tasks, 0);
        assert_eq!(config.provider.base_url, "https://api.anthropic.com");
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model, config.model);
        assert_eq!(parsed.agent.completion_phrases, config.agent.completion_phrases);
        assert_eq!(parsed.tools.forbidden_paths, config.tools.forbidden_paths);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_round_bound_rejected() {
        let mut config = AppConfig::default();
        config.agent.execution_rounds = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("execution_rounds"));
    }

    #[test]
    fn zero_output_limit_rejected() {
        let mut config = AppConfig::default();
        config.agent.planning_output_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn blank_completion_phrase_rejected() {
        let mut config = AppConfig::default();
        config.agent.completion_phrases = vec!["all done".into(), "  ".into()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("completion_phrases"));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        let config = result.unwrap();
        assert_eq!(config.agent.planning_rounds, 5);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
model = "claude-sonnet-4-20250514"

[agent]
execution_rounds = 3
completion_phrases = ["all finished"]

[tools]
allowed_commands = ["ls", "cat"]
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.model, "claude-sonnet-4-20250514");
        assert_eq!(config.agent.execution_rounds, 3);
        assert_eq!(config.agent.planning_rounds, 5);
        assert_eq!(config.agent.completion_phrases, vec!["all finished"]);
        assert_eq!(config.tools.allowed_commands, vec!["ls", "cat"]);
        assert_eq!(config.tools.command_timeout_secs, 120);
    }

    #[test]
    fn unparsable_file_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "model = [unterminated").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn invalid_file_values_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[agent]\nplanning_rounds = 0").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-ant-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("sk-ant-secret"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("claude-3-5-sonnet-20241022"));
        assert!(toml_str.contains("[agent]"));
        assert!(!toml_str.contains("api_key"));
    }

    #[test]
    fn has_api_key_ignores_empty() {
        let config = AppConfig {
            api_key: Some(String::new()),
            ..AppConfig::default()
        };
        assert!(!config.has_api_key());
    }
}
