//! Error types for the Tasksmith domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each phase of a run has its own error type; the top-level [`Error`]
//! is what the orchestrator reports to its caller.
//!
//! Propagation policy:
//! - [`ToolError`] never leaves the agent loops; it is fed back to the model
//!   as an erroring tool result.
//! - [`PlanningError`] is fatal to the run.
//! - [`ExecutionError`] is fatal to a single task only.

use std::path::PathBuf;

use thiserror::Error;

use crate::plan::TaskStatus;

/// The top-level error type for all Tasksmith operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Working directory does not exist: {}", .0.display())]
    WorkingDirectoryNotFound(PathBuf),

    #[error("Planning failed: {0}")]
    Planning(#[from] PlanningError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// A failure reported by the completion service.
///
/// The service contract treats failures as opaque text; the variants only
/// exist so callers can log something more useful than a status code.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    NotFound(String),

    #[error("{tool_name} failed: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("{tool_name} timed out after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Permission denied: {tool_name} — {reason}")]
    PermissionDenied { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

/// Why a response could not be turned into a plan.
///
/// Both variants mean "retry or abort"; neither ever produces a placeholder task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// The response never introduced a plan section.
    #[error("no plan present in response")]
    NoMarker,

    /// A plan section was present but no line looked like a task.
    #[error("plan section contained no recognizable tasks")]
    NoTasks,
}

#[derive(Debug, Clone, Error)]
pub enum PlanningError {
    #[error("completion service failed during planning: {0}")]
    Provider(#[from] ProviderError),

    #[error("failed to generate a valid plan after {rounds} exploration rounds: {reason}")]
    NoValidPlan {
        rounds: u32,
        reason: ExtractionError,
    },
}

#[derive(Debug, Clone, Error)]
pub enum ExecutionError {
    #[error("completion service failed on {task_id}: {source}")]
    Provider {
        task_id: String,
        #[source]
        source: ProviderError,
    },

    #[error("no task with id {0} in the current plan")]
    UnknownTask(String),

    #[error("task {task_id} cannot move from {} to {}", .source.from, .source.to)]
    InvalidTransition {
        task_id: String,
        #[source]
        source: TransitionError,
    },
}

/// An attempted task status change that leaves the lifecycle path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal task transition {from} -> {to}")]
pub struct TransitionError {
    pub from: TaskStatus,
    pub to: TaskStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::from(PlanningError::Provider(ProviderError::ApiError {
            status_code: 529,
            message: "Overloaded".into(),
        }));
        assert!(err.to_string().contains("529"));
        assert!(err.to_string().contains("Overloaded"));
    }

    #[test]
    fn tool_error_matches_executor_wording() {
        let err = ToolError::NotFound("deploy".into());
        assert_eq!(err.to_string(), "unknown tool: deploy");
    }

    #[test]
    fn planning_error_names_the_budget() {
        let err = PlanningError::NoValidPlan {
            rounds: 5,
            reason: ExtractionError::NoMarker,
        };
        let text = err.to_string();
        assert!(text.contains("5 exploration rounds"));
        assert!(text.contains("no plan present"));
    }

    #[test]
    fn execution_error_carries_task_id() {
        let err = ExecutionError::Provider {
            task_id: "task-2".into(),
            source: ProviderError::Network("connection reset".into()),
        };
        assert!(err.to_string().contains("task-2"));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn transition_error_displays_states() {
        let err = ExecutionError::InvalidTransition {
            task_id: "task-1".into(),
            source: TransitionError {
                from: TaskStatus::Completed,
                to: TaskStatus::InProgress,
            },
        };
        assert_eq!(
            err.to_string(),
            "task task-1 cannot move from completed to in_progress"
        );
    }
}
