//! Plan and Task domain types.
//!
//! A task walks `pending → in_progress → {completed | failed}` exactly once.
//! The transition methods enforce that path; nothing outside this module
//! assigns `status` directly.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TransitionError;

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of work in a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// `task-1`, `task-2`, … in plan order
    pub id: String,

    /// What to do
    pub description: String,

    status: TaskStatus,

    /// Summary set on completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Error text set on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// True when the task was completed because its round budget ran out
    /// rather than because the model reported completion.
    #[serde(default)]
    pub exhausted: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a pending task with the id for its 1-based plan position.
    pub fn new(position: usize, description: impl Into<String>) -> Self {
        Self {
            id: format!("task-{position}"),
            description: description.into(),
            status: TaskStatus::Pending,
            output: None,
            error: None,
            exhausted: false,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    fn transition(&mut self, allowed_from: TaskStatus, to: TaskStatus) -> Result<(), TransitionError> {
        if self.status != allowed_from {
            return Err(TransitionError {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// `pending → in_progress`.
    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.transition(TaskStatus::Pending, TaskStatus::InProgress)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// `in_progress → completed`.
    pub fn complete(&mut self, output: impl Into<String>) -> Result<(), TransitionError> {
        self.transition(TaskStatus::InProgress, TaskStatus::Completed)?;
        self.output = Some(output.into());
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// `in_progress → failed`.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), TransitionError> {
        self.transition(TaskStatus::InProgress, TaskStatus::Failed)?;
        self.error = Some(error.into());
        self.completed_at = Some(Utc::now());
        Ok(())
    }
}

/// An ordered, non-empty list of tasks produced once per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    tasks: Vec<Task>,

    pub summary: String,

    pub created_at: DateTime<Utc>,

    /// There is no human approval gate; plans are approved on creation.
    pub approved: bool,
}

impl Plan {
    /// Build a plan from task descriptions in order. Returns `None` when
    /// there are no descriptions: an empty plan is never constructed.
    pub fn from_descriptions<I, S>(descriptions: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tasks: Vec<Task> = descriptions
            .into_iter()
            .enumerate()
            .map(|(i, d)| Task::new(i + 1, d))
            .collect();

        if tasks.is_empty() {
            return None;
        }

        Some(Self {
            summary: format!("Plan with {} tasks", tasks.len()),
            tasks,
            created_at: Utc::now(),
            approved: true,
        })
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Mutable access for status transitions; the task list itself stays fixed.
    pub fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Task ids in execution order.
    pub fn task_ids(&self) -> Vec<String> {
        self.tasks.iter().map(|t| t.id.clone()).collect()
    }

    pub fn count(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status == status).count()
    }
}
