//! Run state — the mutable record of one agent run.
//!
//! Owned by the orchestrator for the lifetime of a run. The planner and the
//! executor receive it by `&mut` and change it only through the methods here.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::ExecutionError;
use crate::message::Message;
use crate::plan::{Plan, Task};

/// Unique identifier for a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    pub id: RunId,

    /// The directory every action is scoped to
    pub working_dir: PathBuf,

    /// The natural-language request as given
    pub original_request: String,

    /// Append-only history shared across phases
    messages: Vec<Message>,

    plan: Option<Plan>,

    /// Id of the task currently executing
    current_task: Option<String>,

    /// Snapshots taken at completion time, in completion order
    completed_tasks: Vec<Task>,

    /// One entry per failed task, in failure order
    errors: Vec<String>,
}

impl RunState {
    pub fn new(working_dir: impl Into<PathBuf>, request: impl Into<String>) -> Self {
        Self {
            id: RunId::new(),
            working_dir: working_dir.into(),
            original_request: request.into(),
            messages: Vec::new(),
            plan: None,
            current_task: None,
            completed_tasks: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    /// Install the plan produced by the planner.
    pub fn install_plan(&mut self, plan: Plan) {
        if self.plan.is_some() {
            warn!(run_id = %self.id, "Replacing an already installed plan");
        }
        self.plan = Some(plan);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn completed_tasks(&self) -> &[Task] {
        &self.completed_tasks
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.plan.as_ref().and_then(|p| p.task(id))
    }

    /// The task currently in progress, if any.
    pub fn current_task(&self) -> Option<&Task> {
        self.current_task.as_deref().and_then(|id| self.task(id))
    }

    /// True once a plan exists and every task reached a terminal state.
    pub fn all_tasks_terminal(&self) -> bool {
        self.plan
            .as_ref()
            .is_some_and(|p| p.tasks().iter().all(|t| t.status().is_terminal()))
    }

    fn task_mut(&mut self, id: &str) -> Result<&mut Task, ExecutionError> {
        self.plan
            .as_mut()
            .and_then(|p| p.task_mut(id))
            .ok_or_else(|| ExecutionError::UnknownTask(id.to_string()))
    }

    /// `pending → in_progress`; the task becomes the current task.
    pub fn start_task(&mut self, id: &str) -> Result<(), ExecutionError> {
        let task = self.task_mut(id)?;
        task.start()
            .map_err(|source| ExecutionError::InvalidTransition {
                task_id: id.to_string(),
                source,
            })?;
        self.current_task = Some(id.to_string());
        Ok(())
    }

    /// `in_progress → completed`, recording a snapshot in the completed list.
    pub fn complete_task(
        &mut self,
        id: &str,
        output: impl Into<String>,
        exhausted: bool,
    ) -> Result<(), ExecutionError> {
        let task = self.task_mut(id)?;
        task.complete(output)
            .map_err(|source| ExecutionError::InvalidTransition {
                task_id: id.to_string(),
                source,
            })?;
        task.exhausted = exhausted;
        let snapshot = task.clone();
        self.completed_tasks.push(snapshot);
        self.clear_current(id);
        Ok(())
    }

    /// `in_progress → failed`, appending the error to the run's error list.
    pub fn fail_task(&mut self, id: &str, error: impl Into<String>) -> Result<(), ExecutionError> {
        let error = error.into();
        let task = self.task_mut(id)?;
        task.fail(error.clone())
            .map_err(|source| ExecutionError::InvalidTransition {
                task_id: id.to_string(),
                source,
            })?;
        self.errors.push(error);
        self.clear_current(id);
        Ok(())
    }

    fn clear_current(&mut self, id: &str) {
        if self.current_task.as_deref() == Some(id) {
            self.current_task = None;
        }
    }
}
