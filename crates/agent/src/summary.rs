//! End-of-run report.

use std::fmt;

use tasksmith_core::plan::TaskStatus;
use tasksmith_core::state::RunState;

/// Per-status counts and the error list of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub pending: usize,
    pub in_progress: usize,
    /// Completed only because the round budget ran out
    pub exhausted: usize,
    pub errors: Vec<String>,
}

impl RunSummary {
    pub fn from_state(state: &RunState) -> Self {
        let Some(plan) = state.plan() else {
            return Self {
                errors: state.errors().to_vec(),
                ..Self::default()
            };
        };

        Self {
            total: plan.len(),
            completed: plan.count(TaskStatus::Completed),
            failed: plan.count(TaskStatus::Failed),
            pending: plan.count(TaskStatus::Pending),
            in_progress: plan.count(TaskStatus::InProgress),
            exhausted: plan.tasks().iter().filter(|t| t.exhausted).count(),
            errors: state.errors().to_vec(),
        }
    }

    pub fn all_completed(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  Completed: {}", self.completed)?;
        if self.exhausted > 0 {
            write!(f, " ({} hit the round limit)", self.exhausted)?;
        }
        writeln!(f)?;
        if self.failed > 0 {
            writeln!(f, "  Failed: {}", self.failed)?;
        }
        if self.pending > 0 {
            writeln!(f, "  Pending: {}", self.pending)?;
        }
        if self.in_progress > 0 {
            writeln!(f, "  In progress: {}", self.in_progress)?;
        }

        if !self.errors.is_empty() {
            writeln!(f, "\nErrors encountered:")?;
            for err in &self.errors {
                writeln!(f, "  - {err}")?;
            }
        }

        if self.all_completed() {
            write!(f, "\nAll tasks completed successfully!")
        } else if self.completed > 0 {
            write!(
                f,
                "\nPartial completion: {}/{} tasks done",
                self.completed, self.total
            )
        } else {
            write!(f, "\nNo tasks completed")
        }
    }
}
