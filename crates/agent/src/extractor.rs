//! Plan extraction — turn free-form model output into an ordered task list.
//!
//! A plan section starts at the `PLAN:` marker. Each line after it that
//! starts with an ordinal (`1.`, `2)`, `17.`) or a bullet (`- `, `* `)
//! becomes one task; every other line is ignored.
//!
//! ```text
//! I looked at the router and the handlers.
//! PLAN:
//! 1. Add a /health route in cmd/server/main.go
//! 2. Write the handler
//! - Add a test for the handler
//! ```

use std::sync::LazyLock;

use regex_lite::Regex;
use tasksmith_core::error::ExtractionError;
use tasksmith_core::plan::Plan;
use tracing::{debug, warn};

/// The literal token that introduces a plan section.
pub const PLAN_MARKER: &str = "PLAN:";

static ORDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[.)]\s*").expect("ordinal pattern is a valid regex"));

/// Parses plan sections out of model responses.
#[derive(Debug, Clone, Default)]
pub struct PlanExtractor {
    /// 0 = no limit
    max_tasks: usize,
}

impl PlanExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of tasks a plan may contain. Extra items are dropped.
    pub fn with_max_tasks(mut self, max_tasks: usize) -> Self {
        self.max_tasks = max_tasks;
        self
    }

    /// Extract a plan from response text.
    ///
    /// [`ExtractionError::NoMarker`] means the model has not produced a plan
    /// yet; [`ExtractionError::NoTasks`] means it tried and nothing parsed.
    pub fn extract(&self, text: &str) -> Result<Plan, ExtractionError> {
        let Some((_, section)) = text.split_once(PLAN_MARKER) else {
            return Err(ExtractionError::NoMarker);
        };

        let mut descriptions: Vec<&str> = section.lines().filter_map(task_description).collect();

        if self.max_tasks > 0 && descriptions.len() > self.max_tasks {
            warn!(
                found = descriptions.len(),
                limit = self.max_tasks,
                "Plan exceeds the task limit, dropping extra items"
            );
            descriptions.truncate(self.max_tasks);
        }

        debug!(tasks = descriptions.len(), "Extracted plan section");
        Plan::from_descriptions(descriptions).ok_or(ExtractionError::NoTasks)
    }
}

/// The task text of a plan line, or `None` if the line is not a list item.
fn task_description(line: &str) -> Option<&str> {
    let line = line.trim();

    let rest = if let Some(m) = ORDINAL.find(line) {
        &line[m.end()..]
    } else if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        rest
    } else {
        return None;
    };

    let rest = rest.trim();
    (!rest.is_empty()).then_some(rest)
}
