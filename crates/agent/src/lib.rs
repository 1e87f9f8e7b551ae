//! The agent control loop — plan once, then act on each task.
//!
//! A run has two phases:
//!
//! 1. **Planning**: the [`Planner`] explores the working directory with
//!    tools for a bounded number of rounds until the model emits a
//!    `PLAN:` section, which the [`PlanExtractor`] turns into tasks
//! 2. **Execution**: the [`Executor`] runs each task through its own
//!    bounded act/observe loop until the model announces completion
//!
//! The [`Orchestrator`] sequences both phases, isolates task failures, and
//! returns a [`RunSummary`]. Progress is published on the
//! [`EventBus`](tasksmith_core::EventBus); nothing in this crate prints.

mod actions;
pub mod executor;
pub mod extractor;
pub mod model;
pub mod orchestrator;
pub mod planner;
pub mod prompts;
pub mod summary;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use executor::Executor;
pub use extractor::{PLAN_MARKER, PlanExtractor};
pub use model::ModelSettings;
pub use orchestrator::Orchestrator;
pub use planner::Planner;
pub use summary::RunSummary;
