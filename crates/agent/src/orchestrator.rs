//! Orchestrator — plan once, then execute every task in plan order.
//!
//! The only component with end-to-end control. It owns the [`RunState`]
//! for the lifetime of a run and isolates task failures from each other:
//! a task that fails is recorded and the next one starts regardless.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tasksmith_config::AppConfig;
use tasksmith_core::error::Error;
use tasksmith_core::event::{EventBus, RunEvent};
use tasksmith_core::provider::Provider;
use tasksmith_core::state::RunState;
use tasksmith_core::tool::ToolRegistry;
use tracing::{info, warn};

use crate::executor::Executor;
use crate::model::ModelSettings;
use crate::planner::Planner;
use crate::summary::RunSummary;

pub struct Orchestrator {
    config: AppConfig,
    provider: Arc<dyn Provider>,
    /// Overrides the built-in registry when set
    tools: Option<Arc<ToolRegistry>>,
    event_bus: Arc<EventBus>,
}

impl Orchestrator {
    pub fn new(config: &AppConfig, provider: Arc<dyn Provider>, event_bus: Arc<EventBus>) -> Self {
        Self {
            config: config.clone(),
            provider,
            tools: None,
            event_bus,
        }
    }

    /// Use `tools` instead of the built-in registry for every run.
    pub fn with_tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Run `request` against `working_dir` and report the outcome.
    ///
    /// Fails only when the directory is missing or planning fails; task
    /// failures are reported in the returned summary.
    pub async fn run(&self, working_dir: &Path, request: &str) -> Result<RunSummary, Error> {
        let working_dir = match tokio::fs::canonicalize(working_dir).await {
            Ok(dir) if dir.is_dir() => dir,
            _ => return Err(Error::WorkingDirectoryNotFound(working_dir.to_path_buf())),
        };

        let mut state = RunState::new(&working_dir, request);
        info!(run_id = %state.id, dir = %working_dir.display(), "Run started");
        self.event_bus.publish(RunEvent::RunStarted {
            run_id: state.id.to_string(),
            working_dir: working_dir.display().to_string(),
            request: request.to_string(),
            timestamp: Utc::now(),
        });

        let tools = match &self.tools {
            Some(tools) => tools.clone(),
            None => Arc::new(tasksmith_tools::default_registry(&working_dir, &self.config.tools)),
        };
        let model = ModelSettings::from_config(&self.config);

        Planner::new(
            self.provider.clone(),
            tools.clone(),
            model.clone(),
            self.event_bus.clone(),
        )
        .with_settings(&self.config.agent)
        .generate_plan(&mut state)
        .await?;

        let task_ids = match state.plan() {
            Some(plan) if !plan.is_empty() => plan.task_ids(),
            _ => return Err(Error::Internal("no plan generated".into())),
        };

        let executor = Executor::new(self.provider.clone(), tools, model, self.event_bus.clone())
            .with_settings(&self.config.agent);

        for task_id in &task_ids {
            if let Err(e) = executor.execute_task(&mut state, task_id).await {
                warn!(task_id = %task_id, error = %e, "Task failed, continuing with the next one");
            }
        }
        if !state.all_tasks_terminal() {
            warn!(run_id = %state.id, "Run finished with tasks left unfinished");
        }

        let summary = RunSummary::from_state(&state);
        info!(
            completed = summary.completed,
            failed = summary.failed,
            pending = summary.pending,
            "Run finished"
        );
        self.event_bus.publish(RunEvent::RunFinished {
            completed: summary.completed,
            failed: summary.failed,
            pending: summary.pending,
            timestamp: Utc::now(),
        });

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use tasksmith_core::error::{PlanningError, ProviderError};

    fn orchestrator(provider: Arc<ScriptedProvider>) -> Orchestrator {
        Orchestrator::new(&AppConfig::default(), provider, Arc::new(EventBus::default()))
            .with_tools(Arc::new(echo_registry()))
    }

    fn echo(id: &str) -> tasksmith_core::provider::ProviderResponse {
        tool_response(vec![tool_call(id, "echo", serde_json::json!({ "text": "ok" }))])
    }

    #[tokio::test]
    async fn missing_directory_fails_before_any_call() {
        let provider = Arc::new(ScriptedProvider::new(vec![text_response("PLAN:\n1. a")]));
        let err = orchestrator(provider.clone())
            .run(Path::new("/definitely/not/a/real/dir"), "req")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::WorkingDirectoryNotFound(_)));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn file_is_not_a_working_directory() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let err = orchestrator(provider.clone())
            .run(file.path(), "req")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::WorkingDirectoryNotFound(_)));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn failed_task_does_not_stop_the_run() {
        let dir = tempfile::tempdir().unwrap();
        // call 0: plan; 1-2: task-1; 3: task-2 fails; 4-5: task-3
        let provider = Arc::new(
            ScriptedProvider::new(vec![
                text_response("PLAN:\n1. Add route\n2. Write handler\n3. Add test"),
                echo("toolu_1"),
                text_response("Task completed"),
                echo("toolu_3"),
                text_response("Task completed"),
            ])
            .fail_on(3, ProviderError::Network("connection reset".into())),
        );

        let summary = orchestrator(provider.clone())
            .run(dir.path(), "add a health endpoint")
            .await
            .unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(provider.call_count(), 6);
    }

    #[tokio::test]
    async fn planning_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let script: Vec<_> = (0..6).map(|_| text_response("still thinking")).collect();
        let provider = Arc::new(ScriptedProvider::new(script));

        let err = orchestrator(provider.clone())
            .run(dir.path(), "req")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Planning(PlanningError::NoValidPlan { .. })));
        assert_eq!(provider.call_count(), 6);
    }

    #[tokio::test]
    async fn run_finished_is_published() {
        let dir = tempfile::tempdir().unwrap();
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe();
        let provider = Arc::new(ScriptedProvider::new(vec![
            text_response("PLAN:\n1. Only step"),
            echo("toolu_1"),
            text_response("Task completed"),
        ]));
        let summary = Orchestrator::new(&AppConfig::default(), provider, bus.clone())
            .with_tools(Arc::new(echo_registry()))
            .run(dir.path(), "req")
            .await
            .unwrap();
        assert!(summary.all_completed());

        let mut first = None;
        let mut last = None;
        while let Ok(event) = rx.try_recv() {
            if first.is_none() {
                first = Some(event.clone());
            }
            last = Some(event);
        }
        assert!(matches!(first.as_deref(), Some(RunEvent::RunStarted { .. })));
        assert!(matches!(
            last.as_deref(),
            Some(RunEvent::RunFinished { completed: 1, failed: 0, pending: 0, .. })
        ));
    }
}
