//! Executor — runs one planned task through a bounded act/observe loop.

use std::sync::Arc;

use chrono::Utc;
use tasksmith_config::AgentSettings;
use tasksmith_core::error::ExecutionError;
use tasksmith_core::event::{EventBus, RunEvent};
use tasksmith_core::message::{Conversation, Message};
use tasksmith_core::provider::{Provider, ProviderResponse};
use tasksmith_core::state::RunState;
use tasksmith_core::tool::ToolRegistry;
use tracing::{debug, info, warn};

use crate::actions::{OutputLimit, run_actions};
use crate::model::ModelSettings;
use crate::prompts;

const TRUNCATION_MARKER: &str = "\n... (output truncated)";

/// Carries planned tasks to a terminal status.
pub struct Executor {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    model: ModelSettings,
    max_rounds: u32,
    output_limit: usize,
    /// Lowercase; matched as substrings of the lowercased reply.
    completion_phrases: Vec<String>,
    event_bus: Arc<EventBus>,
}

impl Executor {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        model: ModelSettings,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let defaults = AgentSettings::default();
        Self {
            provider,
            tools,
            model,
            max_rounds: defaults.execution_rounds,
            output_limit: defaults.execution_output_limit,
            completion_phrases: defaults.completion_phrases,
            event_bus,
        }
    }

    /// Apply the execution bounds and completion phrases from configuration.
    pub fn with_settings(mut self, settings: &AgentSettings) -> Self {
        self.max_rounds = settings.execution_rounds;
        self.output_limit = settings.execution_output_limit;
        self.completion_phrases = settings
            .completion_phrases
            .iter()
            .map(|p| p.to_lowercase())
            .collect();
        self
    }

    /// Run the task `task_id` to completion or failure.
    ///
    /// On `Ok` the task is `completed`. A completion service error marks it
    /// `failed` in `state` and is also returned; the caller decides whether
    /// the run continues.
    pub async fn execute_task(
        &self,
        state: &mut RunState,
        task_id: &str,
    ) -> Result<(), ExecutionError> {
        state.start_task(task_id)?;

        let (task, position, total) = {
            let plan = state
                .plan()
                .ok_or_else(|| ExecutionError::UnknownTask(task_id.to_string()))?;
            let position = plan
                .tasks()
                .iter()
                .position(|t| t.id == task_id)
                .ok_or_else(|| ExecutionError::UnknownTask(task_id.to_string()))?;
            (plan.tasks()[position].clone(), position + 1, plan.len())
        };

        info!(task_id, position, total, "Executing task: {}", task.description);
        self.event_bus.publish(RunEvent::TaskStarted {
            task_id: task_id.to_string(),
            description: task.description.clone(),
            position,
            total,
            timestamp: Utc::now(),
        });

        let mut conversation = Conversation::seeded(prompts::task_request(
            state.completed_tasks(),
            &task,
            &state.original_request,
        ));
        let definitions = self.tools.definitions();
        let limit = OutputLimit {
            chars: self.output_limit,
            marker: TRUNCATION_MARKER,
        };

        for round in 0..self.max_rounds {
            let response = match self
                .model
                .complete(
                    self.provider.as_ref(),
                    prompts::EXECUTOR_SYSTEM_PROMPT,
                    &conversation.messages,
                    definitions.clone(),
                )
                .await
            {
                Ok(response) => response,
                Err(source) => {
                    let error = source.to_string();
                    warn!(task_id, round, error = %error, "Completion service failed, failing task");
                    state.fail_task(task_id, error.clone())?;
                    self.event_bus.publish(RunEvent::TaskFailed {
                        task_id: task_id.to_string(),
                        error,
                        timestamp: Utc::now(),
                    });
                    return Err(ExecutionError::Provider {
                        task_id: task_id.to_string(),
                        source,
                    });
                }
            };
            self.report_usage(&response);

            let calls = response.tool_calls();
            let text = response.text();
            // An empty reply leaves no turn in history
            if !calls.is_empty() || !text.trim().is_empty() {
                conversation.push(response.to_message());
            }

            if !calls.is_empty() {
                let results = run_actions(&self.tools, &calls, limit, |call, result, duration_ms| {
                    self.event_bus.publish(RunEvent::ToolInvoked {
                        task_id: task_id.to_string(),
                        tool_name: call.name.clone(),
                        summary: self.tools.describe(call),
                        success: !result.is_error,
                        duration_ms,
                        timestamp: Utc::now(),
                    });
                })
                .await;
                conversation.push(Message::tool_results(results));
                continue;
            }

            if round > 0 && self.signals_completion(&text) {
                info!(task_id, rounds = round + 1, "Task completed");
                state.complete_task(task_id, text.clone(), false)?;
                state.push_message(Message::assistant(text));
                self.event_bus.publish(RunEvent::TaskCompleted {
                    task_id: task_id.to_string(),
                    exhausted: false,
                    timestamp: Utc::now(),
                });
                return Ok(());
            }

            if round == 0 && !text.trim().is_empty() {
                debug!(task_id, "First reply used no tools, nudging");
                conversation.push(Message::user(prompts::PROCEED_WITH_TOOLS));
            }
        }

        warn!(task_id, rounds = self.max_rounds, "Round budget spent, marking task complete");
        state.complete_task(task_id, prompts::EXHAUSTED_OUTPUT, true)?;
        state.push_message(Message::assistant(prompts::EXHAUSTED_OUTPUT));
        self.event_bus.publish(RunEvent::TaskCompleted {
            task_id: task_id.to_string(),
            exhausted: true,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    fn signals_completion(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.completion_phrases.iter().any(|p| lower.contains(p.as_str()))
    }

    fn report_usage(&self, response: &ProviderResponse) {
        if let Some(usage) = &response.usage {
            self.event_bus.publish(RunEvent::ResponseGenerated {
                model: response.model.clone(),
                tokens_used: usage.total(),
                timestamp: Utc::now(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use tasksmith_core::error::ProviderError;
    use tasksmith_core::message::MessageContent;
    use tasksmith_core::plan::{Plan, TaskStatus};

    fn executor(provider: Arc<ScriptedProvider>) -> Executor {
        Executor::new(
            provider,
            Arc::new(echo_registry()),
            ModelSettings::new("mock-model"),
            Arc::new(EventBus::default()),
        )
    }

    fn planned_state(tasks: &[&str]) -> RunState {
        let mut state = RunState::new("/tmp", "add a health endpoint");
        state.install_plan(Plan::from_descriptions(tasks.iter().copied()).unwrap());
        state
    }

    fn echo(id: &str, text: &str) -> ProviderResponse {
        tool_response(vec![tool_call(id, "echo", serde_json::json!({ "text": text }))])
    }

    #[tokio::test]
    async fn completes_after_acting() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            echo("toolu_1", "ok"),
            text_response("Task completed: route added."),
        ]));
        let mut state = planned_state(&["Add route"]);

        executor(provider.clone())
            .execute_task(&mut state, "task-1")
            .await
            .unwrap();

        let task = state.task("task-1").unwrap();
        assert_eq!(task.status(), TaskStatus::Completed);
        assert_eq!(task.output.as_deref(), Some("Task completed: route added."));
        assert!(!task.exhausted);
        assert_eq!(state.completed_tasks().len(), 1);
        assert!(state.current_task().is_none());
        assert_eq!(state.messages().len(), 1);
    }

    #[tokio::test]
    async fn completion_phrase_on_first_round_is_nudged() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            text_response("Task completed"),
            echo("toolu_1", "ok"),
            text_response("All done, task complete."),
        ]));
        let mut state = planned_state(&["Add route"]);

        executor(provider.clone())
            .execute_task(&mut state, "task-1")
            .await
            .unwrap();

        assert_eq!(provider.call_count(), 3);
        let second = provider.request(1);
        assert_eq!(second.messages.last().unwrap().text(), prompts::PROCEED_WITH_TOOLS);
        assert_eq!(
            state.task("task-1").unwrap().output.as_deref(),
            Some("All done, task complete.")
        );
    }

    #[tokio::test]
    async fn empty_reply_is_not_replayed() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            text_response(""),
            echo("toolu_1", "ok"),
            text_response("Task completed"),
        ]));
        let mut state = planned_state(&["Add route"]);

        executor(provider.clone())
            .execute_task(&mut state, "task-1")
            .await
            .unwrap();

        assert_eq!(provider.call_count(), 3);
        // No nudge and no empty assistant turn after the blank reply
        assert_eq!(provider.request(1).messages.len(), 1);
        let last = provider.request(2);
        assert!(
            last.messages
                .iter()
                .all(|m| !matches!(&m.content, MessageContent::Text { text } if text.is_empty()))
        );
        assert_eq!(state.task("task-1").unwrap().status(), TaskStatus::Completed);
    }

    #[tokio::test]
    async fn phrase_match_is_case_insensitive() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            echo("toolu_1", "ok"),
            text_response("SUCCESSFULLY COMPLETED the change"),
        ]));
        let mut state = planned_state(&["Add route"]);

        executor(provider.clone())
            .execute_task(&mut state, "task-1")
            .await
            .unwrap();
        assert_eq!(state.task("task-1").unwrap().status(), TaskStatus::Completed);
    }

    #[tokio::test]
    async fn provider_error_fails_task() {
        let provider = Arc::new(
            ScriptedProvider::new(vec![echo("toolu_1", "a"), echo("toolu_2", "b")])
                .fail_on(2, ProviderError::Network("connection reset".into())),
        );
        let mut state = planned_state(&["Add route", "Write handler"]);

        let err = executor(provider.clone())
            .execute_task(&mut state, "task-1")
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::Provider { ref task_id, .. } if task_id == "task-1"));
        let task = state.task("task-1").unwrap();
        assert_eq!(task.status(), TaskStatus::Failed);
        assert!(task.error.as_deref().unwrap().contains("connection reset"));
        assert_eq!(state.errors().len(), 1);
        assert!(state.completed_tasks().is_empty());
        assert!(state.current_task().is_none());
        assert_eq!(state.task("task-2").unwrap().status(), TaskStatus::Pending);
    }

    #[tokio::test]
    async fn exhausted_budget_is_soft_success() {
        let script: Vec<_> = (0..15).map(|i| echo(&format!("toolu_{i}"), "working")).collect();
        let provider = Arc::new(ScriptedProvider::new(script));
        let mut state = planned_state(&["Add route"]);

        executor(provider.clone())
            .execute_task(&mut state, "task-1")
            .await
            .unwrap();

        assert_eq!(provider.call_count(), 15);
        let task = state.task("task-1").unwrap();
        assert_eq!(task.status(), TaskStatus::Completed);
        assert_eq!(task.output.as_deref(), Some(prompts::EXHAUSTED_OUTPUT));
        assert!(task.exhausted);
    }

    #[tokio::test]
    async fn completed_tasks_seed_the_next_conversation() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            echo("toolu_1", "a"),
            text_response("Task completed"),
            echo("toolu_2", "b"),
            text_response("Task completed"),
        ]));
        let mut state = planned_state(&["Add route", "Write handler"]);
        let executor = executor(provider.clone());

        executor.execute_task(&mut state, "task-1").await.unwrap();
        executor.execute_task(&mut state, "task-2").await.unwrap();

        let seed = provider.request(2).messages[0].text().to_string();
        assert!(seed.starts_with("Previously completed tasks:\n- Add route\n"));
        assert!(seed.contains("Current task to implement:\nWrite handler"));
        // Each task starts from a fresh conversation
        assert_eq!(provider.request(2).messages.len(), 1);
        assert_eq!(
            provider.request(2).system.as_deref(),
            Some(prompts::EXECUTOR_SYSTEM_PROMPT)
        );
    }

    #[tokio::test]
    async fn tool_failure_is_observed_not_fatal() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_response(vec![tool_call("toolu_1", "missing", serde_json::json!({}))]),
            text_response("Task completed anyway"),
        ]));
        let mut state = planned_state(&["Add route"]);

        executor(provider.clone())
            .execute_task(&mut state, "task-1")
            .await
            .unwrap();

        match &provider.request(1).messages[2].content {
            MessageContent::ToolResults { results } => {
                assert!(results[0].is_error);
                assert!(results[0].output.starts_with("Error: "));
            }
            other => panic!("expected tool results, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn tool_invocations_are_published() {
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe();
        let provider = Arc::new(ScriptedProvider::new(vec![
            echo("toolu_1", "hello"),
            text_response("Task completed"),
        ]));
        let executor = Executor::new(
            provider,
            Arc::new(echo_registry()),
            ModelSettings::new("mock-model"),
            bus.clone(),
        );
        let mut state = planned_state(&["Say hello"]);
        executor.execute_task(&mut state, "task-1").await.unwrap();

        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            match event.as_ref() {
                RunEvent::TaskStarted { position, total, .. } => {
                    assert_eq!((*position, *total), (1, 1));
                    kinds.push("started");
                }
                RunEvent::ToolInvoked { tool_name, summary, success, .. } => {
                    assert_eq!(tool_name, "echo");
                    assert_eq!(summary, "hello");
                    assert!(*success);
                    kinds.push("tool");
                }
                RunEvent::TaskCompleted { exhausted, .. } => {
                    assert!(!*exhausted);
                    kinds.push("completed");
                }
                _ => {}
            }
        }
        assert_eq!(kinds, vec!["started", "tool", "completed"]);
    }

    #[tokio::test]
    async fn unknown_task_is_rejected() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let mut state = planned_state(&["Add route"]);
        let err = executor(provider.clone())
            .execute_task(&mut state, "task-9")
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::UnknownTask(_)));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn configured_phrases_replace_defaults() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            echo("toolu_1", "a"),
            text_response("Task completed"),
            text_response("ALL FINISHED"),
        ]));
        let mut state = planned_state(&["Add route"]);
        let settings = AgentSettings {
            completion_phrases: vec!["All Finished".into()],
            ..AgentSettings::default()
        };

        executor(provider.clone())
            .with_settings(&settings)
            .execute_task(&mut state, "task-1")
            .await
            .unwrap();
        assert_eq!(provider.call_count(), 3);
        assert_eq!(state.task("task-1").unwrap().output.as_deref(), Some("ALL FINISHED"));
    }
}
