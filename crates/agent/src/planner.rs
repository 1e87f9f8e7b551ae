//! Planner — bounded exploration followed by plan extraction.
//!
//! ```text
//! seed request ──▶ round 1..N ──tool calls──▶ run tools, feed results back
//!                      │
//!                      └─text──▶ extract PLAN: ──ok──▶ install plan
//!                                       │
//!                                       └─none──▶ next round
//! budget spent ──▶ one request without tools ──▶ extract or fail
//! ```

use std::sync::Arc;

use chrono::Utc;
use tasksmith_config::AgentSettings;
use tasksmith_core::error::PlanningError;
use tasksmith_core::event::{EventBus, RunEvent};
use tasksmith_core::message::{Conversation, Message};
use tasksmith_core::plan::Plan;
use tasksmith_core::provider::{Provider, ProviderResponse};
use tasksmith_core::state::RunState;
use tasksmith_core::tool::ToolRegistry;
use tracing::{debug, info, warn};

use crate::actions::{OutputLimit, run_actions};
use crate::extractor::PlanExtractor;
use crate::model::ModelSettings;
use crate::prompts;

const TRUNCATION_MARKER: &str = "\n... (truncated)";

/// Explores the working directory and produces the run's plan.
pub struct Planner {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    model: ModelSettings,
    extractor: PlanExtractor,
    /// Exploration rounds before the forced final request.
    max_rounds: u32,
    /// Max chars of one tool output fed back to the model.
    output_limit: usize,
    event_bus: Arc<EventBus>,
}

impl Planner {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        model: ModelSettings,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            provider,
            tools,
            model,
            extractor: PlanExtractor::new(),
            max_rounds: 5,
            output_limit: 5000,
            event_bus,
        }
    }

    /// Apply the planning bounds from configuration.
    pub fn with_settings(mut self, settings: &AgentSettings) -> Self {
        self.max_rounds = settings.planning_rounds;
        self.output_limit = settings.planning_output_limit;
        self.extractor = PlanExtractor::new().with_max_tasks(settings.max_plan_tasks);
        self
    }

    pub fn with_output_limit(mut self, chars: usize) -> Self {
        self.output_limit = chars;
        self
    }

    /// Produce a plan and install it into `state`.
    ///
    /// Either a complete plan is installed or the state is left without one.
    /// The working conversation is local and dropped when planning ends.
    pub async fn generate_plan(&self, state: &mut RunState) -> Result<(), PlanningError> {
        self.event_bus.publish(RunEvent::PlanningStarted {
            timestamp: Utc::now(),
        });
        info!(run_id = %state.id, max_rounds = self.max_rounds, "Planning started");

        let mut conversation = Conversation::seeded(prompts::planning_request(&state.original_request));
        let definitions = self.tools.definitions();
        let limit = OutputLimit {
            chars: self.output_limit,
            marker: TRUNCATION_MARKER,
        };

        for round in 1..=self.max_rounds {
            let response = self
                .model
                .complete(
                    self.provider.as_ref(),
                    prompts::PLANNER_SYSTEM_PROMPT,
                    &conversation.messages,
                    definitions.clone(),
                )
                .await?;
            self.report_usage(&response);

            let calls = response.tool_calls();
            if !calls.is_empty() {
                conversation.push(response.to_message());
                let results = run_actions(&self.tools, &calls, limit, |call, _, _| {
                    self.event_bus.publish(RunEvent::ExplorationStep {
                        round,
                        tool_name: call.name.clone(),
                        timestamp: Utc::now(),
                    });
                })
                .await;
                conversation.push(Message::tool_results(results));
                continue;
            }

            let text = response.text();
            match self.extractor.extract(&text) {
                Ok(plan) => {
                    self.install(state, plan, round);
                    return Ok(());
                }
                Err(reason) => {
                    debug!(round, %reason, "No plan in exploration response");
                    if !text.trim().is_empty() {
                        conversation.push(Message::assistant(text));
                        conversation.push(Message::user(prompts::CONTINUE_PLANNING));
                    }
                }
            }
        }

        warn!(rounds = self.max_rounds, "Exploration budget spent without a plan, forcing one");
        conversation.push(Message::user(prompts::FINAL_PLAN_REQUEST));

        let response = self
            .model
            .complete(
                self.provider.as_ref(),
                prompts::PLANNER_SYSTEM_PROMPT,
                &conversation.messages,
                Vec::new(),
            )
            .await?;
        self.report_usage(&response);

        let plan = self
            .extractor
            .extract(&response.text())
            .map_err(|reason| PlanningError::NoValidPlan {
                rounds: self.max_rounds,
                reason,
            })?;
        self.install(state, plan, self.max_rounds + 1);
        Ok(())
    }

    fn install(&self, state: &mut RunState, plan: Plan, round: u32) {
        info!(tasks = plan.len(), round, "Generated plan");
        self.event_bus.publish(RunEvent::PlanCreated {
            tasks: plan.tasks().iter().map(|t| t.description.clone()).collect(),
            timestamp: Utc::now(),
        });
        state.install_plan(plan);
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
