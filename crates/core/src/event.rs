//! Run events — progress notifications published while a run executes.
//!
//! The agent crate never prints. It publishes events here and whoever is
//! driving the run (the CLI, a test) subscribes and renders them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Everything observable about a run's progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    RunStarted {
        run_id: String,
        working_dir: String,
        request: String,
        timestamp: DateTime<Utc>,
    },

    PlanningStarted { timestamp: DateTime<Utc> },

    /// The planner ran an exploration action.
    ExplorationStep {
        round: u32,
        tool_name: String,
        timestamp: DateTime<Utc>,
    },

    PlanCreated {
        tasks: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    TaskStarted {
        task_id: String,
        description: String,
        position: usize,
        total: usize,
        timestamp: DateTime<Utc>,
    },

    /// The executor ran an action for the current task.
    ToolInvoked {
        task_id: String,
        tool_name: String,
        summary: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    TaskCompleted {
        task_id: String,
        exhausted: bool,
        timestamp: DateTime<Utc>,
    },

    TaskFailed {
        task_id: String,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// The completion service answered a request.
    ResponseGenerated {
        model: String,
        tokens_used: u32,
        timestamp: DateTime<Utc>,
    },

    RunFinished {
        completed: usize,
        failed: usize,
        pending: usize,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for run events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<RunEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: RunEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<RunEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(RunEvent::TaskFailed {
            task_id: "task-2".into(),
            error: "Network error: reset".into(),
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            RunEvent::TaskFailed { task_id, error, .. } => {
                assert_eq!(task_id, "task-2");
                assert!(error.contains("reset"));
            }
            other => panic!("Expected TaskFailed event, got {other:?}"),
        }
    }

    #[test]
    fn event_bus_no_subscribers_doesnt_panic() {
        let bus = EventBus::new(16);
        bus.publish(RunEvent::PlanningStarted {
            timestamp: Utc::now(),
        });
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = RunEvent::TaskCompleted {
            task_id: "task-1".into(),
            exhausted: true,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "task_completed");
        assert_eq!(json["exhausted"], true);
    }
}
