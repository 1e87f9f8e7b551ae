//! # Tasksmith Core
//!
//! Domain types, traits, and error definitions for the Tasksmith planning
//! agent. This crate defines the model every other crate implements against.
//!
//! ## Design Philosophy
//!
//! The two outbound collaborators of a run are traits here:
//! - [`Provider`] — the completion service (an LLM endpoint)
//! - [`Tool`] / [`ToolRegistry`] — the action executor
//!
//! Implementations live in their respective crates, so the agent loops can be
//! exercised with scripted providers and temp-dir tools.

pub mod error;
pub mod event;
pub mod message;
pub mod plan;
pub mod provider;
pub mod state;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{
    Error, ExecutionError, ExtractionError, PlanningError, ProviderError, Result, ToolError,
    TransitionError,
};
pub use event::{EventBus, RunEvent};
pub use message::{Conversation, Message, MessageContent, Role};
pub use plan::{Plan, Task, TaskStatus};
pub use provider::{ContentBlock, Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use state::{RunId, RunState};
pub use tool::{Tool, ToolArguments, ToolCall, ToolRegistry, ToolResult};
