//! Provider trait — the abstraction over the completion service.
//!
//! A Provider takes a conversation, a system instruction and an optional set
//! of tool schemas, and returns either text or structured tool invocations.
//! The planner and executor only ever see this trait, which is what lets the
//! tests drive them with scripted responses.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::Message;
use crate::tool::ToolCall;

/// One request to the completion service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "claude-3-5-sonnet-20241022")
    pub model: String,

    /// System instruction, sent outside the conversation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// The full conversation history
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Available tools the model can call; empty disables tool use
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

fn default_temperature() -> f32 {
    0.7
}

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub input_schema: serde_json::Value,
}

/// A block of model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    ToolUse(ToolCall),
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Provider-assigned response id
    #[serde(default)]
    pub id: String,

    /// Which model actually responded (may differ from requested)
    pub model: String,

    /// Content blocks in the order the model produced them
    pub content: Vec<ContentBlock>,

    /// Token usage statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl ProviderResponse {
    /// A response holding a single text block.
    pub fn text_only(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            model: model.into(),
            content: vec![ContentBlock::Text { text: text.into() }],
            usage: None,
        }
    }

    /// All text blocks concatenated in order.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::ToolUse(_) => None,
            })
            .collect()
    }

    /// Tool invocations requested by the model.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolUse(call) => Some(call.clone()),
                ContentBlock::Text { .. } => None,
            })
            .collect()
    }

    /// Convert into the assistant turn that is replayed in history.
    pub fn to_message(&self) -> Message {
        let calls = self.tool_calls();
        if calls.is_empty() {
            Message::assistant(self.text())
        } else {
            Message::tool_invocations(self.text(), calls)
        }
    }
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Usage {
    pub fn total(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// The core Provider trait.
///
/// Failures are opaque to the agent: any `Err` aborts the current phase
/// (planning, or one task's loop).
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "anthropic").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> std::result::Result<ProviderResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageContent;

    fn tool_use(id: &str) -> ContentBlock {
        ContentBlock::ToolUse(ToolCall {
            id: id.into(),
            name: "read_file".into(),
            arguments: serde_json::json!({"path": "go.mod"})
                .as_object()
                .cloned()
                .unwrap(),
        })
    }

    #[test]
    fn text_joins_blocks_in_order() {
        let resp = ProviderResponse {
            id: "msg_1".into(),
            model: "m".into(),
            content: vec![
                ContentBlock::Text { text: "PLAN:\n".into() },
                ContentBlock::Text { text: "1. Do it".into() },
            ],
            usage: None,
        };
        assert_eq!(resp.text(), "PLAN:\n1. Do it");
        assert!(resp.tool_calls().is_empty());
    }

    #[test]
    fn tool_use_response_becomes_invocation_turn() {
        let resp = ProviderResponse {
            id: "msg_2".into(),
            model: "m".into(),
            content: vec![ContentBlock::Text { text: "Reading".into() }, tool_use("toolu_1")],
            usage: Some(Usage {
                input_tokens: 10,
                output_tokens: 5,
            }),
        };
        assert_eq!(resp.tool_calls().len(), 1);
        let msg = resp.to_message();
        match msg.content {
            MessageContent::ToolInvocations { text, calls } => {
                assert_eq!(text, "Reading");
                assert_eq!(calls[0].id, "toolu_1");
            }
            other => panic!("expected tool invocations, got {other:?}"),
        }
        assert_eq!(resp.usage.unwrap().total(), 15);
    }

    #[test]
    fn usage_total_saturates() {
        let usage = Usage {
            input_tokens: u32::MAX,
            output_tokens: 1,
        };
        assert_eq!(usage.total(), u32::MAX);
    }

    #[test]
    fn tool_definition_serialization() {
        let tool = ToolDefinition {
            name: "bash".into(),
            description: "Execute bash commands in the working directory".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "command": { "type": "string", "description": "The bash command to execute" }
                },
                "required": ["command"]
            }),
        };
        let json = serde_json::to_string(&tool).unwrap();
        assert!(json.contains("bash"));
        assert!(json.contains("input_schema"));
    }
}
