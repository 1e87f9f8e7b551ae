//! Message and Conversation domain types.
//!
//! A conversation is replayed to the completion service on every round, so
//! each turn keeps its payload in a tagged [`MessageContent`] rather than a
//! loose string: consumers match exhaustively on what a turn carries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tool::{ToolCall, ToolResult};

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The agent side: instructions and tool results.
    User,
    /// The model side: text and tool invocations.
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// What a single turn carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    /// Plain natural-language text.
    Text { text: String },

    /// An assistant turn requesting actions, with any text emitted alongside.
    ToolInvocations { text: String, calls: Vec<ToolCall> },

    /// A user turn echoing action outputs back to the model.
    ToolResults { results: Vec<ToolResult> },
}

/// A single turn in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// The turn payload
    pub content: MessageContent,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: MessageContent) -> Self {
        Self {
            role,
            content,
            timestamp: Utc::now(),
        }
    }

    /// Create a new user text message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, MessageContent::Text { text: text.into() })
    }

    /// Create a new assistant text message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, MessageContent::Text { text: text.into() })
    }

    /// Create an assistant turn that requests tool invocations.
    pub fn tool_invocations(text: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        Self::new(
            Role::Assistant,
            MessageContent::ToolInvocations {
                text: text.into(),
                calls,
            },
        )
    }

    /// Create a user turn carrying the results of a batch of invocations.
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self::new(Role::User, MessageContent::ToolResults { results })
    }

    /// The natural-language text of this turn, if any.
    pub fn text(&self) -> &str {
        match &self.content {
            MessageContent::Text { text } | MessageContent::ToolInvocations { text, .. } => text,
            MessageContent::ToolResults { .. } => "",
        }
    }

    /// Tool invocations requested in this turn.
    pub fn tool_calls(&self) -> &[ToolCall] {
        match &self.content {
            MessageContent::ToolInvocations { calls, .. } => calls,
            MessageContent::Text { .. } | MessageContent::ToolResults { .. } => &[],
        }
    }
}

/// An ordered, append-only sequence of turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Ordered messages
    pub messages: Vec<Message>,

    /// When this conversation was created
    pub created_at: DateTime<Utc>,

    /// When the last message was added
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new empty conversation.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Start a conversation with a single user turn.
    pub fn seeded(text: impl Into<String>) -> Self {
        let mut conv = Self::new();
        conv.push(Message::user(text));
        conv
    }

    /// Add a message to the conversation.
    pub fn push(&mut self, message: Message) {
        self.updated_at = Utc::now();
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
