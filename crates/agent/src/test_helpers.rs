//! Shared test helpers: a scripted provider and response builders.

use std::sync::Mutex;

use async_trait::async_trait;
use tasksmith_core::error::{ProviderError, ToolError};
use tasksmith_core::provider::{ContentBlock, Provider, ProviderRequest, ProviderResponse, Usage};
use tasksmith_core::tool::{Tool, ToolArguments, ToolCall, ToolRegistry};

/// A mock provider that replays a sequence of scripted responses.
///
/// Every request is captured for later inspection. Running past the end of
/// the script yields an `InvalidResponse` error.
pub struct ScriptedProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
    failure: Option<(usize, ProviderError)>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
            failure: None,
        }
    }

    /// Fail call number `index` (0-based) with `error` instead of replying.
    pub fn fail_on(mut self, index: usize, error: ProviderError) -> Self {
        self.failure = Some((index, error));
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The request received on call number `index` (0-based).
    pub fn request(&self, index: usize) -> ProviderRequest {
        self.requests.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let index = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len() - 1
        };

        if let Some((fail_at, error)) = &self.failure
            && *fail_at == index
        {
            return Err(error.clone());
        }

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(ProviderError::InvalidResponse(format!(
                "script exhausted at call #{index}"
            )));
        }
        Ok(responses.remove(0))
    }
}

/// A text-only response.
pub fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        usage: Some(Usage {
            input_tokens: 10,
            output_tokens: 5,
        }),
        ..ProviderResponse::text_only("mock-model", text)
    }
}

/// A response that requests the given tool calls.
pub fn tool_response(calls: Vec<ToolCall>) -> ProviderResponse {
    ProviderResponse {
        id: String::new(),
        model: "mock-model".into(),
        content: calls.into_iter().map(ContentBlock::ToolUse).collect(),
        usage: Some(Usage {
            input_tokens: 10,
            output_tokens: 5,
        }),
    }
}

pub fn tool_call(id: &str, name: &str, args: serde_json::Value) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments: args.as_object().cloned().unwrap_or_default(),
    }
}

/// Returns its `text` argument unchanged.
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo the given text"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": { "text": { "type": "string" } },
            "required": ["text"]
        })
    }

    async fn execute(&self, arguments: &ToolArguments) -> Result<String, ToolError> {
        arguments
            .get("text")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| ToolError::InvalidArguments("missing 'text'".into()))
    }

    fn describe(&self, arguments: &ToolArguments) -> String {
        arguments
            .get("text")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }
}

pub fn echo_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(EchoTool));
    registry
}
