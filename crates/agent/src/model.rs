//! Completion service calls shared by the planner and the executor.

use std::time::Duration;

use tasksmith_config::AppConfig;
use tasksmith_core::error::ProviderError;
use tasksmith_core::message::Message;
use tasksmith_core::provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition};
use tracing::debug;

/// Model parameters and the per-call deadline.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// No deadline when `None`
    pub call_timeout: Option<Duration>,
}

impl ModelSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            call_timeout: None,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: Some(config.max_tokens),
            call_timeout: Some(Duration::from_secs(config.provider.request_timeout_secs)),
        }
    }

    /// Send one request, enforcing the deadline if one is set.
    pub(crate) async fn complete(
        &self,
        provider: &dyn Provider,
        system: &str,
        messages: &[Message],
        tools: Vec<ToolDefinition>,
    ) -> Result<ProviderResponse, ProviderError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            system: Some(system.to_string()),
            messages: messages.to_vec(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools,
        };

        debug!(
            provider = provider.name(),
            messages = messages.len(),
            tools = request.tools.len(),
            "Requesting completion"
        );

        match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, provider.complete(request))
                .await
                .map_err(|_| {
                    ProviderError::Timeout(format!("no response within {}s", limit.as_secs()))
                })?,
            None => provider.complete(request).await,
        }
    }
}
