//! LLM Provider implementations for Tasksmith.
//!
//! All providers implement the `tasksmith_core::Provider` trait.

pub mod anthropic;

use std::sync::Arc;

use tasksmith_config::AppConfig;
use tasksmith_core::{Provider, ProviderError};

pub use anthropic::AnthropicProvider;

/// Build the configured completion service.
///
/// The key comes only from the passed config, never from ambient process
/// state; callers apply environment overrides when loading the config.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config
        .api_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            ProviderError::NotConfigured(
                "no API key: set api_key in config.toml, TASKSMITH_API_KEY, or ANTHROPIC_API_KEY"
                    .into(),
            )
        })?;

    let provider = AnthropicProvider::from_settings(api_key, &config.provider)?;
    tracing::debug!(base_url = %config.provider.base_url, "Anthropic provider ready");
    Ok(Arc::new(provider))
}
