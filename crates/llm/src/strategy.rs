//! The strategy seam and startup selection.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use storyflow_core::{GeneratedContent, GenerationConfig, StrategyKind};

use crate::client::LlmClient;
use crate::direct::DirectStrategy;
use crate::error::LlmError;
use crate::proxy::ProxyStrategy;
use crate::structured::StructuredStrategy;

/// Per-call overrides merged into the backend request.
pub type Options = Map<String, Value>;

/// Turns a rendered prompt into an article.
#[async_trait]
pub trait GenerationStrategy: Send + Sync {
    /// Stable name stored alongside generated content.
    fn name(&self) -> &'static str;

    async fn process_prompt(
        &self,
        prompt: &str,
        options: &Options,
    ) -> Result<GeneratedContent, LlmError>;
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// Builds the configured strategy.
///
/// # Errors
/// Returns `MissingConfig` when the selected backend lacks its API key,
/// endpoint or token.
pub fn build_strategy(config: &GenerationConfig) -> Result<Arc<dyn GenerationStrategy>, LlmError> {
    let strategy: Arc<dyn GenerationStrategy> = match config.strategy {
        StrategyKind::Direct | StrategyKind::Structured => {
            let api_key =
                non_blank(config.api_key.as_ref()).ok_or(LlmError::MissingConfig("API key"))?;
            let client =
                LlmClient::new(api_key, &config.api_url, config.model.clone(), config.http_timeout)?;
            if config.strategy == StrategyKind::Direct {
                Arc::new(DirectStrategy::new(client, config.decoding))
            } else {
                Arc::new(StructuredStrategy::new(
                    client,
                    config.decoding,
                    non_blank(config.system_prompt.as_ref()).map(ToOwned::to_owned),
                ))
            }
        },
        StrategyKind::Proxy => {
            let url = non_blank(config.proxy_url.as_ref())
                .ok_or(LlmError::MissingConfig("proxy endpoint"))?;
            let token = non_blank(config.proxy_token.as_ref())
                .ok_or(LlmError::MissingConfig("proxy token"))?;
            Arc::new(ProxyStrategy::new(url, token, config.http_timeout)?)
        },
    };
    tracing::info!(strategy = strategy.name(), "generation strategy ready");
    Ok(strategy)
}
