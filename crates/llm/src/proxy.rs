use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use storyflow_core::{GeneratedContent, truncate_chars};

use crate::ai_types::ProxyResponse;
use crate::client::{build_http_client, post_json_with_retry};
use crate::error::LlmError;
use crate::strategy::{GenerationStrategy, Options};

/// Delegates generation to an external endpoint.
///
/// Request: `{"prompt": …, "options": …}` with bearer auth.
/// Response: `{"result": "<article text>"}`.
pub struct ProxyStrategy {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl std::fmt::Debug for ProxyStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyStrategy")
            .field("endpoint", &self.endpoint)
            .field("token", &"***")
            .finish_non_exhaustive()
    }
}

impl ProxyStrategy {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: build_http_client(timeout)?,
            endpoint: endpoint.into(),
            token: token.into(),
        })
    }
}

#[async_trait]
impl GenerationStrategy for ProxyStrategy {
    fn name(&self) -> &'static str {
        "proxy"
    }

    async fn process_prompt(
        &self,
        prompt: &str,
        options: &Options,
    ) -> Result<GeneratedContent, LlmError> {
        let body = json!({ "prompt": prompt, "options": options });
        let text = post_json_with_retry(&self.client, &self.endpoint, &self.token, &body).await?;
        let response: ProxyResponse =
            serde_json::from_str(&text).map_err(|e| LlmError::JsonParse {
                context: format!("proxy response (body: {})", truncate_chars(&text, 200)),
                source: e,
            })?;
        let result = response.result.ok_or(LlmError::EmptyResponse("no result field"))?;
        GeneratedContent::from_text(&result).ok_or(LlmError::EmptyContent)
    }
}
