use std::time::Duration;

use serde_json::{Map, Value};
use storyflow_core::truncate_chars;

use crate::ai_types::{ChatResponse, ResponseMessage};
use crate::error::LlmError;

/// Delay before each attempt; the first attempt is immediate.
pub const RETRY_DELAYS: [u64; 4] = [0, 1, 2, 4];

const ERROR_BODY_PREVIEW: usize = 200;

/// Client for OpenAI-compatible chat completion APIs.
pub struct LlmClient {
    pub(crate) client: reqwest::Client,
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    pub(crate) model: String,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("client", &self.client)
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

pub(crate) fn build_http_client(timeout: Duration) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder().timeout(timeout).build().map_err(|e| LlmError::ClientInit(e.to_string()))
}

impl LlmClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built (TLS backend failure).
    pub fn new(
        api_key: impl Into<String>,
        base_url: &str,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: build_http_client(timeout)?,
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            model: model.into(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a chat completion body and return the first choice's message.
    ///
    /// # Errors
    /// Returns an error if the request fails after retries, the body cannot
    /// be parsed, or the choices array is empty.
    pub async fn chat_completion(&self, body: &Value) -> Result<ResponseMessage, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let text = post_json_with_retry(&self.client, &url, &self.api_key, body).await?;
        let response: ChatResponse =
            serde_json::from_str(&text).map_err(|e| LlmError::JsonParse {
                context: format!(
                    "chat completion response (body: {})",
                    truncate_chars(&text, ERROR_BODY_PREVIEW)
                ),
                source: e,
            })?;
        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or(LlmError::EmptyResponse("no choices returned"))
    }
}

/// Serializes a request and lets caller options override its top-level keys.
pub(crate) fn request_body<T: serde::Serialize>(
    request: &T,
    options: &Map<String, Value>,
) -> Result<Value, LlmError> {
    let mut body = serde_json::to_value(request)
        .map_err(|e| LlmError::JsonParse { context: "request body".to_owned(), source: e })?;
    if let Value::Object(map) = &mut body {
        for (key, value) in options {
            map.insert(key.clone(), value.clone());
        }
    }
    Ok(body)
}

/// POST `body` with bearer auth, retrying transient failures.
///
/// Returns the response text of the first successful attempt.
pub(crate) async fn post_json_with_retry(
    client: &reqwest::Client,
    url: &str,
    bearer: &str,
    body: &Value,
) -> Result<String, LlmError> {
    let max_retries = RETRY_DELAYS.len().saturating_sub(1);
    let mut last_error: Option<LlmError> = None;

    for (attempt, delay_secs) in RETRY_DELAYS.iter().copied().enumerate() {
        if attempt > 0 {
            let delay = Duration::from_secs(delay_secs);
            tokio::time::sleep(delay).await;
            tracing::warn!(url, "LLM retry attempt {attempt}/{max_retries} after {delay:?}");
        }

        let response = match client.post(url).bearer_auth(bearer).json(body).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(error = %e, attempt, "transport failure");
                last_error = Some(LlmError::Transport(e));
                continue;
            },
        };

        let status = response.status();
        if status.is_success() {
            match response.text().await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    last_error = Some(LlmError::Transport(e));
                    continue;
                },
            }
        }

        let body = response.text().await.unwrap_or_else(|_| "Could not read error body".to_owned());
        let err = LlmError::HttpStatus {
            code: status.as_u16(),
            body: truncate_chars(&body, ERROR_BODY_PREVIEW).to_owned(),
        };
        if err.is_transient() {
            last_error = Some(err);
            continue;
        }
        return Err(err);
    }

    Err(LlmError::RetriesExhausted(Box::new(
        last_error.unwrap_or(LlmError::EmptyResponse("no attempt was made")),
    )))
}
