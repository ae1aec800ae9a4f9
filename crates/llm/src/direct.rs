use async_trait::async_trait;
use storyflow_core::{DecodingParams, GeneratedContent};

use crate::ai_types::{ChatRequest, Message};
use crate::client::{LlmClient, request_body};
use crate::error::LlmError;
use crate::strategy::{GenerationStrategy, Options};

/// Single-shot chat completion; the reply text becomes the article.
#[derive(Debug)]
pub struct DirectStrategy {
    client: LlmClient,
    decoding: DecodingParams,
}

impl DirectStrategy {
    #[must_use]
    pub const fn new(client: LlmClient, decoding: DecodingParams) -> Self {
        Self { client, decoding }
    }
}

#[async_trait]
impl GenerationStrategy for DirectStrategy {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn process_prompt(
        &self,
        prompt: &str,
        options: &Options,
    ) -> Result<GeneratedContent, LlmError> {
        let request =
            ChatRequest::new(self.client.model(), vec![Message::user(prompt)], &self.decoding);
        let body = request_body(&request, options)?;
        let message = self.client.chat_completion(&body).await?;
        let text = message.content.unwrap_or_default();
        GeneratedContent::from_text(&text).ok_or(LlmError::EmptyContent)
    }
}
