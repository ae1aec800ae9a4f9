use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use storyflow_core::{DecodingParams, GeneratedContent, strip_markdown_json};

use crate::ai_types::{
    ChatRequest, FunctionDef, Message, ResponseMessage, Tool, ToolChoice, ToolChoiceFunction,
};
use crate::client::{LlmClient, request_body};
use crate::error::LlmError;
use crate::strategy::{GenerationStrategy, Options};

/// Function the model is forced to call.
pub const STRUCTURED_TOOL_NAME: &str = "generate_structured_output";

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct StructuredArticle {
    title: String,
    description: String,
    body: String,
}

/// Forced function call with a strict title/description/body schema.
#[derive(Debug)]
pub struct StructuredStrategy {
    client: LlmClient,
    decoding: DecodingParams,
    system_prompt: Option<String>,
}

impl StructuredStrategy {
    #[must_use]
    pub const fn new(
        client: LlmClient,
        decoding: DecodingParams,
        system_prompt: Option<String>,
    ) -> Self {
        Self { client, decoding, system_prompt }
    }

    fn request(&self, prompt: &str) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system_prompt {
            messages.push(Message::system(system.as_str()));
        }
        messages.push(Message::user(prompt));

        let mut request = ChatRequest::new(self.client.model(), messages, &self.decoding);
        request.tools = Some(vec![Tool {
            tool_type: "function",
            function: FunctionDef {
                name: STRUCTURED_TOOL_NAME,
                parameters: article_schema(),
                strict: true,
            },
        }]);
        request.tool_choice = Some(ToolChoice {
            choice_type: "function",
            function: ToolChoiceFunction { name: STRUCTURED_TOOL_NAME },
        });
        request
    }
}

fn article_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "title": { "type": "string", "description": "Article title." },
            "description": { "type": "string", "description": "SEO-optimized article description." },
            "body": { "type": "string", "description": "Article content." }
        },
        "required": ["title", "description", "body"],
        "additionalProperties": false
    })
}

/// Pulls the tool arguments out of the reply.
///
/// Some compatible backends answer with the JSON object as plain content
/// instead of a tool call; that is accepted too.
fn arguments(message: &ResponseMessage) -> Result<&str, LlmError> {
    if let Some(call) = message.tool_calls.iter().find(|c| c.function.name == STRUCTURED_TOOL_NAME)
    {
        return Ok(call.function.arguments.as_str());
    }
    if let Some(call) = message.tool_calls.first() {
        return Err(LlmError::InvalidStructuredOutput(format!(
            "unexpected tool call '{}'",
            call.function.name
        )));
    }
    match message.content.as_deref().map(strip_markdown_json) {
        Some(content) if !content.is_empty() => Ok(content),
        _ => Err(LlmError::EmptyContent),
    }
}

pub(crate) fn parse_arguments(raw: &str) -> Result<GeneratedContent, LlmError> {
    if raw.trim().is_empty() {
        return Err(LlmError::EmptyContent);
    }
    let article: StructuredArticle = serde_json::from_str(raw)
        .map_err(|e| LlmError::InvalidStructuredOutput(e.to_string()))?;
    let content = GeneratedContent {
        title: article.title.trim().to_owned(),
        body: article.body.trim().to_owned(),
        seo_description: article.description.trim().to_owned(),
    };
    if content.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    Ok(content)
}

#[async_trait]
impl GenerationStrategy for StructuredStrategy {
    fn name(&self) -> &'static str {
        "structured"
    }

    async fn process_prompt(
        &self,
        prompt: &str,
        options: &Options,
    ) -> Result<GeneratedContent, LlmError> {
        let body = request_body(&self.request(prompt), options)?;
        let message = self.client.chat_completion(&body).await?;
        parse_arguments(arguments(&message)?)
    }
}
