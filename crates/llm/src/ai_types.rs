use serde::{Deserialize, Serialize};
use serde_json::Value;
use storyflow_core::DecodingParams;

#[derive(Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
}

impl ChatRequest {
    pub(crate) fn new(model: &str, messages: Vec<Message>, decoding: &DecodingParams) -> Self {
        Self {
            model: model.to_owned(),
            messages,
            max_tokens: decoding.max_tokens,
            temperature: decoding.temperature,
            top_p: decoding.top_p,
            frequency_penalty: decoding.frequency_penalty,
            presence_penalty: decoding.presence_penalty,
            tools: None,
            tool_choice: None,
        }
    }
}

#[derive(Serialize)]
pub(crate) struct Message {
    pub role: &'static str,
    pub content: String,
}

impl Message {
    pub(crate) fn system(content: impl Into<String>) -> Self {
        Self { role: "system", content: content.into() }
    }

    pub(crate) fn user(content: impl Into<String>) -> Self {
        Self { role: "user", content: content.into() }
    }
}

#[derive(Serialize)]
pub(crate) struct Tool {
    #[serde(rename = "type")]
    pub tool_type: &'static str,
    pub function: FunctionDef,
}

#[derive(Serialize)]
pub(crate) struct FunctionDef {
    pub name: &'static str,
    pub parameters: Value,
    pub strict: bool,
}

#[derive(Serialize)]
pub(crate) struct ToolChoice {
    #[serde(rename = "type")]
    pub choice_type: &'static str,
    pub function: ToolChoiceFunction,
}

#[derive(Serialize)]
pub(crate) struct ToolChoiceFunction {
    pub name: &'static str,
}

#[derive(Deserialize)]
pub(crate) struct ChatResponse {
    pub choices: Vec<Choice>,
}

#[derive(Deserialize)]
pub(crate) struct Choice {
    pub message: ResponseMessage,
}

/// Assistant message: plain text, tool calls, or both.
#[derive(Debug, Default, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Deserialize)]
pub struct ToolCall {
    pub function: FunctionCall,
}

#[derive(Debug, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Deserialize)]
pub(crate) struct ProxyResponse {
    #[serde(default)]
    pub result: Option<String>,
}
