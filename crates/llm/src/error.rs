//! Typed error enum for the LLM crate.

use thiserror::Error;

/// Errors from generation backends.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Connection, TLS or timeout failure before a status line was read.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP status {code}: {body}")]
    HttpStatus { code: u16, body: String },
    #[error("JSON parse error in {context}: {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    /// The backend answered with no choices or no result field.
    #[error("empty response: {0}")]
    EmptyResponse(&'static str),
    /// The backend answered, but the generated text is blank.
    #[error("model returned empty content")]
    EmptyContent,
    #[error("invalid structured output: {0}")]
    InvalidStructuredOutput(String),
    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),
    #[error("client initialization failed: {0}")]
    ClientInit(String),
    #[error("all retries exhausted, last error: {0}")]
    RetriesExhausted(Box<LlmError>),
}

impl LlmError {
    /// Whether this error is transient and should be retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::HttpStatus { code, .. } => matches!(code, 429 | 500 | 502 | 503 | 529),
            _ => false,
        }
    }

    /// Whether the backend rejected the credentials.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::HttpStatus { code: 401 | 403, .. })
    }

    /// Short category name used as a failed item's reason prefix.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::HttpStatus { .. } if self.is_auth() => "auth",
            Self::HttpStatus { .. } => "http_status",
            Self::JsonParse { .. } | Self::EmptyResponse(_) => "malformed_response",
            Self::EmptyContent => "empty_content",
            Self::InvalidStructuredOutput(_) => "invalid_structured_output",
            Self::MissingConfig(_) | Self::ClientInit(_) => "configuration",
            Self::RetriesExhausted(inner) => inner.category(),
        }
    }
}
