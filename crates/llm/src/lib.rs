//! Generation strategies for storyflow.
//!
//! A [`GenerationStrategy`] turns a rendered prompt into
//! [`GeneratedContent`](storyflow_core::GeneratedContent). Three backends
//! are provided, selected at startup by [`build_strategy`]:
//!
//! - [`DirectStrategy`]: single chat completion, raw text converted to an article
//! - [`StructuredStrategy`]: forced function call returning title, description and body
//! - [`ProxyStrategy`]: POST to an external endpoint that owns the model call

#![allow(missing_docs, reason = "Internal crate with self-explanatory API")]
#![allow(clippy::missing_errors_doc, reason = "Errors are self-explanatory from Result types")]

pub mod ai_types;
mod client;
mod direct;
pub mod error;
mod proxy;
mod strategy;
mod structured;


pub use client::{LlmClient, RETRY_DELAYS};
pub use direct::DirectStrategy;
pub use error::LlmError;
pub use proxy::ProxyStrategy;
pub use strategy::{GenerationStrategy, Options, build_strategy};
pub use structured::{STRUCTURED_TOOL_NAME, StructuredStrategy};
