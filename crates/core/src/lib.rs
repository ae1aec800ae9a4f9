//! Core types for storyflow
//!
//! Domain types shared by every other crate: pitches and their status
//! machine, prompt templates, queue items, generated content and the
//! startup configuration.

#![allow(missing_docs, reason = "Field names are self-explanatory")]
#![allow(clippy::missing_errors_doc, reason = "Errors are self-explanatory from Result types")]
#![allow(clippy::unwrap_used, reason = "Regex literals in LazyLock statics are checked by tests")]

mod config;
mod constants;
mod content;
mod env_config;
mod error;
mod json_utils;
mod pitch;
mod prompt;
mod queue;

pub use config::{
    Config, DecodingParams, GenerationConfig, PipelineConfig, SchedulerConfig, StorageConfig,
    StrategyKind, default_db_path,
};
pub use constants::*;
pub use content::{GeneratedContent, GenerationCommit, OutputTarget, StoredContent};
pub use env_config::{env_lookup, parse_with_default};
pub use error::{CoreError, Result};
pub use json_utils::{collapse_whitespace, strip_markdown_json, truncate_chars};
pub use pitch::{
    Actor, Pillar, Pitch, PitchAction, PitchContent, PitchEdit, PitchOrigin, PitchStatus,
    SideEffect, Transition,
};
pub use prompt::{
    NewPromptTemplate, PromptTemplate, PromptTier, RenderedPrompt, ResolvedPrompt, render_template,
};
pub use queue::{EnqueueOutcome, QueueItem, QueueItemStatus, QueueStats};
