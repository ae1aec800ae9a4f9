//! Async trait implementations for SQLite `Storage` via `spawn_blocking`.

use async_trait::async_trait;
use storyflow_core::{
    EnqueueOutcome, GeneratedContent, GenerationCommit, NewPromptTemplate, OutputTarget, Pitch,
    PitchContent, PitchOrigin, PitchStatus, PromptTemplate, QueueItem, QueueItemStatus, QueueStats, StoredContent,
};

use crate::Storage;
use crate::error::StorageError;
use crate::traits::{ContentStore, PitchStore, PromptTemplateStore, QueueStore};

/// Helper: run a blocking closure on the tokio blocking pool.
async fn blocking<F, T>(f: F) -> Result<T, StorageError>
where
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

/// Body-generating macro for async-to-blocking delegation.
///
/// Each argument is annotated with a capture kind:
/// - `@ref arg`     : `.clone()` a `&T`, pass as `&arg`
/// - `@str arg`     : `.to_owned()` a `&str`, pass as `&arg`
/// - `@opt_str arg` : `.map(ToOwned::to_owned)` an `Option<&str>`, pass as `arg.as_deref()`
/// - `@slice arg`   : `.to_vec()` a `&[T]`, pass as `&arg`
/// - `@val arg`     : move directly (Copy/owned types)
macro_rules! delegate {
    ($self:ident, $method:ident $(, @$kind:ident $arg:ident)*) => {{
        let s = $self.clone();
        $(delegate!(@capture $kind $arg);)*
        blocking(move || s.$method($(delegate!(@pass $kind $arg)),*)).await
    }};
    (@capture ref $arg:ident) => { let $arg = $arg.clone(); };
    (@capture str $arg:ident) => { let $arg = $arg.to_owned(); };
    (@capture opt_str $arg:ident) => { let $arg = $arg.map(ToOwned::to_owned); };
    (@capture slice $arg:ident) => { let $arg = $arg.to_vec(); };
    (@capture val $arg:ident) => { };
    (@pass ref $arg:ident) => { &$arg };
    (@pass str $arg:ident) => { &$arg };
    (@pass opt_str $arg:ident) => { $arg.as_deref() };
    (@pass slice $arg:ident) => { &$arg };
    (@pass val $arg:ident) => { $arg };
}

// ── PitchStore ───────────────────────────────────────────────────

#[async_trait]
impl PitchStore for Storage {
    async fn create_pitch(
        &self,
        content: &PitchContent,
        origin: PitchOrigin,
    ) -> Result<Pitch, StorageError> {
        delegate!(self, create_pitch, @ref content, @val origin)
    }
    async fn get_pitch(&self, id: i64) -> Result<Option<Pitch>, StorageError> {
        delegate!(self, get_pitch, @val id)
    }
    async fn list_pitches(
        &self,
        status: Option<PitchStatus>,
        limit: usize,
    ) -> Result<Vec<Pitch>, StorageError> {
        delegate!(self, list_pitches, @val status, @val limit)
    }
    async fn pitch_ids_with_status(&self, status: PitchStatus) -> Result<Vec<i64>, StorageError> {
        delegate!(self, pitch_ids_with_status, @val status)
    }
    async fn update_pitch_content(
        &self,
        id: i64,
        content: &PitchContent,
        expected: PitchStatus,
    ) -> Result<Pitch, StorageError> {
        delegate!(self, update_pitch_content, @val id, @ref content, @val expected)
    }
    async fn update_pitch_status(
        &self,
        id: i64,
        from: PitchStatus,
        to: PitchStatus,
    ) -> Result<Pitch, StorageError> {
        delegate!(self, update_pitch_status, @val id, @val from, @val to)
    }
}

// ── PromptTemplateStore ──────────────────────────────────────────

#[async_trait]
impl PromptTemplateStore for Storage {
    async fn create_template(
        &self,
        template: &NewPromptTemplate,
    ) -> Result<PromptTemplate, StorageError> {
        delegate!(self, create_template, @ref template)
    }
    async fn get_template(&self, id: i64) -> Result<Option<PromptTemplate>, StorageError> {
        delegate!(self, get_template, @val id)
    }
    async fn list_templates(&self) -> Result<Vec<PromptTemplate>, StorageError> {
        delegate!(self, list_templates)
    }
    async fn find_templates(
        &self,
        category: &str,
        topic: Option<&str>,
    ) -> Result<Vec<PromptTemplate>, StorageError> {
        delegate!(self, find_templates, @str category, @opt_str topic)
    }
    async fn delete_template(&self, id: i64) -> Result<bool, StorageError> {
        delegate!(self, delete_template, @val id)
    }
}

// ── QueueStore ───────────────────────────────────────────────────

#[async_trait]
impl QueueStore for Storage {
    async fn enqueue(&self, pitch_id: i64) -> Result<EnqueueOutcome, StorageError> {
        delegate!(self, enqueue, @val pitch_id)
    }
    async fn enqueue_with_priority(&self, pitch_id: i64) -> Result<EnqueueOutcome, StorageError> {
        delegate!(self, enqueue_with_priority, @val pitch_id)
    }
    async fn claim_batch(&self, limit: usize) -> Result<Vec<QueueItem>, StorageError> {
        delegate!(self, claim_batch, @val limit)
    }
    async fn complete_item(&self, id: i64) -> Result<bool, StorageError> {
        delegate!(self, complete_item, @val id)
    }
    async fn fail_item(&self, id: i64, reason: &str) -> Result<bool, StorageError> {
        delegate!(self, fail_item, @val id, @str reason)
    }
    async fn release_items(&self, ids: &[i64]) -> Result<usize, StorageError> {
        delegate!(self, release_items, @slice ids)
    }
    async fn release_stale_items(
        &self,
        visibility_timeout_secs: i64,
    ) -> Result<usize, StorageError> {
        delegate!(self, release_stale_items, @val visibility_timeout_secs)
    }
    async fn get_queue_item(&self, id: i64) -> Result<Option<QueueItem>, StorageError> {
        delegate!(self, get_queue_item, @val id)
    }
    async fn active_item_for_pitch(
        &self,
        pitch_id: i64,
    ) -> Result<Option<QueueItem>, StorageError> {
        delegate!(self, active_item_for_pitch, @val pitch_id)
    }
    async fn list_queue_items(
        &self,
        status: Option<QueueItemStatus>,
        limit: usize,
    ) -> Result<Vec<QueueItem>, StorageError> {
        delegate!(self, list_queue_items, @val status, @val limit)
    }
    async fn queue_stats(&self) -> Result<QueueStats, StorageError> {
        delegate!(self, queue_stats)
    }
    async fn clear_failed_items(&self) -> Result<usize, StorageError> {
        delegate!(self, clear_failed_items)
    }
}

// ── ContentStore ─────────────────────────────────────────────────

#[async_trait]
impl ContentStore for Storage {
    async fn commit_generation(
        &self,
        pitch_id: i64,
        content: &GeneratedContent,
        target: OutputTarget,
        author: Option<&str>,
        strategy: &str,
    ) -> Result<GenerationCommit, StorageError> {
        delegate!(
            self,
            commit_generation,
            @val pitch_id,
            @ref content,
            @val target,
            @opt_str author,
            @str strategy
        )
    }
    async fn get_content(&self, id: i64) -> Result<Option<StoredContent>, StorageError> {
        delegate!(self, get_content, @val id)
    }
    async fn content_for_pitch(&self, pitch_id: i64) -> Result<Vec<StoredContent>, StorageError> {
        delegate!(self, content_for_pitch, @val pitch_id)
    }
}
