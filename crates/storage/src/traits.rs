//! Storage backend trait abstraction
//!
//! Async domain traits implemented by the SQLite store (via
//! `spawn_blocking`), the PostgreSQL store and the `StorageBackend` enum.

use async_trait::async_trait;
use storyflow_core::{
    EnqueueOutcome, GeneratedContent, GenerationCommit, NewPromptTemplate, OutputTarget, Pitch,
    PitchContent, PitchOrigin, PitchStatus, PromptTemplate, QueueItem, QueueItemStatus, QueueStats, StoredContent,
};

use crate::error::StorageError;

/// Pitch rows.
#[async_trait]
pub trait PitchStore: Send + Sync {
    /// Insert a new pitch in status `pending`.
    async fn create_pitch(
        &self,
        content: &PitchContent,
        origin: PitchOrigin,
    ) -> Result<Pitch, StorageError>;

    async fn get_pitch(&self, id: i64) -> Result<Option<Pitch>, StorageError>;

    /// Most recent first.
    async fn list_pitches(
        &self,
        status: Option<PitchStatus>,
        limit: usize,
    ) -> Result<Vec<Pitch>, StorageError>;

    /// Every pitch id in `status`, oldest first.
    async fn pitch_ids_with_status(&self, status: PitchStatus) -> Result<Vec<i64>, StorageError>;

    /// Overwrite the editable fields, only if the pitch is still `expected`.
    ///
    /// Fails with `StaleStatus` when the status moved on.
    async fn update_pitch_content(
        &self,
        id: i64,
        content: &PitchContent,
        expected: PitchStatus,
    ) -> Result<Pitch, StorageError>;

    /// Compare-and-set the status from `from` to `to`.
    ///
    /// Fails with `StaleStatus` when the stored status is not `from`.
    async fn update_pitch_status(
        &self,
        id: i64,
        from: PitchStatus,
        to: PitchStatus,
    ) -> Result<Pitch, StorageError>;

}

/// Prompt templates.
#[async_trait]
pub trait PromptTemplateStore: Send + Sync {
    /// Fails with `Duplicate` when a template with the same
    /// (pillar, category, topic) key exists.
    async fn create_template(
        &self,
        template: &NewPromptTemplate,
    ) -> Result<PromptTemplate, StorageError>;

    async fn get_template(&self, id: i64) -> Result<Option<PromptTemplate>, StorageError>;

    async fn list_templates(&self) -> Result<Vec<PromptTemplate>, StorageError>;

    /// Templates for `category` whose topic equals `topic` (`None` matches
    /// only templates without a topic), lowest id first, any pillar.
    async fn find_templates(
        &self,
        category: &str,
        topic: Option<&str>,
    ) -> Result<Vec<PromptTemplate>, StorageError>;

    async fn delete_template(&self, id: i64) -> Result<bool, StorageError>;
}

/// Generation work queue.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Insert a pending item unless the pitch already has an active one.
    async fn enqueue(&self, pitch_id: i64) -> Result<EnqueueOutcome, StorageError>;

    /// Like `enqueue`, but the item is dated before every other pending item.
    /// An already pending item for the pitch is moved to the front.
    async fn enqueue_with_priority(&self, pitch_id: i64) -> Result<EnqueueOutcome, StorageError>;

    /// Atomically move up to `limit` pending items to `processing`, oldest first.
    async fn claim_batch(&self, limit: usize) -> Result<Vec<QueueItem>, StorageError>;

    /// `processing` → `completed`. Returns false if the item was not processing.
    async fn complete_item(&self, id: i64) -> Result<bool, StorageError>;

    /// `processing` → `failed` with a reason. Returns false if the item was not processing.
    async fn fail_item(&self, id: i64, reason: &str) -> Result<bool, StorageError>;

    /// Return specific processing items to `pending`.
    async fn release_items(&self, ids: &[i64]) -> Result<usize, StorageError>;

    /// Return processing items claimed at least `visibility_timeout_secs` ago to `pending`.
    async fn release_stale_items(&self, visibility_timeout_secs: i64)
    -> Result<usize, StorageError>;

    async fn get_queue_item(&self, id: i64) -> Result<Option<QueueItem>, StorageError>;

    async fn active_item_for_pitch(&self, pitch_id: i64)
    -> Result<Option<QueueItem>, StorageError>;

    /// Items in claim order.
    async fn list_queue_items(
        &self,
        status: Option<QueueItemStatus>,
        limit: usize,
    ) -> Result<Vec<QueueItem>, StorageError>;

    async fn queue_stats(&self) -> Result<QueueStats, StorageError>;

    async fn clear_failed_items(&self) -> Result<usize, StorageError>;
}

/// Draft articles.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store generated output (a draft row or the pitch text, per `target`)
    /// and move the pitch to `generated`, atomically.
    ///
    /// Fails with `StaleStatus` and writes nothing when the pitch no longer
    /// accepts generation.
    async fn commit_generation(
        &self,
        pitch_id: i64,
        content: &GeneratedContent,
        target: OutputTarget,
        author: Option<&str>,
        strategy: &str,
    ) -> Result<GenerationCommit, StorageError>;

    async fn get_content(&self, id: i64) -> Result<Option<StoredContent>, StorageError>;

    /// Newest first.
    async fn content_for_pitch(&self, pitch_id: i64) -> Result<Vec<StoredContent>, StorageError>;
}
