//! Unified storage backend with enum dispatch.

#[cfg(feature = "sqlite")]
use std::path::Path;

use async_trait::async_trait;
use storyflow_core::{
    EnqueueOutcome, GeneratedContent, GenerationCommit, NewPromptTemplate, OutputTarget, Pitch,
    PitchContent, PitchOrigin, PitchStatus, PromptTemplate, QueueItem, QueueItemStatus, QueueStats, StorageConfig,
    StoredContent,
};

use crate::error::StorageError;
use crate::traits::{ContentStore, PitchStore, PromptTemplateStore, QueueStore};

macro_rules! dispatch {
    ($self:expr, $trait:path, $method:ident ( $($arg:expr),* $(,)? )) => {
        match $self {
            #[cfg(feature = "sqlite")]
            StorageBackend::Sqlite(s) => <crate::Storage as $trait>::$method(s, $($arg),*).await,
            #[cfg(feature = "postgres")]
            StorageBackend::Postgres(s) => <crate::pg_storage::PgStorage as $trait>::$method(s, $($arg),*).await,
        }
    };
}

#[derive(Clone, Debug)]
pub enum StorageBackend {
    #[cfg(feature = "sqlite")]
    Sqlite(crate::Storage),
    #[cfg(feature = "postgres")]
    Postgres(crate::pg_storage::PgStorage),
}

impl StorageBackend {
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    #[cfg(feature = "sqlite")]
    pub fn new_sqlite(db_path: &Path, pool_size: u32) -> Result<Self, StorageError> {
        Ok(Self::Sqlite(crate::Storage::with_pool_size(db_path, pool_size)?))
    }

    /// # Errors
    /// Returns an error if the database cannot be reached or migrated.
    #[cfg(feature = "postgres")]
    pub async fn new_postgres(database_url: &str) -> Result<Self, StorageError> {
        Ok(Self::Postgres(crate::pg_storage::PgStorage::new(database_url).await?))
    }

    /// Opens PostgreSQL when a URL is configured and the backend is compiled
    /// in, otherwise the SQLite file (creating its parent directory).
    ///
    /// # Errors
    /// Returns an error if the selected database cannot be opened.
    pub async fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        #[cfg(feature = "postgres")]
        {
            if let Some(url) = config.database_url.as_deref() {
                return Self::new_postgres(url).await;
            }
        }
        #[cfg(not(feature = "postgres"))]
        {
            if config.database_url.is_some() {
                tracing::warn!("database URL set but postgres support is not compiled in, using SQLite");
            }
        }
        Self::open_file(config)
    }

    #[cfg(feature = "sqlite")]
    fn open_file(config: &StorageConfig) -> Result<Self, StorageError> {
        if let Some(parent) = config.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::new_sqlite(&config.db_path, config.pool_size)
    }

    #[cfg(not(feature = "sqlite"))]
    fn open_file(_config: &StorageConfig) -> Result<Self, StorageError> {
        Err(StorageError::Migration("no database URL configured".to_owned()))
    }
}

// ── PitchStore ───────────────────────────────────────────────────

#[async_trait]
impl PitchStore for StorageBackend {
    async fn create_pitch(
        &self,
        content: &PitchContent,
        origin: PitchOrigin,
    ) -> Result<Pitch, StorageError> {
        dispatch!(self, PitchStore, create_pitch(content, origin))
    }

    async fn get_pitch(&self, id: i64) -> Result<Option<Pitch>, StorageError> {
        dispatch!(self, PitchStore, get_pitch(id))
    }

    async fn list_pitches(
        &self,
        status: Option<PitchStatus>,
        limit: usize,
    ) -> Result<Vec<Pitch>, StorageError> {
        dispatch!(self, PitchStore, list_pitches(status, limit))
    }

    async fn pitch_ids_with_status(&self, status: PitchStatus) -> Result<Vec<i64>, StorageError> {
        dispatch!(self, PitchStore, pitch_ids_with_status(status))
    }

    async fn update_pitch_content(
        &self,
        id: i64,
        content: &PitchContent,
        expected: PitchStatus,
    ) -> Result<Pitch, StorageError> {
        dispatch!(self, PitchStore, update_pitch_content(id, content, expected))
    }

    async fn update_pitch_status(
        &self,
        id: i64,
        from: PitchStatus,
        to: PitchStatus,
    ) -> Result<Pitch, StorageError> {
        dispatch!(self, PitchStore, update_pitch_status(id, from, to))
    }

}

// ── PromptTemplateStore ──────────────────────────────────────────

#[async_trait]
impl PromptTemplateStore for StorageBackend {
    async fn create_template(
        &self,
        template: &NewPromptTemplate,
    ) -> Result<PromptTemplate, StorageError> {
        dispatch!(self, PromptTemplateStore, create_template(template))
    }

    async fn get_template(&self, id: i64) -> Result<Option<PromptTemplate>, StorageError> {
        dispatch!(self, PromptTemplateStore, get_template(id))
    }

    async fn list_templates(&self) -> Result<Vec<PromptTemplate>, StorageError> {
        dispatch!(self, PromptTemplateStore, list_templates())
    }

    async fn find_templates(
        &self,
        category: &str,
        topic: Option<&str>,
    ) -> Result<Vec<PromptTemplate>, StorageError> {
        dispatch!(self, PromptTemplateStore, find_templates(category, topic))
    }

    async fn delete_template(&self, id: i64) -> Result<bool, StorageError> {
        dispatch!(self, PromptTemplateStore, delete_template(id))
    }
}

// ── QueueStore ───────────────────────────────────────────────────

#[async_trait]
impl QueueStore for StorageBackend {
    async fn enqueue(&self, pitch_id: i64) -> Result<EnqueueOutcome, StorageError> {
        dispatch!(self, QueueStore, enqueue(pitch_id))
    }

    async fn enqueue_with_priority(&self, pitch_id: i64) -> Result<EnqueueOutcome, StorageError> {
        dispatch!(self, QueueStore, enqueue_with_priority(pitch_id))
    }

    async fn claim_batch(&self, limit: usize) -> Result<Vec<QueueItem>, StorageError> {
        dispatch!(self, QueueStore, claim_batch(limit))
    }

    async fn complete_item(&self, id: i64) -> Result<bool, StorageError> {
        dispatch!(self, QueueStore, complete_item(id))
    }

    async fn fail_item(&self, id: i64, reason: &str) -> Result<bool, StorageError> {
        dispatch!(self, QueueStore, fail_item(id, reason))
    }

    async fn release_items(&self, ids: &[i64]) -> Result<usize, StorageError> {
        dispatch!(self, QueueStore, release_items(ids))
    }

    async fn release_stale_items(
        &self,
        visibility_timeout_secs: i64,
    ) -> Result<usize, StorageError> {
        dispatch!(self, QueueStore, release_stale_items(visibility_timeout_secs))
    }

    async fn get_queue_item(&self, id: i64) -> Result<Option<QueueItem>, StorageError> {
        dispatch!(self, QueueStore, get_queue_item(id))
    }

    async fn active_item_for_pitch(
        &self,
        pitch_id: i64,
    ) -> Result<Option<QueueItem>, StorageError> {
        dispatch!(self, QueueStore, active_item_for_pitch(pitch_id))
    }

    async fn list_queue_items(
        &self,
        status: Option<QueueItemStatus>,
        limit: usize,
    ) -> Result<Vec<QueueItem>, StorageError> {
        dispatch!(self, QueueStore, list_queue_items(status, limit))
    }

    async fn queue_stats(&self) -> Result<QueueStats, StorageError> {
        dispatch!(self, QueueStore, queue_stats())
    }

    async fn clear_failed_items(&self) -> Result<usize, StorageError> {
        dispatch!(self, QueueStore, clear_failed_items())
    }
}

// ── ContentStore ─────────────────────────────────────────────────

#[async_trait]
impl ContentStore for StorageBackend {
    async fn commit_generation(
        &self,
        pitch_id: i64,
        content: &GeneratedContent,
        target: OutputTarget,
        author: Option<&str>,
        strategy: &str,
    ) -> Result<GenerationCommit, StorageError> {
        dispatch!(self, ContentStore, commit_generation(pitch_id, content, target, author, strategy))
    }

    async fn get_content(&self, id: i64) -> Result<Option<StoredContent>, StorageError> {
        dispatch!(self, ContentStore, get_content(id))
    }

    async fn content_for_pitch(&self, pitch_id: i64) -> Result<Vec<StoredContent>, StorageError> {
        dispatch!(self, ContentStore, content_for_pitch(pitch_id))
    }
}
