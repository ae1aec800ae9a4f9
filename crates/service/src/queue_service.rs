use std::sync::Arc;

use storyflow_core::{EnqueueOutcome, QueueItem, QueueItemStatus, QueueStats};
use storyflow_storage::StorageBackend;
use storyflow_storage::traits::QueueStore;

use crate::ServiceError;

pub struct QueueService {
    storage: Arc<StorageBackend>,
}

impl QueueService {
    #[must_use]
    pub const fn new(storage: Arc<StorageBackend>) -> Self {
        Self { storage }
    }

    pub async fn enqueue(&self, pitch_id: i64) -> Result<EnqueueOutcome, ServiceError> {
        Ok(self.storage.enqueue(pitch_id).await?)
    }

    pub async fn enqueue_with_priority(&self, pitch_id: i64) -> Result<EnqueueOutcome, ServiceError> {
        Ok(self.storage.enqueue_with_priority(pitch_id).await?)
    }

    pub async fn get_item(&self, id: i64) -> Result<QueueItem, ServiceError> {
        self.storage
            .get_queue_item(id)
            .await?
            .ok_or(ServiceError::NotFound { entity: "queue item", id })
    }

    pub async fn active_item_for_pitch(
        &self,
        pitch_id: i64,
    ) -> Result<Option<QueueItem>, ServiceError> {
        Ok(self.storage.active_item_for_pitch(pitch_id).await?)
    }

    pub async fn list_items(
        &self,
        status: Option<QueueItemStatus>,
        limit: usize,
    ) -> Result<Vec<QueueItem>, ServiceError> {
        Ok(self.storage.list_queue_items(status, limit).await?)
    }

    pub async fn stats(&self) -> Result<QueueStats, ServiceError> {
        Ok(self.storage.queue_stats().await?)
    }

    pub async fn clear_failed(&self) -> Result<usize, ServiceError> {
        Ok(self.storage.clear_failed_items().await?)
    }

    pub async fn release_stale_items(
        &self,
        visibility_timeout_secs: i64,
    ) -> Result<usize, ServiceError> {
        Ok(self.storage.release_stale_items(visibility_timeout_secs).await?)
    }
}

/// Releases abandoned claims back to pending on startup.
pub async fn run_startup_recovery(
    queue: &QueueService,
    visibility_timeout_secs: i64,
) -> Result<usize, ServiceError> {
    let released = queue.release_stale_items(visibility_timeout_secs).await?;
    if released > 0 {
        tracing::info!("Startup recovery: released {} stale queue items back to pending", released);
    }
    Ok(released)
}
