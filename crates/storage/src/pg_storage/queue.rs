//! QueueStore implementation for PgStorage.

use async_trait::async_trait;
use storyflow_core::{
    EnqueueOutcome, PRIORITY_BACKDATE_SECS, QueueItemStatus, QueueStats,
};

use super::*;
use crate::traits::QueueStore;

async fn ensure_pitch_exists(
    tx: &mut sqlx::PgConnection,
    pitch_id: i64,
) -> Result<(), StorageError> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM pitches WHERE id = $1 FOR UPDATE")
        .bind(pitch_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(StorageError::NotFound { entity: "pitch", id: pitch_id.to_string() });
    }
    Ok(())
}

async fn active_item(
    conn: &mut sqlx::PgConnection,
    pitch_id: i64,
) -> Result<Option<QueueItem>, StorageError> {
    let row = sqlx::query(&format!(
        "SELECT {ITEM_COLUMNS} FROM queue_items
           WHERE pitch_id = $1 AND status IN ('pending', 'processing')"
    ))
    .bind(pitch_id)
    .fetch_optional(&mut *conn)
    .await?;
    row.as_ref().map(row_to_queue_item).transpose()
}

#[async_trait]
impl QueueStore for PgStorage {
    async fn enqueue(&self, pitch_id: i64) -> Result<EnqueueOutcome, StorageError> {
        let mut tx = self.pool.begin().await?;
        ensure_pitch_exists(&mut tx, pitch_id).await?;
        let now = Utc::now().timestamp();
        let inserted: Option<i64> = sqlx::query_scalar(
            "INSERT INTO queue_items (pitch_id, status, created_at_epoch, updated_at_epoch)
               VALUES ($1, 'pending', $2, $2)
               ON CONFLICT DO NOTHING
               RETURNING id",
        )
        .bind(pitch_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;
        let outcome = match inserted {
            Some(id) => EnqueueOutcome::Inserted(id),
            None => {
                let existing = active_item(&mut tx, pitch_id).await?.ok_or_else(|| {
                    StorageError::NotFound { entity: "active queue item", id: pitch_id.to_string() }
                })?;
                EnqueueOutcome::AlreadyQueued(existing.id)
            },
        };
        tx.commit().await?;
        Ok(outcome)
    }

    async fn enqueue_with_priority(&self, pitch_id: i64) -> Result<EnqueueOutcome, StorageError> {
        let mut tx = self.pool.begin().await?;
        ensure_pitch_exists(&mut tx, pitch_id).await?;
        let now = Utc::now().timestamp();
        let oldest: Option<i64> = sqlx::query_scalar(
            "SELECT MIN(created_at_epoch) FROM queue_items WHERE status = 'pending' AND pitch_id <> $1",
        )
        .bind(pitch_id)
        .fetch_one(&mut *tx)
        .await?;
        let front = oldest.map_or(now, |oldest| (oldest - PRIORITY_BACKDATE_SECS).min(now));

        let outcome = match active_item(&mut tx, pitch_id).await? {
            Some(item) if item.status == QueueItemStatus::Pending => {
                sqlx::query(
                    "UPDATE queue_items SET created_at_epoch = $1, updated_at_epoch = $2 WHERE id = $3",
                )
                .bind(front)
                .bind(now)
                .bind(item.id)
                .execute(&mut *tx)
                .await?;
                EnqueueOutcome::AlreadyQueued(item.id)
            },
            Some(item) => EnqueueOutcome::AlreadyQueued(item.id),
            None => {
                let id: i64 = sqlx::query_scalar(
                    "INSERT INTO queue_items (pitch_id, status, created_at_epoch, updated_at_epoch)
                       VALUES ($1, 'pending', $2, $3)
                       RETURNING id",
                )
                .bind(pitch_id)
                .bind(front)
                .bind(now)
                .fetch_one(&mut *tx)
                .await?;
                EnqueueOutcome::Inserted(id)
            },
        };
        tx.commit().await?;
        Ok(outcome)
    }

    async fn claim_batch(&self, limit: usize) -> Result<Vec<QueueItem>, StorageError> {
        let now = Utc::now().timestamp();
        let rows = sqlx::query(&format!(
            "UPDATE queue_items
               SET status = 'processing', claimed_at_epoch = $1, updated_at_epoch = $1
               WHERE id IN (
                   SELECT id FROM queue_items
                   WHERE status = 'pending'
                   ORDER BY created_at_epoch ASC, id ASC
                   LIMIT $2
                   FOR UPDATE SKIP LOCKED
               )
               RETURNING {ITEM_COLUMNS}"
        ))
        .bind(now)
        .bind(usize_to_i64(limit))
        .fetch_all(&self.pool)
        .await?;
        let mut items = rows.iter().map(row_to_queue_item).collect::<Result<Vec<_>, _>>()?;
        items.sort_by_key(|item| (item.created_at, item.id));
        Ok(items)
    }

    async fn complete_item(&self, id: i64) -> Result<bool, StorageError> {
        let now = Utc::now().timestamp();
        let result = sqlx::query(
            "UPDATE queue_items SET status = 'completed', updated_at_epoch = $1, error_reason = NULL
               WHERE id = $2 AND status = 'processing'",
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn fail_item(&self, id: i64, reason: &str) -> Result<bool, StorageError> {
        let now = Utc::now().timestamp();
        let result = sqlx::query(
            "UPDATE queue_items SET status = 'failed', updated_at_epoch = $1, error_reason = $2
               WHERE id = $3 AND status = 'processing'",
        )
        .bind(now)
        .bind(reason)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn release_items(&self, ids: &[i64]) -> Result<usize, StorageError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let now = Utc::now().timestamp();
        let result = sqlx::query(
            "UPDATE queue_items
               SET status = 'pending', claimed_at_epoch = NULL, updated_at_epoch = $1
               WHERE id = ANY($2) AND status = 'processing'",
        )
        .bind(now)
        .bind(ids)
        .execute(&self.pool)
        .await?;
        Ok(rows_to_usize(result.rows_affected()))
    }

    async fn release_stale_items(
        &self,
        visibility_timeout_secs: i64,
    ) -> Result<usize, StorageError> {
        let now = Utc::now().timestamp();
        let stale_threshold = now - visibility_timeout_secs;
        let result = sqlx::query(
            "UPDATE queue_items
               SET status = 'pending', claimed_at_epoch = NULL, updated_at_epoch = $1
               WHERE status = 'processing' AND claimed_at_epoch <= $2",
        )
        .bind(now)
        .bind(stale_threshold)
        .execute(&self.pool)
        .await?;
        Ok(rows_to_usize(result.rows_affected()))
    }

    async fn get_queue_item(&self, id: i64) -> Result<Option<QueueItem>, StorageError> {
        let row = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM queue_items WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_queue_item).transpose()
    }

    async fn active_item_for_pitch(
        &self,
        pitch_id: i64,
    ) -> Result<Option<QueueItem>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        active_item(&mut conn, pitch_id).await
    }

    async fn list_queue_items(
        &self,
        status: Option<QueueItemStatus>,
        limit: usize,
    ) -> Result<Vec<QueueItem>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM queue_items
               WHERE ($1::TEXT IS NULL OR status = $1)
               ORDER BY created_at_epoch ASC, id ASC
               LIMIT $2"
        ))
        .bind(status.map(|s| s.as_str()))
        .bind(usize_to_i64(limit))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_queue_item).collect()
    }

    async fn queue_stats(&self) -> Result<QueueStats, StorageError> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM queue_items GROUP BY status")
                .fetch_all(&self.pool)
                .await?;
        let mut stats = QueueStats::default();
        for (status, count) in rows {
            let count = u64::try_from(count).unwrap_or(0);
            match status.parse::<QueueItemStatus>() {
                Ok(QueueItemStatus::Pending) => stats.pending = count,
                Ok(QueueItemStatus::Processing) => stats.processing = count,
                Ok(QueueItemStatus::Completed) => stats.completed = count,
                Ok(QueueItemStatus::Failed) => stats.failed = count,
                Err(e) => tracing::warn!(error = %e, "unknown queue status in stats"),
            }
        }
        Ok(stats)
    }

    async fn clear_failed_items(&self) -> Result<usize, StorageError> {
        let result = sqlx::query("DELETE FROM queue_items WHERE status = 'failed'")
            .execute(&self.pool)
            .await?;
        Ok(rows_to_usize(result.rows_affected()))
    }
}
