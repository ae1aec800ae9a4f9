use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use storyflow_core::{
    EnqueueOutcome, PRIORITY_BACKDATE_SECS, QueueItem, QueueItemStatus, QueueStats,
};

use super::{Storage, clamp_limit, from_epoch, get_conn, log_row_error, parse_column};
use crate::error::StorageError;

const ITEM_COLUMNS: &str =
    "id, pitch_id, status, created_at_epoch, updated_at_epoch, claimed_at_epoch, error_reason";

fn row_to_queue_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<QueueItem> {
    Ok(QueueItem {
        id: row.get(0)?,
        pitch_id: row.get(1)?,
        status: parse_column::<QueueItemStatus>(&row.get::<_, String>(2)?)?,
        created_at: from_epoch(row.get(3)?),
        updated_at: from_epoch(row.get(4)?),
        claimed_at: row.get::<_, Option<i64>>(5)?.map(from_epoch),
        error_reason: row.get(6)?,
    })
}

fn ensure_pitch_exists(conn: &Connection, pitch_id: i64) -> Result<(), StorageError> {
    let exists: Option<i64> = conn
        .query_row("SELECT 1 FROM pitches WHERE id = ?1", params![pitch_id], |row| row.get(0))
        .optional()?;
    if exists.is_none() {
        return Err(StorageError::NotFound { entity: "pitch", id: pitch_id.to_string() });
    }
    Ok(())
}

fn active_item(conn: &Connection, pitch_id: i64) -> Result<Option<QueueItem>, StorageError> {
    let sql = format!(
        "SELECT {ITEM_COLUMNS} FROM queue_items
           WHERE pitch_id = ?1 AND status IN ('pending', 'processing')"
    );
    Ok(conn.query_row(&sql, params![pitch_id], row_to_queue_item).optional()?)
}

/// Timestamp that sorts before every pending item of other pitches.
fn front_of_queue_epoch(conn: &Connection, pitch_id: i64, now: i64) -> Result<i64, StorageError> {
    let oldest: Option<i64> = conn.query_row(
        "SELECT MIN(created_at_epoch) FROM queue_items WHERE status = 'pending' AND pitch_id != ?1",
        params![pitch_id],
        |row| row.get(0),
    )?;
    Ok(oldest.map_or(now, |oldest| (oldest - PRIORITY_BACKDATE_SECS).min(now)))
}

impl Storage {
    /// Insert a pending item unless the pitch already has an active one.
    ///
    /// # Errors
    /// Returns `NotFound` if the pitch does not exist.
    pub fn enqueue(&self, pitch_id: i64) -> Result<EnqueueOutcome, StorageError> {
        let mut conn = get_conn(&self.pool)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        ensure_pitch_exists(&tx, pitch_id)?;
        let now = Utc::now().timestamp();
        let inserted = tx.execute(
            "INSERT INTO queue_items (pitch_id, status, created_at_epoch, updated_at_epoch)
               VALUES (?1, 'pending', ?2, ?2)
               ON CONFLICT DO NOTHING",
            params![pitch_id, now],
        )?;
        let outcome = if inserted > 0 {
            EnqueueOutcome::Inserted(tx.last_insert_rowid())
        } else {
            let existing = active_item(&tx, pitch_id)?.ok_or_else(|| {
                StorageError::NotFound { entity: "active queue item", id: pitch_id.to_string() }
            })?;
            EnqueueOutcome::AlreadyQueued(existing.id)
        };
        tx.commit()?;
        Ok(outcome)
    }

    /// Enqueue ahead of every other pending item.
    ///
    /// # Errors
    /// Returns `NotFound` if the pitch does not exist.
    pub fn enqueue_with_priority(&self, pitch_id: i64) -> Result<EnqueueOutcome, StorageError> {
        let mut conn = get_conn(&self.pool)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        ensure_pitch_exists(&tx, pitch_id)?;
        let now = Utc::now().timestamp();
        let front = front_of_queue_epoch(&tx, pitch_id, now)?;

        let outcome = match active_item(&tx, pitch_id)? {
            Some(item) if item.status == QueueItemStatus::Pending => {
                tx.execute(
                    "UPDATE queue_items SET created_at_epoch = ?1, updated_at_epoch = ?2 WHERE id = ?3",
                    params![front, now, item.id],
                )?;
                EnqueueOutcome::AlreadyQueued(item.id)
            },
            Some(item) => EnqueueOutcome::AlreadyQueued(item.id),
            None => {
                tx.execute(
                    "INSERT INTO queue_items (pitch_id, status, created_at_epoch, updated_at_epoch)
                       VALUES (?1, 'pending', ?2, ?3)",
                    params![pitch_id, front, now],
                )?;
                EnqueueOutcome::Inserted(tx.last_insert_rowid())
            },
        };
        tx.commit()?;
        Ok(outcome)
    }

    /// Claim up to `limit` pending items, oldest first.
    ///
    /// # Errors
    /// Returns error if database operation fails.
    pub fn claim_batch(&self, limit: usize) -> Result<Vec<QueueItem>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let now = Utc::now().timestamp();
        let sql = format!(
            "UPDATE queue_items
               SET status = 'processing', claimed_at_epoch = ?1, updated_at_epoch = ?1
               WHERE id IN (
                   SELECT id FROM queue_items
                   WHERE status = 'pending'
                   ORDER BY created_at_epoch ASC, id ASC
                   LIMIT ?2
               )
               RETURNING {ITEM_COLUMNS}"
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut items: Vec<QueueItem> = stmt
            .query_map(params![now, clamp_limit(limit)], row_to_queue_item)?
            .filter_map(log_row_error)
            .collect();
        items.sort_by_key(|item| (item.created_at, item.id));
        Ok(items)
    }

    /// # Errors
    /// Returns error if database update fails.
    pub fn complete_item(&self, id: i64) -> Result<bool, StorageError> {
        let conn = get_conn(&self.pool)?;
        let now = Utc::now().timestamp();
        let affected = conn.execute(
            "UPDATE queue_items SET status = 'completed', updated_at_epoch = ?1, error_reason = NULL
               WHERE id = ?2 AND status = 'processing'",
            params![now, id],
        )?;
        Ok(affected > 0)
    }

    /// # Errors
    /// Returns error if database update fails.
    pub fn fail_item(&self, id: i64, reason: &str) -> Result<bool, StorageError> {
        let conn = get_conn(&self.pool)?;
        let now = Utc::now().timestamp();
        let affected = conn.execute(
            "UPDATE queue_items SET status = 'failed', updated_at_epoch = ?1, error_reason = ?2
               WHERE id = ?3 AND status = 'processing'",
            params![now, reason, id],
        )?;
        Ok(affected > 0)
    }

    /// Release specific items back to pending immediately.
    ///
    /// # Errors
    /// Returns error if database update fails.
    pub fn release_items(&self, ids: &[i64]) -> Result<usize, StorageError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut conn = get_conn(&self.pool)?;
        let tx = conn.transaction()?;
        let now = Utc::now().timestamp();
        let mut released = 0usize;
        {
            let mut stmt = tx.prepare(
                "UPDATE queue_items SET status = 'pending', claimed_at_epoch = NULL, updated_at_epoch = ?1
                   WHERE id = ?2 AND status = 'processing'",
            )?;
            for id in ids {
                released += stmt.execute(params![now, id])?;
            }
        }
        tx.commit()?;
        Ok(released)
    }

    /// Release processing items whose claim is at least `visibility_timeout_secs` old.
    ///
    /// # Errors
    /// Returns error if database update fails.
    pub fn release_stale_items(&self, visibility_timeout_secs: i64) -> Result<usize, StorageError> {
        let conn = get_conn(&self.pool)?;
        let now = Utc::now().timestamp();
        let stale_threshold = now - visibility_timeout_secs;
        let affected = conn.execute(
            "UPDATE queue_items
               SET status = 'pending', claimed_at_epoch = NULL, updated_at_epoch = ?1
               WHERE status = 'processing' AND claimed_at_epoch <= ?2",
            params![now, stale_threshold],
        )?;
        Ok(affected)
    }

    /// # Errors
    /// Returns error if database query fails.
    pub fn get_queue_item(&self, id: i64) -> Result<Option<QueueItem>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let sql = format!("SELECT {ITEM_COLUMNS} FROM queue_items WHERE id = ?1");
        Ok(conn.query_row(&sql, params![id], row_to_queue_item).optional()?)
    }

    /// # Errors
    /// Returns error if database query fails.
    pub fn active_item_for_pitch(&self, pitch_id: i64) -> Result<Option<QueueItem>, StorageError> {
        let conn = get_conn(&self.pool)?;
        active_item(&conn, pitch_id)
    }

    /// # Errors
    /// Returns error if database query fails.
    pub fn list_queue_items(
        &self,
        status: Option<QueueItemStatus>,
        limit: usize,
    ) -> Result<Vec<QueueItem>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM queue_items
               WHERE (?1 IS NULL OR status = ?1)
               ORDER BY created_at_epoch ASC, id ASC
               LIMIT ?2"
        );
        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map(params![status.map(|s| s.as_str()), clamp_limit(limit)], row_to_queue_item)?
            .filter_map(log_row_error)
            .collect();
        Ok(items)
    }

    /// # Errors
    /// Returns error if database query fails.
    pub fn queue_stats(&self) -> Result<QueueStats, StorageError> {
        let conn = get_conn(&self.pool)?;
        let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM queue_items GROUP BY status")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
        let mut stats = QueueStats::default();
        for (status, count) in rows.filter_map(log_row_error) {
            let count = count as u64;
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

    /// # Errors
    /// Returns error if database delete fails.
    pub fn clear_failed_items(&self) -> Result<usize, StorageError> {
        let conn = get_conn(&self.pool)?;
        let affected = conn.execute("DELETE FROM queue_items WHERE status = 'failed'", [])?;
        Ok(affected)
    }
}
