//! PitchStore implementation for PgStorage.

use async_trait::async_trait;
use storyflow_core::{PitchContent, PitchOrigin, PitchStatus};

use super::*;
use crate::traits::PitchStore;

pub(super) fn not_found(id: i64) -> StorageError {
    StorageError::NotFound { entity: "pitch", id: id.to_string() }
}

impl PgStorage {
    async fn select_pitch(&self, id: i64) -> Result<Option<Pitch>, StorageError> {
        let row = sqlx::query(&format!("SELECT {PITCH_COLUMNS} FROM pitches WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_pitch).transpose()
    }

    async fn stale_or_missing(&self, id: i64, expected: PitchStatus) -> StorageError {
        match self.select_pitch(id).await {
            Ok(Some(pitch)) => {
                StorageError::StaleStatus { pitch_id: id, expected, actual: pitch.status }
            },
            Ok(None) => not_found(id),
            Err(e) => e,
        }
    }
}

#[async_trait]
impl PitchStore for PgStorage {
    async fn create_pitch(
        &self,
        content: &PitchContent,
        origin: PitchOrigin,
    ) -> Result<Pitch, StorageError> {
        let now = Utc::now().timestamp();
        let row = sqlx::query(&format!(
            "INSERT INTO pitches
               (pillar, category, topic, main_seo_keyword, suggested_pitch, origin, status,
                created_at_epoch, updated_at_epoch)
               VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7, $7)
               RETURNING {PITCH_COLUMNS}"
        ))
        .bind(content.pillar.map(|p| p.as_str()))
        .bind(&content.category)
        .bind(&content.topic)
        .bind(&content.main_seo_keyword)
        .bind(&content.suggested_pitch)
        .bind(origin.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        row_to_pitch(&row)
    }

    async fn get_pitch(&self, id: i64) -> Result<Option<Pitch>, StorageError> {
        self.select_pitch(id).await
    }

    async fn list_pitches(
        &self,
        status: Option<PitchStatus>,
        limit: usize,
    ) -> Result<Vec<Pitch>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {PITCH_COLUMNS} FROM pitches
               WHERE ($1::TEXT IS NULL OR status = $1)
               ORDER BY created_at_epoch DESC, id DESC
               LIMIT $2"
        ))
        .bind(status.map(|s| s.as_str()))
        .bind(usize_to_i64(limit))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_pitch).collect()
    }

    async fn pitch_ids_with_status(&self, status: PitchStatus) -> Result<Vec<i64>, StorageError> {
        let ids = sqlx::query_scalar(
            "SELECT id FROM pitches WHERE status = $1 ORDER BY created_at_epoch ASC, id ASC",
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn update_pitch_content(
        &self,
        id: i64,
        content: &PitchContent,
        expected: PitchStatus,
    ) -> Result<Pitch, StorageError> {
        let now = Utc::now().timestamp();
        let row = sqlx::query(&format!(
            "UPDATE pitches
               SET pillar = $1, category = $2, topic = $3, main_seo_keyword = $4,
                   suggested_pitch = $5, updated_at_epoch = $6
               WHERE id = $7 AND status = $8
               RETURNING {PITCH_COLUMNS}"
        ))
        .bind(content.pillar.map(|p| p.as_str()))
        .bind(&content.category)
        .bind(&content.topic)
        .bind(&content.main_seo_keyword)
        .bind(&content.suggested_pitch)
        .bind(now)
        .bind(id)
        .bind(expected.as_str())
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => row_to_pitch(&row),
            None => Err(self.stale_or_missing(id, expected).await),
        }
    }

    async fn update_pitch_status(
        &self,
        id: i64,
        from: PitchStatus,
        to: PitchStatus,
    ) -> Result<Pitch, StorageError> {
        let now = Utc::now().timestamp();
        let row = sqlx::query(&format!(
            "UPDATE pitches SET status = $1, updated_at_epoch = $2
               WHERE id = $3 AND status = $4
               RETURNING {PITCH_COLUMNS}"
        ))
        .bind(to.as_str())
        .bind(now)
        .bind(id)
        .bind(from.as_str())
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => row_to_pitch(&row),
            None => Err(self.stale_or_missing(id, from).await),
        }
    }
}
