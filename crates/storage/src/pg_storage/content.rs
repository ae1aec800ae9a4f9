//! ContentStore implementation for PgStorage.

use async_trait::async_trait;
use storyflow_core::{GeneratedContent, GenerationCommit, OutputTarget, PitchAction, PitchStatus};

use super::pitches::not_found;
use super::*;
use crate::traits::ContentStore;

#[async_trait]
impl ContentStore for PgStorage {
    async fn commit_generation(
        &self,
        pitch_id: i64,
        content: &GeneratedContent,
        target: OutputTarget,
        author: Option<&str>,
        strategy: &str,
    ) -> Result<GenerationCommit, StorageError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&format!("SELECT {PITCH_COLUMNS} FROM pitches WHERE id = $1 FOR UPDATE"))
            .bind(pitch_id)
            .fetch_optional(&mut *tx)
            .await?;
        let pitch = row.as_ref().map(row_to_pitch).transpose()?.ok_or_else(|| not_found(pitch_id))?;
        let transition = pitch.status.apply(PitchAction::Complete).map_err(|_| {
            StorageError::StaleStatus {
                pitch_id,
                expected: PitchStatus::Processing,
                actual: pitch.status,
            }
        })?;

        let now = Utc::now().timestamp();
        let draft = match target {
            OutputTarget::Draft => {
                let row = sqlx::query(&format!(
                    "INSERT INTO generated_content
                       (pitch_id, title, body, seo_description, author, strategy, created_at_epoch)
                       VALUES ($1, $2, $3, $4, $5, $6, $7)
                       RETURNING {CONTENT_COLUMNS}"
                ))
                .bind(pitch_id)
                .bind(&content.title)
                .bind(&content.body)
                .bind(&content.seo_description)
                .bind(author)
                .bind(strategy)
                .bind(now)
                .fetch_one(&mut *tx)
                .await?;
                Some(row_to_content(&row)?)
            },
            OutputTarget::Pitch => {
                sqlx::query("UPDATE pitches SET suggested_pitch = $1 WHERE id = $2")
                    .bind(&content.body)
                    .bind(pitch_id)
                    .execute(&mut *tx)
                    .await?;
                None
            },
        };
        let row = sqlx::query(&format!(
            "UPDATE pitches SET status = $1, updated_at_epoch = $2
               WHERE id = $3
               RETURNING {PITCH_COLUMNS}"
        ))
        .bind(transition.to.as_str())
        .bind(now)
        .bind(pitch_id)
        .fetch_one(&mut *tx)
        .await?;
        let pitch = row_to_pitch(&row)?;
        tx.commit().await?;
        Ok(GenerationCommit { from: transition.from, pitch, draft })
    }

    async fn get_content(&self, id: i64) -> Result<Option<StoredContent>, StorageError> {
        let row =
            sqlx::query(&format!("SELECT {CONTENT_COLUMNS} FROM generated_content WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.as_ref().map(row_to_content).transpose()
    }

    async fn content_for_pitch(&self, pitch_id: i64) -> Result<Vec<StoredContent>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {CONTENT_COLUMNS} FROM generated_content
               WHERE pitch_id = $1
               ORDER BY created_at_epoch DESC, id DESC"
        ))
        .bind(pitch_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_content).collect()
    }
}
