use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use storyflow_core::{
    GeneratedContent, GenerationCommit, OutputTarget, PitchAction, PitchStatus, StoredContent,
};

use super::pitches::{not_found, select_pitch};
use super::{Storage, from_epoch, get_conn, log_row_error};
use crate::error::StorageError;

const CONTENT_COLUMNS: &str =
    "id, pitch_id, title, body, seo_description, author, strategy, created_at_epoch";

fn row_to_content(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredContent> {
    Ok(StoredContent {
        id: row.get(0)?,
        pitch_id: row.get(1)?,
        title: row.get(2)?,
        body: row.get(3)?,
        seo_description: row.get(4)?,
        author: row.get(5)?,
        strategy: row.get(6)?,
        created_at: from_epoch(row.get(7)?),
    })
}

fn insert_draft(
    conn: &Connection,
    pitch_id: i64,
    content: &GeneratedContent,
    author: Option<&str>,
    strategy: &str,
    now: i64,
) -> Result<StoredContent, StorageError> {
    let sql = format!(
        "INSERT INTO generated_content
           (pitch_id, title, body, seo_description, author, strategy, created_at_epoch)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           RETURNING {CONTENT_COLUMNS}"
    );
    Ok(conn.query_row(
        &sql,
        params![pitch_id, content.title, content.body, content.seo_description, author, strategy, now],
        row_to_content,
    )?)
}

impl Storage {
    /// Write generated output and complete the pitch in one transaction.
    ///
    /// The pitch is completed from whatever status it holds now, as long as
    /// that status still accepts generation. Nothing is written otherwise.
    ///
    /// # Errors
    /// Returns `NotFound` for a missing pitch, or `StaleStatus` when the pitch
    /// left `approved`/`processing` during generation.
    pub fn commit_generation(
        &self,
        pitch_id: i64,
        content: &GeneratedContent,
        target: OutputTarget,
        author: Option<&str>,
        strategy: &str,
    ) -> Result<GenerationCommit, StorageError> {
        let mut conn = get_conn(&self.pool)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let pitch = select_pitch(&tx, pitch_id)?.ok_or_else(|| not_found(pitch_id))?;
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
                Some(insert_draft(&tx, pitch_id, content, author, strategy, now)?)
            },
            OutputTarget::Pitch => {
                tx.execute(
                    "UPDATE pitches SET suggested_pitch = ?1 WHERE id = ?2",
                    params![content.body, pitch_id],
                )?;
                None
            },
        };
        tx.execute(
            "UPDATE pitches SET status = ?1, updated_at_epoch = ?2 WHERE id = ?3",
            params![transition.to.as_str(), now, pitch_id],
        )?;
        let pitch = select_pitch(&tx, pitch_id)?.ok_or_else(|| not_found(pitch_id))?;
        tx.commit()?;
        Ok(GenerationCommit { from: transition.from, pitch, draft })
    }

    /// # Errors
    /// Returns error if database query fails.
    pub fn get_content(&self, id: i64) -> Result<Option<StoredContent>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let sql = format!("SELECT {CONTENT_COLUMNS} FROM generated_content WHERE id = ?1");
        Ok(conn.query_row(&sql, params![id], row_to_content).optional()?)
    }

    /// # Errors
    /// Returns error if database query fails.
    pub fn content_for_pitch(&self, pitch_id: i64) -> Result<Vec<StoredContent>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let sql = format!(
            "SELECT {CONTENT_COLUMNS} FROM generated_content
               WHERE pitch_id = ?1
               ORDER BY created_at_epoch DESC, id DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows =
            stmt.query_map(params![pitch_id], row_to_content)?.filter_map(log_row_error).collect();
        Ok(rows)
    }
}
