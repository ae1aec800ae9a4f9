use chrono::Utc;
use rusqlite::{OptionalExtension, params};
use storyflow_core::{Pillar, Pitch, PitchContent, PitchOrigin, PitchStatus};

use super::{Storage, clamp_limit, from_epoch, get_conn, log_row_error, parse_column, parse_opt_column};
use crate::error::StorageError;

const PITCH_COLUMNS: &str = "id, pillar, category, topic, main_seo_keyword, suggested_pitch, \
                             origin, status, created_at_epoch, updated_at_epoch";

fn row_to_pitch(row: &rusqlite::Row<'_>) -> rusqlite::Result<Pitch> {
    Ok(Pitch {
        id: row.get(0)?,
        pillar: parse_opt_column::<Pillar>(row.get(1)?)?,
        category: row.get(2)?,
        topic: row.get(3)?,
        main_seo_keyword: row.get(4)?,
        suggested_pitch: row.get(5)?,
        origin: parse_column::<PitchOrigin>(&row.get::<_, String>(6)?)?,
        status: parse_column::<PitchStatus>(&row.get::<_, String>(7)?)?,
        created_at: from_epoch(row.get(8)?),
        updated_at: from_epoch(row.get(9)?),
    })
}

pub(super) fn not_found(id: i64) -> StorageError {
    StorageError::NotFound { entity: "pitch", id: id.to_string() }
}

pub(super) fn select_pitch(conn: &rusqlite::Connection, id: i64) -> Result<Option<Pitch>, StorageError> {
    let sql = format!("SELECT {PITCH_COLUMNS} FROM pitches WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], row_to_pitch).optional()?)
}

/// After a guarded UPDATE touched no row: the pitch is either gone or in another status.
fn stale_or_missing(
    conn: &rusqlite::Connection,
    id: i64,
    expected: PitchStatus,
) -> StorageError {
    match select_pitch(conn, id) {
        Ok(Some(pitch)) => StorageError::StaleStatus { pitch_id: id, expected, actual: pitch.status },
        Ok(None) => not_found(id),
        Err(e) => e,
    }
}

impl Storage {
    /// Insert a new pending pitch.
    ///
    /// # Errors
    /// Returns error if database insert fails.
    pub fn create_pitch(
        &self,
        content: &PitchContent,
        origin: PitchOrigin,
    ) -> Result<Pitch, StorageError> {
        let conn = get_conn(&self.pool)?;
        let now = Utc::now().timestamp();
        conn.execute(
            "INSERT INTO pitches
               (pillar, category, topic, main_seo_keyword, suggested_pitch, origin, status,
                created_at_epoch, updated_at_epoch)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'pending', ?7, ?7)",
            params![
                content.pillar.map(|p| p.as_str()),
                content.category,
                content.topic,
                content.main_seo_keyword,
                content.suggested_pitch,
                origin.as_str(),
                now,
            ],
        )?;
        let id = conn.last_insert_rowid();
        select_pitch(&conn, id)?.ok_or_else(|| not_found(id))
    }

    /// # Errors
    /// Returns error if database query fails.
    pub fn get_pitch(&self, id: i64) -> Result<Option<Pitch>, StorageError> {
        let conn = get_conn(&self.pool)?;
        select_pitch(&conn, id)
    }

    /// # Errors
    /// Returns error if database query fails.
    pub fn list_pitches(
        &self,
        status: Option<PitchStatus>,
        limit: usize,
    ) -> Result<Vec<Pitch>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let sql = format!(
            "SELECT {PITCH_COLUMNS} FROM pitches
               WHERE (?1 IS NULL OR status = ?1)
               ORDER BY created_at_epoch DESC, id DESC
               LIMIT ?2"
        );
        let mut stmt = conn.prepare(&sql)?;
        let pitches = stmt
            .query_map(params![status.map(|s| s.as_str()), clamp_limit(limit)], row_to_pitch)?
            .filter_map(log_row_error)
            .collect();
        Ok(pitches)
    }

    /// # Errors
    /// Returns error if database query fails.
    pub fn pitch_ids_with_status(&self, status: PitchStatus) -> Result<Vec<i64>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let mut stmt = conn.prepare(
            "SELECT id FROM pitches WHERE status = ?1 ORDER BY created_at_epoch ASC, id ASC",
        )?;
        let ids = stmt
            .query_map(params![status.as_str()], |row| row.get(0))?
            .filter_map(log_row_error)
            .collect();
        Ok(ids)
    }

    /// Overwrite content fields while the pitch is still in `expected`.
    ///
    /// # Errors
    /// Returns `StaleStatus` or `NotFound` when the guard fails.
    pub fn update_pitch_content(
        &self,
        id: i64,
        content: &PitchContent,
        expected: PitchStatus,
    ) -> Result<Pitch, StorageError> {
        let conn = get_conn(&self.pool)?;
        let now = Utc::now().timestamp();
        let affected = conn.execute(
            "UPDATE pitches
               SET pillar = ?1, category = ?2, topic = ?3, main_seo_keyword = ?4,
                   suggested_pitch = ?5, updated_at_epoch = ?6
               WHERE id = ?7 AND status = ?8",
            params![
                content.pillar.map(|p| p.as_str()),
                content.category,
                content.topic,
                content.main_seo_keyword,
                content.suggested_pitch,
                now,
                id,
                expected.as_str(),
            ],
        )?;
        if affected == 0 {
            return Err(stale_or_missing(&conn, id, expected));
        }
        select_pitch(&conn, id)?.ok_or_else(|| not_found(id))
    }

    /// Compare-and-set the pitch status.
    ///
    /// # Errors
    /// Returns `StaleStatus` or `NotFound` when the guard fails.
    pub fn update_pitch_status(
        &self,
        id: i64,
        from: PitchStatus,
        to: PitchStatus,
    ) -> Result<Pitch, StorageError> {
        let conn = get_conn(&self.pool)?;
        let now = Utc::now().timestamp();
        let affected = conn.execute(
            "UPDATE pitches SET status = ?1, updated_at_epoch = ?2 WHERE id = ?3 AND status = ?4",
            params![to.as_str(), now, id, from.as_str()],
        )?;
        if affected == 0 {
            return Err(stale_or_missing(&conn, id, from));
        }
        select_pitch(&conn, id)?.ok_or_else(|| not_found(id))
    }
}
