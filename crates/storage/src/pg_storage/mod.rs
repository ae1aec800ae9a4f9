//! PostgreSQL storage backend using sqlx.
//!
//! Split into modular files by domain concern. The schema mirrors the
//! SQLite one so both backends share row semantics.

#![allow(
    clippy::arithmetic_side_effects,
    reason = "DB row counts and pagination are bounded by PostgreSQL limits"
)]

mod content;
mod pitches;
mod prompts;
mod queue;

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use storyflow_core::{
    CoreError, MAX_QUERY_LIMIT, PG_POOL_ACQUIRE_TIMEOUT_SECS, PG_POOL_IDLE_TIMEOUT_SECS,
    PG_POOL_MAX_CONNECTIONS, Pitch, PromptTemplate, QueueItem, StoredContent,
};

use super::pg_migrations::run_pg_migrations;
use crate::error::StorageError;

#[derive(Clone, Debug)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    /// # Errors
    /// Returns an error if the pool cannot connect or migrations fail.
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(PG_POOL_MAX_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(PG_POOL_ACQUIRE_TIMEOUT_SECS))
            .idle_timeout(Duration::from_secs(PG_POOL_IDLE_TIMEOUT_SECS))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;
        run_pg_migrations(&pool).await.map_err(|e| StorageError::Migration(e.to_string()))?;
        tracing::info!("PgStorage initialized");
        Ok(Self { pool })
    }
}

pub(crate) fn usize_to_i64(val: usize) -> i64 {
    i64::try_from(val.min(MAX_QUERY_LIMIT)).unwrap_or(i64::MAX)
}

pub(crate) fn rows_to_usize(rows: u64) -> usize {
    usize::try_from(rows).unwrap_or(usize::MAX)
}

pub(crate) fn from_epoch(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

fn parse_text<T>(row: &sqlx::postgres::PgRow, column: &str) -> Result<T, StorageError>
where
    T: FromStr<Err = CoreError>,
{
    let value: String = row.try_get(column)?;
    value.parse().map_err(|e| StorageError::corrupt(format!("column {column}"), e))
}

fn parse_opt_text<T>(row: &sqlx::postgres::PgRow, column: &str) -> Result<Option<T>, StorageError>
where
    T: FromStr<Err = CoreError>,
{
    let value: Option<String> = row.try_get(column)?;
    value
        .map(|v| v.parse().map_err(|e| StorageError::corrupt(format!("column {column}"), e)))
        .transpose()
}

pub(crate) const PITCH_COLUMNS: &str = "id, pillar, category, topic, main_seo_keyword, \
     suggested_pitch, origin, status, created_at_epoch, updated_at_epoch";

pub(crate) fn row_to_pitch(row: &sqlx::postgres::PgRow) -> Result<Pitch, StorageError> {
    Ok(Pitch {
        id: row.try_get("id")?,
        pillar: parse_opt_text(row, "pillar")?,
        category: row.try_get("category")?,
        topic: row.try_get("topic")?,
        main_seo_keyword: row.try_get("main_seo_keyword")?,
        suggested_pitch: row.try_get("suggested_pitch")?,
        origin: parse_text(row, "origin")?,
        status: parse_text(row, "status")?,
        created_at: from_epoch(row.try_get("created_at_epoch")?),
        updated_at: from_epoch(row.try_get("updated_at_epoch")?),
    })
}

pub(crate) const TEMPLATE_COLUMNS: &str =
    "id, pillar, category, topic, prompt, created_at_epoch, updated_at_epoch";

pub(crate) fn row_to_template(row: &sqlx::postgres::PgRow) -> Result<PromptTemplate, StorageError> {
    Ok(PromptTemplate {
        id: row.try_get("id")?,
        pillar: parse_opt_text(row, "pillar")?,
        category: row.try_get("category")?,
        topic: row.try_get("topic")?,
        prompt: row.try_get("prompt")?,
        created_at: from_epoch(row.try_get("created_at_epoch")?),
        updated_at: from_epoch(row.try_get("updated_at_epoch")?),
    })
}

pub(crate) const ITEM_COLUMNS: &str =
    "id, pitch_id, status, created_at_epoch, updated_at_epoch, claimed_at_epoch, error_reason";

pub(crate) fn row_to_queue_item(row: &sqlx::postgres::PgRow) -> Result<QueueItem, StorageError> {
    Ok(QueueItem {
        id: row.try_get("id")?,
        pitch_id: row.try_get("pitch_id")?,
        status: parse_text(row, "status")?,
        created_at: from_epoch(row.try_get("created_at_epoch")?),
        updated_at: from_epoch(row.try_get("updated_at_epoch")?),
        claimed_at: row.try_get::<Option<i64>, _>("claimed_at_epoch")?.map(from_epoch),
        error_reason: row.try_get("error_reason")?,
    })
}

pub(crate) const CONTENT_COLUMNS: &str =
    "id, pitch_id, title, body, seo_description, author, strategy, created_at_epoch";

pub(crate) fn row_to_content(row: &sqlx::postgres::PgRow) -> Result<StoredContent, StorageError> {
    Ok(StoredContent {
        id: row.try_get("id")?,
        pitch_id: row.try_get("pitch_id")?,
        title: row.try_get("title")?,
        body: row.try_get("body")?,
        seo_description: row.try_get("seo_description")?,
        author: row.try_get("author")?,
        strategy: row.try_get("strategy")?,
        created_at: from_epoch(row.try_get("created_at_epoch")?),
    })
}
