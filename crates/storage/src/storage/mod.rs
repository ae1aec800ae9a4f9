//! `SQLite` storage implementation
//!
//! All methods are synchronous; `sqlite_async` wraps them in
//! `spawn_blocking` for the async traits.

// SQLite uses i64 for counts/limits, Rust uses usize - safe conversions within DB context
#![allow(
    clippy::as_conversions,
    clippy::cast_possible_wrap,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "SQLite i64 <-> Rust usize conversions are safe within DB row counts"
)]
#![allow(clippy::absolute_paths, reason = "std paths in error handling are clear")]

mod content;
mod pitches;
mod prompts;
mod queue;

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use storyflow_core::{CoreError, DEFAULT_DB_POOL_SIZE, MAX_QUERY_LIMIT};

use crate::error::StorageError;
use crate::migrations;

/// Type alias for pooled connection
pub(crate) type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Main storage struct wrapping `SQLite` connection pool
#[derive(Clone, Debug)]
pub struct Storage {
    pub(crate) pool: Pool<SqliteConnectionManager>,
}

/// Get a connection from the pool
pub(crate) fn get_conn(pool: &Pool<SqliteConnectionManager>) -> Result<PooledConn, StorageError> {
    Ok(pool.get()?)
}

/// Log row read errors and filter them out
pub(crate) fn log_row_error<T>(result: rusqlite::Result<T>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(error = %e, "Row read error");
            None
        },
    }
}

/// Parse an enum column, surfacing bad values as a conversion failure
pub(crate) fn parse_column<T>(value: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = CoreError>,
{
    value.parse().map_err(|e: CoreError| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

pub(crate) fn parse_opt_column<T>(value: Option<String>) -> rusqlite::Result<Option<T>>
where
    T: FromStr<Err = CoreError>,
{
    value.as_deref().map(parse_column).transpose()
}

pub(crate) fn from_epoch(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

pub(crate) fn clamp_limit(limit: usize) -> i64 {
    limit.min(MAX_QUERY_LIMIT) as i64
}

/// Custom connection initializer for concurrency settings
fn init_connection(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "PRAGMA busy_timeout = 30000;
         PRAGMA synchronous = NORMAL;
         PRAGMA foreign_keys = ON;",
    )
}

impl Storage {
    /// Create new storage instance with `SQLite` connection pool
    ///
    /// # Errors
    /// Returns an error if the pool cannot be built or migrations fail.
    pub fn new(db_path: &Path) -> Result<Self, StorageError> {
        Self::with_pool_size(db_path, DEFAULT_DB_POOL_SIZE)
    }

    /// # Errors
    /// Returns an error if the pool cannot be built or migrations fail.
    pub fn with_pool_size(db_path: &Path, pool_size: u32) -> Result<Self, StorageError> {
        let manager = SqliteConnectionManager::file(db_path).with_init(init_connection);
        let pool = Pool::builder().max_size(pool_size.max(1)).build(manager)?;

        let conn = pool.get()?;
        migrations::run_migrations(&conn).map_err(|e| StorageError::Migration(e.to_string()))?;
        drop(conn);

        tracing::info!(pool_size, path = %db_path.display(), "Storage initialized with connection pool");

        Ok(Self { pool })
    }
}
