//! Typed error enum for the storage layer.
//!
//! Callers match on specific failure modes (not found, duplicate, stale
//! status) instead of inspecting backend error strings.

use storyflow_core::{CoreError, PitchStatus};
use thiserror::Error;

/// Storage-layer error with variants covering every expected failure mode.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Row not found for expected-present entity.
    #[error("not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    /// Unique constraint violation (template specificity key).
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// Compare-and-set on a pitch status lost against a concurrent writer.
    #[error("pitch {pitch_id} is {actual}, expected {expected}")]
    StaleStatus { pitch_id: i64, expected: PitchStatus, actual: PitchStatus },

    #[cfg(feature = "sqlite")]
    #[error("database error: {0}")]
    Sqlite(#[source] rusqlite::Error),

    #[cfg(feature = "sqlite")]
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[cfg(feature = "postgres")]
    #[error("database error: {0}")]
    Postgres(#[source] sqlx::Error),

    /// Row data could not be mapped into a domain type.
    #[error("data corruption: {context}")]
    DataCorruption {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Migration failure.
    #[error("migration error: {0}")]
    Migration(String),

    /// Filesystem failure while preparing the database location.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking task running a SQLite call panicked or was cancelled.
    #[error("blocking task failed: {0}")]
    Blocking(String),
}

impl StorageError {
    /// Whether this error is likely transient (worth retrying).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Pool(_) => true,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(rusqlite::Error::SqliteFailure(e, _)) => {
                matches!(e.code, rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
            },
            #[cfg(feature = "postgres")]
            Self::Postgres(sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)) => true,
            _ => false,
        }
    }

    /// Whether this error is a unique-constraint violation.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }

    #[cfg_attr(not(feature = "postgres"), allow(dead_code))]
    pub(crate) fn corrupt(context: impl Into<String>, source: CoreError) -> Self {
        Self::DataCorruption { context: context.into(), source: Box::new(source) }
    }
}

/// Custom `From<rusqlite::Error>`, not blanket `#[from]`.
///
/// - `QueryReturnedNoRows` → `NotFound` (callers remap with entity context)
/// - `SQLITE_CONSTRAINT_UNIQUE` → `Duplicate`
/// - everything else → `Sqlite`
#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::QueryReturnedNoRows => {
                Self::NotFound { entity: "row", id: "unknown".into() }
            },
            rusqlite::Error::SqliteFailure(e, msg)
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Self::Duplicate(msg.clone().unwrap_or_else(|| e.to_string()))
            },
            _ => Self::Sqlite(err),
        }
    }
}

/// Custom `From<sqlx::Error>`.
///
/// - `RowNotFound` → `NotFound`
/// - SQLSTATE 23505 → `Duplicate`
/// - everything else → `Postgres`
#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound { entity: "row", id: "unknown".into() },
            sqlx::Error::Database(db_err) if db_err.code().is_some_and(|c| c == "23505") => {
                Self::Duplicate(db_err.message().to_owned())
            },
            _ => Self::Postgres(err),
        }
    }
}

impl From<tokio::task::JoinError> for StorageError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Blocking(err.to_string())
    }
}
