//! Typed error enum for the service layer.
//!
//! Unifies storage and domain-validation failures so callers can match on
//! specific failure modes such as a missing entity or a stale status.

use storyflow_core::CoreError;
use storyflow_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage operation failed (DB, not found, duplicate, stale status).
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// Domain validation: invalid status, transition or edit.
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Storage(StorageError::NotFound { .. }))
    }

    /// Whether a concurrent writer changed the pitch status first.
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Storage(StorageError::StaleStatus { .. }))
    }

    /// Whether the caller asked for something the domain rules forbid.
    pub fn is_rejected(&self) -> bool {
        matches!(
            self,
            Self::Core(
                CoreError::InvalidStatus(_)
                    | CoreError::InvalidTransition { .. }
                    | CoreError::UnlistedTransition { .. }
                    | CoreError::NotEditable(_)
                    | CoreError::InvalidInput(_)
            )
        )
    }
}
