//! Work queue types.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Status of a generation job in the work queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueItemStatus {
    /// Waiting to be claimed.
    Pending,
    /// Claimed by a processor run.
    Processing,
    /// Content was generated and stored.
    Completed,
    /// Generation failed; see `error_reason`.
    Failed,
}

impl QueueItemStatus {
    pub const ALL: &'static [QueueItemStatus] =
        &[Self::Pending, Self::Processing, Self::Completed, Self::Failed];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Pending and processing items block a second enqueue of the same pitch.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(*self, Self::Pending | Self::Processing)
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

impl Display for QueueItemStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueItemStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(CoreError::InvalidStatus(other.to_owned())),
        }
    }
}

/// One generation job for one pitch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: i64,
    pub pitch_id: i64,
    pub status: QueueItemStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub error_reason: Option<String>,
}

/// Result of an idempotent enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "item_id", rename_all = "snake_case")]
pub enum EnqueueOutcome {
    /// A new pending item was created.
    Inserted(i64),
    /// The pitch already had an active item; nothing was written.
    AlreadyQueued(i64),
}

impl EnqueueOutcome {
    #[must_use]
    pub const fn item_id(&self) -> i64 {
        match *self {
            Self::Inserted(id) | Self::AlreadyQueued(id) => id,
        }
    }

    #[must_use]
    pub const fn is_inserted(&self) -> bool {
        matches!(*self, Self::Inserted(_))
    }
}

/// Counts of queue items by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub pending: u64,
    pub processing: u64,
    pub completed: u64,
    pub failed: u64,
}

impl QueueStats {
    #[must_use]
    pub const fn active(&self) -> u64 {
        self.pending.saturating_add(self.processing)
    }
}
