//! Periodic repair pass: every approved pitch ends up queued and processing.

use std::sync::Arc;

use serde::Serialize;
use storyflow_core::{EnqueueOutcome, PitchAction, PitchStatus};
use storyflow_storage::traits::{PitchStore, QueueStore};
use storyflow_storage::{StorageBackend, StorageError};

use crate::ServiceError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub scanned: usize,
    pub enqueued: usize,
    pub already_queued: usize,
    pub transitioned: usize,
    pub errors: usize,
}

pub struct ReconciliationSweep {
    storage: Arc<StorageBackend>,
}

impl ReconciliationSweep {
    #[must_use]
    pub const fn new(storage: Arc<StorageBackend>) -> Self {
        Self { storage }
    }

    /// Enqueues every approved pitch (idempotently) and moves it to
    /// `processing`. Per-pitch errors are counted and logged.
    ///
    /// # Errors
    /// Returns an error only if approved pitches cannot be listed.
    pub async fn sweep(&self) -> Result<SweepReport, ServiceError> {
        let transition = PitchStatus::Approved.apply(PitchAction::StartProcessing)?;
        let ids = self.storage.pitch_ids_with_status(PitchStatus::Approved).await?;
        let mut report = SweepReport { scanned: ids.len(), ..SweepReport::default() };

        for pitch_id in ids {
            match self.storage.enqueue(pitch_id).await {
                Ok(EnqueueOutcome::Inserted(item_id)) => {
                    report.enqueued += 1;
                    tracing::debug!(pitch_id, item_id, "sweep enqueued approved pitch");
                },
                Ok(EnqueueOutcome::AlreadyQueued(_)) => report.already_queued += 1,
                Err(e) => {
                    report.errors += 1;
                    tracing::warn!(pitch_id, error = %e, "sweep enqueue failed");
                    continue;
                },
            }

            match self.storage.update_pitch_status(pitch_id, transition.from, transition.to).await {
                Ok(_) => report.transitioned += 1,
                Err(StorageError::StaleStatus { actual, .. }) => {
                    tracing::debug!(pitch_id, %actual, "pitch moved on before sweep transition");
                },
                Err(e) => {
                    report.errors += 1;
                    tracing::warn!(pitch_id, error = %e, "sweep status update failed");
                },
            }
        }

        if report.scanned > 0 {
            tracing::info!(
                scanned = report.scanned,
                enqueued = report.enqueued,
                already_queued = report.already_queued,
                transitioned = report.transitioned,
                errors = report.errors,
                "reconciliation sweep finished"
            );
        }
        Ok(report)
    }
}
