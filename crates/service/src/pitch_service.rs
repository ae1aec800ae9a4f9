//! Operator-facing pitch workflow.
//!
//! Every status change goes through [`PitchStatus::apply`] and is persisted
//! with a compare-and-set on the status the decision was made from. Queue
//! side effects run after the status write; a failed enqueue is logged and
//! left for the reconciliation sweep to repair.

use std::sync::Arc;

use serde::Serialize;
use storyflow_core::{
    Actor, CoreError, EnqueueOutcome, Pitch, PitchAction, PitchContent, PitchEdit, PitchOrigin,
    PitchStatus, SideEffect, Transition,
};
use storyflow_storage::traits::{PitchStore, QueueStore};
use storyflow_storage::{StorageBackend, StorageError};

use crate::ServiceError;

/// Result of an operator action.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome {
    pub pitch: Pitch,
    pub transition: Transition,
    /// `None` when the transition has no queue side effect or the enqueue failed.
    pub queued: Option<EnqueueOutcome>,
}

pub struct PitchService {
    storage: Arc<StorageBackend>,
}

impl PitchService {
    #[must_use]
    pub const fn new(storage: Arc<StorageBackend>) -> Self {
        Self { storage }
    }

    pub async fn create_pitch(
        &self,
        content: PitchContent,
        origin: PitchOrigin,
    ) -> Result<Pitch, ServiceError> {
        let content = content.validated()?;
        let pitch = self.storage.create_pitch(&content, origin).await?;
        tracing::info!(pitch_id = pitch.id, origin = origin.as_str(), category = %pitch.category, "pitch created");
        Ok(pitch)
    }

    pub async fn get_pitch(&self, id: i64) -> Result<Pitch, ServiceError> {
        self.storage.get_pitch(id).await?.ok_or(ServiceError::NotFound { entity: "pitch", id })
    }

    pub async fn list_pitches(
        &self,
        status: Option<PitchStatus>,
        limit: usize,
    ) -> Result<Vec<Pitch>, ServiceError> {
        Ok(self.storage.list_pitches(status, limit).await?)
    }

    /// Edits content fields; only pending pitches are editable.
    pub async fn edit_pitch(&self, id: i64, edit: &PitchEdit) -> Result<Pitch, ServiceError> {
        let pitch = self.get_pitch(id).await?;
        if edit.is_empty() {
            return Ok(pitch);
        }
        let content = edit.apply(&pitch)?;
        match self.storage.update_pitch_content(id, &content, PitchStatus::Pending).await {
            Ok(updated) => {
                tracing::info!(pitch_id = id, "pitch content updated");
                Ok(updated)
            },
            Err(StorageError::StaleStatus { actual, .. }) => {
                Err(CoreError::NotEditable(actual).into())
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Applies a named operator action.
    ///
    /// Pipeline-only actions (`start-processing`, `complete`) are rejected.
    pub async fn apply_action(
        &self,
        id: i64,
        action: PitchAction,
    ) -> Result<TransitionOutcome, ServiceError> {
        let pitch = self.get_pitch(id).await?;
        if action.actor() != Actor::Operator {
            return Err(CoreError::InvalidTransition { from: pitch.status, action }.into());
        }
        let transition = pitch.status.apply(action)?;
        self.commit(pitch, transition).await
    }

    /// Handles a raw "set status to X" request.
    ///
    /// The value must name a known status and the move must correspond to a
    /// listed operator action; anything else is rejected.
    pub async fn request_status(
        &self,
        id: i64,
        raw_status: &str,
    ) -> Result<TransitionOutcome, ServiceError> {
        let target: PitchStatus = raw_status.trim().parse()?;
        let pitch = self.get_pitch(id).await?;
        let action = pitch.status.operator_action_to(target)?;
        let transition = pitch.status.apply(action)?;
        self.commit(pitch, transition).await
    }

    async fn commit(
        &self,
        pitch: Pitch,
        transition: Transition,
    ) -> Result<TransitionOutcome, ServiceError> {
        let pitch = if transition.changes_status() {
            self.storage.update_pitch_status(pitch.id, transition.from, transition.to).await?
        } else {
            pitch
        };
        tracing::info!(
            pitch_id = pitch.id,
            action = %transition.action,
            from = %transition.from,
            to = %transition.to,
            "pitch transition"
        );

        let queued = match transition.side_effect {
            SideEffect::None => None,
            SideEffect::Enqueue => self.run_side_effect(pitch.id, false).await,
            SideEffect::EnqueueWithPriority => self.run_side_effect(pitch.id, true).await,
        };
        Ok(TransitionOutcome { pitch, transition, queued })
    }

    async fn run_side_effect(&self, pitch_id: i64, priority: bool) -> Option<EnqueueOutcome> {
        let result = if priority {
            self.storage.enqueue_with_priority(pitch_id).await
        } else {
            self.storage.enqueue(pitch_id).await
        };
        match result {
            Ok(outcome) => {
                tracing::debug!(pitch_id, priority, item_id = outcome.item_id(), "pitch queued");
                Some(outcome)
            },
            Err(e) => {
                tracing::warn!(pitch_id, priority, error = %e, "enqueue after transition failed, sweep will retry");
                None
            },
        }
    }
}
