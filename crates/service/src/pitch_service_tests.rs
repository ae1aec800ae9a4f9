#![expect(clippy::unwrap_used, reason = "test code")]

use storyflow_core::{
    CoreError, EnqueueOutcome, PitchAction, PitchContent, PitchEdit, PitchOrigin, PitchStatus,
    QueueItemStatus,
};
use storyflow_storage::traits::{PitchStore, QueueStore};

use crate::test_support::test_env;
use crate::{PitchService, ServiceError};

fn content(label: &str) -> PitchContent {
    PitchContent::new("Fitness", format!("Pitch {label}")).topic("Home workouts")
}

#[tokio::test]
async fn test_approve_enqueues() {
    let env = test_env();
    let service = PitchService::new(env.storage.clone());
    let pitch = service.create_pitch(content("a"), PitchOrigin::Manual).await.unwrap();

    let outcome = service.apply_action(pitch.id, PitchAction::Approve).await.unwrap();
    assert_eq!(outcome.pitch.status, PitchStatus::Approved);
    assert!(matches!(outcome.queued, Some(EnqueueOutcome::Inserted(_))));

    let item = env.storage.active_item_for_pitch(pitch.id).await.unwrap().unwrap();
    assert_eq!(item.status, QueueItemStatus::Pending);
}

#[tokio::test]
async fn test_action_outside_table_rejected() {
    let env = test_env();
    let service = PitchService::new(env.storage.clone());
    let pitch = service.create_pitch(content("a"), PitchOrigin::Manual).await.unwrap();
    service.apply_action(pitch.id, PitchAction::Approve).await.unwrap();

    let err = service.apply_action(pitch.id, PitchAction::Approve).await.unwrap_err();
    assert!(err.is_rejected());
    let err = service.apply_action(pitch.id, PitchAction::Publish).await.unwrap_err();
    assert!(matches!(err, ServiceError::Core(CoreError::InvalidTransition { .. })));
}

#[tokio::test]
async fn test_pipeline_actions_not_available_to_operator() {
    let env = test_env();
    let service = PitchService::new(env.storage.clone());
    let pitch = service.create_pitch(content("a"), PitchOrigin::Manual).await.unwrap();
    service.apply_action(pitch.id, PitchAction::Approve).await.unwrap();

    let err = service.apply_action(pitch.id, PitchAction::Complete).await.unwrap_err();
    assert!(matches!(err, ServiceError::Core(CoreError::InvalidTransition { .. })));
    assert_eq!(service.get_pitch(pitch.id).await.unwrap().status, PitchStatus::Approved);

    let err = service.request_status(pitch.id, "generated").await.unwrap_err();
    assert!(matches!(err, ServiceError::Core(CoreError::UnlistedTransition { .. })));
}

#[tokio::test]
async fn test_force_generate_jumps_queue() {
    let env = test_env();
    let service = PitchService::new(env.storage.clone());
    let first = service.create_pitch(content("first"), PitchOrigin::Manual).await.unwrap();
    let urgent = service.create_pitch(content("urgent"), PitchOrigin::Manual).await.unwrap();
    service.apply_action(first.id, PitchAction::Approve).await.unwrap();

    let outcome = service.apply_action(urgent.id, PitchAction::ForceGenerate).await.unwrap();
    assert_eq!(outcome.pitch.status, PitchStatus::Approved);
    let urgent_item = outcome.queued.unwrap().item_id();

    let claimed = env.storage.claim_batch(1).await.unwrap();
    assert_eq!(claimed.first().unwrap().id, urgent_item);
}

#[tokio::test]
async fn test_force_generate_on_approved_bumps_existing_item() {
    let env = test_env();
    let service = PitchService::new(env.storage.clone());
    let first = service.create_pitch(content("first"), PitchOrigin::Manual).await.unwrap();
    let second = service.create_pitch(content("second"), PitchOrigin::Manual).await.unwrap();
    service.apply_action(first.id, PitchAction::Approve).await.unwrap();
    let approved = service.apply_action(second.id, PitchAction::Approve).await.unwrap();
    let second_item = approved.queued.unwrap().item_id();

    let outcome = service.apply_action(second.id, PitchAction::ForceGenerate).await.unwrap();
    assert!(!outcome.transition.changes_status());
    assert_eq!(outcome.queued, Some(EnqueueOutcome::AlreadyQueued(second_item)));

    let claimed = env.storage.claim_batch(1).await.unwrap();
    assert_eq!(claimed.first().unwrap().id, second_item);
}

#[tokio::test]
async fn test_refuse_and_reopen() {
    let env = test_env();
    let service = PitchService::new(env.storage.clone());
    let pitch = service.create_pitch(content("a"), PitchOrigin::Automated).await.unwrap();

    let refused = service.apply_action(pitch.id, PitchAction::Refuse).await.unwrap();
    assert_eq!(refused.pitch.status, PitchStatus::Refused);
    assert!(refused.queued.is_none());

    let reopened = service.request_status(pitch.id, "pending").await.unwrap();
    assert_eq!(reopened.transition.action, PitchAction::Reopen);
    assert_eq!(reopened.pitch.status, PitchStatus::Pending);
}

#[tokio::test]
async fn test_raw_status_requests() {
    let env = test_env();
    let service = PitchService::new(env.storage.clone());
    let pitch = service.create_pitch(content("a"), PitchOrigin::Manual).await.unwrap();

    let err = service.request_status(pitch.id, "assign").await.unwrap_err();
    assert!(matches!(err, ServiceError::Core(CoreError::InvalidStatus(_))));

    let outcome = service.request_status(pitch.id, " approved ").await.unwrap();
    assert_eq!(outcome.transition.action, PitchAction::Approve);
    assert!(outcome.queued.is_some());
}

#[tokio::test]
async fn test_retry_after_failed_generation() {
    let env = test_env();
    let service = PitchService::new(env.storage.clone());
    let pitch = service.create_pitch(content("a"), PitchOrigin::Manual).await.unwrap();
    let item = service.apply_action(pitch.id, PitchAction::Approve).await.unwrap().queued.unwrap();
    env.storage
        .update_pitch_status(pitch.id, PitchStatus::Approved, PitchStatus::Processing)
        .await
        .unwrap();
    env.storage.claim_batch(1).await.unwrap();
    env.storage.fail_item(item.item_id(), "boom").await.unwrap();

    let outcome = service.apply_action(pitch.id, PitchAction::Retry).await.unwrap();
    assert_eq!(outcome.pitch.status, PitchStatus::Approved);
    let requeued = outcome.queued.unwrap();
    assert!(requeued.is_inserted());
    assert_ne!(requeued.item_id(), item.item_id());
}

#[tokio::test]
async fn test_edit_only_while_pending() {
    let env = test_env();
    let service = PitchService::new(env.storage.clone());
    let pitch = service.create_pitch(content("a"), PitchOrigin::Manual).await.unwrap();

    let edit = PitchEdit { suggested_pitch: Some("Rewritten".to_owned()), ..PitchEdit::default() };
    let edited = service.edit_pitch(pitch.id, &edit).await.unwrap();
    assert_eq!(edited.suggested_pitch, "Rewritten");
    assert_eq!(edited.topic.as_deref(), Some("Home workouts"));

    service.apply_action(pitch.id, PitchAction::Approve).await.unwrap();
    let err = service.edit_pitch(pitch.id, &edit).await.unwrap_err();
    assert!(matches!(err, ServiceError::Core(CoreError::NotEditable(PitchStatus::Approved))));
}

#[tokio::test]
async fn test_create_validation_and_not_found() {
    let env = test_env();
    let service = PitchService::new(env.storage.clone());

    let err = service.create_pitch(PitchContent::new("  ", "x"), PitchOrigin::Manual).await.unwrap_err();
    assert!(err.is_rejected());

    let err = service.apply_action(404, PitchAction::Approve).await.unwrap_err();
    assert!(err.is_not_found());

    assert!(service.list_pitches(None, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_change_surfaces_stale_status() {
    let env = test_env();
    let service = PitchService::new(env.storage.clone());
    let pitch = service.create_pitch(content("a"), PitchOrigin::Manual).await.unwrap();
    env.storage
        .update_pitch_status(pitch.id, PitchStatus::Pending, PitchStatus::Refused)
        .await
        .unwrap();

    let err = env
        .storage
        .update_pitch_status(pitch.id, PitchStatus::Pending, PitchStatus::Approved)
        .await
        .map_err(ServiceError::from)
        .unwrap_err();
    assert!(err.is_stale());
}
