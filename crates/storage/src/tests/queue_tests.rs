//! Work queue: idempotent enqueue, priority ordering, claims, releases.

#![expect(clippy::unwrap_used, reason = "test code")]

use storyflow_core::{EnqueueOutcome, QueueItemStatus};

use super::{create_approved_pitch, create_test_storage};
use crate::error::StorageError;

#[test]
fn test_enqueue_is_idempotent_while_active() {
    let (storage, _temp_dir) = create_test_storage();
    let pitch = create_approved_pitch(&storage, "Fitness");

    let first = storage.enqueue(pitch.id).unwrap();
    assert!(first.is_inserted());
    let second = storage.enqueue(pitch.id).unwrap();
    assert_eq!(second, EnqueueOutcome::AlreadyQueued(first.item_id()));

    let claimed = storage.claim_batch(5).unwrap();
    assert_eq!(claimed.len(), 1);
    let third = storage.enqueue(pitch.id).unwrap();
    assert_eq!(third, EnqueueOutcome::AlreadyQueued(first.item_id()));

    assert!(storage.complete_item(first.item_id()).unwrap());
    let fourth = storage.enqueue(pitch.id).unwrap();
    assert!(fourth.is_inserted());
    assert_ne!(fourth.item_id(), first.item_id());
}

#[test]
fn test_enqueue_missing_pitch() {
    let (storage, _temp_dir) = create_test_storage();
    let err = storage.enqueue(77).unwrap_err();
    assert!(matches!(err, StorageError::NotFound { entity: "pitch", .. }));
    let err = storage.enqueue_with_priority(77).unwrap_err();
    assert!(matches!(err, StorageError::NotFound { entity: "pitch", .. }));
}

#[test]
fn test_claim_batch_fifo_and_exclusive() {
    let (storage, _temp_dir) = create_test_storage();
    let a = create_approved_pitch(&storage, "A");
    let b = create_approved_pitch(&storage, "B");
    let c = create_approved_pitch(&storage, "C");
    for pitch in [&a, &b, &c] {
        storage.enqueue(pitch.id).unwrap();
    }

    let first = storage.claim_batch(2).unwrap();
    assert_eq!(first.iter().map(|i| i.pitch_id).collect::<Vec<_>>(), vec![a.id, b.id]);
    assert!(first.iter().all(|i| i.status == QueueItemStatus::Processing));
    assert!(first.iter().all(|i| i.claimed_at.is_some()));

    let second = storage.claim_batch(2).unwrap();
    assert_eq!(second.iter().map(|i| i.pitch_id).collect::<Vec<_>>(), vec![c.id]);
    assert!(storage.claim_batch(2).unwrap().is_empty());
}

#[test]
fn test_priority_enqueue_claims_first() {
    let (storage, _temp_dir) = create_test_storage();
    let a = create_approved_pitch(&storage, "A");
    let b = create_approved_pitch(&storage, "B");
    let urgent = create_approved_pitch(&storage, "Urgent");
    storage.enqueue(a.id).unwrap();
    storage.enqueue(b.id).unwrap();

    let outcome = storage.enqueue_with_priority(urgent.id).unwrap();
    assert!(outcome.is_inserted());

    let claimed = storage.claim_batch(3).unwrap();
    assert_eq!(claimed.iter().map(|i| i.pitch_id).collect::<Vec<_>>(), vec![urgent.id, a.id, b.id]);
}

#[test]
fn test_priority_enqueue_bumps_pending_item() {
    let (storage, _temp_dir) = create_test_storage();
    let a = create_approved_pitch(&storage, "A");
    let b = create_approved_pitch(&storage, "B");
    storage.enqueue(a.id).unwrap();
    let b_item = storage.enqueue(b.id).unwrap().item_id();

    let outcome = storage.enqueue_with_priority(b.id).unwrap();
    assert_eq!(outcome, EnqueueOutcome::AlreadyQueued(b_item));

    let claimed = storage.claim_batch(1).unwrap();
    assert_eq!(claimed.first().unwrap().id, b_item);
}

#[test]
fn test_priority_enqueue_leaves_processing_item() {
    let (storage, _temp_dir) = create_test_storage();
    let a = create_approved_pitch(&storage, "A");
    let item = storage.enqueue(a.id).unwrap().item_id();
    storage.claim_batch(1).unwrap();

    let outcome = storage.enqueue_with_priority(a.id).unwrap();
    assert_eq!(outcome, EnqueueOutcome::AlreadyQueued(item));
    let stored = storage.get_queue_item(item).unwrap().unwrap();
    assert_eq!(stored.status, QueueItemStatus::Processing);
}

#[test]
fn test_complete_and_fail_require_processing() {
    let (storage, _temp_dir) = create_test_storage();
    let a = create_approved_pitch(&storage, "A");
    let b = create_approved_pitch(&storage, "B");
    let a_item = storage.enqueue(a.id).unwrap().item_id();
    let b_item = storage.enqueue(b.id).unwrap().item_id();

    assert!(!storage.complete_item(a_item).unwrap());
    storage.claim_batch(2).unwrap();
    assert!(storage.complete_item(a_item).unwrap());
    assert!(!storage.fail_item(a_item, "late").unwrap());
    assert!(storage.fail_item(b_item, "model timeout").unwrap());

    let failed = storage.get_queue_item(b_item).unwrap().unwrap();
    assert_eq!(failed.status, QueueItemStatus::Failed);
    assert_eq!(failed.error_reason.as_deref(), Some("model timeout"));
}

#[test]
fn test_release_items_returns_to_pending() {
    let (storage, _temp_dir) = create_test_storage();
    let a = create_approved_pitch(&storage, "A");
    let item = storage.enqueue(a.id).unwrap().item_id();
    storage.claim_batch(1).unwrap();

    assert_eq!(storage.release_items(&[item, 999]).unwrap(), 1);
    let released = storage.get_queue_item(item).unwrap().unwrap();
    assert_eq!(released.status, QueueItemStatus::Pending);
    assert!(released.claimed_at.is_none());
    assert_eq!(storage.release_items(&[]).unwrap(), 0);
}

#[test]
fn test_release_stale_items() {
    let (storage, _temp_dir) = create_test_storage();
    let a = create_approved_pitch(&storage, "A");
    storage.enqueue(a.id).unwrap();
    storage.claim_batch(1).unwrap();

    assert_eq!(storage.release_stale_items(3600).unwrap(), 0);
    assert_eq!(storage.release_stale_items(0).unwrap(), 1);
    assert_eq!(storage.claim_batch(1).unwrap().len(), 1);
}

#[test]
fn test_queue_stats_and_clear_failed() {
    let (storage, _temp_dir) = create_test_storage();
    let a = create_approved_pitch(&storage, "A");
    let b = create_approved_pitch(&storage, "B");
    let c = create_approved_pitch(&storage, "C");
    let a_item = storage.enqueue(a.id).unwrap().item_id();
    let b_item = storage.enqueue(b.id).unwrap().item_id();
    storage.claim_batch(2).unwrap();
    storage.complete_item(a_item).unwrap();
    storage.fail_item(b_item, "boom").unwrap();
    storage.enqueue(c.id).unwrap();

    let stats = storage.queue_stats().unwrap();
    assert_eq!((stats.pending, stats.processing, stats.completed, stats.failed), (1, 0, 1, 1));
    assert_eq!(stats.active(), 1);

    assert_eq!(storage.list_queue_items(Some(QueueItemStatus::Failed), 10).unwrap().len(), 1);
    assert_eq!(storage.list_queue_items(None, 10).unwrap().len(), 3);
    assert_eq!(storage.clear_failed_items().unwrap(), 1);
    assert_eq!(storage.queue_stats().unwrap().failed, 0);
}

#[test]
fn test_active_item_for_pitch() {
    let (storage, _temp_dir) = create_test_storage();
    let a = create_approved_pitch(&storage, "A");
    assert!(storage.active_item_for_pitch(a.id).unwrap().is_none());
    let item = storage.enqueue(a.id).unwrap().item_id();
    assert_eq!(storage.active_item_for_pitch(a.id).unwrap().unwrap().id, item);
}
