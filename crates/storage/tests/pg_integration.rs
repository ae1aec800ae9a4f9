//! Integration tests for PgStorage.
//! Run with: DATABASE_URL=... cargo test -p storyflow-storage --features postgres -- --ignored pg_

#![cfg(feature = "postgres")]
#![allow(clippy::unwrap_used, reason = "integration test code")]

use storyflow_core::{
    EnqueueOutcome, GeneratedContent, NewPromptTemplate, OutputTarget, PitchContent, PitchOrigin,
    PitchStatus, QueueItemStatus,
};
use storyflow_storage::traits::{ContentStore, PitchStore, PromptTemplateStore, QueueStore};
use storyflow_storage::{PgStorage, StorageError};

async fn create_pg_storage() -> PgStorage {
    let url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for PgStorage integration tests");
    PgStorage::new(&url).await.expect("Failed to connect to PostgreSQL")
}

fn unique_category(label: &str) -> String {
    format!("{label}-{}", chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

async fn approved_pitch(storage: &PgStorage, label: &str) -> i64 {
    let pitch = storage
        .create_pitch(&PitchContent::new(unique_category(label), "pg pitch"), PitchOrigin::Manual)
        .await
        .unwrap();
    storage.update_pitch_status(pitch.id, PitchStatus::Pending, PitchStatus::Approved).await.unwrap();
    pitch.id
}

#[tokio::test]
#[ignore]
async fn pg_status_compare_and_set() {
    let storage = create_pg_storage().await;
    let pitch = storage
        .create_pitch(&PitchContent::new(unique_category("cas"), "body"), PitchOrigin::Manual)
        .await
        .unwrap();
    let err = storage
        .update_pitch_status(pitch.id, PitchStatus::Approved, PitchStatus::Processing)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::StaleStatus { .. }));
}

#[tokio::test]
#[ignore]
async fn pg_enqueue_idempotent_and_claim() {
    let storage = create_pg_storage().await;
    let pitch_id = approved_pitch(&storage, "enqueue").await;

    let first = storage.enqueue(pitch_id).await.unwrap();
    assert!(first.is_inserted());
    let again = storage.enqueue(pitch_id).await.unwrap();
    assert_eq!(again, EnqueueOutcome::AlreadyQueued(first.item_id()));

    let item = storage.active_item_for_pitch(pitch_id).await.unwrap().unwrap();
    assert_eq!(item.status, QueueItemStatus::Pending);

    let _ = storage.enqueue_with_priority(pitch_id).await.unwrap();
    let claimed = storage.claim_batch(1).await.unwrap();
    assert_eq!(claimed.first().unwrap().id, first.item_id());
    assert!(storage.complete_item(first.item_id()).await.unwrap());
}

#[tokio::test]
#[ignore]
async fn pg_template_duplicate_and_lookup() {
    let storage = create_pg_storage().await;
    let category = unique_category("tmpl");
    let template =
        storage.create_template(&NewPromptTemplate::new(category.as_str(), "{pitch}")).await.unwrap();
    let err =
        storage.create_template(&NewPromptTemplate::new(category.as_str(), "again")).await.unwrap_err();
    assert!(err.is_duplicate());

    let found = storage.find_templates(&category, None).await.unwrap();
    assert_eq!(found.iter().map(|t| t.id).collect::<Vec<_>>(), vec![template.id]);
    assert!(storage.delete_template(template.id).await.unwrap());
}

#[tokio::test]
#[ignore]
async fn pg_commit_generation() {
    let storage = create_pg_storage().await;
    let pitch_id = approved_pitch(&storage, "content").await;
    let content = GeneratedContent {
        title: "Title".to_owned(),
        body: "Body".to_owned(),
        seo_description: "Body".to_owned(),
    };
    let commit = storage
        .commit_generation(pitch_id, &content, OutputTarget::Draft, None, "direct")
        .await
        .unwrap();
    assert_eq!(commit.pitch.status, PitchStatus::Generated);
    let stored = commit.draft.unwrap();
    assert_eq!(storage.content_for_pitch(pitch_id).await.unwrap().len(), 1);
    assert_eq!(storage.get_content(stored.id).await.unwrap().unwrap().title, "Title");

    let err = storage
        .commit_generation(pitch_id, &content, OutputTarget::Draft, None, "direct")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::StaleStatus { actual: PitchStatus::Generated, .. }));
    assert_eq!(storage.content_for_pitch(pitch_id).await.unwrap().len(), 1);
}
