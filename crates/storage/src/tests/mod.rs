//! Test utilities and module declarations for storage tests.

use storyflow_core::{Pitch, PitchContent, PitchOrigin, PitchStatus};
use tempfile::TempDir;

use crate::Storage;

#[expect(clippy::unwrap_used, reason = "test code")]
pub fn create_test_storage() -> (Storage, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let storage = Storage::new(&db_path).unwrap();
    (storage, temp_dir)
}

#[expect(clippy::unwrap_used, reason = "test code")]
pub fn create_test_pitch(storage: &Storage, category: &str) -> Pitch {
    let content = PitchContent::new(category, format!("Pitch about {category}"))
        .topic("Home workouts")
        .keyword("exercícios em casa");
    storage.create_pitch(&content, PitchOrigin::Manual).unwrap()
}

/// Creates a pitch and moves it straight to `approved`.
#[expect(clippy::unwrap_used, reason = "test code")]
pub fn create_approved_pitch(storage: &Storage, category: &str) -> Pitch {
    let pitch = create_test_pitch(storage, category);
    storage.update_pitch_status(pitch.id, PitchStatus::Pending, PitchStatus::Approved).unwrap()
}

mod prompt_tests;
mod queue_tests;
