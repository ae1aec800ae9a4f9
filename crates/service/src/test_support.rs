//! Shared fixtures for service tests.

#![expect(clippy::unwrap_used, reason = "test code")]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use storyflow_core::{GeneratedContent, Pitch, PitchContent, PitchOrigin, PitchStatus};
use storyflow_llm::{GenerationStrategy, LlmError, Options};
use storyflow_storage::StorageBackend;
use storyflow_storage::traits::PitchStore;
use tempfile::TempDir;

pub struct TestEnv {
    pub storage: Arc<StorageBackend>,
    _temp_dir: TempDir,
}

pub fn test_env() -> TestEnv {
    let temp_dir = TempDir::new().unwrap();
    let storage = StorageBackend::new_sqlite(&temp_dir.path().join("test.db"), 4).unwrap();
    TestEnv { storage: Arc::new(storage), _temp_dir: temp_dir }
}

pub async fn create_pitch(storage: &StorageBackend, content: PitchContent) -> Pitch {
    storage.create_pitch(&content, PitchOrigin::Manual).await.unwrap()
}

pub async fn approved_pitch(storage: &StorageBackend, suggested: &str) -> Pitch {
    let pitch = create_pitch(storage, PitchContent::new("Fitness", suggested)).await;
    storage.update_pitch_status(pitch.id, PitchStatus::Pending, PitchStatus::Approved).await.unwrap()
}

type Behavior = Box<dyn Fn(&str) -> Result<GeneratedContent, LlmError> + Send + Sync>;

/// Scripted strategy that records every prompt it receives.
pub struct FakeStrategy {
    behavior: Behavior,
    delay: Duration,
    prompts: Mutex<Vec<String>>,
}

impl FakeStrategy {
    /// Succeeds with an article whose body echoes the prompt.
    pub fn echo() -> Self {
        Self::with(|prompt| {
            Ok(GeneratedContent {
                title: "Generated".to_owned(),
                body: format!("Article for: {prompt}"),
                seo_description: "Generated article".to_owned(),
            })
        })
    }

    /// Fails every prompt containing `marker`, echoes the rest.
    pub fn failing_on(marker: &'static str) -> Self {
        let echo = Self::echo();
        Self::with(move |prompt| {
            if prompt.contains(marker) {
                Err(LlmError::HttpStatus { code: 500, body: "model overloaded".to_owned() })
            } else {
                (echo.behavior)(prompt)
            }
        })
    }

    pub fn with<F>(behavior: F) -> Self
    where
        F: Fn(&str) -> Result<GeneratedContent, LlmError> + Send + Sync + 'static,
    {
        Self { behavior: Box::new(behavior), delay: Duration::ZERO, prompts: Mutex::new(Vec::new()) }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Runs the scripted behavior without recording or delay.
    pub fn process_sync(&self, prompt: &str) -> Result<GeneratedContent, LlmError> {
        (self.behavior)(prompt)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationStrategy for FakeStrategy {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn process_prompt(
        &self,
        prompt: &str,
        _options: &Options,
    ) -> Result<GeneratedContent, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_owned());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.behavior)(prompt)
    }
}
