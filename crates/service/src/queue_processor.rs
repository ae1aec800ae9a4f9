//! Drains the work queue: claim a batch, generate each item, record outcomes.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use storyflow_core::{GeneratedContent, OutputTarget, PipelineConfig, QueueItem};
use storyflow_llm::{GenerationStrategy, Options};
use storyflow_storage::traits::{ContentStore, PitchStore, QueueStore};
use storyflow_storage::{StorageBackend, StorageError};
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::shutdown::{cancelled, is_cancelled};
use crate::{PromptResolver, ServiceError};

/// Counts for one processor run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessorReport {
    pub claimed: usize,
    pub completed: usize,
    pub failed: usize,
    /// Claimed items handed back to pending because the run was cancelled.
    pub released: usize,
}

enum ItemOutcome {
    Completed,
    Failed(String),
    Abandoned,
}

/// What a single job needs; cloned into the job's own task.
#[derive(Clone)]
struct JobContext {
    storage: Arc<StorageBackend>,
    resolver: Arc<PromptResolver>,
    strategy: Arc<dyn GenerationStrategy>,
    options: Arc<Options>,
    job_timeout: Duration,
}

pub struct QueueProcessor {
    job: JobContext,
    output_target: OutputTarget,
    default_author: Option<String>,
    batch_size: usize,
}

impl QueueProcessor {
    #[must_use]
    pub fn new(
        storage: Arc<StorageBackend>,
        strategy: Arc<dyn GenerationStrategy>,
        config: &PipelineConfig,
    ) -> Self {
        let resolver = PromptResolver::new(Arc::clone(&storage), config.default_prompt.clone());
        Self {
            job: JobContext {
                storage,
                resolver: Arc::new(resolver),
                strategy,
                options: Arc::new(Options::new()),
                job_timeout: config.job_timeout,
            },
            output_target: config.output_target,
            default_author: config.default_author.clone(),
            batch_size: config.batch_size.max(1),
        }
    }

    /// Processes one batch.
    ///
    /// Items are handled one at a time and independently: a failure, or a
    /// panic inside the strategy, marks that item `failed` and the run moves
    /// on. When `shutdown` fires during generation, the job is aborted and
    /// every unfinished item goes back to `pending`. Storing the output is
    /// never interrupted once generation has finished.
    ///
    /// # Errors
    /// Returns an error only if the batch cannot be claimed.
    pub async fn run(&self, shutdown: &watch::Receiver<bool>) -> Result<ProcessorReport, ServiceError> {
        let mut report = ProcessorReport::default();
        if is_cancelled(shutdown) {
            return Ok(report);
        }

        let storage = &self.job.storage;
        let items = storage.claim_batch(self.batch_size).await?;
        report.claimed = items.len();
        if items.is_empty() {
            tracing::debug!("queue processor: nothing to do");
            return Ok(report);
        }

        let mut shutdown = shutdown.clone();
        let mut unfinished = Vec::new();
        for item in &items {
            if is_cancelled(&shutdown) {
                unfinished.push(item.id);
                continue;
            }

            let outcome = tokio::select! {
                biased;
                () = cancelled(&mut shutdown) => ItemOutcome::Abandoned,
                generated = self.generate_isolated(item) => match generated {
                    Ok(content) => self.commit(item, &content).await,
                    Err(reason) => ItemOutcome::Failed(reason),
                },
            };

            match outcome {
                ItemOutcome::Completed => {
                    report.completed += 1;
                    if let Err(e) = storage.complete_item(item.id).await {
                        tracing::error!(item_id = item.id, error = %e, "failed to mark queue item completed");
                    }
                },
                ItemOutcome::Failed(reason) => {
                    report.failed += 1;
                    tracing::warn!(item_id = item.id, pitch_id = item.pitch_id, reason = %reason, "queue item failed");
                    if let Err(e) = storage.fail_item(item.id, &reason).await {
                        tracing::error!(item_id = item.id, error = %e, "failed to mark queue item failed");
                    }
                },
                ItemOutcome::Abandoned => {
                    tracing::info!(item_id = item.id, "generation abandoned on shutdown");
                    unfinished.push(item.id);
                },
            }
        }

        if !unfinished.is_empty() {
            match storage.release_items(&unfinished).await {
                Ok(released) => report.released = released,
                Err(e) => {
                    tracing::error!(error = %e, count = unfinished.len(), "failed to release unfinished items");
                },
            }
        }

        tracing::info!(
            claimed = report.claimed,
            completed = report.completed,
            failed = report.failed,
            released = report.released,
            "queue processor run finished"
        );
        Ok(report)
    }

    /// Runs the job in its own task. Dropping the returned future aborts it.
    async fn generate_isolated(&self, item: &QueueItem) -> Result<GeneratedContent, String> {
        let mut job = JoinSet::new();
        job.spawn(self.job.clone().generate(item.pitch_id));
        match job.join_next().await {
            Some(Ok(result)) => result,
            Some(Err(e)) if e.is_panic() => Err(format!("panic: {}", panic_message(&*e.into_panic()))),
            Some(Err(e)) => Err(format!("job aborted: {e}")),
            None => Err("job aborted".to_owned()),
        }
    }

    /// Stores the output and completes the pitch in one transaction.
    async fn commit(&self, item: &QueueItem, content: &GeneratedContent) -> ItemOutcome {
        let committed = self
            .job
            .storage
            .commit_generation(
                item.pitch_id,
                content,
                self.output_target,
                self.default_author.as_deref(),
                self.job.strategy.name(),
            )
            .await;
        match committed {
            Ok(commit) => {
                tracing::info!(
                    pitch_id = item.pitch_id,
                    from = %commit.from,
                    draft_id = commit.draft.as_ref().map(|d| d.id),
                    "pitch generated"
                );
                ItemOutcome::Completed
            },
            Err(StorageError::StaleStatus { actual, .. }) => {
                ItemOutcome::Failed(format!("pitch status changed during generation (now {actual})"))
            },
            Err(e) => ItemOutcome::Failed(format!("storage: {e}")),
        }
    }
}

impl JobContext {
    /// Resolves the prompt and calls the strategy; `Err` carries the reason
    /// recorded on the item.
    async fn generate(self, pitch_id: i64) -> Result<GeneratedContent, String> {
        let pitch = self
            .storage
            .get_pitch(pitch_id)
            .await
            .map_err(|e| format!("storage: {e}"))?
            .ok_or_else(|| "pitch not found".to_owned())?;
        if !pitch.status.accepts_generation() {
            return Err(format!("pitch not eligible (status {})", pitch.status));
        }

        let prompt = self
            .resolver
            .resolve(&pitch)
            .await
            .map_err(|e| format!("storage: {e}"))?
            .ok_or_else(|| "no prompt available".to_owned())?;

        let started = std::time::Instant::now();
        let content = tokio::time::timeout(
            self.job_timeout,
            self.strategy.process_prompt(&prompt.text, &self.options),
        )
        .await
        .map_err(|_elapsed| format!("timeout after {}s", self.job_timeout.as_secs()))?
        .map_err(|e| {
            if e.category() == "transport" {
                tracing::warn!(pitch_id, error = %e, "generation backend unreachable");
            }
            format!("{}: {e}", e.category())
        })?;
        if content.is_empty() {
            return Err("empty_content: model returned empty content".to_owned());
        }
        tracing::debug!(
            pitch_id,
            tier = %prompt.tier,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "content generated"
        );
        Ok(content)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic payload")
}
