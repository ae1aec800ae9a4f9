use std::sync::Arc;

use anyhow::{Context, Result};
use storyflow_core::Config;
use storyflow_llm::{GenerationStrategy, build_strategy};
use storyflow_service::{
    QueueProcessor, QueueService, ReconciliationSweep, Scheduler, run_startup_recovery,
    shutdown_channel,
};
use tokio::sync::watch;

use super::{open_storage, print_json};

fn strategy(config: &Config) -> Result<Arc<dyn GenerationStrategy>> {
    build_strategy(&config.generation).context("generation backend is not configured")
}

/// Flips `tx` to `true` on Ctrl-C.
fn forward_ctrl_c(tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("shutdown requested");
                let _ = tx.send(true);
            },
            Err(e) => tracing::error!(error = %e, "failed to listen for Ctrl-C"),
        }
    });
}

pub(crate) async fn run(config: Config) -> Result<()> {
    let strategy = strategy(&config)?;
    let storage = open_storage(&config).await?;

    let queue = QueueService::new(Arc::clone(&storage));
    if let Err(e) = run_startup_recovery(&queue, config.pipeline.visibility_timeout_secs).await {
        tracing::warn!(error = %e, "startup recovery failed");
    }

    let processor = Arc::new(QueueProcessor::new(Arc::clone(&storage), strategy, &config.pipeline));
    let sweep = Arc::new(ReconciliationSweep::new(storage));
    let (tx, rx) = shutdown_channel();
    let handle = Scheduler::new(processor, sweep, config.scheduler).spawn(&rx);
    tracing::info!(
        process_every_secs = config.scheduler.process_interval.as_secs(),
        sweep_every_secs = config.scheduler.sweep_interval.as_secs(),
        "scheduler started"
    );

    forward_ctrl_c(tx);
    handle.join().await;
    tracing::info!("scheduler stopped");
    Ok(())
}

pub(crate) async fn run_process_once(config: Config) -> Result<()> {
    let strategy = strategy(&config)?;
    let storage = open_storage(&config).await?;
    let processor = QueueProcessor::new(storage, strategy, &config.pipeline);

    let (tx, rx) = shutdown_channel();
    forward_ctrl_c(tx);
    let report = processor.run(&rx).await?;
    print_json(&report)
}

pub(crate) async fn run_sweep_once(config: Config) -> Result<()> {
    let storage = open_storage(&config).await?;
    let report = ReconciliationSweep::new(storage).sweep().await?;
    print_json(&report)
}
