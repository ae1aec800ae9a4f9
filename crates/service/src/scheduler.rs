//! Periodic driver for the processor and the sweep.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use storyflow_core::SchedulerConfig;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::shutdown::cancelled;
use crate::{QueueProcessor, ReconciliationSweep};

pub struct Scheduler {
    processor: Arc<QueueProcessor>,
    sweep: Arc<ReconciliationSweep>,
    config: SchedulerConfig,
}

/// Join handles of the two loops.
pub struct SchedulerHandle {
    processor: JoinHandle<()>,
    sweep: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Waits for both loops to exit after shutdown was requested.
    pub async fn join(self) {
        for (name, handle) in [("processor", self.processor), ("sweep", self.sweep)] {
            if let Err(e) = handle.await {
                tracing::error!(task = name, error = %e, "scheduler task panicked");
            }
        }
    }
}

/// Runs `task` every `period` until shutdown.
///
/// The first run happens immediately. A tick that comes due while `task` is
/// still running is delayed, never run concurrently.
fn spawn_periodic<F, Fut>(
    name: &'static str,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut task: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                () = cancelled(&mut shutdown) => break,
                _ = interval.tick() => {},
            }
            tracing::debug!(task = name, "scheduler tick");
            task().await;
        }
        tracing::info!(task = name, "scheduler loop stopped");
    })
}

impl Scheduler {
    #[must_use]
    pub const fn new(
        processor: Arc<QueueProcessor>,
        sweep: Arc<ReconciliationSweep>,
        config: SchedulerConfig,
    ) -> Self {
        Self { processor, sweep, config }
    }

    #[must_use]
    pub fn spawn(self, shutdown: &watch::Receiver<bool>) -> SchedulerHandle {
        let processor = Arc::clone(&self.processor);
        let run_shutdown = shutdown.clone();
        let processor = spawn_periodic(
            "processor",
            self.config.process_interval,
            shutdown.clone(),
            move || {
                let processor = Arc::clone(&processor);
                let run_shutdown = run_shutdown.clone();
                async move {
                    if let Err(e) = processor.run(&run_shutdown).await {
                        tracing::error!(error = %e, "queue processor run failed");
                    }
                }
            },
        );

        let sweep = Arc::clone(&self.sweep);
        let sweep = spawn_periodic("sweep", self.config.sweep_interval, shutdown.clone(), move || {
            let sweep = Arc::clone(&sweep);
            async move {
                if let Err(e) = sweep.sweep().await {
                    tracing::error!(error = %e, "reconciliation sweep failed");
                }
            }
        });

        tracing::info!(
            process_interval_secs = self.config.process_interval.as_secs(),
            sweep_interval_secs = self.config.sweep_interval.as_secs(),
            "scheduler started"
        );
        SchedulerHandle { processor, sweep }
    }
}
