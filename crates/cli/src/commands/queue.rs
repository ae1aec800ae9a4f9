use anyhow::{Context, Result, bail};
use clap::Subcommand;
use storyflow_core::{Config, QueueItemStatus};
use storyflow_service::QueueService;

use super::{open_storage, print_json};

#[derive(Subcommand)]
pub(crate) enum QueueCommand {
    List {
        #[arg(short, long)]
        status: Option<QueueItemStatus>,
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },
    Stats,
    /// Show one queue item, or the active item of a pitch
    Show {
        #[arg(required_unless_present = "pitch")]
        id: Option<i64>,
        #[arg(long, conflicts_with = "id")]
        pitch: Option<i64>,
    },
    /// Queue a pitch for generation without changing its status
    Enqueue {
        pitch_id: i64,
        /// Put the item ahead of every other pending item
        #[arg(long)]
        priority: bool,
    },
    /// Delete failed items so their pitches can be queued again
    ClearFailed,
}

pub(crate) async fn run(command: QueueCommand, config: &Config) -> Result<()> {
    let queue = QueueService::new(open_storage(config).await?);

    match command {
        QueueCommand::List { status, limit } => print_json(&queue.list_items(status, limit).await?),
        QueueCommand::Stats => print_json(&queue.stats().await?),
        QueueCommand::Show { id: Some(id), .. } => print_json(&queue.get_item(id).await?),
        QueueCommand::Show { id: None, pitch } => {
            let pitch_id = pitch.context("either a queue item id or --pitch is required")?;
            match queue.active_item_for_pitch(pitch_id).await? {
                Some(item) => print_json(&item),
                None => bail!("pitch {pitch_id} has no pending or processing queue item"),
            }
        },
        QueueCommand::Enqueue { pitch_id, priority } => {
            let outcome = if priority {
                queue.enqueue_with_priority(pitch_id).await?
            } else {
                queue.enqueue(pitch_id).await?
            };
            print_json(&outcome)
        },
        QueueCommand::ClearFailed => {
            let cleared = queue.clear_failed().await?;
            print_json(&serde_json::json!({ "cleared": cleared }))
        },
    }
}
