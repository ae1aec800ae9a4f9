use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use storyflow_core::Config;
use storyflow_storage::StorageBackend;

pub(crate) mod pitch;
pub(crate) mod prompt;
pub(crate) mod queue;
pub(crate) mod serve;

pub(crate) async fn open_storage(config: &Config) -> Result<Arc<StorageBackend>> {
    let storage = StorageBackend::from_config(&config.storage)
        .await
        .with_context(|| format!("failed to open database at {}", config.storage.db_path.display()))?;
    Ok(Arc::new(storage))
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
