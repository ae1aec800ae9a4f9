//! Storage layer for storyflow
//!
//! SQLite storage by default, PostgreSQL behind the `postgres` feature.
//! Both implement the async store traits; `StorageBackend` dispatches
//! between them.

pub mod backend;
pub mod error;
#[cfg(feature = "sqlite")]
mod migrations;
#[cfg(feature = "postgres")]
mod pg_migrations;
#[cfg(feature = "postgres")]
pub mod pg_storage;
#[cfg(feature = "sqlite")]
mod sqlite_async;
#[cfg(feature = "sqlite")]
mod storage;
#[cfg(all(test, feature = "sqlite"))]
mod tests;
pub mod traits;

pub use backend::StorageBackend;
pub use error::StorageError;
#[cfg(feature = "postgres")]
pub use pg_storage::PgStorage;
#[cfg(feature = "sqlite")]
pub use storage::Storage;
pub use traits::{ContentStore, PitchStore, PromptTemplateStore, QueueStore};
