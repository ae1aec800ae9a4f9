//! Shared constants for storyflow.
//!
//! Centralizes defaults that would otherwise be duplicated across crates.

/// Number of queue items claimed by one processor run.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Processor interval in seconds (five minutes).
pub const DEFAULT_PROCESS_INTERVAL_SECS: u64 = 300;

/// Reconciliation sweep interval in seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Upper bound for a single generation job, including transport retries.
pub const DEFAULT_JOB_TIMEOUT_SECS: u64 = 180;

/// Per-request HTTP timeout for generation backends.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 120;

/// Claims older than this are considered abandoned and released on startup.
pub const DEFAULT_VISIBILITY_TIMEOUT_SECS: i64 = 900;

/// How far before the oldest pending item a priority item is dated.
pub const PRIORITY_BACKDATE_SECS: i64 = 1;

/// Maximum number of rows returned by any listing query.
pub const MAX_QUERY_LIMIT: usize = 1000;

/// SQLite connection pool size.
pub const DEFAULT_DB_POOL_SIZE: u32 = 8;

/// PostgreSQL connection pool: maximum connections.
pub const PG_POOL_MAX_CONNECTIONS: u32 = 10;

/// PostgreSQL connection pool: acquire timeout in seconds.
pub const PG_POOL_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// PostgreSQL connection pool: idle timeout in seconds.
pub const PG_POOL_IDLE_TIMEOUT_SECS: u64 = 300;

/// Default OpenAI-compatible API base URL.
pub const DEFAULT_API_URL: &str = "https://api.openai.com";

/// Default chat model.
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Decoding defaults tuned for factual, non-repetitive long-form text.
pub const DEFAULT_MAX_TOKENS: u32 = 2500;
pub const DEFAULT_TEMPERATURE: f32 = 0.5;
pub const DEFAULT_TOP_P: f32 = 0.9;
pub const DEFAULT_FREQUENCY_PENALTY: f32 = 0.2;
pub const DEFAULT_PRESENCE_PENALTY: f32 = 0.3;

/// Longest generated title kept when deriving one from raw text.
pub const MAX_TITLE_CHARS: usize = 120;

/// Longest SEO description derived from raw text.
pub const MAX_SEO_DESCRIPTION_CHARS: usize = 160;
