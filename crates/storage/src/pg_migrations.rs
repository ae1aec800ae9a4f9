//! PostgreSQL schema migrations for storyflow storage.

use sqlx::PgPool;

use crate::error::StorageError;

const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS pitches (
        id BIGSERIAL PRIMARY KEY,
        pillar TEXT CHECK (pillar IN ('sport', 'strategic-content', 'partner-content', 'proprietary-content')),
        category TEXT NOT NULL,
        topic TEXT,
        main_seo_keyword TEXT,
        suggested_pitch TEXT NOT NULL,
        origin TEXT NOT NULL DEFAULT 'manual' CHECK (origin IN ('manual', 'automated')),
        status TEXT NOT NULL DEFAULT 'pending'
            CHECK (status IN ('pending', 'approved', 'refused', 'processing', 'generated', 'published')),
        created_at_epoch BIGINT NOT NULL,
        updated_at_epoch BIGINT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_pitches_status ON pitches (status)",
    "CREATE TABLE IF NOT EXISTS prompt_templates (
        id BIGSERIAL PRIMARY KEY,
        pillar TEXT CHECK (pillar IN ('sport', 'strategic-content', 'partner-content', 'proprietary-content')),
        category TEXT NOT NULL,
        topic TEXT,
        prompt TEXT NOT NULL,
        created_at_epoch BIGINT NOT NULL,
        updated_at_epoch BIGINT NOT NULL
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_prompt_templates_key
        ON prompt_templates ((COALESCE(pillar, '')), category, (COALESCE(topic, '')))",
    "CREATE TABLE IF NOT EXISTS queue_items (
        id BIGSERIAL PRIMARY KEY,
        pitch_id BIGINT NOT NULL REFERENCES pitches (id) ON DELETE CASCADE,
        status TEXT NOT NULL DEFAULT 'pending'
            CHECK (status IN ('pending', 'processing', 'completed', 'failed')),
        created_at_epoch BIGINT NOT NULL,
        updated_at_epoch BIGINT NOT NULL,
        claimed_at_epoch BIGINT,
        error_reason TEXT
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_queue_items_active_pitch
        ON queue_items (pitch_id) WHERE status IN ('pending', 'processing')",
    "CREATE INDEX IF NOT EXISTS idx_queue_items_claim ON queue_items (status, created_at_epoch, id)",
    "CREATE TABLE IF NOT EXISTS generated_content (
        id BIGSERIAL PRIMARY KEY,
        pitch_id BIGINT NOT NULL REFERENCES pitches (id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        body TEXT NOT NULL,
        seo_description TEXT NOT NULL DEFAULT '',
        author TEXT,
        strategy TEXT NOT NULL,
        created_at_epoch BIGINT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_generated_content_pitch ON generated_content (pitch_id)",
];

/// Run all PostgreSQL migrations. Every statement is idempotent.
pub async fn run_pg_migrations(pool: &PgPool) -> Result<(), StorageError> {
    for sql in STATEMENTS {
        sqlx::query(sql).execute(pool).await?;
    }
    tracing::info!(statements = STATEMENTS.len(), "PostgreSQL schema up to date");
    Ok(())
}
