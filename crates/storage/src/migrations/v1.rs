//! Migration v1: pitches, prompt templates, work queue, generated content

pub(super) const SQL: &str = "
CREATE TABLE IF NOT EXISTS pitches (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    pillar TEXT CHECK(pillar IN ('sport', 'strategic-content', 'partner-content', 'proprietary-content')),
    category TEXT NOT NULL,
    topic TEXT,
    main_seo_keyword TEXT,
    suggested_pitch TEXT NOT NULL,
    origin TEXT NOT NULL CHECK(origin IN ('manual', 'automated')) DEFAULT 'manual',
    status TEXT NOT NULL CHECK(status IN ('pending', 'approved', 'refused', 'processing', 'generated', 'published')) DEFAULT 'pending',
    created_at_epoch INTEGER NOT NULL,
    updated_at_epoch INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pitches_status ON pitches(status);

CREATE TABLE IF NOT EXISTS prompt_templates (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    pillar TEXT CHECK(pillar IN ('sport', 'strategic-content', 'partner-content', 'proprietary-content')),
    category TEXT NOT NULL,
    topic TEXT,
    prompt TEXT NOT NULL,
    created_at_epoch INTEGER NOT NULL,
    updated_at_epoch INTEGER NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_prompt_templates_key
    ON prompt_templates(COALESCE(pillar, ''), category, COALESCE(topic, ''));

CREATE TABLE IF NOT EXISTS queue_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    pitch_id INTEGER NOT NULL REFERENCES pitches(id) ON DELETE CASCADE,
    status TEXT NOT NULL CHECK(status IN ('pending', 'processing', 'completed', 'failed')) DEFAULT 'pending',
    created_at_epoch INTEGER NOT NULL,
    updated_at_epoch INTEGER NOT NULL,
    claimed_at_epoch INTEGER,
    error_reason TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_queue_items_active_pitch
    ON queue_items(pitch_id) WHERE status IN ('pending', 'processing');
CREATE INDEX IF NOT EXISTS idx_queue_items_claim ON queue_items(status, created_at_epoch, id);

CREATE TABLE IF NOT EXISTS generated_content (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    pitch_id INTEGER NOT NULL REFERENCES pitches(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    body TEXT NOT NULL,
    seo_description TEXT NOT NULL DEFAULT '',
    author TEXT,
    strategy TEXT NOT NULL,
    created_at_epoch INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_generated_content_pitch ON generated_content(pitch_id);
";
