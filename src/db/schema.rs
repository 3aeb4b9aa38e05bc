pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- summaries table
CREATE TABLE IF NOT EXISTS summaries (
    id TEXT PRIMARY KEY,
    url TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    content TEXT NOT NULL,
    author TEXT,
    published_at TEXT,
    summary_lines TEXT NOT NULL,
    summary_text TEXT NOT NULL,
    tokens_used INTEGER NOT NULL DEFAULT 0,
    processing_time INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_summaries_created_at ON summaries(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_summaries_url ON summaries(url);

-- comments table (owned by summaries)
CREATE TABLE IF NOT EXISTS comments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    summary_id TEXT NOT NULL REFERENCES summaries(id) ON DELETE CASCADE,
    text TEXT NOT NULL,
    tone TEXT NOT NULL,
    length INTEGER NOT NULL,
    position INTEGER NOT NULL,
    UNIQUE(summary_id, position)
);

CREATE INDEX IF NOT EXISTS idx_comments_summary_id ON comments(summary_id);

-- daily_analytics table (one row per UTC day)
CREATE TABLE IF NOT EXISTS daily_analytics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL UNIQUE,
    total_summaries INTEGER NOT NULL DEFAULT 0,
    total_comments INTEGER NOT NULL DEFAULT 0,
    total_tokens INTEGER NOT NULL DEFAULT 0,
    unique_urls INTEGER NOT NULL DEFAULT 0,
    avg_processing_time REAL NOT NULL DEFAULT 0
);
"#;
