//! Database schema and migrations for feed-to-mastodon.
//!
//! Migrations are applied sequentially when the database is first opened or
//! upgraded. Version N is the N-th entry of [`MIGRATIONS`].

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_migrations table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Entries table. IF NOT EXISTS lets stores that predate version
    // tracking adopt the migration without failing.
    r#"
-- Feed entries and their posting state
CREATE TABLE IF NOT EXISTS entries (
    id          TEXT PRIMARY KEY,
    entry_data  BLOB NOT NULL,              -- JSON-encoded feed item
    posted_at   TEXT,                       -- NULL until posted
    fetched_at  TEXT NOT NULL,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_entries_posted_at ON entries(posted_at);
CREATE INDEX IF NOT EXISTS idx_entries_fetched_at ON entries(fetched_at);
"#,
    // v2: Settings key/value table
    r#"
-- Feed metadata and credentials
CREATE TABLE IF NOT EXISTS settings (
    key         TEXT PRIMARY KEY,
    value       TEXT,
    updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
);
"#,
];
