//! Database Migrations
//!
//! Schema migration definitions for the item store.

/// Migration definitions
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema: items and rating log",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "Queue filter indexes",
        up: MIGRATION_V2_UP,
    },
];

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version number
    pub version: u32,
    /// Description
    pub description: &'static str,
    /// SQL to apply
    pub up: &'static str,
}

/// V1: Initial schema
const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    kind TEXT NOT NULL DEFAULT 'learning_item',
    priority INTEGER NOT NULL DEFAULT 50 CHECK (priority BETWEEN 0 AND 100),
    category_id INTEGER,
    favorite INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,

    -- Scheduling state (NULL until the first rating)
    last_reviewed_at TEXT,
    next_due_at TEXT,
    review_count INTEGER NOT NULL DEFAULT 0,
    stability REAL,
    difficulty REAL
);

CREATE INDEX IF NOT EXISTS idx_items_next_due ON items(next_due_at);

-- Append-only: rows are never updated
CREATE TABLE IF NOT EXISTS rating_events (
    id TEXT PRIMARY KEY,
    item_id INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
    raw_rating INTEGER NOT NULL,
    grade INTEGER NOT NULL,
    timestamp TEXT NOT NULL,
    elapsed_days REAL NOT NULL,
    retrievability REAL NOT NULL,
    resulting_interval_days INTEGER NOT NULL,
    resulting_next_due_at TEXT NOT NULL,
    stability_after REAL NOT NULL,
    difficulty_after REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_rating_events_item ON rating_events(item_id, timestamp);

INSERT OR REPLACE INTO schema_version (version, applied_at) VALUES (1, datetime('now'));
"#;

/// V2: Indexes for the store-side queue filters
const MIGRATION_V2_UP: &str = r#"
CREATE INDEX IF NOT EXISTS idx_items_category ON items(category_id);
CREATE INDEX IF NOT EXISTS idx_items_kind ON items(kind);
CREATE INDEX IF NOT EXISTS idx_items_favorite ON items(favorite) WHERE favorite = 1;

INSERT OR REPLACE INTO schema_version (version, applied_at) VALUES (2, datetime('now'));
"#;

/// Get current schema version from database
pub fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .or(Ok(0))
}

/// Apply pending migrations
pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let current_version = get_current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                "Applying migration v{}: {}",
                migration.version,
                migration.description
            );
            conn.execute_batch(migration.up)?;
            applied += 1;
        }
    }

    Ok(applied)
}
