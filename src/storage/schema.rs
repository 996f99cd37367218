//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Review-Harvester database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track harvest runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    items_attempted INTEGER NOT NULL DEFAULT 0,
    items_succeeded INTEGER NOT NULL DEFAULT 0,
    items_failed INTEGER NOT NULL DEFAULT 0,
    pages_fetched INTEGER NOT NULL DEFAULT 0,
    records_written INTEGER NOT NULL DEFAULT 0
);

-- One row per extracted review
CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    item_id TEXT NOT NULL,
    item_name TEXT NOT NULL,
    page INTEGER NOT NULL,
    position INTEGER NOT NULL,
    title TEXT NOT NULL,
    product_name TEXT NOT NULL,
    review_date TEXT NOT NULL,
    author TEXT NOT NULL,
    rating INTEGER NOT NULL,
    headline TEXT NOT NULL,
    body TEXT NOT NULL,
    helpful_count INTEGER NOT NULL,
    attachment_count INTEGER NOT NULL,
    collected_at TEXT NOT NULL,
    UNIQUE(run_id, item_id, page, position)
);

CREATE INDEX IF NOT EXISTS idx_records_item ON records(item_id);
CREATE INDEX IF NOT EXISTS idx_records_run ON records(run_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
