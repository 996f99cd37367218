//! SQLite persistence
//!
//! Every harvest opens a new row in `runs`; records reference it and are
//! committed page by page.

use crate::extract::Record;
use crate::output::RunStatistics;
use crate::state::TargetItem;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{PersistenceSink, StorageError, StorageResult};
use crate::storage::{ItemCount, RunRecord, RunStatus, StoredStatistics};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite-backed record sink for one run
pub struct SqliteSink {
    conn: Connection,
    run_id: i64,
}

impl SqliteSink {
    /// Opens (or creates) the database and starts a new run
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `config_hash` - Hash of the configuration the run uses
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteSink)` - Database ready and run row created
    /// * `Err(StorageError)` - Failed to open or initialize the database
    pub fn open(path: &Path, config_hash: &str) -> StorageResult<Self> {
        let conn = open_connection(path)?;
        Self::with_connection(conn, config_hash)
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory(config_hash: &str) -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Self::with_connection(conn, config_hash)
    }

    fn with_connection(conn: Connection, config_hash: &str) -> StorageResult<Self> {
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        let run_id = conn.last_insert_rowid();
        tracing::info!("Started run {}", run_id);
        Ok(Self { conn, run_id })
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    /// Reads back this sink's run row
    pub fn run(&self) -> StorageResult<RunRecord> {
        read_run(&self.conn, self.run_id)?.ok_or(StorageError::RunNotFound(self.run_id))
    }

    /// Aggregates over everything stored so far
    pub fn statistics(&self) -> StorageResult<StoredStatistics> {
        query_statistics(&self.conn)
    }
}

impl PersistenceSink for SqliteSink {
    fn append(
        &mut self,
        item: &TargetItem,
        page: u32,
        records: &[Record],
    ) -> StorageResult<usize> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        let mut inserted = 0;

        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO records (
                    run_id, item_id, item_name, page, position, title, product_name,
                    review_date, author, rating, headline, body, helpful_count,
                    attachment_count, collected_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            )?;

            for (position, record) in records.iter().enumerate() {
                inserted += stmt.execute(params![
                    self.run_id,
                    item.id,
                    item.name,
                    page,
                    position as i64,
                    record.title,
                    record.product_name,
                    record.review_date,
                    record.author,
                    record.rating,
                    record.headline,
                    record.body,
                    record.helpful_count,
                    record.attachment_count,
                    now,
                ])?;
            }
        }

        tx.commit()?;
        tracing::debug!(
            "Stored {}/{} records for item {} page {}",
            inserted,
            records.len(),
            item.id,
            page
        );
        Ok(inserted)
    }

    fn finish(&mut self, stats: &RunStatistics) -> StorageResult<()> {
        let status = if stats.interrupted {
            RunStatus::Interrupted
        } else {
            RunStatus::Completed
        };
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, items_attempted = ?3,
             items_succeeded = ?4, items_failed = ?5, pages_fetched = ?6, records_written = ?7
             WHERE id = ?8",
            params![
                status.to_db_string(),
                now,
                stats.items_attempted as i64,
                stats.items_succeeded as i64,
                stats.items_failed as i64,
                stats.pages_fetched as i64,
                stats.records_written as i64,
                self.run_id
            ],
        )?;
        tracing::info!("Run {} marked {}", self.run_id, status.to_db_string());
        Ok(())
    }
}

/// Opens a database with the pragmas used for harvesting
pub fn open_connection(path: &Path) -> StorageResult<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(path)?;

    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA temp_store = MEMORY;
    ",
    )?;

    initialize_schema(&conn)?;

    Ok(conn)
}

/// Loads stored statistics without starting a run
pub fn load_statistics(path: &Path) -> StorageResult<StoredStatistics> {
    if !path.exists() {
        return Err(StorageError::Database(format!(
            "No database at {}",
            path.display()
        )));
    }
    let conn = open_connection(path)?;
    query_statistics(&conn)
}

fn read_run(conn: &Connection, run_id: i64) -> StorageResult<Option<RunRecord>> {
    let run = conn
        .query_row(
            "SELECT id, started_at, finished_at, config_hash, status, items_attempted,
             items_succeeded, items_failed, pages_fetched, records_written
             FROM runs WHERE id = ?1",
            params![run_id],
            run_from_row,
        )
        .optional()?;
    Ok(run)
}

fn run_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Running),
        items_attempted: row.get::<_, i64>(5)? as u64,
        items_succeeded: row.get::<_, i64>(6)? as u64,
        items_failed: row.get::<_, i64>(7)? as u64,
        pages_fetched: row.get::<_, i64>(8)? as u64,
        records_written: row.get::<_, i64>(9)? as u64,
    })
}

fn query_statistics(conn: &Connection) -> StorageResult<StoredStatistics> {
    let run_count: i64 = conn.query_row("SELECT COUNT(*) FROM runs", [], |row| row.get(0))?;
    let total_records: i64 =
        conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;

    let latest_run = conn
        .query_row(
            "SELECT id, started_at, finished_at, config_hash, status, items_attempted,
             items_succeeded, items_failed, pages_fetched, records_written
             FROM runs ORDER BY id DESC LIMIT 1",
            [],
            run_from_row,
        )
        .optional()?;

    let mut stmt = conn.prepare(
        "SELECT item_id, MAX(item_name), COUNT(*), COUNT(DISTINCT page)
         FROM records
         GROUP BY item_id
         ORDER BY COUNT(*) DESC, item_id",
    )?;
    let items = stmt
        .query_map([], |row| {
            Ok(ItemCount {
                item_id: row.get(0)?,
                item_name: row.get(1)?,
                records: row.get::<_, i64>(2)? as u64,
                pages: row.get::<_, i64>(3)? as u64,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(StoredStatistics {
        run_count: run_count as u64,
        total_records: total_records as u64,
        latest_run,
        items,
    })
}
