//! Storage module for persisting harvested records
//!
//! This module handles everything written to disk, including:
//! - SQLite database initialization and schema management
//! - Run tracking (start, finish, status, counts)
//! - Per-page record persistence behind the `PersistenceSink` trait
//! - An in-memory sink for tests and dry runs

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::{MemorySink, StoredRecord};
pub use sqlite::{load_statistics, open_connection, SqliteSink};
pub use traits::{PersistenceSink, StorageError, StorageResult};

/// Represents a harvest run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub items_attempted: u64,
    pub items_succeeded: u64,
    pub items_failed: u64,
    pub pages_fetched: u64,
    pub records_written: u64,
}

/// Records stored for one item across all runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemCount {
    pub item_id: String,
    pub item_name: String,
    pub records: u64,
    pub pages: u64,
}

/// Aggregates over the whole database
#[derive(Debug, Clone)]
pub struct StoredStatistics {
    pub run_count: u64,
    pub total_records: u64,
    pub latest_run: Option<RunRecord>,
    pub items: Vec<ItemCount>,
}

/// Status of a harvest run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            _ => None,
        }
    }
}
