//! Persistence trait and error types

use crate::extract::Record;
use crate::output::RunStatistics;
use crate::state::TargetItem;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Write failed: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Destination for harvested records
///
/// Records are appended per page as soon as the page is fetched, so an
/// interrupted run keeps everything it collected. Appending the same
/// `(item, page, position)` twice stores it once.
pub trait PersistenceSink: Send {
    /// Stores the records of one page
    ///
    /// # Arguments
    ///
    /// * `item` - The item the page belongs to
    /// * `page` - 1-based page number
    /// * `records` - Records in document order; the index is the position
    ///
    /// # Returns
    ///
    /// The number of records newly stored
    fn append(&mut self, item: &TargetItem, page: u32, records: &[Record])
        -> StorageResult<usize>;

    /// Closes the run with its final statistics
    fn finish(&mut self, _stats: &RunStatistics) -> StorageResult<()> {
        Ok(())
    }
}
