use crate::extract::Record;
use crate::output::RunStatistics;
use crate::state::TargetItem;
use crate::storage::traits::{PersistenceSink, StorageError, StorageResult};
use std::sync::{Arc, Mutex};

/// A record with the context it was stored under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub item_id: String,
    pub page: u32,
    pub position: usize,
    pub record: Record,
}

/// In-memory sink
///
/// Clones share the same storage, so a caller can keep a handle while the
/// orchestrator owns the boxed sink.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<StoredRecord>>>,
    finished: Arc<Mutex<Option<RunStatistics>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything stored so far
    pub fn records(&self) -> Vec<StoredRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Statistics passed to `finish`, if the run has finished
    pub fn finished(&self) -> Option<RunStatistics> {
        self.finished
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl PersistenceSink for MemorySink {
    fn append(
        &mut self,
        item: &TargetItem,
        page: u32,
        records: &[Record],
    ) -> StorageResult<usize> {
        let mut stored = self
            .records
            .lock()
            .map_err(|_| StorageError::Write("memory sink lock poisoned".to_string()))?;

        let mut inserted = 0;
        for (position, record) in records.iter().enumerate() {
            let exists = stored
                .iter()
                .any(|s| s.item_id == item.id && s.page == page && s.position == position);
            if exists {
                continue;
            }
            stored.push(StoredRecord {
                item_id: item.id.clone(),
                page,
                position,
                record: record.clone(),
            });
            inserted += 1;
        }
        Ok(inserted)
    }

    fn finish(&mut self, stats: &RunStatistics) -> StorageResult<()> {
        let mut finished = self
            .finished
            .lock()
            .map_err(|_| StorageError::Write("memory sink lock poisoned".to_string()))?;
        *finished = Some(stats.clone());
        Ok(())
    }
}
