//! In-memory persistence gateway
//!
//! Process-local store for tests and embedded use. Nothing survives a
//! restart.

use crate::gateway::{enforce_record_limits, PersistenceGateway};
use async_trait::async_trait;
use econsult_core::{
    EconsultResult, LabelCounts, NewRecord, PersistedRecord, RecordId, StorageError,
};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct MemoryState {
    records: Vec<PersistedRecord>,
    last_id: RecordId,
}

/// Gateway backed by a `Vec` behind a `RwLock`.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    state: RwLock<MemoryState>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> EconsultResult<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|_| StorageError::LockPoisoned.into())
    }

    fn write(&self) -> EconsultResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|_| StorageError::LockPoisoned.into())
    }

    /// Snapshot of every record in insertion order.
    pub fn records(&self) -> EconsultResult<Vec<PersistedRecord>> {
        Ok(self.read()?.records.clone())
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn insert(&self, record: NewRecord) -> EconsultResult<RecordId> {
        let record = enforce_record_limits(record)?;
        let mut state = self.write()?;
        state.last_id += 1;
        let id = state.last_id;
        state.records.push(record.into_persisted(id));
        Ok(id)
    }

    async fn get(&self, id: RecordId) -> EconsultResult<Option<PersistedRecord>> {
        let state = self.read()?;
        Ok(state.records.iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self, limit: u32, offset: u32) -> EconsultResult<Vec<PersistedRecord>> {
        let state = self.read()?;
        let mut records: Vec<&PersistedRecord> = state.records.iter().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(records
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn aggregate(&self) -> EconsultResult<LabelCounts> {
        let state = self.read()?;
        let mut counts = LabelCounts::default();
        for record in &state.records {
            counts.add(record.sentiment.label, 1);
        }
        Ok(counts)
    }

    async fn count(&self) -> EconsultResult<u64> {
        Ok(self.read()?.records.len() as u64)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
