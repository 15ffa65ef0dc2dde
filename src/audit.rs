//! Audit log: append-only record of accepted likes.
//!
//! The log is a write sink on the like path and the source of truth for
//! offline reconciliation if fast-store state is lost. It offers no update
//! or delete operations.

use std::sync::RwLock;

use redb::{ReadableTable, ReadableTableMetadata, TableDefinition};

use crate::error::StoreError;
use crate::event::{AuditRecord, LikeEvent};
use crate::store::durable::{redb_err, DurableStore};
use crate::store::StoreResult;

/// Durable sink for like events.
pub trait AuditLog: Send + Sync {
    /// Append an event, returning the sequence number assigned to it.
    fn append(&self, event: &LikeEvent) -> StoreResult<u64>;

    /// Every record, in append order.
    fn scan(&self) -> StoreResult<Vec<AuditRecord>>;

    /// Number of records.
    fn len(&self) -> StoreResult<u64>;

    /// Whether the log holds no records.
    fn is_empty(&self) -> StoreResult<bool> {
        self.len().map(|n| n == 0)
    }
}

// ---------------------------------------------------------------------------
// In-memory log
// ---------------------------------------------------------------------------

/// Audit log kept in process memory, for memory-only engines and tests.
#[derive(Debug, Default)]
pub struct MemAuditLog {
    records: RwLock<Vec<AuditRecord>>,
}

impl MemAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Unavailable {
            message: "audit lock poisoned".into(),
        }
    }
}

impl AuditLog for MemAuditLog {
    fn append(&self, event: &LikeEvent) -> StoreResult<u64> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        let seq = records.len() as u64 + 1;
        records.push(AuditRecord { seq, event: *event });
        Ok(seq)
    }

    fn scan(&self) -> StoreResult<Vec<AuditRecord>> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        Ok(records.clone())
    }

    fn len(&self) -> StoreResult<u64> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        Ok(records.len() as u64)
    }
}

// ---------------------------------------------------------------------------
// redb log
// ---------------------------------------------------------------------------

/// `seq` -> bincode-encoded [`LikeEvent`].
const LIKE_EVENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("like_events");

/// Audit log persisted in redb.
#[derive(Debug, Clone)]
pub struct RedbAuditLog {
    store: DurableStore,
}

impl RedbAuditLog {
    /// Use the `like_events` table of an open durable store.
    pub fn new(store: DurableStore) -> StoreResult<Self> {
        store.ensure_table(LIKE_EVENTS)?;
        Ok(Self { store })
    }
}

impl AuditLog for RedbAuditLog {
    fn append(&self, event: &LikeEvent) -> StoreResult<u64> {
        let encoded = bincode::serialize(event).map_err(|e| StoreError::Serialization {
            message: format!("failed to serialize like event: {e}"),
        })?;

        let txn = self
            .store
            .database()
            .begin_write()
            .map_err(redb_err("begin_write"))?;
        let seq = {
            let mut table = txn.open_table(LIKE_EVENTS).map_err(redb_err("open_table"))?;
            let seq = table
                .last()
                .map_err(redb_err("last"))?
                .map(|(key, _)| key.value() + 1)
                .unwrap_or(1);
            table
                .insert(seq, encoded.as_slice())
                .map_err(redb_err("insert event"))?;
            seq
        };
        txn.commit().map_err(redb_err("commit"))?;
        Ok(seq)
    }

    fn scan(&self) -> StoreResult<Vec<AuditRecord>> {
        let txn = self
            .store
            .database()
            .begin_read()
            .map_err(redb_err("begin_read"))?;
        let table = txn.open_table(LIKE_EVENTS).map_err(redb_err("open_table"))?;
        let mut records = Vec::new();
        for entry in table.iter().map_err(redb_err("iter events"))? {
            let (key, value) = entry.map_err(redb_err("read event"))?;
            let event: LikeEvent =
                bincode::deserialize(value.value()).map_err(|e| StoreError::Serialization {
                    message: format!("failed to deserialize like event {}: {e}", key.value()),
                })?;
            records.push(AuditRecord {
                seq: key.value(),
                event,
            });
        }
        Ok(records)
    }

    fn len(&self) -> StoreResult<u64> {
        let txn = self
            .store
            .database()
            .begin_read()
            .map_err(redb_err("begin_read"))?;
        let table = txn.open_table(LIKE_EVENTS).map_err(redb_err("open_table"))?;
        table.len().map_err(redb_err("len events"))
    }
}
