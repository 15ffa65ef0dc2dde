//! ACID-durable redb handle shared by the persistent stores.
//!
//! All writes go through transactions. Reads use MVCC snapshots.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use redb::{Database, Key, TableDefinition, Value};

use crate::error::StoreError;
use crate::store::StoreResult;

/// Map any redb error into [`StoreError::Redb`], tagged with the failed step.
pub(crate) fn redb_err<E: std::fmt::Display>(step: &'static str) -> impl FnOnce(E) -> StoreError {
    move |e| StoreError::Redb {
        message: format!("{step} failed: {e}"),
    }
}

/// A redb database file inside the data directory.
///
/// Cloning is cheap; clones share the same open database.
#[derive(Clone)]
pub struct DurableStore {
    db: Arc<Database>,
    path: PathBuf,
}

impl DurableStore {
    /// Open or create `file_name` in the given directory.
    pub fn open(data_dir: &Path, file_name: &str) -> StoreResult<Self> {
        std::fs::create_dir_all(data_dir).map_err(|e| StoreError::Io { source: e })?;
        let path = data_dir.join(file_name);
        let db = Database::create(&path).map_err(|e| StoreError::Redb {
            message: format!("failed to open redb at {}: {e}", path.display()),
        })?;
        tracing::debug!(path = %path.display(), "opened redb store");
        Ok(Self {
            db: Arc::new(db),
            path,
        })
    }

    /// Create the table if it does not exist yet, so read transactions can
    /// always open it.
    pub fn ensure_table<K: Key + 'static, V: Value + 'static>(
        &self,
        table: TableDefinition<'_, K, V>,
    ) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(redb_err("begin_write"))?;
        txn.open_table(table).map_err(redb_err("open_table"))?;
        txn.commit().map_err(redb_err("commit"))?;
        Ok(())
    }

    /// Get a reference to the underlying database (for table operations).
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Location of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for DurableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableStore")
            .field("path", &self.path)
            .finish()
    }
}
