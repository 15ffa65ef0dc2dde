//! Fast store persisted in redb.
//!
//! Tables:
//! - `claims`: `(user, item)` -> `()`
//! - `counters`: `item` -> count
//! - `ranking`: `(u64::MAX - score, item)` -> `()`, so forward iteration
//!   yields score descending, then item ascending
//!
//! A credit rewrites the counter and the ranking entry in one write
//! transaction; redb serializes writers, so no other credit interleaves.

use std::path::Path;

use redb::{ReadableTable, ReadableTableMetadata, TableDefinition};

use crate::ids::{ItemId, UserId};
use crate::store::durable::{redb_err, DurableStore};
use crate::store::{Claim, FastStore, StoreResult};

const CLAIMS: TableDefinition<(u64, u64), ()> = TableDefinition::new("claims");
const COUNTERS: TableDefinition<u64, u64> = TableDefinition::new("counters");
const RANKING: TableDefinition<(u64, u64), ()> = TableDefinition::new("ranking");

fn rank_key(score: u64, item: ItemId) -> (u64, u64) {
    (u64::MAX - score, item.get())
}

/// Score held by the ranking table itself, independent of the counter.
fn ranked_score(
    ranking: &impl ReadableTable<(u64, u64), ()>,
    item: ItemId,
) -> StoreResult<Option<u64>> {
    for entry in ranking.iter().map_err(redb_err("iter ranking"))? {
        let (key, _) = entry.map_err(redb_err("read rank"))?;
        let (inverted, ranked) = key.value();
        if ranked == item.get() {
            return Ok(Some(u64::MAX - inverted));
        }
    }
    Ok(None)
}

/// Fast store whose state survives restarts.
#[derive(Debug, Clone)]
pub struct RedbFastStore {
    store: DurableStore,
}

impl RedbFastStore {
    /// Open or create `fast.redb` in the given directory.
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        let store = DurableStore::open(data_dir, "fast.redb")?;
        store.ensure_table(CLAIMS)?;
        store.ensure_table(COUNTERS)?;
        store.ensure_table(RANKING)?;
        Ok(Self { store })
    }
}

impl FastStore for RedbFastStore {
    fn try_claim(&self, user: UserId, item: ItemId) -> StoreResult<Claim> {
        let txn = self
            .store
            .database()
            .begin_write()
            .map_err(redb_err("begin_write"))?;
        let existed = {
            let mut claims = txn.open_table(CLAIMS).map_err(redb_err("open_table"))?;
            let previous = claims
                .insert((user.get(), item.get()), ())
                .map_err(redb_err("insert claim"))?;
            previous.is_some()
        };
        if existed {
            txn.abort().map_err(redb_err("abort"))?;
            return Ok(Claim::AlreadyClaimed);
        }
        txn.commit().map_err(redb_err("commit"))?;
        Ok(Claim::Claimed)
    }

    fn credit(&self, item: ItemId) -> StoreResult<u64> {
        let txn = self
            .store
            .database()
            .begin_write()
            .map_err(redb_err("begin_write"))?;
        let count = {
            let mut counters = txn.open_table(COUNTERS).map_err(redb_err("open_table"))?;
            let mut ranking = txn.open_table(RANKING).map_err(redb_err("open_table"))?;

            let previous = counters
                .get(item.get())
                .map_err(redb_err("get counter"))?
                .map(|guard| guard.value())
                .unwrap_or(0);
            let count = previous + 1;

            counters
                .insert(item.get(), count)
                .map_err(redb_err("insert counter"))?;
            if previous > 0 {
                ranking
                    .remove(rank_key(previous, item))
                    .map_err(redb_err("remove rank"))?;
            }
            ranking
                .insert(rank_key(count, item), ())
                .map_err(redb_err("insert rank"))?;
            count
        };
        txn.commit().map_err(redb_err("commit"))?;
        Ok(count)
    }

    fn likes(&self, item: ItemId) -> StoreResult<u64> {
        let txn = self
            .store
            .database()
            .begin_read()
            .map_err(redb_err("begin_read"))?;
        let counters = txn.open_table(COUNTERS).map_err(redb_err("open_table"))?;
        let count = counters
            .get(item.get())
            .map_err(redb_err("get counter"))?
            .map(|guard| guard.value())
            .unwrap_or(0);
        Ok(count)
    }

    fn score(&self, item: ItemId) -> StoreResult<Option<u64>> {
        let txn = self
            .store
            .database()
            .begin_read()
            .map_err(redb_err("begin_read"))?;
        let ranking = txn.open_table(RANKING).map_err(redb_err("open_table"))?;
        ranked_score(&ranking, item)
    }

    fn standing(&self, item: ItemId) -> StoreResult<(u64, Option<u64>)> {
        let txn = self
            .store
            .database()
            .begin_read()
            .map_err(redb_err("begin_read"))?;
        let counters = txn.open_table(COUNTERS).map_err(redb_err("open_table"))?;
        let ranking = txn.open_table(RANKING).map_err(redb_err("open_table"))?;
        let likes = counters
            .get(item.get())
            .map_err(redb_err("get counter"))?
            .map(|guard| guard.value())
            .unwrap_or(0);
        Ok((likes, ranked_score(&ranking, item)?))
    }

    fn top(&self, n: usize) -> StoreResult<Vec<(ItemId, u64)>> {
        let txn = self
            .store
            .database()
            .begin_read()
            .map_err(redb_err("begin_read"))?;
        let ranking = txn.open_table(RANKING).map_err(redb_err("open_table"))?;
        let mut out = Vec::with_capacity(n.min(64));
        for entry in ranking.iter().map_err(redb_err("iter ranking"))?.take(n) {
            let (key, _) = entry.map_err(redb_err("read rank"))?;
            let (inverted, raw_item) = key.value();
            // Zero ids are never written; skip rather than fail the whole read.
            if let Some(item) = ItemId::new(raw_item) {
                out.push((item, u64::MAX - inverted));
            }
        }
        Ok(out)
    }

    fn ranked_len(&self) -> StoreResult<usize> {
        let txn = self
            .store
            .database()
            .begin_read()
            .map_err(redb_err("begin_read"))?;
        let ranking = txn.open_table(RANKING).map_err(redb_err("open_table"))?;
        let len = ranking.len().map_err(redb_err("len ranking"))?;
        Ok(len as usize)
    }

    fn backend(&self) -> &'static str {
        "redb"
    }
}
