//! Item catalog: read-only title lookups used to enrich rankings.
//!
//! The catalog belongs to the host application; this crate only reads
//! titles from it. `set_title` exists so hosts and tests can seed it.

use dashmap::DashMap;
use redb::{ReadableTable, TableDefinition};

use crate::error::CatalogError;
use crate::ids::ItemId;
use crate::store::durable::{redb_err, DurableStore};
use crate::store::StoreResult;

/// Source of item display titles.
pub trait Catalog: Send + Sync {
    /// Title of `item`, or [`CatalogError::NotFound`].
    fn lookup_title(&self, item: ItemId) -> Result<String, CatalogError>;

    /// Insert or replace the title of `item`.
    fn set_title(&self, item: ItemId, title: &str) -> StoreResult<()>;
}

/// In-memory catalog.
#[derive(Debug, Default)]
pub struct MemCatalog {
    titles: DashMap<ItemId, String>,
}

impl MemCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Catalog for MemCatalog {
    fn lookup_title(&self, item: ItemId) -> Result<String, CatalogError> {
        self.titles
            .get(&item)
            .map(|r| r.value().clone())
            .ok_or(CatalogError::NotFound { item: item.get() })
    }

    fn set_title(&self, item: ItemId, title: &str) -> StoreResult<()> {
        self.titles.insert(item, title.to_string());
        Ok(())
    }
}

const ITEM_TITLES: TableDefinition<u64, &str> = TableDefinition::new("item_titles");

/// Catalog persisted in the durable store next to the audit log.
#[derive(Debug, Clone)]
pub struct RedbCatalog {
    store: DurableStore,
}

impl RedbCatalog {
    /// Use the `item_titles` table of an open durable store.
    pub fn new(store: DurableStore) -> StoreResult<Self> {
        store.ensure_table(ITEM_TITLES)?;
        Ok(Self { store })
    }
}

impl Catalog for RedbCatalog {
    fn lookup_title(&self, item: ItemId) -> Result<String, CatalogError> {
        let txn = self
            .store
            .database()
            .begin_read()
            .map_err(redb_err("begin_read"))?;
        let table = txn.open_table(ITEM_TITLES).map_err(redb_err("open_table"))?;
        let title = table
            .get(item.get())
            .map_err(redb_err("get title"))?
            .map(|guard| guard.value().to_string());
        title.ok_or(CatalogError::NotFound { item: item.get() })
    }

    fn set_title(&self, item: ItemId, title: &str) -> StoreResult<()> {
        let txn = self
            .store
            .database()
            .begin_write()
            .map_err(redb_err("begin_write"))?;
        {
            let mut table = txn.open_table(ITEM_TITLES).map_err(redb_err("open_table"))?;
            table
                .insert(item.get(), title)
                .map_err(redb_err("insert title"))?;
        }
        txn.commit().map_err(redb_err("commit"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn exercise(catalog: &dyn Catalog) {
        let item = ItemId::new(42).unwrap();
        assert!(matches!(
            catalog.lookup_title(item),
            Err(CatalogError::NotFound { item: 42 })
        ));
        catalog.set_title(item, "Rust ownership in practice").unwrap();
        assert_eq!(
            catalog.lookup_title(item).unwrap(),
            "Rust ownership in practice"
        );
        catalog.set_title(item, "Renamed").unwrap();
        assert_eq!(catalog.lookup_title(item).unwrap(), "Renamed");
    }

    #[test]
    fn mem_catalog_lookup() {
        exercise(&MemCatalog::new());
    }

    #[test]
    fn redb_catalog_lookup() {
        let dir = TempDir::new().unwrap();
        let store = DurableStore::open(dir.path(), "durable.redb").unwrap();
        exercise(&RedbCatalog::new(store).unwrap());
    }
}
