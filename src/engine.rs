//! Engine facade: top-level API for the likerank system.
//!
//! The `Engine` opens the stores described by an [`EngineConfig`], hands
//! explicit handles to the engagement service and the rank reader, and
//! closes everything when dropped.

use std::sync::Arc;

use crate::audit::{AuditLog, MemAuditLog, RedbAuditLog};
use crate::catalog::{Catalog, MemCatalog, RedbCatalog};
use crate::config::{EngineConfig, FastBackend};
use crate::deadline::Deadline;
use crate::error::{EngineError, LikerankResult};
use crate::export::{LikeEventExport, LikesExport};
use crate::ids::{ItemId, UserId};
use crate::rank::{RankReader, RankedItem};
use crate::service::{EngagementService, LikeReceipt};
use crate::store::{DurableStore, FastStore, MemFastStore, RedbFastStore};

/// The likerank engine.
pub struct Engine {
    config: EngineConfig,
    fast: Arc<dyn FastStore>,
    audit: Arc<dyn AuditLog>,
    catalog: Arc<dyn Catalog>,
    deadline: Arc<Deadline>,
    service: EngagementService,
    ranks: RankReader,
}

impl Engine {
    /// Create an engine, opening the stores the configuration asks for.
    pub fn new(config: EngineConfig) -> LikerankResult<Self> {
        config.validate()?;

        let (fast, audit, catalog): (Arc<dyn FastStore>, Arc<dyn AuditLog>, Arc<dyn Catalog>) =
            match config.data_dir {
                Some(ref dir) => {
                    std::fs::create_dir_all(dir).map_err(|_| EngineError::DataDir {
                        path: dir.display().to_string(),
                    })?;
                    let durable = DurableStore::open(dir, "durable.redb")?;
                    let fast: Arc<dyn FastStore> = match config.fast_store {
                        FastBackend::Redb => Arc::new(RedbFastStore::open(dir)?),
                        FastBackend::Memory => Arc::new(MemFastStore::new()),
                    };
                    (
                        fast,
                        Arc::new(RedbAuditLog::new(durable.clone())?),
                        Arc::new(RedbCatalog::new(durable)?),
                    )
                }
                None => (
                    Arc::new(MemFastStore::new()),
                    Arc::new(MemAuditLog::new()),
                    Arc::new(MemCatalog::new()),
                ),
            };

        Self::with_stores(config, fast, audit, catalog)
    }

    /// Create an engine around stores the host already opened.
    pub fn with_stores(
        config: EngineConfig,
        fast: Arc<dyn FastStore>,
        audit: Arc<dyn AuditLog>,
        catalog: Arc<dyn Catalog>,
    ) -> LikerankResult<Self> {
        config.validate()?;

        let deadline = Arc::new(Deadline::new(config.workers, config.op_timeout())?);
        tracing::info!(
            backend = fast.backend(),
            persistent = config.data_dir.is_some(),
            timeout_ms = config.op_timeout_ms,
            workers = config.workers,
            "initializing likerank engine"
        );

        let service = EngagementService::new(
            Arc::clone(&fast),
            Arc::clone(&audit),
            Arc::clone(&deadline),
        );
        let ranks = RankReader::new(
            Arc::clone(&fast),
            Arc::clone(&catalog),
            Arc::clone(&deadline),
            config.default_top_n,
        );

        Ok(Self {
            config,
            fast,
            audit,
            catalog,
            deadline,
            service,
            ranks,
        })
    }

    /// Record a like of `item`, by `user` if known.
    pub fn submit_like(&self, item: ItemId, user: Option<UserId>) -> LikerankResult<LikeReceipt> {
        self.service.submit_like(user, item)
    }

    /// Current like count of `item`.
    pub fn likes(&self, item: ItemId) -> LikerankResult<u64> {
        self.service.likes(item)
    }

    /// The `n` most-liked items (`0` means the configured default).
    pub fn top_n(&self, n: usize) -> LikerankResult<Vec<RankedItem>> {
        self.ranks.top_n(n)
    }

    /// Like count of `item` in export form.
    pub fn export_likes(&self, item: ItemId) -> LikerankResult<LikesExport> {
        Ok(LikesExport {
            item_id: item.get(),
            likes: self.likes(item)?,
        })
    }

    /// Full audit log in export form, in append order.
    pub fn export_audit(&self) -> LikerankResult<Vec<LikeEventExport>> {
        let audit = Arc::clone(&self.audit);
        let records = self.deadline.run("scan_audit", move || audit.scan())?;
        Ok(records.iter().map(LikeEventExport::from).collect())
    }

    /// Get the engagement service handle.
    pub fn service(&self) -> &EngagementService {
        &self.service
    }

    /// Get the rank reader handle.
    pub fn ranks(&self) -> &RankReader {
        &self.ranks
    }

    /// Get the fast store handle.
    pub fn fast_store(&self) -> &dyn FastStore {
        self.fast.as_ref()
    }

    /// Get the audit log handle.
    pub fn audit(&self) -> &dyn AuditLog {
        self.audit.as_ref()
    }

    /// Get the catalog handle.
    pub fn catalog(&self) -> &dyn Catalog {
        self.catalog.as_ref()
    }

    /// Get the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Summary of the engine state.
    pub fn info(&self) -> LikerankResult<EngineInfo> {
        let fast = Arc::clone(&self.fast);
        let ranked_items = self.deadline.run("ranked_len", move || fast.ranked_len())?;
        let audit = Arc::clone(&self.audit);
        let audit_records = self.deadline.run("audit_len", move || audit.len())?;
        Ok(EngineInfo {
            backend: self.fast.backend(),
            ranked_items,
            audit_records,
            op_timeout_ms: self.config.op_timeout_ms,
            persistent: self.config.data_dir.is_some(),
        })
    }
}

/// Summary information about the engine state.
#[derive(Debug, Clone)]
pub struct EngineInfo {
    pub backend: &'static str,
    pub ranked_items: usize,
    pub audit_records: u64,
    pub op_timeout_ms: u64,
    pub persistent: bool,
}

impl std::fmt::Display for EngineInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "likerank engine info")?;
        writeln!(f, "  fast store:    {}", self.backend)?;
        writeln!(f, "  ranked items:  {}", self.ranked_items)?;
        writeln!(f, "  audit records: {}", self.audit_records)?;
        writeln!(f, "  op timeout:    {} ms", self.op_timeout_ms)?;
        writeln!(f, "  persistent:    {}", self.persistent)?;
        Ok(())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("service", &self.service)
            .field("ranks", &self.ranks)
            .finish()
    }
}
