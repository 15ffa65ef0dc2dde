//! Rank reader: top-N queries over the like ranking, enriched with titles.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::deadline::Deadline;
use crate::error::{CatalogError, LikerankResult, RankError};
use crate::ids::ItemId;
use crate::store::FastStore;

/// Page size used when a request does not name a usable one.
pub const DEFAULT_TOP_N: usize = 10;

/// One row of a top-N answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedItem {
    pub id: ItemId,
    pub score: u64,
    /// 1-based position in the ranking.
    pub rank: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Turn a raw request value into a page size.
///
/// Missing, unparsable and non-positive values fall back to `default`.
pub fn parse_top(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .map(|n| n as usize)
        .unwrap_or(default)
}

/// Serves top-N queries.
pub struct RankReader {
    fast: Arc<dyn FastStore>,
    catalog: Arc<dyn Catalog>,
    deadline: Arc<Deadline>,
    default_n: usize,
}

impl RankReader {
    pub fn new(
        fast: Arc<dyn FastStore>,
        catalog: Arc<dyn Catalog>,
        deadline: Arc<Deadline>,
        default_n: usize,
    ) -> Self {
        Self {
            fast,
            catalog,
            deadline,
            default_n,
        }
    }

    /// The page size used for `n == 0`.
    pub fn default_n(&self) -> usize {
        self.default_n
    }

    /// The `n` most-liked items, ties broken by ascending item id.
    ///
    /// Titles are best effort: items missing from the catalog, or a catalog
    /// that cannot be reached, yield rows without a title.
    pub fn top_n(&self, n: usize) -> LikerankResult<Vec<RankedItem>> {
        let n = if n == 0 { self.default_n } else { n };

        let fast = Arc::clone(&self.fast);
        let entries = self
            .deadline
            .run("top", move || fast.top(n))
            .map_err(|source| RankError::RangeReadFailed { n, source })?;

        let ranked = entries
            .into_iter()
            .enumerate()
            .map(|(i, (id, score))| RankedItem {
                id,
                score,
                rank: i + 1,
                title: self.title_of(id),
            })
            .collect();
        Ok(ranked)
    }

    fn title_of(&self, item: ItemId) -> Option<String> {
        let catalog = Arc::clone(&self.catalog);
        match self
            .deadline
            .run("lookup_title", move || catalog.lookup_title(item))
        {
            Ok(title) => Some(title),
            Err(CatalogError::NotFound { .. }) => {
                tracing::debug!(%item, "ranked item missing from catalog");
                None
            }
            Err(e) => {
                tracing::warn!(%item, error = %e, "title lookup failed");
                None
            }
        }
    }
}

impl std::fmt::Debug for RankReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RankReader")
            .field("backend", &self.fast.backend())
            .field("default_n", &self.default_n)
            .finish()
    }
}
