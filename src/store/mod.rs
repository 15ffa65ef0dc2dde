//! Fast store: dedup claims, per-item counters and the like ranking.
//!
//! Two backends implement [`FastStore`]:
//!
//! - [`MemFastStore`]: concurrent in-memory state (DashMap + one tally lock)
//! - [`RedbFastStore`]: the same state in redb tables, one write transaction per mutation
//!
//! [`DurableStore`] is the shared redb handle that the persistent fast store,
//! the audit log and the catalog are built on.

pub mod durable;
pub mod mem;
pub mod persistent;

pub use durable::DurableStore;
pub use mem::MemFastStore;
pub use persistent::RedbFastStore;

use crate::error::StoreError;
use crate::ids::{ItemId, UserId};

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Outcome of a dedup claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// First like of this item by this user; the pair is now recorded.
    Claimed,
    /// The pair was recorded by an earlier call.
    AlreadyClaimed,
}

/// Low-latency store holding dedup state, counters and the ranking.
///
/// Implementations own all concurrency control for their keys: callers
/// never lock around these calls.
pub trait FastStore: Send + Sync {
    /// Record that `user` liked `item`.
    ///
    /// Returns [`Claim::Claimed`] at most once per pair over the lifetime of
    /// the store. The record is in place before `Claimed` is returned.
    fn try_claim(&self, user: UserId, item: ItemId) -> StoreResult<Claim>;

    /// Increment the item's counter and ranking score by one, atomically.
    ///
    /// Readers observe either both effects or neither. On error, both are
    /// left at their previous values. Returns the new count.
    fn credit(&self, item: ItemId) -> StoreResult<u64>;

    /// Current counter value, 0 for items never credited.
    fn likes(&self, item: ItemId) -> StoreResult<u64>;

    /// Ranking score of `item` as held by the ranking structure itself.
    fn score(&self, item: ItemId) -> StoreResult<Option<u64>>;

    /// Counter value and ranking score of `item`, read from one snapshot.
    ///
    /// The score is `None` exactly when the counter is 0.
    fn standing(&self, item: ItemId) -> StoreResult<(u64, Option<u64>)>;

    /// Up to `n` ranking entries, by score descending then item id ascending.
    fn top(&self, n: usize) -> StoreResult<Vec<(ItemId, u64)>>;

    /// Number of items with a ranking entry.
    fn ranked_len(&self) -> StoreResult<usize>;

    /// Short backend name for diagnostics.
    fn backend(&self) -> &'static str;
}
