//! In-memory fast store.
//!
//! Claims live in a sharded `DashSet`. Counters and ranking live together in
//! one [`Tally`] behind a single lock, so a credit updates both before any
//! reader can look. All data is lost on process exit.

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use dashmap::DashSet;

use crate::error::StoreError;
use crate::ids::{ItemId, UserId};
use crate::store::{Claim, FastStore, StoreResult};

#[derive(Debug, Default)]
struct Tally {
    counters: HashMap<ItemId, u64>,
    /// Ordered by score descending, then item ascending.
    ranking: BTreeSet<(Reverse<u64>, ItemId)>,
}

impl Tally {
    /// Score held by the ranking itself, independent of the counter.
    fn ranked_score(&self, item: ItemId) -> Option<u64> {
        self.ranking
            .iter()
            .find(|(_, ranked)| *ranked == item)
            .map(|(Reverse(score), _)| *score)
    }

    fn credit(&mut self, item: ItemId) -> u64 {
        let count = self.counters.entry(item).or_insert(0);
        let previous = *count;
        *count += 1;
        if previous > 0 {
            self.ranking.remove(&(Reverse(previous), item));
        }
        self.ranking.insert((Reverse(*count), item));
        *count
    }
}

/// Concurrent in-memory fast store.
#[derive(Debug, Default)]
pub struct MemFastStore {
    claims: DashSet<(UserId, ItemId)>,
    tally: RwLock<Tally>,
}

impl MemFastStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded dedup claims.
    pub fn claim_count(&self) -> usize {
        self.claims.len()
    }

    fn poisoned() -> StoreError {
        StoreError::Unavailable {
            message: "tally lock poisoned by a panicked writer".into(),
        }
    }
}

impl FastStore for MemFastStore {
    fn try_claim(&self, user: UserId, item: ItemId) -> StoreResult<Claim> {
        if self.claims.insert((user, item)) {
            Ok(Claim::Claimed)
        } else {
            Ok(Claim::AlreadyClaimed)
        }
    }

    fn credit(&self, item: ItemId) -> StoreResult<u64> {
        let mut tally = self.tally.write().map_err(|_| Self::poisoned())?;
        Ok(tally.credit(item))
    }

    fn likes(&self, item: ItemId) -> StoreResult<u64> {
        let tally = self.tally.read().map_err(|_| Self::poisoned())?;
        Ok(tally.counters.get(&item).copied().unwrap_or(0))
    }

    fn score(&self, item: ItemId) -> StoreResult<Option<u64>> {
        let tally = self.tally.read().map_err(|_| Self::poisoned())?;
        Ok(tally.ranked_score(item))
    }

    fn standing(&self, item: ItemId) -> StoreResult<(u64, Option<u64>)> {
        let tally = self.tally.read().map_err(|_| Self::poisoned())?;
        let likes = tally.counters.get(&item).copied().unwrap_or(0);
        Ok((likes, tally.ranked_score(item)))
    }

    fn top(&self, n: usize) -> StoreResult<Vec<(ItemId, u64)>> {
        let tally = self.tally.read().map_err(|_| Self::poisoned())?;
        Ok(tally
            .ranking
            .iter()
            .take(n)
            .map(|(Reverse(score), item)| (*item, *score))
            .collect())
    }

    fn ranked_len(&self) -> StoreResult<usize> {
        let tally = self.tally.read().map_err(|_| Self::poisoned())?;
        Ok(tally.ranking.len())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(raw: u64) -> ItemId {
        ItemId::new(raw).unwrap()
    }

    fn user(raw: u64) -> UserId {
        UserId::new(raw).unwrap()
    }

    #[test]
    fn claim_is_granted_once() {
        let store = MemFastStore::new();
        assert_eq!(store.try_claim(user(7), item(42)).unwrap(), Claim::Claimed);
        assert_eq!(
            store.try_claim(user(7), item(42)).unwrap(),
            Claim::AlreadyClaimed
        );
        assert_eq!(store.try_claim(user(8), item(42)).unwrap(), Claim::Claimed);
        assert_eq!(store.try_claim(user(7), item(43)).unwrap(), Claim::Claimed);
        assert_eq!(store.claim_count(), 3);
    }

    #[test]
    fn credit_keeps_counter_and_score_equal() {
        let store = MemFastStore::new();
        assert_eq!(store.likes(item(1)).unwrap(), 0);
        assert_eq!(store.score(item(1)).unwrap(), None);

        for expected in 1..=5 {
            assert_eq!(store.credit(item(1)).unwrap(), expected);
            assert_eq!(store.score(item(1)).unwrap(), Some(expected));
            assert_eq!(store.likes(item(1)).unwrap(), expected);
        }
        assert_eq!(store.ranked_len().unwrap(), 1);
    }

    #[test]
    fn top_orders_by_score_then_id() {
        let store = MemFastStore::new();
        for _ in 0..2 {
            store.credit(item(9)).unwrap();
        }
        store.credit(item(3)).unwrap();
        store.credit(item(1)).unwrap();
        for _ in 0..2 {
            store.credit(item(4)).unwrap();
        }

        let top = store.top(10).unwrap();
        assert_eq!(
            top,
            vec![(item(4), 2), (item(9), 2), (item(1), 1), (item(3), 1)]
        );
        assert_eq!(store.top(2).unwrap().len(), 2);
        assert!(store.top(0).unwrap().is_empty());
    }

    #[test]
    fn concurrent_credits_are_not_lost() {
        use std::sync::Arc;
        let store = Arc::new(MemFastStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        store.credit(item(42)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.likes(item(42)).unwrap(), 2_000);
        assert_eq!(store.score(item(42)).unwrap(), Some(2_000));
        assert_eq!(store.ranked_len().unwrap(), 1);
    }

    #[test]
    fn standing_is_consistent_during_credits() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let store = Arc::new(MemFastStore::new());
        let done = Arc::new(AtomicBool::new(false));
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                let done = Arc::clone(&done);
                std::thread::spawn(move || loop {
                    let finished = done.load(Ordering::SeqCst);
                    let (likes, score) = store.standing(item(42)).unwrap();
                    assert_eq!(score, (likes > 0).then_some(likes));
                    for (ranked, score) in store.top(3).unwrap() {
                        assert!(score > 0);
                        assert!(store.standing(ranked).unwrap().1.is_some());
                    }
                    if finished {
                        break;
                    }
                })
            })
            .collect();
        let writers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        store.credit(item(42)).unwrap();
                        store.credit(item(43)).unwrap();
                    }
                })
            })
            .collect();
        for w in writers {
            w.join().unwrap();
        }
        done.store(true, Ordering::SeqCst);
        for r in readers {
            r.join().unwrap();
        }
        assert_eq!(store.standing(item(42)).unwrap(), (2_000, Some(2_000)));
    }
}
