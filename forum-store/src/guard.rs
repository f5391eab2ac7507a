//! Request-scoped read/write coordination over one `EntityCollection`.
//!
//! A plain `std::sync::RwLock` rather than an async lock, since every
//! repository command in this system runs to completion synchronously
//! within one request (spec 5).
//! `ResourceGuard` additionally tracks read-path side effects (last-seen
//! timestamps, view counters) that must still be written even though the
//! caller only asked for a read, by queuing them for a short exclusive
//! pass once the read guard drops rather than upgrading the lock in
//! place.

use crate::entity_collection::EntityCollection;
use forum_core::{StoreError, Timestamp};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

/// A deferred mutation recorded during a read, applied once the read
/// guard is released. Kept intentionally small: only the side effects the
/// spec documents as allowed on a read path (view counters, last-seen,
/// page-visited).
pub enum DeferredWrite {
    TouchUserLastSeen { user: forum_core::UserId, at: Timestamp },
    TouchThreadActivity { thread: forum_core::ThreadId, at: Timestamp },
}

#[derive(Default)]
pub struct ResourceGuard {
    inner: RwLock<EntityCollection>,
}

impl ResourceGuard {
    pub fn new(entities: EntityCollection) -> Self {
        Self { inner: RwLock::new(entities) }
    }

    /// Acquire the collection for reading. Returns `StoreError::LockPoisoned`
    /// rather than panicking, so a poisoned writer can't take down an
    /// otherwise-healthy read path.
    pub fn read(&self) -> Result<RwLockReadGuard<'_, EntityCollection>, StoreError> {
        self.inner.read().map_err(|_| {
            warn!("entity store lock poisoned on read");
            StoreError::LockPoisoned
        })
    }

    pub fn write(&self) -> Result<RwLockWriteGuard<'_, EntityCollection>, StoreError> {
        self.inner.write().map_err(|_| {
            warn!("entity store lock poisoned on write");
            StoreError::LockPoisoned
        })
    }

    /// Apply a batch of deferred writes gathered during a read-path
    /// command. Takes a short-lived write lock; callers should prefer
    /// batching all of a single command's deferred writes into one call
    /// rather than one call per side effect.
    pub fn apply_deferred(&self, writes: Vec<DeferredWrite>) -> Result<(), StoreError> {
        if writes.is_empty() {
            return Ok(());
        }
        let mut guard = self.write()?;
        for write in writes {
            match write {
                DeferredWrite::TouchUserLastSeen { user, at } => {
                    guard.users.touch_last_seen(user, at);
                }
                DeferredWrite::TouchThreadActivity { thread, at } => {
                    guard.threads.touch_activity(thread, at);
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ResourceGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceGuard").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_then_deferred_write_is_visible() {
        let guard = ResourceGuard::new(EntityCollection::new());
        let user = forum_core::User::new(
            forum_core::UserId::new_v7(),
            "alice".into(),
            0,
            forum_core::VisitDetails::anonymous(),
        );
        let id = user.id;
        guard.write().unwrap().insert_user(user).unwrap();

        {
            let _r = guard.read().unwrap();
        }
        guard
            .apply_deferred(vec![DeferredWrite::TouchUserLastSeen { user: id, at: 42 }])
            .unwrap();

        assert_eq!(guard.read().unwrap().users.get(id).unwrap().last_seen, 42);
    }
}
