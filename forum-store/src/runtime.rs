//! Per-entity atomic counters and the per-user spin-locked page-visited
//! map (spec 5).
//!
//! These fields are mutated from *read* paths and never participate in any
//! secondary index, so they live outside the plain-data entity structs in
//! `forum-core` (which must stay `Clone`/`PartialEq`/`Serialize`) in a
//! side table keyed by id, following the "atomics via interior mutability
//! on the specific fields that aren't index keys" design note.

use forum_core::{ThreadId, UserId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;

/// Runtime-only counters for one `User`, updated under the store's shared
/// read lock.
#[derive(Debug, Default)]
pub struct UserRuntime {
    pub vote_history_not_read: AtomicU32,
    pub quotes_history_not_read: AtomicU32,
    pub vote_history_last_retrieved: AtomicI64,
    pub show_in_online_users: AtomicBool,
    /// Guarded by `latest_page_lock` below rather than the global store
    /// lock, so a hot "get thread by id" read doesn't contend on it.
    latest_page_lock: SpinLock,
    latest_thread_page_visited: Mutex<HashMap<ThreadId, u32>>,
}

impl UserRuntime {
    pub fn new() -> Self {
        Self {
            show_in_online_users: AtomicBool::new(true),
            ..Default::default()
        }
    }

    pub fn record_page_visited(&self, thread: ThreadId, page: u32) {
        let _guard = self.latest_page_lock.lock();
        self.latest_thread_page_visited
            .lock()
            .expect("latest_thread_page_visited mutex poisoned")
            .insert(thread, page);
    }

    pub fn page_visited(&self, thread: ThreadId) -> Option<u32> {
        let _guard = self.latest_page_lock.lock();
        self.latest_thread_page_visited
            .lock()
            .expect("latest_thread_page_visited mutex poisoned")
            .get(&thread)
            .copied()
    }
}

/// Runtime-only counters for one `DiscussionThread`.
#[derive(Debug, Default)]
pub struct ThreadRuntime {
    pub visited: AtomicU64,
}

/// Runtime-only counters for one `Attachment`.
#[derive(Debug, Default)]
pub struct AttachmentRuntime {
    pub nr_of_get_requests: AtomicU64,
}

/// A minimal test-and-set spin lock. The critical sections it guards
/// (inserting into a small per-user map) are O(1) and never block on I/O,
/// so a spin loop avoids the cost of a full OS mutex without reaching for
/// an external spinlock crate (the teacher's own collections lean on bare
/// `std::sync` primitives rather than `parking_lot`).
#[derive(Debug, Default)]
struct SpinLock {
    locked: AtomicBool,
}

struct SpinLockGuard<'a> {
    lock: &'a SpinLock,
}

impl Drop for SpinLockGuard<'_> {
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
    }
}

impl SpinLock {
    fn lock(&self) -> SpinLockGuard<'_> {
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            std::hint::spin_loop();
        }
        SpinLockGuard { lock: self }
    }
}

/// Side tables for every entity kind whose runtime counters aren't part of
/// the serializable entity struct. Owned by `EntityCollection`, one table
/// per entity kind, inserted/removed alongside the entity itself.
#[derive(Debug, Default)]
pub struct RuntimeTables {
    pub users: HashMap<UserId, UserRuntime>,
    pub threads: HashMap<ThreadId, ThreadRuntime>,
    pub attachments: HashMap<forum_core::AttachmentId, AttachmentRuntime>,
}

impl RuntimeTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&self, id: UserId) -> Option<&UserRuntime> {
        self.users.get(&id)
    }

    pub fn thread(&self, id: ThreadId) -> Option<&ThreadRuntime> {
        self.threads.get(&id)
    }

    pub fn attachment(&self, id: forum_core::AttachmentId) -> Option<&AttachmentRuntime> {
        self.attachments.get(&id)
    }
}
