//! Observer hooks for reads and writes, mirroring `MemoryRepository`'s
//! `addObserver`/`ReadRepositoryObserver`/`WriteRepositoryObserver`
//! pattern. The journal/metrics/cache-invalidation collaborators attach
//! here; this crate ships only the no-op default.

use forum_core::{EntityRef, Timestamp, UserId};

pub trait ReadEvents: Send + Sync {
    fn on_entity_read(&self, _entity: EntityRef, _by: UserId, _at: Timestamp) {}
}

pub trait WriteEvents: Send + Sync {
    fn on_entity_created(&self, _entity: EntityRef, _by: UserId, _at: Timestamp) {}
    fn on_entity_changed(&self, _entity: EntityRef, _by: UserId, _at: Timestamp) {}
    fn on_entity_deleted(&self, _entity: EntityRef, _by: UserId, _at: Timestamp) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpObserver;

impl ReadEvents for NoOpObserver {}
impl WriteEvents for NoOpObserver {}
