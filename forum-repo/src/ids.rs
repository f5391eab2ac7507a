//! Id generation, kept behind a trait so tests can supply deterministic
//! ids while production uses time-sortable v7 uuids (spec 9: "id
//! generation is an external collaborator" - this is the seam).

use forum_core::EntityIdType;

pub trait IdGenerator: Send + Sync {
    fn generate<Id: EntityIdType>(&self) -> Id;
}

/// Production generator: every id is a fresh UUIDv7, so ids sort roughly
/// by creation order even across entity kinds.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidV7Generator;

impl IdGenerator for UuidV7Generator {
    fn generate<Id: EntityIdType>(&self) -> Id {
        Id::new_v7()
    }
}
