//! In-memory entity collections, indices and the request-scoped RW guard
//! for the forum data core.
//!
//! `forum-core` defines plain data; this crate defines how it's indexed,
//! held, and safely read/written concurrently. Nothing here talks to a
//! network, a disk, or a clock other than through `Timestamp`s its
//! callers already hold - persistence and the journal are an external
//! collaborator's job.

pub mod collation;
pub mod collections;
pub mod entity_collection;
pub mod guard;
pub mod index;
pub mod runtime;

pub use entity_collection::EntityCollection;
pub use guard::{DeferredWrite, ResourceGuard};

/// A stable, cheap, `Copy` handle into a typed collection. The type-safe
/// ids in `forum-core` already are this handle (spec 9's `EntityPointer`
/// design note) - this alias exists so call sites that are conceptually
/// "holding a pointer" rather than "holding an id" can say so.
pub type EntityPointer<Id> = Id;
