//! The repository: the ~110-command surface the rest of the system drives
//! the entity store and authorization core through. Every command takes
//! whatever typed arguments it needs plus an `OutStream` to write its JSON
//! result into; nothing here does I/O, networking or persistence - those
//! are external collaborators (spec 1, 9).

pub mod commands;
pub mod events;
pub mod ids;
pub mod outstream;
pub mod pagination;
pub mod serialization;
pub mod validation;

pub use events::{NoOpObserver, ReadEvents, WriteEvents};
pub use ids::{IdGenerator, UuidV7Generator};
pub use outstream::{write_json, JsonOutStream, OutStream};
pub use pagination::{Page, PageRequest};
pub use serialization::{Serializable, SerializationRestriction};

use forum_authz::Authorization;
use forum_core::ForumConfig;
use forum_store::ResourceGuard;

/// Everything a command needs beyond its own arguments: the entity store,
/// the authorization facade, config, id generation and observers. One
/// `Repository` is built per process and shared across requests; it holds
/// no per-request state itself (that lives in the caller's request scope).
pub struct Repository<I: IdGenerator, R: ReadEvents, W: WriteEvents> {
    pub store: ResourceGuard,
    pub authorization: Authorization,
    pub config: ForumConfig,
    pub ids: I,
    pub read_events: R,
    pub write_events: W,
}

impl<I: IdGenerator, R: ReadEvents, W: WriteEvents> Repository<I, R, W> {
    pub fn new(config: ForumConfig, ids: I, read_events: R, write_events: W, authorization: Authorization) -> Self {
        Self {
            store: ResourceGuard::new(forum_store::EntityCollection::new()),
            authorization,
            config,
            ids,
            read_events,
            write_events,
        }
    }
}
