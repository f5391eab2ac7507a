//! The repository command surface, grouped by the entity kind each command
//! operates on, mirroring `MemoryRepository`'s per-area split
//! (`...User.cpp`, `...DiscussionThread.cpp`, `...Authorization.cpp`, ...).

pub mod attachments;
pub mod authorization;
pub mod categories;
pub mod comments;
pub mod messages;
pub mod private_messages;
pub mod tags;
pub mod threads;
pub mod users;

pub use attachments::*;
pub use authorization::*;
pub use categories::*;
pub use comments::*;
pub use messages::*;
pub use private_messages::*;
pub use tags::*;
pub use threads::*;
pub use users::*;
