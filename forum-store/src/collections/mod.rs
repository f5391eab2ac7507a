//! One module per entity kind: a primary `HashMap` keyed by id plus the
//! secondary indices that kind's paginated/ranked listings need (spec
//! 4.1's per-entity index table). Each collection owns its indices and
//! exposes `insert`/`remove`/`prepare_update_*`/`commit_update_*` so
//! `EntityCollection` never reaches into a `BTreeSet` directly.

pub mod attachments;
pub mod categories;
pub mod comments;
pub mod messages;
pub mod private_messages;
pub mod tags;
pub mod threads;
pub mod users;

pub use attachments::AttachmentCollection;
pub use categories::CategoryCollection;
pub use comments::CommentCollection;
pub use messages::MessageCollection;
pub use private_messages::PrivateMessageCollection;
pub use tags::TagCollection;
pub use threads::ThreadCollection;
pub use users::UserCollection;
