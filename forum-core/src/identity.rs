//! Identity types for forum entities: stable ids, timestamps, privilege
//! scalars and the bounded/non-owning string types used by message content.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// ENTITY ID TYPE SYSTEM
// ============================================================================

/// Trait for type-safe entity ids.
///
/// Each entity kind gets its own newtype so a `ThreadId` can never be passed
/// where a `TagId` is expected, while every id still shares the same
/// construction and parsing API.
pub trait EntityIdType:
    Copy
    + Clone
    + Eq
    + PartialEq
    + Ord
    + Hash
    + fmt::Debug
    + fmt::Display
    + FromStr
    + Serialize
    + serde::de::DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// Name of the entity kind, e.g. `"thread"`.
    const ENTITY_NAME: &'static str;

    fn new(uuid: Uuid) -> Self;
    fn as_uuid(&self) -> Uuid;

    /// The distinguished "empty" id: anonymous user, no parent, forum-wide scope.
    fn empty() -> Self {
        Self::new(Uuid::nil())
    }

    fn is_empty(&self) -> bool {
        self.as_uuid().is_nil()
    }

    /// Time-sortable id, used when the core itself mints a new id.
    fn new_v7() -> Self {
        Self::new(Uuid::now_v7())
    }
}

/// Error returned when parsing an entity id from a string fails.
#[derive(Debug, Clone)]
pub struct EntityIdParseError {
    pub entity_name: &'static str,
    pub input: String,
    pub source: uuid::Error,
}

impl fmt::Display for EntityIdParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to parse {} id from '{}': {}",
            self.entity_name, self.input, self.source
        )
    }
}

impl std::error::Error for EntityIdParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

macro_rules! define_entity_id {
    ($name:ident, $entity:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(Uuid);

        impl EntityIdType for $name {
            const ENTITY_NAME: &'static str = $entity;

            fn new(uuid: Uuid) -> Self {
                Self(uuid)
            }

            fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = EntityIdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::from_str(s)
                    .map(Self::new)
                    .map_err(|e| EntityIdParseError {
                        entity_name: Self::ENTITY_NAME,
                        input: s.to_string(),
                        source: e,
                    })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::empty()
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                self.0.serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                Uuid::deserialize(deserializer).map(Self::new)
            }
        }
    };
}

define_entity_id!(UserId, "user", "Type-safe id for a User.");
define_entity_id!(ThreadId, "thread", "Type-safe id for a DiscussionThread.");
define_entity_id!(
    MessageId,
    "message",
    "Type-safe id for a DiscussionThreadMessage."
);
define_entity_id!(CommentId, "comment", "Type-safe id for a MessageComment.");
define_entity_id!(TagId, "tag", "Type-safe id for a DiscussionTag.");
define_entity_id!(
    CategoryId,
    "category",
    "Type-safe id for a DiscussionCategory."
);
define_entity_id!(AttachmentId, "attachment", "Type-safe id for an Attachment.");
define_entity_id!(
    PrivateMessageId,
    "private_message",
    "Type-safe id for a PrivateMessage."
);

// ============================================================================
// TIMESTAMPS
// ============================================================================

/// Seconds since a fixed epoch. `0` means "unset" - this is a plain
/// integer, not `chrono::DateTime`, to match the wire representation the
/// original authorization/ranking code keys indices on.
pub type Timestamp = i64;

/// Current wall-clock time as a `Timestamp`. Commands should prefer taking
/// `now` from the ambient request context rather than calling this, so that
/// a single instant is used consistently across a transaction; this helper
/// exists for callers (tests, the replay boundary) that have no context.
pub fn now() -> Timestamp {
    chrono::Utc::now().timestamp()
}

// ============================================================================
// PRIVILEGE SCALARS
// ============================================================================

/// Signed weight of a privilege grant or requirement, clamped to the
/// documented range. `None` at the call site means "not set" / "fall
/// through to the next scope".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrivilegeValue(i16);

impl PrivilegeValue {
    pub const MIN: i16 = -32000;
    pub const MAX: i16 = 32000;

    pub fn new(value: i16) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> i16 {
        self.0
    }
}

impl From<i16> for PrivilegeValue {
    fn from(v: i16) -> Self {
        Self::new(v)
    }
}

impl fmt::Display for PrivilegeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Duration in seconds a grant remains valid. `0` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrivilegeDuration(pub i64);

impl PrivilegeDuration {
    pub const UNLIMITED: PrivilegeDuration = PrivilegeDuration(0);

    pub fn is_unlimited(self) -> bool {
        self.0 == 0
    }

    /// `expiresAt = now + duration`, clamped against overflow per
    /// DESIGN.md's resolution of the open `calculatePrivilegeExpires`
    /// question: durations at or beyond half of `i64::MAX` are reduced
    /// before adding, rather than rejected.
    pub fn expires_at(self, now: Timestamp) -> Timestamp {
        if self.is_unlimited() {
            return 0;
        }
        let safe = self.0.min(i64::MAX / 2);
        now.saturating_add(safe)
    }
}

// ============================================================================
// VISIT DETAILS
// ============================================================================

/// Client details recorded alongside creation/mutation events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitDetails {
    pub ip: [u8; 16],
    pub user_agent: String,
}

impl VisitDetails {
    pub fn new(ip: [u8; 16], user_agent: impl Into<String>, max_len: usize) -> Self {
        let mut user_agent = user_agent.into();
        if user_agent.len() > max_len {
            user_agent.truncate(max_len);
        }
        Self { ip, user_agent }
    }

    pub fn anonymous() -> Self {
        Self {
            ip: [0u8; 16],
            user_agent: String::new(),
        }
    }
}

// ============================================================================
// MESSAGE CONTENT
// ============================================================================

/// Message/comment body content.
///
/// Content is usually owned, but the journal replay path may hand back a
/// view into a buffer it already materialized (`EntityCollection`'s
/// `message_content_pointer` operation in `forum-store`); `Shared` avoids
/// an extra copy in that path without forcing every caller to deal with
/// lifetimes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Content {
    Owned(String),
    Shared(Arc<str>),
}

impl Content {
    pub fn as_str(&self) -> &str {
        match self {
            Content::Owned(s) => s.as_str(),
            Content::Shared(s) => s.as_ref(),
        }
    }

    pub fn char_len(&self) -> usize {
        self.as_str().chars().count()
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Content::Owned(s)
    }
}

impl From<Content> for String {
    fn from(c: Content) -> Self {
        match c {
            Content::Owned(s) => s,
            Content::Shared(s) => s.to_string(),
        }
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Content::Owned(s.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_type_safety() {
        let user = UserId::new_v7();
        let thread = ThreadId::new_v7();
        assert_ne!(user.as_uuid(), thread.as_uuid());
    }

    #[test]
    fn entity_id_empty_is_nil() {
        assert!(UserId::empty().is_empty());
        assert_eq!(UserId::empty().as_uuid(), Uuid::nil());
    }

    #[test]
    fn entity_id_from_str_roundtrip() {
        let id = ThreadId::new_v7();
        let parsed: ThreadId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn entity_id_parse_error_names_entity() {
        let err: Result<TagId, _> = "not-a-uuid".parse();
        assert_eq!(err.unwrap_err().entity_name, "tag");
    }

    #[test]
    fn privilege_value_clamps() {
        assert_eq!(PrivilegeValue::new(100_000).get(), PrivilegeValue::MAX);
        assert_eq!(PrivilegeValue::new(-100_000).get(), PrivilegeValue::MIN);
    }

    #[test]
    fn privilege_duration_unlimited_is_zero() {
        assert_eq!(PrivilegeDuration::UNLIMITED.expires_at(1000), 0);
    }

    #[test]
    fn privilege_duration_overflow_is_clamped_not_panicking() {
        let d = PrivilegeDuration(i64::MAX);
        let expires = d.expires_at(10);
        assert!(expires > 10);
    }
}
