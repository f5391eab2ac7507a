//! Enum types shared across the forum core: entity kinds, privileges,
//! status codes and the small state machines named in the spec.

use serde::{Deserialize, Serialize};

/// Discriminator for the kind of entity an `EntityRef`/grant/privilege
/// scope points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    User,
    DiscussionThread,
    DiscussionThreadMessage,
    MessageComment,
    DiscussionTag,
    DiscussionCategory,
    Attachment,
    PrivateMessage,
    ForumWide,
}

/// Reference to an entity by type and id, for generic event/observer
/// payloads that aren't already carrying a typed id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity_type: EntityType,
    pub id: uuid::Uuid,
}

/// Every privilege-gated action in the system. The integer discriminant is
/// stable (used as the index into `ForumWidePrivilegeStore`'s threshold
/// arrays), so new variants must be appended, never inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Privilege {
    // --- forum-wide / thread-level ---
    AddThread = 0,
    AddThreadMessage,
    AutoApproveThread,
    AutoApproveMessage,
    AutoApproveAttachment,
    ChangeOwnUserName,
    ChangeOwnUserInfo,
    ChangeAnyUserName,
    ChangeAnyUserInfo,
    DeleteAnyUser,
    ChangeDiscussionThreadName,
    ChangeDiscussionThreadPinDisplayOrder,
    DeleteDiscussionThread,
    MergeDiscussionThreads,
    ViewUnapproved,
    ViewUnapprovedAttachment,

    // --- thread-level ---
    AddMessage,
    ChangeOwnMessageContent,
    ChangeAnyMessageContent,
    DeleteOwnMessage,
    DeleteAnyMessage,
    MoveDiscussionThreadMessage,
    UpVote,
    DownVote,
    ResetVote,
    AddComment,
    SolveComment,
    SubscribeToThread,
    UnsubscribeFromThread,
    ViewThread,

    // --- message-level ---
    ViewMessage,
    ViewCreatorUser,
    ViewVotes,
    ViewIpAddress,
    GetMessageComments,

    // --- tag-level ---
    AddDiscussionTag,
    ChangeDiscussionTagName,
    DeleteDiscussionTag,
    MergeDiscussionTags,
    AddDiscussionTagToThread,
    RemoveDiscussionTagFromThread,

    // --- category-level ---
    AddDiscussionCategory,
    ChangeDiscussionCategoryName,
    ChangeDiscussionCategoryDescription,
    ChangeDiscussionCategoryParent,
    ChangeDiscussionCategoryDisplayOrder,
    DeleteDiscussionCategory,
    AddDiscussionCategoryTag,
    RemoveDiscussionCategoryTag,

    // --- attachment-level ---
    AddAttachmentToMessage,
    RemoveAttachmentFromMessage,
    DeleteAttachment,
    AutoApproveAttachmentUpload,

    // --- privilege administration ---
    AssignDiscussionThreadPrivilege,
    AssignDiscussionTagPrivilege,
    AssignDiscussionCategoryPrivilege,
    AssignForumWidePrivilege,

    // --- throttling escape hatch ---
    NoThrottling,
}

pub const PRIVILEGE_COUNT: usize = Privilege::NoThrottling as usize + 1;

/// Sliding-window throttling buckets, each independently configured with
/// `(max_count, period_seconds)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThrottleBucket {
    NewContent,
    EditContent,
    EditPrivileges,
    Vote,
    Subscribe,
}

/// Outcome of a repository command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCode {
    Ok,
    InvalidParameters,
    ValueTooLong,
    ValueTooShort,
    AlreadyExists,
    NotFound,
    NoEffect,
    CircularReferenceNotAllowed,
    NotAllowed,
    NotUpdatedSinceLastCheck,
    Unauthorized,
    Throttled,
    UserWithSameAuthAlreadyExists,
}

impl StatusCode {
    pub fn is_ok(self) -> bool {
        matches!(self, StatusCode::Ok)
    }
}

/// Result of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationStatus {
    Ok,
    NotAllowed,
    Throttled,
}

/// Ascending/descending sort direction for a paginated index view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// A user's current vote on a message. There is no separate "none" struct
/// variant stored - absence from both vote maps already means none - this
/// enum exists for call sites that need to reason about the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteState {
    None,
    Up,
    Down,
}

/// Kind of field being validated, used to pick the right length bounds and
/// regex out of `ForumConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidatedFieldKind {
    UserName,
    ThreadName,
    TagName,
    CategoryName,
    MessageContent,
    CommentContent,
    UserInfo,
    UserTitle,
    UserSignature,
}

impl ValidatedFieldKind {
    /// Stable string key, used where config is keyed by string (TOML map
    /// keys must be strings; enum variants aren't).
    pub fn as_str(self) -> &'static str {
        match self {
            ValidatedFieldKind::UserName => "user_name",
            ValidatedFieldKind::ThreadName => "thread_name",
            ValidatedFieldKind::TagName => "tag_name",
            ValidatedFieldKind::CategoryName => "category_name",
            ValidatedFieldKind::MessageContent => "message_content",
            ValidatedFieldKind::CommentContent => "comment_content",
            ValidatedFieldKind::UserInfo => "user_info",
            ValidatedFieldKind::UserTitle => "user_title",
            ValidatedFieldKind::UserSignature => "user_signature",
        }
    }
}

impl ThrottleBucket {
    pub fn as_str(self) -> &'static str {
        match self {
            ThrottleBucket::NewContent => "new_content",
            ThrottleBucket::EditContent => "edit_content",
            ThrottleBucket::EditPrivileges => "edit_privileges",
            ThrottleBucket::Vote => "vote",
            ThrottleBucket::Subscribe => "subscribe",
        }
    }
}
