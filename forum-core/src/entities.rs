//! Core entity structures.
//!
//! These are plain data: construction, field access and serialization only.
//! Index maintenance lives in `forum-store`, privilege resolution in
//! `forum-authz`; nothing here reaches back into either.

use crate::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Per-action required-privilege thresholds, attached to whichever entity
/// owns that scope (a thread, a tag, a category, or the forum-wide
/// singleton). `None` at a given `Privilege` means "fall through to the
/// next scope in the chain" (spec 4.4).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivilegeThresholds(Vec<Option<PrivilegeValue>>);

impl Default for PrivilegeThresholds {
    fn default() -> Self {
        Self(vec![None; PRIVILEGE_COUNT])
    }
}

impl PrivilegeThresholds {
    pub fn get(&self, p: Privilege) -> Option<PrivilegeValue> {
        self.0[p as usize]
    }

    pub fn set(&mut self, p: Privilege, value: Option<PrivilegeValue>) {
        self.0[p as usize] = value;
    }
}

/// A fixed-capacity ring buffer, used for the 64-entry vote/quote history
/// kept per user. Oldest entry is evicted once full.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingBuffer<T> {
    capacity: usize,
    items: VecDeque<T>,
}

impl<T> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, item: T) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub const HISTORY_RING_CAPACITY: usize = 64;

/// One entry in a user's vote-received history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub message: MessageId,
    pub voter: UserId,
    pub up: bool,
    pub at: Timestamp,
}

/// One entry in a user's quote-received history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteReceipt {
    pub message: MessageId,
    pub quoted_by: UserId,
    pub at: Timestamp,
}

/// Who/when/why/from-where of the last edit to a thread or message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastUpdate {
    pub by: UserId,
    pub at: Timestamp,
    pub reason: Option<String>,
    pub ip: [u8; 16],
}

/// User - an account that can author content and hold privileges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub created: Timestamp,
    pub creation_details: VisitDetails,
    /// Unique when present; only one user may hold a given auth token.
    pub auth_token: Option<String>,
    /// Unique per collation-aware comparison (accent- and case-insensitive).
    pub name: String,
    pub info: Option<String>,
    pub title: Option<String>,
    pub signature: Option<String>,
    pub logo: Option<String>,
    pub last_seen: Timestamp,
    pub up_votes_received: u32,
    pub down_votes_received: u32,
    pub own_threads: Vec<ThreadId>,
    pub own_messages: Vec<MessageId>,
    pub own_comments: Vec<CommentId>,
    pub subscribed_threads: BTreeSet<ThreadId>,
    pub voted_messages: BTreeSet<MessageId>,
    pub vote_history: RingBuffer<VoteReceipt>,
    pub quote_history: RingBuffer<QuoteReceipt>,
}

impl User {
    pub fn new(id: UserId, name: String, created: Timestamp, creation_details: VisitDetails) -> Self {
        Self {
            id,
            created,
            creation_details,
            auth_token: None,
            name,
            info: None,
            title: None,
            signature: None,
            logo: None,
            last_seen: created,
            up_votes_received: 0,
            down_votes_received: 0,
            own_threads: Vec::new(),
            own_messages: Vec::new(),
            own_comments: Vec::new(),
            subscribed_threads: BTreeSet::new(),
            voted_messages: BTreeSet::new(),
            vote_history: RingBuffer::new(HISTORY_RING_CAPACITY),
            quote_history: RingBuffer::new(HISTORY_RING_CAPACITY),
        }
    }

    pub fn message_count(&self) -> usize {
        self.own_messages.len()
    }

    pub fn thread_count(&self) -> usize {
        self.own_threads.len()
    }
}

/// DiscussionThread - a top-level container of messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionThread {
    pub id: ThreadId,
    pub creator: UserId,
    pub name: String,
    pub created: Timestamp,
    pub last_updated: Option<LastUpdate>,
    pub latest_visible_change: Timestamp,
    pub latest_message_created: Timestamp,
    pub pin_display_order: u16,
    pub approved: bool,
    pub messages: Vec<MessageId>,
    pub subscribed_users: BTreeSet<UserId>,
    pub tags: BTreeSet<TagId>,
    pub categories: BTreeSet<CategoryId>,
    pub visitors_since_last_edit: BTreeSet<UserId>,
    pub required_privileges: PrivilegeThresholds,
}

impl DiscussionThread {
    pub fn new(id: ThreadId, creator: UserId, name: String, created: Timestamp) -> Self {
        Self {
            id,
            creator,
            name,
            created,
            last_updated: None,
            latest_visible_change: created,
            latest_message_created: 0,
            pin_display_order: 0,
            approved: true,
            messages: Vec::new(),
            subscribed_users: BTreeSet::new(),
            tags: BTreeSet::new(),
            categories: BTreeSet::new(),
            visitors_since_last_edit: BTreeSet::new(),
            required_privileges: PrivilegeThresholds::default(),
        }
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

/// DiscussionThreadMessage - a single post within a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionThreadMessage {
    pub id: MessageId,
    pub creator: UserId,
    pub parent_thread: ThreadId,
    pub content: Content,
    pub created: Timestamp,
    pub last_updated: Option<LastUpdate>,
    pub approved: bool,
    pub solved_comments: u32,
    pub up_votes: BTreeMap<UserId, Timestamp>,
    pub down_votes: BTreeMap<UserId, Timestamp>,
    pub comments: Vec<CommentId>,
    pub attachments: BTreeSet<AttachmentId>,
}

impl DiscussionThreadMessage {
    pub fn new(
        id: MessageId,
        creator: UserId,
        parent_thread: ThreadId,
        content: Content,
        created: Timestamp,
    ) -> Self {
        Self {
            id,
            creator,
            parent_thread,
            content,
            created,
            last_updated: None,
            approved: true,
            solved_comments: 0,
            up_votes: BTreeMap::new(),
            down_votes: BTreeMap::new(),
            comments: Vec::new(),
            attachments: BTreeSet::new(),
        }
    }

    pub fn vote_state(&self, user: UserId) -> VoteState {
        if self.up_votes.contains_key(&user) {
            VoteState::Up
        } else if self.down_votes.contains_key(&user) {
            VoteState::Down
        } else {
            VoteState::None
        }
    }
}

/// MessageComment - a remark attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageComment {
    pub id: CommentId,
    pub parent_message: MessageId,
    pub creator: UserId,
    pub created: Timestamp,
    pub content: Content,
    pub solved: bool,
}

/// DiscussionTag - a label that can be attached to threads and categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionTag {
    pub id: TagId,
    pub name: String,
    pub ui_blob: Vec<u8>,
    pub threads: BTreeSet<ThreadId>,
    pub categories: BTreeSet<CategoryId>,
    pub message_count: u64,
    pub required_privileges: PrivilegeThresholds,
}

impl DiscussionTag {
    pub fn new(id: TagId, name: String) -> Self {
        Self {
            id,
            name,
            ui_blob: Vec::new(),
            threads: BTreeSet::new(),
            categories: BTreeSet::new(),
            message_count: 0,
            required_privileges: PrivilegeThresholds::default(),
        }
    }
}

/// DiscussionCategory - a hierarchical grouping of tags/threads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionCategory {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub display_order: u16,
    pub parent: Option<CategoryId>,
    pub children: BTreeSet<CategoryId>,
    /// Direct threads, each with its own pin-display-order within this category.
    pub direct_threads: BTreeMap<ThreadId, u16>,
    pub tags: BTreeSet<TagId>,
    pub message_count: u64,
    pub total_threads: u64,
    pub total_messages: u64,
    pub required_privileges: PrivilegeThresholds,
}

impl DiscussionCategory {
    pub fn new(id: CategoryId, name: String, parent: Option<CategoryId>) -> Self {
        Self {
            id,
            name,
            description: None,
            display_order: 0,
            parent,
            children: BTreeSet::new(),
            direct_threads: BTreeMap::new(),
            tags: BTreeSet::new(),
            message_count: 0,
            total_threads: 0,
            total_messages: 0,
            required_privileges: PrivilegeThresholds::default(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Attachment - a file, independent of any particular message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: AttachmentId,
    pub creator: UserId,
    pub name: String,
    pub size: u64,
    pub created: Timestamp,
    pub approved: bool,
    pub messages: BTreeSet<MessageId>,
}

impl Attachment {
    pub fn new(id: AttachmentId, creator: UserId, name: String, size: u64, created: Timestamp) -> Self {
        Self {
            id,
            creator,
            name,
            size,
            created,
            approved: false,
            messages: BTreeSet::new(),
        }
    }
}

/// PrivateMessage - a direct message between two users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateMessage {
    pub id: PrivateMessageId,
    pub source: UserId,
    pub destination: UserId,
    pub created: Timestamp,
    pub content: Content,
}
