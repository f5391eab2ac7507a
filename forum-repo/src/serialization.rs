//! Per-viewer entity serialization: which fields of a `DiscussionThreadMessage`/
//! `User`/etc. end up in the JSON a given requester receives depends on
//! what they're authorized to see (spec 4.4/4.7). Grounded on
//! `AuthorizationGrantedPrivilegeStore.h`'s `SerializationRestriction`.

use forum_authz::Authorization;
use forum_core::{
    Attachment, DiscussionCategory, DiscussionTag, DiscussionThread, DiscussionThreadMessage,
    MessageComment, Privilege, Timestamp, User, UserId,
};
use forum_store::EntityCollection;
use serde_json::{json, Value};

/// Bundles everything a `Serializable` impl needs to decide per-field
/// visibility: who's asking, when, and what they're authorized to see.
pub struct SerializationRestriction<'a> {
    pub authorization: &'a Authorization,
    pub entities: &'a EntityCollection,
    pub config: &'a forum_core::ForumConfig,
    pub user: UserId,
    pub now: Timestamp,
}

impl<'a> SerializationRestriction<'a> {
    fn allowed_on_thread(&self, thread: forum_core::ThreadId, privilege: Privilege) -> bool {
        self.authorization
            .can_do_on_thread(self.entities, self.config, self.user, thread, privilege, self.now)
            == forum_core::AuthorizationStatus::Ok
    }

    fn allowed_on_message(&self, message: forum_core::MessageId, privilege: Privilege) -> bool {
        self.authorization
            .can_do_on_message(self.entities, self.config, self.user, message, privilege, self.now)
            == forum_core::AuthorizationStatus::Ok
    }

    pub fn can_view_message_votes(&self, message: &DiscussionThreadMessage) -> bool {
        self.allowed_on_message(message.id, Privilege::ViewVotes)
    }

    pub fn can_view_message_creator(&self, message: &DiscussionThreadMessage) -> bool {
        self.allowed_on_message(message.id, Privilege::ViewCreatorUser)
    }

    pub fn can_view_message_edit_history(&self, message: &DiscussionThreadMessage) -> bool {
        self.allowed_on_message(message.id, Privilege::ViewIpAddress)
    }

    pub fn can_view_message_comments(&self, message: &DiscussionThreadMessage) -> bool {
        self.allowed_on_message(message.id, Privilege::GetMessageComments)
    }

    pub fn can_view_unapproved_message(&self, message: &DiscussionThreadMessage) -> bool {
        self.authorization
            .can_view_unapproved_message(self.entities, self.user, message.id, self.now)
    }
}

/// A type that knows how to render itself to JSON for a given viewer.
pub trait Serializable {
    fn to_json(&self, restriction: &SerializationRestriction<'_>) -> Value;
}

impl Serializable for User {
    fn to_json(&self, _restriction: &SerializationRestriction<'_>) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "info": self.info,
            "title": self.title,
            "signature": self.signature,
            "created": self.created,
            "lastSeen": self.last_seen,
            "upVotesReceived": self.up_votes_received,
            "downVotesReceived": self.down_votes_received,
            "threadCount": self.thread_count(),
            "messageCount": self.message_count(),
        })
    }
}

impl Serializable for DiscussionThread {
    fn to_json(&self, _restriction: &SerializationRestriction<'_>) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "createdBy": self.creator,
            "created": self.created,
            "latestVisibleChange": self.latest_visible_change,
            "pinDisplayOrder": self.pin_display_order,
            "approved": self.approved,
            "messageCount": self.message_count(),
            "tags": self.tags,
            "categories": self.categories,
        })
    }
}

impl Serializable for DiscussionThreadMessage {
    fn to_json(&self, restriction: &SerializationRestriction<'_>) -> Value {
        let mut value = json!({
            "id": self.id,
            "parentThread": self.parent_thread,
            "content": self.content.as_str(),
            "created": self.created,
            "approved": self.approved,
            "solvedCommentCount": self.solved_comments,
        });
        let obj = value.as_object_mut().expect("object literal");
        if restriction.can_view_message_creator(self) {
            obj.insert("createdBy".into(), json!(self.creator));
        }
        if restriction.can_view_message_votes(self) {
            obj.insert("upVotes".into(), json!(self.up_votes.len()));
            obj.insert("downVotes".into(), json!(self.down_votes.len()));
        }
        if restriction.can_view_message_edit_history(self) {
            obj.insert("lastUpdated".into(), json!(self.last_updated));
        }
        if restriction.can_view_message_comments(self) {
            obj.insert("commentCount".into(), json!(self.comments.len()));
        }
        value
    }
}

impl Serializable for MessageComment {
    fn to_json(&self, _restriction: &SerializationRestriction<'_>) -> Value {
        json!({
            "id": self.id,
            "parentMessage": self.parent_message,
            "createdBy": self.creator,
            "created": self.created,
            "content": self.content.as_str(),
            "solved": self.solved,
        })
    }
}

impl Serializable for DiscussionTag {
    fn to_json(&self, _restriction: &SerializationRestriction<'_>) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "threadCount": self.threads.len(),
            "messageCount": self.message_count,
        })
    }
}

impl Serializable for DiscussionCategory {
    fn to_json(&self, _restriction: &SerializationRestriction<'_>) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "description": self.description,
            "displayOrder": self.display_order,
            "parent": self.parent,
            "threadCount": self.direct_threads.len(),
            "messageCount": self.message_count,
            "totalThreads": self.total_threads,
            "totalMessages": self.total_messages,
        })
    }
}

impl Serializable for Attachment {
    fn to_json(&self, _restriction: &SerializationRestriction<'_>) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "size": self.size,
            "createdBy": self.creator,
            "created": self.created,
            "approved": self.approved,
        })
    }
}
