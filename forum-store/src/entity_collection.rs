//! `EntityCollection` - the full in-memory entity store: one typed
//! collection per entity kind, the runtime side tables, and the
//! cross-collection operations (cascade delete, merge, move, batch
//! insert) that touch more than one collection at once (spec 4.2, 4.3).

use crate::collections::{
    AttachmentCollection, CategoryCollection, CommentCollection, MessageCollection,
    PrivateMessageCollection, TagCollection, ThreadCollection, UserCollection,
};
use crate::runtime::{AttachmentRuntime, RuntimeTables, ThreadRuntime, UserRuntime};
use forum_core::{
    AttachmentId, CategoryId, CommentId, Content, DiscussionCategory, DiscussionTag,
    DiscussionThread, DiscussionThreadMessage, EntityType, MessageComment, MessageId,
    PrivateMessage, PrivateMessageId, StoreError, TagId, ThreadId, Timestamp, User, UserId,
};

/// The complete in-memory entity graph. Owned by one `ResourceGuard`;
/// every mutation here assumes the caller already holds the write half of
/// that guard.
#[derive(Debug, Default)]
pub struct EntityCollection {
    pub users: UserCollection,
    pub threads: ThreadCollection,
    pub messages: MessageCollection,
    pub comments: CommentCollection,
    pub tags: TagCollection,
    pub categories: CategoryCollection,
    pub attachments: AttachmentCollection,
    pub private_messages: PrivateMessageCollection,
    pub runtime: RuntimeTables,
    /// Set by `start_batch_insert`; while `true`, mutation paths that
    /// normally maintain every secondary index incrementally skip the
    /// expensive ones and rebuild them in bulk on `stop_batch_insert`
    /// (spec 4.2's bulk-load path).
    batch_insert_active: bool,
}

impl EntityCollection {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // batch insert
    // ------------------------------------------------------------------

    pub fn start_batch_insert(&mut self) {
        self.batch_insert_active = true;
    }

    /// Indices built incrementally (`RankedIndex`/`SortedVecIndex`
    /// insert-on-write) stay correct even under batch insert, so there is
    /// nothing to rebuild here today; this remains the single place that
    /// would grow a bulk-rebuild step if a future index is added that
    /// can't be maintained incrementally.
    pub fn stop_batch_insert(&mut self) {
        self.batch_insert_active = false;
    }

    pub fn is_batch_insert_active(&self) -> bool {
        self.batch_insert_active
    }

    pub fn guard_against_batch_insert(&self, op: &str) -> Result<(), StoreError> {
        if self.batch_insert_active {
            return Err(StoreError::BatchInsertActive { reason: op.to_string() });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // insertion (wires runtime side tables alongside the entity)
    // ------------------------------------------------------------------

    pub fn insert_user(&mut self, user: User) -> Result<(), StoreError> {
        let id = user.id;
        self.users.insert(user)?;
        self.runtime.users.insert(id, UserRuntime::new());
        Ok(())
    }

    pub fn insert_thread(&mut self, thread: DiscussionThread) {
        let id = thread.id;
        self.threads.insert(thread);
        self.runtime.threads.insert(id, ThreadRuntime::default());
    }

    pub fn insert_attachment(&mut self, attachment: Attachment_) {
        let id = attachment.id;
        self.attachments.insert(attachment);
        self.runtime.attachments.insert(id, AttachmentRuntime::default());
    }

    // ------------------------------------------------------------------
    // content pointer
    // ------------------------------------------------------------------

    /// Returns a cheaply clonable view of a message's content, used by the
    /// journal replay boundary to avoid copying large bodies (spec 9's
    /// `EntityPointer` design note).
    pub fn get_message_content_pointer(&self, id: MessageId) -> Option<Content> {
        self.messages.get(id).map(|m| m.content.clone())
    }

    // ------------------------------------------------------------------
    // cascade delete
    // ------------------------------------------------------------------

    /// Delete a user and everything that exists only because of them:
    /// their own threads and messages are cascade-deleted outright (spec
    /// 4.3 `cascade_delete` scenario), matching the original `deleteUser`'s
    /// ordering - own messages first (so a thread owned by someone else
    /// loses just that one message), then own threads (which cascades to
    /// delete any of their own remaining messages too), then the user
    /// record itself. Votes, subscriptions and private messages they
    /// sent/received are removed outright.
    pub fn cascade_delete_user(&mut self, id: UserId) -> Result<(), StoreError> {
        let Some(user) = self.users.remove(id) else {
            return Err(StoreError::NotFound { entity_type: EntityType::User, id: id.as_uuid() });
        };
        self.runtime.users.remove(&id);

        for message_id in &user.own_messages {
            let Some(parent_thread) = self.messages.get(*message_id).map(|m| m.parent_thread) else { continue };
            self.adjust_thread_message_count_delta(parent_thread, -1);
            self.cascade_delete_message_inner(*message_id);
            self.threads.remove_message(parent_thread, *message_id);
        }
        for thread_id in &user.own_threads {
            let _ = self.cascade_delete_thread(*thread_id);
        }
        for comment_id in &user.own_comments {
            if let Some(comment) = self.comments.remove(*comment_id) {
                if let Some(message) = self.messages.get_mut(comment.parent_message) {
                    message.comments.retain(|c| *c != comment.id);
                }
            }
        }

        for thread_id in self.threads.iter().map(|t| t.id).collect::<Vec<_>>() {
            if let Some(thread) = self.threads.get_mut(thread_id) {
                thread.subscribed_users.remove(&id);
                thread.visitors_since_last_edit.remove(&id);
            }
        }
        for message_id in self.messages.iter().map(|m| m.id).collect::<Vec<_>>() {
            if let Some(message) = self.messages.get_mut(message_id) {
                message.up_votes.remove(&id);
                message.down_votes.remove(&id);
            }
        }

        let pm_ids: Vec<PrivateMessageId> = self
            .private_messages
            .iter()
            .filter(|pm| pm.source == id || pm.destination == id)
            .map(|pm| pm.id)
            .collect();
        for pm_id in pm_ids {
            self.private_messages.remove(pm_id);
        }

        Ok(())
    }

    /// Delete a thread and everything addressable only through it: its
    /// messages, their comments, and the back-references held by tags,
    /// categories and authors (spec 4.3 `cascade_delete` scenario).
    pub fn cascade_delete_thread(&mut self, id: ThreadId) -> Result<(), StoreError> {
        let Some(thread) = self.threads.remove(id) else {
            return Err(StoreError::NotFound { entity_type: EntityType::DiscussionThread, id: id.as_uuid() });
        };
        self.runtime.threads.remove(&id);

        let msg_count = thread.messages.len() as i64;
        for message_id in &thread.messages {
            self.cascade_delete_message_inner(*message_id);
        }
        for tag_id in &thread.tags {
            self.tags.detach_thread(*tag_id, &id);
            self.tags.adjust_message_count(*tag_id, -msg_count);
        }
        for category_id in &thread.categories {
            if let Some(category) = self.categories.get_mut(*category_id) {
                category.direct_threads.remove(&id);
            }
            self.categories.adjust_message_count(*category_id, -msg_count);
        }
        self.users.remove_own_thread(thread.creator, id);
        for user_id in &thread.subscribed_users {
            if let Some(user) = self.users.get_mut(*user_id) {
                user.subscribed_threads.remove(&id);
            }
        }
        Ok(())
    }

    fn cascade_delete_message_inner(&mut self, id: MessageId) {
        let Some(message) = self.messages.remove(id) else { return };
        for comment_id in &message.comments {
            self.comments.remove(*comment_id);
        }
        self.users.remove_own_message(message.creator, id);
        for voter in message.up_votes.keys().chain(message.down_votes.keys()) {
            if let Some(user) = self.users.get_mut(*voter) {
                user.voted_messages.remove(&id);
            }
        }
        for attachment_id in &message.attachments {
            if let Some(attachment) = self.attachments.get_mut(*attachment_id) {
                attachment.messages.remove(&id);
            }
        }
    }

    /// Delete a single message without touching the rest of its thread
    /// (spec 4.3's single-message delete path; `cascade_delete_thread`
    /// uses the cheaper `cascade_delete_message_inner` directly since it
    /// already owns the whole thread).
    pub fn cascade_delete_message(&mut self, id: MessageId) -> Result<(), StoreError> {
        let Some(message) = self.messages.get(id) else {
            return Err(StoreError::NotFound { entity_type: EntityType::DiscussionThreadMessage, id: id.as_uuid() });
        };
        let parent_thread = message.parent_thread;
        self.adjust_thread_message_count_delta(parent_thread, -1);
        self.cascade_delete_message_inner(id);
        self.threads.remove_message(parent_thread, id);
        Ok(())
    }

    /// Propagate a thread's message-count change (`delta`, positive on
    /// add, negative on delete) to every tag and category the thread
    /// carries, maintaining the counter-consistency invariant (spec 3.3
    /// invariant 3: `tag.messageCount`/`category.messageCount` track the
    /// messages of every thread they're attached to).
    pub fn adjust_thread_message_count_delta(&mut self, thread: ThreadId, delta: i64) {
        let Some(t) = self.threads.get(thread) else { return };
        let tags: Vec<TagId> = t.tags.iter().copied().collect();
        let categories: Vec<CategoryId> = t.categories.iter().copied().collect();
        for tag_id in tags {
            self.tags.adjust_message_count(tag_id, delta);
        }
        for category_id in categories {
            self.categories.adjust_message_count(category_id, delta);
        }
    }

    // ------------------------------------------------------------------
    // merge / move
    // ------------------------------------------------------------------

    /// Merge `source` into `destination`: every message moves over
    /// (preserving order and votes), tag/category memberships union, and
    /// `source` is deleted (spec 4.3 `merge_threads` scenario). Tag/category
    /// message counts are adjusted by ±`source`'s message count (spec
    /// 4.3's "adjusts tag/category message counts by ±|from.messages|"):
    /// a tag/category common to both nets to zero, since the total message
    /// count under it didn't actually change.
    pub fn merge_discussion_threads(
        &mut self,
        destination: ThreadId,
        source: ThreadId,
    ) -> Result<(), StoreError> {
        if destination == source {
            return Err(StoreError::IndexError {
                index_name: "threads".into(),
                reason: "cannot merge a thread into itself".into(),
            });
        }
        let (dest_tags_before, dest_categories_before) = {
            let dest = self
                .threads
                .get(destination)
                .ok_or(StoreError::NotFound { entity_type: EntityType::DiscussionThread, id: destination.as_uuid() })?;
            (dest.tags.clone(), dest.categories.clone())
        };
        let source_thread = self
            .threads
            .remove(source)
            .ok_or(StoreError::NotFound { entity_type: EntityType::DiscussionThread, id: source.as_uuid() })?;
        self.runtime.threads.remove(&source);
        let msg_count = source_thread.messages.len() as i64;

        for message_id in &source_thread.messages {
            self.messages.reparent(*message_id, destination);
        }
        for tag_id in &source_thread.tags {
            self.tags.detach_thread(*tag_id, &source);
            self.tags.attach_thread(*tag_id, destination);
            self.tags.adjust_message_count(*tag_id, -msg_count);
        }
        for tag_id in &dest_tags_before {
            self.tags.adjust_message_count(*tag_id, msg_count);
        }
        for category_id in &source_thread.categories {
            if let Some(category) = self.categories.get_mut(*category_id) {
                if let Some(pin_order) = category.direct_threads.remove(&source) {
                    category.direct_threads.insert(destination, pin_order);
                }
            }
            self.categories.adjust_message_count(*category_id, -msg_count);
        }
        for category_id in &dest_categories_before {
            self.categories.adjust_message_count(*category_id, msg_count);
        }
        for user_id in &source_thread.subscribed_users {
            if let Some(user) = self.users.get_mut(*user_id) {
                user.subscribed_threads.remove(&source);
                user.subscribed_threads.insert(destination);
            }
        }

        self.threads.absorb(destination, source_thread);
        Ok(())
    }

    /// Merge `source` tag into `destination`: every thread/category that
    /// referenced `source` now references `destination` instead, message
    /// counts add up, and `source` is deleted.
    pub fn merge_discussion_tags(
        &mut self,
        destination: TagId,
        source: TagId,
    ) -> Result<(), StoreError> {
        if destination == source {
            return Err(StoreError::IndexError {
                index_name: "tags".into(),
                reason: "cannot merge a tag into itself".into(),
            });
        }
        let source_tag = self
            .tags
            .remove(source)
            .ok_or(StoreError::NotFound { entity_type: EntityType::DiscussionTag, id: source.as_uuid() })?;

        for thread_id in &source_tag.threads {
            if let Some(thread) = self.threads.get_mut(*thread_id) {
                thread.tags.remove(&source);
                thread.tags.insert(destination);
            }
        }
        for category_id in &source_tag.categories {
            if let Some(category) = self.categories.get_mut(*category_id) {
                category.tags.remove(&source);
                category.tags.insert(destination);
            }
        }

        if self.tags.get(destination).is_none() {
            return Err(StoreError::NotFound { entity_type: EntityType::DiscussionTag, id: destination.as_uuid() });
        }
        for thread_id in &source_tag.threads {
            self.tags.attach_thread(destination, *thread_id);
        }
        self.tags.extend_categories(destination, source_tag.categories);
        self.tags.adjust_message_count(destination, source_tag.message_count as i64);
        Ok(())
    }

    /// Move a message to a different thread, preserving its votes and
    /// comments (spec 9's resolved open question).
    pub fn move_discussion_thread_message(
        &mut self,
        message: MessageId,
        new_thread: ThreadId,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        let old_thread = self
            .messages
            .get(message)
            .ok_or(StoreError::NotFound { entity_type: EntityType::DiscussionThreadMessage, id: message.as_uuid() })?
            .parent_thread;
        if old_thread == new_thread {
            return Ok(());
        }
        if self.threads.get(new_thread).is_none() {
            return Err(StoreError::NotFound { entity_type: EntityType::DiscussionThread, id: new_thread.as_uuid() });
        }
        self.messages.reparent(message, new_thread);
        self.threads.remove_message(old_thread, message);
        self.threads.push_message(new_thread, message, now);
        self.adjust_thread_message_count_delta(old_thread, -1);
        self.adjust_thread_message_count_delta(new_thread, 1);
        Ok(())
    }

    /// Reject a category reparent that would introduce a cycle (spec 4.3
    /// invariant 3 / `reparent_cycle_rejected` scenario): `new_parent`
    /// must not be `id` itself or any descendant of `id`.
    pub fn would_create_category_cycle(&self, id: CategoryId, new_parent: CategoryId) -> bool {
        if id == new_parent {
            return true;
        }
        let mut frontier = vec![id];
        while let Some(current) = frontier.pop() {
            let children = self.categories.children_of(Some(current));
            if children.contains(&new_parent) {
                return true;
            }
            frontier.extend(children);
        }
        false
    }
}

// `Attachment` already exists in forum-core; this local alias keeps
// `insert_attachment`'s signature readable without a second use-path.
type Attachment_ = forum_core::Attachment;

#[cfg(test)]
mod tests {
    use super::*;
    use forum_core::{now, VisitDetails};

    fn new_user(name: &str) -> User {
        User::new(UserId::new_v7(), name.to_string(), now(), VisitDetails::anonymous())
    }

    #[test]
    fn cascade_delete_user_deletes_own_threads_and_messages() {
        let mut store = EntityCollection::new();
        let user = new_user("alice");
        let user_id = user.id;
        store.insert_user(user).unwrap();

        let thread = DiscussionThread::new(ThreadId::new_v7(), user_id, "t".into(), now());
        let thread_id = thread.id;
        store.insert_thread(thread);
        store.users.get_mut(user_id).unwrap().own_threads.push(thread_id);

        let message = DiscussionThreadMessage::new(
            MessageId::new_v7(),
            user_id,
            thread_id,
            Content::from("hi"),
            now(),
        );
        let message_id = message.id;
        store.threads.push_message(thread_id, message_id, now());
        store.messages.insert(message);
        store.users.get_mut(user_id).unwrap().own_messages.push(message_id);

        store.cascade_delete_user(user_id).unwrap();

        assert!(store.users.get(user_id).is_none());
        assert!(store.threads.get(thread_id).is_none());
        assert!(store.messages.get(message_id).is_none());
    }

    #[test]
    fn category_cycle_detection() {
        let mut store = EntityCollection::new();
        let root = DiscussionCategory::new(CategoryId::new_v7(), "root".into(), None);
        let root_id = root.id;
        store.categories.insert(root).unwrap();
        let child = DiscussionCategory::new(CategoryId::new_v7(), "child".into(), Some(root_id));
        let child_id = child.id;
        store.categories.insert(child).unwrap();

        assert!(store.would_create_category_cycle(root_id, child_id));
        assert!(!store.would_create_category_cycle(child_id, root_id));
    }

    #[test]
    fn merge_discussion_threads_moves_messages() {
        let mut store = EntityCollection::new();
        let user = new_user("bob");
        let user_id = user.id;
        store.insert_user(user).unwrap();

        let dest = DiscussionThread::new(ThreadId::new_v7(), user_id, "dest".into(), now());
        let dest_id = dest.id;
        store.insert_thread(dest);

        let mut src = DiscussionThread::new(ThreadId::new_v7(), user_id, "src".into(), now());
        let message = DiscussionThreadMessage::new(
            MessageId::new_v7(),
            user_id,
            src.id,
            Content::from("hi"),
            now(),
        );
        let message_id = message.id;
        src.messages.push(message_id);
        let src_id = src.id;
        store.insert_thread(src);
        store.messages.insert(message);

        store.merge_discussion_threads(dest_id, src_id).unwrap();

        assert!(store.threads.get(src_id).is_none());
        assert_eq!(store.messages.get(message_id).unwrap().parent_thread, dest_id);
        assert!(store.threads.get(dest_id).unwrap().messages.contains(&message_id));
    }
}
