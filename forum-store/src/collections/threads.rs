//! Discussion thread collection: primary id index plus the ranked views
//! thread-listing commands page over (by name, by latest activity, by
//! pin order within a category, by creator).

use crate::index::RankedIndex;
use forum_core::{DiscussionThread, EntityType, MessageId, StoreError, ThreadId, Timestamp, UserId};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ThreadCollection {
    by_id: HashMap<ThreadId, DiscussionThread>,
    by_name: RankedIndex<String, ThreadId>,
    by_latest_activity: RankedIndex<Timestamp, ThreadId>,
    by_pin_order: RankedIndex<u16, ThreadId>,
    by_creator: RankedIndex<UserId, ThreadId>,
    by_message_count: RankedIndex<usize, ThreadId>,
    by_latest_message_created: RankedIndex<Timestamp, ThreadId>,
}

impl ThreadCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn get(&self, id: ThreadId) -> Option<&DiscussionThread> {
        self.by_id.get(&id)
    }

    pub fn get_mut(&mut self, id: ThreadId) -> Option<&mut DiscussionThread> {
        self.by_id.get_mut(&id)
    }

    pub fn insert(&mut self, thread: DiscussionThread) {
        self.by_name.insert(thread.name.clone(), thread.id);
        self.by_latest_activity.insert(thread.latest_visible_change, thread.id);
        self.by_pin_order.insert(thread.pin_display_order, thread.id);
        self.by_creator.insert(thread.creator, thread.id);
        self.by_message_count.insert(thread.messages.len(), thread.id);
        self.by_latest_message_created.insert(thread.latest_message_created, thread.id);
        self.by_id.insert(thread.id, thread);
    }

    pub fn remove(&mut self, id: ThreadId) -> Option<DiscussionThread> {
        let thread = self.by_id.remove(&id)?;
        self.by_name.remove(&thread.name, id);
        self.by_latest_activity.remove(&thread.latest_visible_change, id);
        self.by_pin_order.remove(&thread.pin_display_order, id);
        self.by_creator.remove(&thread.creator, id);
        self.by_message_count.remove(&thread.messages.len(), id);
        self.by_latest_message_created.remove(&thread.latest_message_created, id);
        Some(thread)
    }

    pub fn rename(&mut self, id: ThreadId, new_name: String) -> Result<(), StoreError> {
        let old_name = self
            .by_id
            .get(&id)
            .ok_or(StoreError::NotFound { entity_type: EntityType::DiscussionThread, id: id.as_uuid() })?
            .name
            .clone();
        self.by_name.remove(&old_name, id);
        self.by_name.insert(new_name.clone(), id);
        self.by_id.get_mut(&id).unwrap().name = new_name;
        Ok(())
    }

    pub fn touch_activity(&mut self, id: ThreadId, at: Timestamp) {
        if let Some(thread) = self.by_id.get_mut(&id) {
            let old = thread.latest_visible_change;
            thread.latest_visible_change = at;
            self.by_latest_activity.remove(&old, id);
            self.by_latest_activity.insert(at, id);
        }
    }

    pub fn set_pin_order(&mut self, id: ThreadId, order: u16) {
        if let Some(thread) = self.by_id.get_mut(&id) {
            let old = thread.pin_display_order;
            thread.pin_display_order = order;
            self.by_pin_order.remove(&old, id);
            self.by_pin_order.insert(order, id);
        }
    }

    pub fn rank_by_latest_activity(&self, id: ThreadId, activity: Timestamp) -> Option<usize> {
        self.by_latest_activity.rank_of(&activity, id)
    }

    pub fn nth_by_latest_activity_descending(&self, n: usize) -> Option<ThreadId> {
        self.by_latest_activity.nth_descending(n).map(|(_, id)| *id)
    }

    pub fn nth_by_message_count_descending(&self, n: usize) -> Option<ThreadId> {
        self.by_message_count.nth_descending(n).map(|(_, id)| *id)
    }

    pub fn nth_by_latest_message_created_descending(&self, n: usize) -> Option<ThreadId> {
        self.by_latest_message_created.nth_descending(n).map(|(_, id)| *id)
    }

    pub fn by_creator(&self) -> &RankedIndex<UserId, ThreadId> {
        &self.by_creator
    }

    /// Append one message to a thread, maintaining message-count and
    /// latest-activity/latest-message-created ranked indices together
    /// (spec 4.1's `addDiscussionMessage` bump).
    pub fn push_message(&mut self, id: ThreadId, message: MessageId, at: Timestamp) {
        if let Some(thread) = self.by_id.get_mut(&id) {
            let old_count = thread.messages.len();
            thread.messages.push(message);
            let new_count = thread.messages.len();
            self.by_message_count.remove(&old_count, id);
            self.by_message_count.insert(new_count, id);

            let old_latest_message = thread.latest_message_created;
            thread.latest_message_created = at;
            self.by_latest_message_created.remove(&old_latest_message, id);
            self.by_latest_message_created.insert(at, id);

            let old_activity = thread.latest_visible_change;
            thread.latest_visible_change = at;
            self.by_latest_activity.remove(&old_activity, id);
            self.by_latest_activity.insert(at, id);
        }
    }

    /// Remove one message from a thread's member list, maintaining the
    /// message-count ranked index.
    pub fn remove_message(&mut self, id: ThreadId, message: MessageId) {
        if let Some(thread) = self.by_id.get_mut(&id) {
            let old_count = thread.messages.len();
            thread.messages.retain(|m| *m != message);
            let new_count = thread.messages.len();
            if new_count != old_count {
                self.by_message_count.remove(&old_count, id);
                self.by_message_count.insert(new_count, id);
            }
        }
    }

    /// Absorb another (already-detached) thread's messages and memberships
    /// into `id`, keeping every ranked index in sync (spec 4.3
    /// `merge_threads` scenario).
    pub fn absorb(&mut self, id: ThreadId, source: DiscussionThread) {
        if let Some(thread) = self.by_id.get_mut(&id) {
            let old_count = thread.messages.len();
            thread.messages.extend(source.messages);
            let new_count = thread.messages.len();
            thread.tags.extend(source.tags);
            thread.categories.extend(source.categories);
            thread.subscribed_users.extend(source.subscribed_users);
            let old_latest_message = thread.latest_message_created;
            thread.latest_message_created = thread.latest_message_created.max(source.latest_message_created);
            let new_latest_message = thread.latest_message_created;

            self.by_message_count.remove(&old_count, id);
            self.by_message_count.insert(new_count, id);
            if new_latest_message != old_latest_message {
                self.by_latest_message_created.remove(&old_latest_message, id);
                self.by_latest_message_created.insert(new_latest_message, id);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiscussionThread> {
        self.by_id.values()
    }
}
