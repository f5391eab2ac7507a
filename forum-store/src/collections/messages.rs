//! Discussion thread message collection: primary id index plus the
//! `(thread, created)` ranked index that thread-page pagination reads.

use crate::index::RankedIndex;
use forum_core::{DiscussionThreadMessage, MessageId, ThreadId, Timestamp, UserId};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct MessageCollection {
    by_id: HashMap<MessageId, DiscussionThreadMessage>,
    /// Ranked by `(parent_thread, created)`, giving stable page ordering
    /// within a thread without a separate per-thread index structure.
    by_thread_created: RankedIndex<(ThreadId, Timestamp), MessageId>,
    by_creator: RankedIndex<UserId, MessageId>,
}

impl MessageCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn get(&self, id: MessageId) -> Option<&DiscussionThreadMessage> {
        self.by_id.get(&id)
    }

    pub fn get_mut(&mut self, id: MessageId) -> Option<&mut DiscussionThreadMessage> {
        self.by_id.get_mut(&id)
    }

    pub fn insert(&mut self, message: DiscussionThreadMessage) {
        self.by_thread_created
            .insert((message.parent_thread, message.created), message.id);
        self.by_creator.insert(message.creator, message.id);
        self.by_id.insert(message.id, message);
    }

    pub fn remove(&mut self, id: MessageId) -> Option<DiscussionThreadMessage> {
        let message = self.by_id.remove(&id)?;
        self.by_thread_created
            .remove(&(message.parent_thread, message.created), id);
        self.by_creator.remove(&message.creator, id);
        Some(message)
    }

    /// Move a message to a different thread, preserving its vote state
    /// (spec 9's resolved open question on `moveDiscussionThreadMessage`).
    pub fn reparent(&mut self, id: MessageId, new_thread: ThreadId) {
        let Some(message) = self.by_id.get_mut(&id) else { return };
        let old_key = (message.parent_thread, message.created);
        message.parent_thread = new_thread;
        let new_key = (new_thread, message.created);
        self.by_thread_created.remove(&old_key, id);
        self.by_thread_created.insert(new_key, id);
    }

    pub fn page_for_thread(&self, thread: ThreadId, offset: usize, limit: usize) -> Vec<MessageId> {
        self.by_thread_created
            .iter_ascending()
            .filter(|((t, _), _)| *t == thread)
            .skip(offset)
            .take(limit)
            .map(|(_, id)| *id)
            .collect()
    }

    pub fn count_for_thread(&self, thread: ThreadId) -> usize {
        self.by_thread_created
            .iter_ascending()
            .filter(|((t, _), _)| *t == thread)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiscussionThreadMessage> {
        self.by_id.values()
    }
}
