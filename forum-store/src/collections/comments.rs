//! Message comment collection: primary id index plus the `(message,
//! created)` ranked index comment pagination reads.

use crate::index::RankedIndex;
use forum_core::{CommentId, MessageComment, MessageId, Timestamp};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct CommentCollection {
    by_id: HashMap<CommentId, MessageComment>,
    by_message_created: RankedIndex<(MessageId, Timestamp), CommentId>,
}

impl CommentCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn get(&self, id: CommentId) -> Option<&MessageComment> {
        self.by_id.get(&id)
    }

    pub fn get_mut(&mut self, id: CommentId) -> Option<&mut MessageComment> {
        self.by_id.get_mut(&id)
    }

    pub fn insert(&mut self, comment: MessageComment) {
        self.by_message_created
            .insert((comment.parent_message, comment.created), comment.id);
        self.by_id.insert(comment.id, comment);
    }

    pub fn remove(&mut self, id: CommentId) -> Option<MessageComment> {
        let comment = self.by_id.remove(&id)?;
        self.by_message_created
            .remove(&(comment.parent_message, comment.created), id);
        Some(comment)
    }

    pub fn for_message(&self, message: MessageId) -> Vec<CommentId> {
        self.by_message_created
            .iter_ascending()
            .filter(|((m, _), _)| *m == message)
            .map(|(_, id)| *id)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MessageComment> {
        self.by_id.values()
    }
}
