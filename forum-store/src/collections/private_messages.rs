//! Private message collection: primary id index plus ranked inbox/outbox
//! views keyed by `(user, created)`.

use crate::index::RankedIndex;
use forum_core::{PrivateMessage, PrivateMessageId, Timestamp, UserId};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct PrivateMessageCollection {
    by_id: HashMap<PrivateMessageId, PrivateMessage>,
    by_destination_created: RankedIndex<(UserId, Timestamp), PrivateMessageId>,
    by_source_created: RankedIndex<(UserId, Timestamp), PrivateMessageId>,
}

impl PrivateMessageCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn get(&self, id: PrivateMessageId) -> Option<&PrivateMessage> {
        self.by_id.get(&id)
    }

    pub fn insert(&mut self, message: PrivateMessage) {
        self.by_destination_created
            .insert((message.destination, message.created), message.id);
        self.by_source_created
            .insert((message.source, message.created), message.id);
        self.by_id.insert(message.id, message);
    }

    pub fn remove(&mut self, id: PrivateMessageId) -> Option<PrivateMessage> {
        let message = self.by_id.remove(&id)?;
        self.by_destination_created
            .remove(&(message.destination, message.created), id);
        self.by_source_created
            .remove(&(message.source, message.created), id);
        Some(message)
    }

    pub fn inbox(&self, user: UserId, offset: usize, limit: usize) -> Vec<PrivateMessageId> {
        self.by_destination_created
            .iter_descending()
            .filter(|((u, _), _)| *u == user)
            .skip(offset)
            .take(limit)
            .map(|(_, id)| *id)
            .collect()
    }

    pub fn outbox(&self, user: UserId, offset: usize, limit: usize) -> Vec<PrivateMessageId> {
        self.by_source_created
            .iter_descending()
            .filter(|((u, _), _)| *u == user)
            .skip(offset)
            .take(limit)
            .map(|(_, id)| *id)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PrivateMessage> {
        self.by_id.values()
    }
}
