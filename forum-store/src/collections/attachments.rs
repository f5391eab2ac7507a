//! Attachment collection: primary id index plus a ranked creation-time
//! view for unapproved-attachment review listings.

use crate::index::RankedIndex;
use forum_core::{Attachment, AttachmentId, Timestamp};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct AttachmentCollection {
    by_id: HashMap<AttachmentId, Attachment>,
    by_created: RankedIndex<Timestamp, AttachmentId>,
}

impl AttachmentCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn get(&self, id: AttachmentId) -> Option<&Attachment> {
        self.by_id.get(&id)
    }

    pub fn get_mut(&mut self, id: AttachmentId) -> Option<&mut Attachment> {
        self.by_id.get_mut(&id)
    }

    pub fn insert(&mut self, attachment: Attachment) {
        self.by_created.insert(attachment.created, attachment.id);
        self.by_id.insert(attachment.id, attachment);
    }

    pub fn remove(&mut self, id: AttachmentId) -> Option<Attachment> {
        let attachment = self.by_id.remove(&id)?;
        self.by_created.remove(&attachment.created, id);
        Some(attachment)
    }

    pub fn unapproved(&self) -> Vec<AttachmentId> {
        self.by_id
            .values()
            .filter(|a| !a.approved)
            .map(|a| a.id)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attachment> {
        self.by_id.values()
    }
}
