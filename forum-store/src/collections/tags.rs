//! Discussion tag collection: primary id index, a unique collation-aware
//! name index and the ranked name view tag listings page over.

use crate::collation::collation_key;
use crate::index::{RankedIndex, SortedVecIndex};
use forum_core::{CategoryId, DiscussionTag, EntityType, StoreError, TagId, ThreadId};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Default)]
pub struct TagCollection {
    by_id: HashMap<TagId, DiscussionTag>,
    by_collation_name: HashMap<String, TagId>,
    by_name: RankedIndex<String, TagId>,
    /// Low-memory variant (spec 4.1): small table, single-step deltas.
    by_thread_count: SortedVecIndex<usize, TagId>,
    by_message_count: SortedVecIndex<usize, TagId>,
}

impl TagCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn get(&self, id: TagId) -> Option<&DiscussionTag> {
        self.by_id.get(&id)
    }

    pub fn get_mut(&mut self, id: TagId) -> Option<&mut DiscussionTag> {
        self.by_id.get_mut(&id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<TagId> {
        self.by_collation_name.get(&collation_key(name)).copied()
    }

    pub fn name_taken(&self, name: &str) -> bool {
        self.by_collation_name.contains_key(&collation_key(name))
    }

    pub fn insert(&mut self, tag: DiscussionTag) -> Result<(), StoreError> {
        let key = collation_key(&tag.name);
        if self.by_collation_name.contains_key(&key) {
            return Err(StoreError::IndexError {
                index_name: "tags.by_collation_name".into(),
                reason: format!("name '{}' already taken", tag.name),
            });
        }
        self.by_name.insert(tag.name.clone(), tag.id);
        self.by_thread_count.insert(tag.threads.len(), tag.id);
        self.by_message_count.insert(tag.message_count as usize, tag.id);
        self.by_collation_name.insert(key, tag.id);
        self.by_id.insert(tag.id, tag);
        Ok(())
    }

    pub fn remove(&mut self, id: TagId) -> Option<DiscussionTag> {
        let tag = self.by_id.remove(&id)?;
        self.by_name.remove(&tag.name, id);
        self.by_thread_count.remove(&tag.threads.len(), id);
        self.by_message_count.remove(&(tag.message_count as usize), id);
        self.by_collation_name.remove(&collation_key(&tag.name));
        Some(tag)
    }

    /// 0-based rank descending by attached-thread count (spec 4.1
    /// `threadCount` listing).
    pub fn nth_by_thread_count_descending(&self, n: usize) -> Option<TagId> {
        let len = self.by_thread_count.len();
        if n >= len {
            return None;
        }
        self.by_thread_count.nth(len - 1 - n).map(|(_, id)| *id)
    }

    pub fn nth_by_message_count_descending(&self, n: usize) -> Option<TagId> {
        let len = self.by_message_count.len();
        if n >= len {
            return None;
        }
        self.by_message_count.nth(len - 1 - n).map(|(_, id)| *id)
    }

    pub fn nth_by_name_ascending(&self, n: usize) -> Option<TagId> {
        self.by_name.nth_ascending(n).map(|(_, id)| *id)
    }

    pub fn nth_by_name_descending(&self, n: usize) -> Option<TagId> {
        self.by_name.nth_descending(n).map(|(_, id)| *id)
    }

    /// Attach a thread to this tag, maintaining the ranked thread-count
    /// index; a no-op if already attached.
    pub fn attach_thread(&mut self, id: TagId, thread: ThreadId) {
        if let Some(tag) = self.by_id.get_mut(&id) {
            let old = tag.threads.len();
            tag.threads.insert(thread);
            let new = tag.threads.len();
            if new != old {
                self.by_thread_count.remove(&old, id);
                self.by_thread_count.insert(new, id);
            }
        }
    }

    pub fn detach_thread(&mut self, id: TagId, thread: &ThreadId) {
        if let Some(tag) = self.by_id.get_mut(&id) {
            let old = tag.threads.len();
            tag.threads.remove(thread);
            let new = tag.threads.len();
            if new != old {
                self.by_thread_count.remove(&old, id);
                self.by_thread_count.insert(new, id);
            }
        }
    }

    /// Apply `delta` to `message_count` (saturating at zero), maintaining
    /// the ranked message-count index (spec 3.3 invariant 3).
    pub fn adjust_message_count(&mut self, id: TagId, delta: i64) {
        if let Some(tag) = self.by_id.get_mut(&id) {
            let old = tag.message_count as usize;
            tag.message_count = (tag.message_count as i64 + delta).max(0) as u64;
            let new = tag.message_count as usize;
            if new != old {
                self.by_message_count.remove(&old, id);
                self.by_message_count.insert(new, id);
            }
        }
    }

    pub fn extend_categories(&mut self, id: TagId, categories: BTreeSet<CategoryId>) {
        if let Some(tag) = self.by_id.get_mut(&id) {
            tag.categories.extend(categories);
        }
    }

    pub fn rename(&mut self, id: TagId, new_name: String) -> Result<(), StoreError> {
        let new_key = collation_key(&new_name);
        if self.by_collation_name.get(&new_key).is_some_and(|&existing| existing != id) {
            return Err(StoreError::IndexError {
                index_name: "tags.by_collation_name".into(),
                reason: format!("name '{}' already taken", new_name),
            });
        }
        let old_name = self
            .by_id
            .get(&id)
            .ok_or(StoreError::NotFound { entity_type: EntityType::DiscussionTag, id: id.as_uuid() })?
            .name
            .clone();
        self.by_name.remove(&old_name, id);
        self.by_collation_name.remove(&collation_key(&old_name));
        self.by_name.insert(new_name.clone(), id);
        self.by_collation_name.insert(new_key, id);
        self.by_id.get_mut(&id).unwrap().name = new_name;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiscussionTag> {
        self.by_id.values()
    }
}
