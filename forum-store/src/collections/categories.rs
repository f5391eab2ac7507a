//! Discussion category collection: primary id index, a per-parent unique
//! name constraint and the ranked display-order view used when listing a
//! category's children.

use crate::collation::collation_key;
use crate::index::RankedIndex;
use forum_core::{CategoryId, DiscussionCategory, EntityType, StoreError};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct CategoryCollection {
    by_id: HashMap<CategoryId, DiscussionCategory>,
    /// Unique within a parent (spec 3.6 invariant): `(parent, collation
    /// key)` -> id. The root level uses `parent = None`.
    by_parent_and_name: HashMap<(Option<CategoryId>, String), CategoryId>,
    by_parent_display_order: RankedIndex<(Option<CategoryId>, u16), CategoryId>,
    by_message_count: RankedIndex<usize, CategoryId>,
    /// `(is_non_root, display_order)`: roots (`parent == None`, `false`)
    /// sort before non-roots while preserving display order within each
    /// group (spec 3.6/4.1's `displayOrderRootPriority`).
    by_root_priority: RankedIndex<(bool, u16), CategoryId>,
}

impl CategoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn get(&self, id: CategoryId) -> Option<&DiscussionCategory> {
        self.by_id.get(&id)
    }

    pub fn get_mut(&mut self, id: CategoryId) -> Option<&mut DiscussionCategory> {
        self.by_id.get_mut(&id)
    }

    pub fn name_taken_under(&self, parent: Option<CategoryId>, name: &str) -> bool {
        self.by_parent_and_name
            .contains_key(&(parent, collation_key(name)))
    }

    pub fn children_of(&self, parent: Option<CategoryId>) -> Vec<CategoryId> {
        self.by_parent_display_order
            .iter_ascending()
            .filter(|((p, _), _)| *p == parent)
            .map(|(_, id)| *id)
            .collect()
    }

    pub fn insert(&mut self, category: DiscussionCategory) -> Result<(), StoreError> {
        let key = (category.parent, collation_key(&category.name));
        if self.by_parent_and_name.contains_key(&key) {
            return Err(StoreError::IndexError {
                index_name: "categories.by_parent_and_name".into(),
                reason: format!("name '{}' already taken under this parent", category.name),
            });
        }
        self.by_parent_display_order
            .insert((category.parent, category.display_order), category.id);
        self.by_root_priority
            .insert((category.parent.is_some(), category.display_order), category.id);
        self.by_message_count.insert(category.message_count as usize, category.id);
        self.by_parent_and_name.insert(key, category.id);
        if let Some(parent) = category.parent {
            if let Some(parent_category) = self.by_id.get_mut(&parent) {
                parent_category.children.insert(category.id);
            }
        }
        self.by_id.insert(category.id, category);
        Ok(())
    }

    pub fn remove(&mut self, id: CategoryId) -> Option<DiscussionCategory> {
        let category = self.by_id.remove(&id)?;
        self.by_parent_display_order
            .remove(&(category.parent, category.display_order), id);
        self.by_root_priority
            .remove(&(category.parent.is_some(), category.display_order), id);
        self.by_message_count.remove(&(category.message_count as usize), id);
        self.by_parent_and_name
            .remove(&(category.parent, collation_key(&category.name)));
        if let Some(parent) = category.parent {
            if let Some(parent_category) = self.by_id.get_mut(&parent) {
                parent_category.children.remove(&id);
            }
        }
        Some(category)
    }

    pub fn rename(&mut self, id: CategoryId, new_name: String) -> Result<(), StoreError> {
        let (parent, old_name) = {
            let c = self
                .by_id
                .get(&id)
                .ok_or(StoreError::NotFound { entity_type: EntityType::DiscussionCategory, id: id.as_uuid() })?;
            (c.parent, c.name.clone())
        };
        let new_key = (parent, collation_key(&new_name));
        if self.by_parent_and_name.get(&new_key).is_some_and(|&existing| existing != id) {
            return Err(StoreError::IndexError {
                index_name: "categories.by_parent_and_name".into(),
                reason: format!("name '{}' already taken under this parent", new_name),
            });
        }
        self.by_parent_and_name.remove(&(parent, collation_key(&old_name)));
        self.by_parent_and_name.insert(new_key, id);
        self.by_id.get_mut(&id).unwrap().name = new_name;
        Ok(())
    }

    /// Reparent a category, maintaining both the per-parent name
    /// uniqueness index and the display-order index. Callers must check
    /// for cycles before calling this (spec 4.3 invariant 3 /
    /// `reparent_cycle_rejected` scenario) - this method trusts its input.
    pub fn reparent(
        &mut self,
        id: CategoryId,
        new_parent: Option<CategoryId>,
    ) -> Result<(), StoreError> {
        let (old_parent, name, display_order) = {
            let c = self
                .by_id
                .get(&id)
                .ok_or(StoreError::NotFound { entity_type: EntityType::DiscussionCategory, id: id.as_uuid() })?;
            (c.parent, c.name.clone(), c.display_order)
        };
        let key = collation_key(&name);
        if self.by_parent_and_name.contains_key(&(new_parent, key.clone())) {
            return Err(StoreError::IndexError {
                index_name: "categories.by_parent_and_name".into(),
                reason: format!("name '{}' already taken under new parent", name),
            });
        }
        self.by_parent_and_name.remove(&(old_parent, key.clone()));
        self.by_parent_and_name.insert((new_parent, key), id);
        self.by_parent_display_order
            .remove(&(old_parent, display_order), id);
        self.by_parent_display_order
            .insert((new_parent, display_order), id);
        self.by_root_priority.remove(&(old_parent.is_some(), display_order), id);
        self.by_root_priority.insert((new_parent.is_some(), display_order), id);
        if let Some(old) = old_parent {
            if let Some(old_category) = self.by_id.get_mut(&old) {
                old_category.children.remove(&id);
            }
        }
        if let Some(new) = new_parent {
            if let Some(new_category) = self.by_id.get_mut(&new) {
                new_category.children.insert(id);
            }
        }
        self.by_id.get_mut(&id).unwrap().parent = new_parent;
        Ok(())
    }

    pub fn set_display_order(&mut self, id: CategoryId, order: u16) {
        let Some(category) = self.by_id.get_mut(&id) else { return };
        let old = category.display_order;
        let parent = category.parent;
        category.display_order = order;
        self.by_parent_display_order.remove(&(parent, old), id);
        self.by_parent_display_order.insert((parent, order), id);
        self.by_root_priority.remove(&(parent.is_some(), old), id);
        self.by_root_priority.insert((parent.is_some(), order), id);
    }

    /// Apply `delta` to `message_count` (saturating at zero), maintaining
    /// the ranked message-count index (spec 3.3 invariant 3).
    pub fn adjust_message_count(&mut self, id: CategoryId, delta: i64) {
        if let Some(category) = self.by_id.get_mut(&id) {
            let old = category.message_count as usize;
            category.message_count = (category.message_count as i64 + delta).max(0) as u64;
            let new = category.message_count as usize;
            if new != old {
                self.by_message_count.remove(&old, id);
                self.by_message_count.insert(new, id);
            }
        }
    }

    pub fn nth_by_message_count_descending(&self, n: usize) -> Option<CategoryId> {
        self.by_message_count.nth_descending(n).map(|(_, id)| *id)
    }

    /// 0-based rank ascending by root-priority key: every root category
    /// (in display order), then every non-root category (in display
    /// order).
    pub fn nth_by_root_priority_ascending(&self, n: usize) -> Option<CategoryId> {
        self.by_root_priority.nth_ascending(n).map(|(_, id)| *id)
    }

    pub fn nth_by_root_priority_descending(&self, n: usize) -> Option<CategoryId> {
        self.by_root_priority.nth_descending(n).map(|(_, id)| *id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiscussionCategory> {
        self.by_id.values()
    }
}
