//! User collection: primary id index, unique name/auth-token indices and
//! the ranked views the user-listing commands page over.

use crate::collation::collation_key;
use crate::index::{RankedIndex, SortedVecIndex};
use forum_core::{MessageId, StoreError, ThreadId, Timestamp, User, UserId};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct UserCollection {
    by_id: HashMap<UserId, User>,
    /// Unique: collation key -> id (spec 3.3 invariant 8).
    by_collation_name: HashMap<String, UserId>,
    /// Unique: auth token -> id.
    by_auth_token: HashMap<String, UserId>,
    by_name: RankedIndex<String, UserId>,
    by_created: RankedIndex<Timestamp, UserId>,
    by_last_seen: RankedIndex<Timestamp, UserId>,
    /// Low-memory variant (spec 4.1): counts only change by one at a time
    /// and the table is small relative to `by_id`, so a sorted `Vec` beats
    /// a `BTreeSet` node per entry.
    by_thread_count: SortedVecIndex<usize, UserId>,
    by_message_count: SortedVecIndex<usize, UserId>,
}

impl UserCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn get(&self, id: UserId) -> Option<&User> {
        self.by_id.get(&id)
    }

    pub fn get_mut(&mut self, id: UserId) -> Option<&mut User> {
        self.by_id.get_mut(&id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<UserId> {
        self.by_collation_name.get(&collation_key(name)).copied()
    }

    pub fn find_by_auth_token(&self, token: &str) -> Option<UserId> {
        self.by_auth_token.get(token).copied()
    }

    pub fn name_taken(&self, name: &str) -> bool {
        self.by_collation_name.contains_key(&collation_key(name))
    }

    pub fn rank_by_name(&self, id: UserId, name: &str) -> Option<usize> {
        self.by_name.rank_of(&collation_key(name), id)
    }

    pub fn nth_by_created(&self, n: usize) -> Option<UserId> {
        self.by_created.nth_ascending(n).map(|(_, id)| *id)
    }

    pub fn nth_by_last_seen_descending(&self, n: usize) -> Option<UserId> {
        self.by_last_seen.nth_descending(n).map(|(_, id)| *id)
    }

    pub fn nth_by_name_ascending(&self, n: usize) -> Option<UserId> {
        self.by_name.nth_ascending(n).map(|(_, id)| *id)
    }

    pub fn nth_by_name_descending(&self, n: usize) -> Option<UserId> {
        self.by_name.nth_descending(n).map(|(_, id)| *id)
    }

    /// 0-based rank descending by owned-thread count (spec 4.1's
    /// `threadCount` listing).
    pub fn nth_by_thread_count_descending(&self, n: usize) -> Option<UserId> {
        let len = self.by_thread_count.len();
        if n >= len {
            return None;
        }
        self.by_thread_count.nth(len - 1 - n).map(|(_, id)| *id)
    }

    pub fn nth_by_message_count_descending(&self, n: usize) -> Option<UserId> {
        let len = self.by_message_count.len();
        if n >= len {
            return None;
        }
        self.by_message_count.nth(len - 1 - n).map(|(_, id)| *id)
    }

    pub fn insert(&mut self, user: User) -> Result<(), StoreError> {
        let key = collation_key(&user.name);
        if self.by_collation_name.contains_key(&key) {
            return Err(StoreError::IndexError {
                index_name: "users.by_collation_name".into(),
                reason: format!("name '{}' already taken", user.name),
            });
        }
        if let Some(token) = &user.auth_token {
            if self.by_auth_token.contains_key(token) {
                return Err(StoreError::IndexError {
                    index_name: "users.by_auth_token".into(),
                    reason: "auth token already in use".into(),
                });
            }
        }
        self.by_name.insert(user.name.clone(), user.id);
        self.by_created.insert(user.created, user.id);
        self.by_last_seen.insert(user.last_seen, user.id);
        self.by_thread_count.insert(user.own_threads.len(), user.id);
        self.by_message_count.insert(user.own_messages.len(), user.id);
        self.by_collation_name.insert(key, user.id);
        if let Some(token) = &user.auth_token {
            self.by_auth_token.insert(token.clone(), user.id);
        }
        self.by_id.insert(user.id, user);
        Ok(())
    }

    pub fn remove(&mut self, id: UserId) -> Option<User> {
        let user = self.by_id.remove(&id)?;
        self.by_name.remove(&user.name, id);
        self.by_created.remove(&user.created, id);
        self.by_last_seen.remove(&user.last_seen, id);
        self.by_thread_count.remove(&user.own_threads.len(), id);
        self.by_message_count.remove(&user.own_messages.len(), id);
        self.by_collation_name.remove(&collation_key(&user.name));
        if let Some(token) = &user.auth_token {
            self.by_auth_token.remove(token);
        }
        Some(user)
    }

    /// Append to `own_threads`, maintaining the ranked thread-count index.
    pub fn add_own_thread(&mut self, id: UserId, thread: ThreadId) {
        if let Some(user) = self.by_id.get_mut(&id) {
            let old = user.own_threads.len();
            user.own_threads.push(thread);
            let new = user.own_threads.len();
            self.by_thread_count.remove(&old, id);
            self.by_thread_count.insert(new, id);
        }
    }

    pub fn remove_own_thread(&mut self, id: UserId, thread: ThreadId) {
        if let Some(user) = self.by_id.get_mut(&id) {
            let old = user.own_threads.len();
            user.own_threads.retain(|t| *t != thread);
            let new = user.own_threads.len();
            if new != old {
                self.by_thread_count.remove(&old, id);
                self.by_thread_count.insert(new, id);
            }
        }
    }

    pub fn add_own_message(&mut self, id: UserId, message: MessageId) {
        if let Some(user) = self.by_id.get_mut(&id) {
            let old = user.own_messages.len();
            user.own_messages.push(message);
            let new = user.own_messages.len();
            self.by_message_count.remove(&old, id);
            self.by_message_count.insert(new, id);
        }
    }

    pub fn remove_own_message(&mut self, id: UserId, message: MessageId) {
        if let Some(user) = self.by_id.get_mut(&id) {
            let old = user.own_messages.len();
            user.own_messages.retain(|m| *m != message);
            let new = user.own_messages.len();
            if new != old {
                self.by_message_count.remove(&old, id);
                self.by_message_count.insert(new, id);
            }
        }
    }

    /// Rename a user, maintaining the unique collation index and the
    /// ranked name index (spec 4.1 invariant 1's prepare/commit bracket).
    pub fn rename(&mut self, id: UserId, new_name: String) -> Result<(), StoreError> {
        let new_key = collation_key(&new_name);
        if self.by_collation_name.get(&new_key).is_some_and(|&existing| existing != id) {
            return Err(StoreError::IndexError {
                index_name: "users.by_collation_name".into(),
                reason: format!("name '{}' already taken", new_name),
            });
        }
        let old_name = {
            let user = self
                .by_id
                .get(&id)
                .ok_or_else(|| StoreError::NotFound { entity_type: forum_core::EntityType::User, id: id.as_uuid() })?;
            user.name.clone()
        };
        let old_key = collation_key(&old_name);
        self.by_name.remove(&old_name, id);
        self.by_collation_name.remove(&old_key);
        self.by_name.insert(new_name.clone(), id);
        self.by_collation_name.insert(new_key, id);
        self.by_id.get_mut(&id).unwrap().name = new_name;
        Ok(())
    }

    pub fn touch_last_seen(&mut self, id: UserId, at: Timestamp) {
        if let Some(user) = self.by_id.get_mut(&id) {
            let old = user.last_seen;
            user.last_seen = at;
            self.by_last_seen.remove(&old, id);
            self.by_last_seen.insert(at, id);
        }
    }

    pub fn set_auth_token(&mut self, id: UserId, token: Option<String>) -> Result<(), StoreError> {
        if let Some(t) = &token {
            if self.by_auth_token.get(t).is_some_and(|&existing| existing != id) {
                return Err(StoreError::IndexError {
                    index_name: "users.by_auth_token".into(),
                    reason: "auth token already in use".into(),
                });
            }
        }
        let Some(user) = self.by_id.get_mut(&id) else {
            return Err(StoreError::NotFound { entity_type: forum_core::EntityType::User, id: id.as_uuid() });
        };
        if let Some(old) = user.auth_token.take() {
            self.by_auth_token.remove(&old);
        }
        if let Some(t) = &token {
            self.by_auth_token.insert(t.clone(), id);
        }
        user.auth_token = token;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &User> {
        self.by_id.values()
    }
}
