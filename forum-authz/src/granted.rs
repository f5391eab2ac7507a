//! Granted-privilege store and the resolution algorithm that walks the
//! scope chain (message -> thread -> tags -> forum-wide, category ->
//! ancestors -> forum-wide) to decide whether a user's granted privileges
//! clear an entity's required threshold.
//!
//! Grounded on `AuthorizationGrantedPrivilegeStore.{h,cpp}`: five
//! independent grant collections (one per scope kind), each a multimap
//! keyed by `(user, entity)`, plus a by-user and by-entity index for
//! enumeration. `calculate_privilege` reproduces the original's
//! max-positive/min-negative accumulation exactly, including the
//! anonymous-user short-circuit and the logged-in-user default floor.

use forum_core::{PrivilegeDuration, PrivilegeValue, Timestamp, UserId};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// The anonymous/empty user id never accrues specific grants - spec 4.4's
/// "forum-wide default applies, grants never do" rule for unauthenticated
/// requests.
fn is_anonymous(user: UserId) -> bool {
    user.is_empty()
}

#[derive(Debug, Clone, Copy)]
struct PrivilegeEntry {
    user: UserId,
    entity: Uuid,
    value: PrivilegeValue,
    granted_at: Timestamp,
    expires_at: Timestamp,
}

impl PrivilegeEntry {
    fn is_live(&self, now: Timestamp) -> bool {
        self.expires_at <= 0 || self.expires_at >= now
    }
}

/// One scope's grant multimap: `(user, entity)` -> grants, with a by-user
/// and by-entity secondary index for enumeration (spec 4.5's "list
/// privileges granted to this user/entity" operations).
#[derive(Debug, Default)]
struct PrivilegeEntryCollection {
    by_user_entity: HashMap<(UserId, Uuid), Vec<PrivilegeEntry>>,
    entities_by_user: HashMap<UserId, HashSet<Uuid>>,
    users_by_entity: HashMap<Uuid, HashSet<UserId>>,
}

impl PrivilegeEntryCollection {
    fn grant(&mut self, user: UserId, entity: Uuid, value: PrivilegeValue, now: Timestamp, expires_at: Timestamp) {
        if value.get() == 0 {
            self.revoke_all(user, entity);
            return;
        }
        self.by_user_entity
            .entry((user, entity))
            .or_default()
            .push(PrivilegeEntry { user, entity, value, granted_at: now, expires_at });
        self.entities_by_user.entry(user).or_default().insert(entity);
        self.users_by_entity.entry(entity).or_default().insert(user);
    }

    fn revoke_all(&mut self, user: UserId, entity: Uuid) {
        self.by_user_entity.remove(&(user, entity));
        if let Some(set) = self.entities_by_user.get_mut(&user) {
            set.remove(&entity);
        }
        if let Some(set) = self.users_by_entity.get_mut(&entity) {
            set.remove(&user);
        }
    }

    fn entries(&self, user: UserId, entity: Uuid) -> &[PrivilegeEntry] {
        self.by_user_entity
            .get(&(user, entity))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn entities_granted_to(&self, user: UserId) -> impl Iterator<Item = Uuid> + '_ {
        self.entities_by_user.get(&user).into_iter().flatten().copied()
    }

    fn users_granted_on(&self, entity: Uuid) -> impl Iterator<Item = UserId> + '_ {
        self.users_by_entity.get(&entity).into_iter().flatten().copied()
    }
}

/// Combined positive/negative accumulator. Positive grants take the
/// maximum seen, negative grants take the minimum (most restrictive);
/// the two are summed to get the effective value (spec 4.4 invariant 2).
#[derive(Debug, Clone, Copy, Default)]
pub struct PrivilegeAccumulator {
    pub(crate) positive: i32,
    pub(crate) negative: i32,
}

impl PrivilegeAccumulator {
    pub fn effective_value(self) -> i32 {
        self.positive + self.negative
    }

    fn accumulate(&mut self, value: PrivilegeValue) {
        let v = value.get() as i32;
        if v > 0 {
            self.positive = self.positive.max(v);
        } else if v < 0 {
            self.negative = self.negative.min(v);
        }
    }
}

/// The five independent grant stores (thread-message, thread, tag,
/// category, forum-wide) plus the logged-in-user default floor applied
/// before any grant is consulted.
#[derive(Debug)]
pub struct GrantedPrivilegeStore {
    message_grants: PrivilegeEntryCollection,
    thread_grants: PrivilegeEntryCollection,
    tag_grants: PrivilegeEntryCollection,
    category_grants: PrivilegeEntryCollection,
    forum_wide_grants: PrivilegeEntryCollection,
    default_privilege_value_for_logged_in_user: PrivilegeValue,
}

impl GrantedPrivilegeStore {
    pub fn new(default_privilege_value_for_logged_in_user: PrivilegeValue) -> Self {
        Self {
            message_grants: PrivilegeEntryCollection::default(),
            thread_grants: PrivilegeEntryCollection::default(),
            tag_grants: PrivilegeEntryCollection::default(),
            category_grants: PrivilegeEntryCollection::default(),
            forum_wide_grants: PrivilegeEntryCollection::default(),
            default_privilege_value_for_logged_in_user,
        }
    }

    pub fn grant_message_privilege(
        &mut self,
        user: UserId,
        entity: Uuid,
        value: PrivilegeValue,
        now: Timestamp,
        duration: PrivilegeDuration,
    ) {
        self.message_grants.grant(user, entity, value, now, duration.expires_at(now));
    }

    pub fn grant_thread_privilege(
        &mut self,
        user: UserId,
        entity: Uuid,
        value: PrivilegeValue,
        now: Timestamp,
        duration: PrivilegeDuration,
    ) {
        self.thread_grants.grant(user, entity, value, now, duration.expires_at(now));
    }

    pub fn grant_tag_privilege(
        &mut self,
        user: UserId,
        entity: Uuid,
        value: PrivilegeValue,
        now: Timestamp,
        duration: PrivilegeDuration,
    ) {
        self.tag_grants.grant(user, entity, value, now, duration.expires_at(now));
    }

    pub fn grant_category_privilege(
        &mut self,
        user: UserId,
        entity: Uuid,
        value: PrivilegeValue,
        now: Timestamp,
        duration: PrivilegeDuration,
    ) {
        self.category_grants.grant(user, entity, value, now, duration.expires_at(now));
    }

    pub fn grant_forum_wide_privilege(
        &mut self,
        user: UserId,
        value: PrivilegeValue,
        now: Timestamp,
        duration: PrivilegeDuration,
    ) {
        self.forum_wide_grants.grant(user, Uuid::nil(), value, now, duration.expires_at(now));
    }

    pub fn default_privilege_value_for_logged_in_user(&self) -> PrivilegeValue {
        self.default_privilege_value_for_logged_in_user
    }

    pub fn set_default_privilege_value_for_logged_in_user(&mut self, value: PrivilegeValue) {
        self.default_privilege_value_for_logged_in_user = value;
    }

    pub fn entities_granted_to_user(&self, user: UserId) -> impl Iterator<Item = Uuid> + '_ {
        self.thread_grants
            .entities_granted_to(user)
            .chain(self.tag_grants.entities_granted_to(user))
            .chain(self.category_grants.entities_granted_to(user))
            .chain(self.message_grants.entities_granted_to(user))
    }

    pub fn users_granted_on_entity(&self, entity: Uuid) -> impl Iterator<Item = UserId> + '_ {
        self.thread_grants
            .users_granted_on(entity)
            .chain(self.tag_grants.users_granted_on(entity))
            .chain(self.category_grants.users_granted_on(entity))
            .chain(self.message_grants.users_granted_on(entity))
    }

    /// Mirrors `GrantedPrivilegeStore::calculatePrivilege`: applies the
    /// logged-in-user default floor, then short-circuits for anonymous
    /// users (who can only ever reach the default), otherwise folds in
    /// every live grant for `(user, entity)`.
    fn calculate(
        &self,
        collection: &PrivilegeEntryCollection,
        user: UserId,
        entity: Uuid,
        now: Timestamp,
        acc: &mut PrivilegeAccumulator,
    ) {
        let default_positive = if is_anonymous(user) {
            0
        } else {
            self.default_privilege_value_for_logged_in_user.get().max(0) as i32
        };
        acc.positive = acc.positive.max(default_positive);

        if is_anonymous(user) {
            return;
        }

        for entry in collection.entries(user, entity) {
            if entry.is_live(now) {
                acc.accumulate(entry.value);
            }
        }
    }

    pub fn calculate_message_privilege(&self, user: UserId, message: Uuid, now: Timestamp, acc: &mut PrivilegeAccumulator) {
        self.calculate(&self.message_grants, user, message, now, acc);
    }

    pub fn calculate_thread_privilege(&self, user: UserId, thread: Uuid, now: Timestamp, acc: &mut PrivilegeAccumulator) {
        self.calculate(&self.thread_grants, user, thread, now, acc);
    }

    pub fn calculate_tag_privilege(&self, user: UserId, tag: Uuid, now: Timestamp, acc: &mut PrivilegeAccumulator) {
        self.calculate(&self.tag_grants, user, tag, now, acc);
    }

    pub fn calculate_category_privilege(&self, user: UserId, category: Uuid, now: Timestamp, acc: &mut PrivilegeAccumulator) {
        self.calculate(&self.category_grants, user, category, now, acc);
    }

    pub fn calculate_forum_wide_privilege(&self, user: UserId, now: Timestamp, acc: &mut PrivilegeAccumulator) {
        self.calculate(&self.forum_wide_grants, user, Uuid::nil(), now, acc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_grant_is_ignored() {
        let mut store = GrantedPrivilegeStore::new(PrivilegeValue::new(0));
        let user = UserId::new_v7();
        let entity = Uuid::new_v4();
        store.grant_thread_privilege(user, entity, PrivilegeValue::new(5), 100, PrivilegeDuration(10));

        let mut acc = PrivilegeAccumulator::default();
        store.calculate_thread_privilege(user, entity, 200, &mut acc);
        assert_eq!(acc.effective_value(), 0);
    }

    #[test]
    fn positive_and_negative_grants_combine() {
        let mut store = GrantedPrivilegeStore::new(PrivilegeValue::new(0));
        let user = UserId::new_v7();
        let entity = Uuid::new_v4();
        store.grant_thread_privilege(user, entity, PrivilegeValue::new(10), 0, PrivilegeDuration::UNLIMITED);
        store.grant_thread_privilege(user, entity, PrivilegeValue::new(-3), 0, PrivilegeDuration::UNLIMITED);

        let mut acc = PrivilegeAccumulator::default();
        store.calculate_thread_privilege(user, entity, 1, &mut acc);
        assert_eq!(acc.effective_value(), 7);
    }

    #[test]
    fn anonymous_user_never_sees_grants() {
        let mut store = GrantedPrivilegeStore::new(PrivilegeValue::new(1));
        let anon = UserId::empty();
        let entity = Uuid::new_v4();
        store.grant_thread_privilege(anon, entity, PrivilegeValue::new(100), 0, PrivilegeDuration::UNLIMITED);

        let mut acc = PrivilegeAccumulator::default();
        store.calculate_thread_privilege(anon, entity, 1, &mut acc);
        assert_eq!(acc.effective_value(), 0);
    }

    #[test]
    fn zero_value_grant_revokes() {
        let mut store = GrantedPrivilegeStore::new(PrivilegeValue::new(0));
        let user = UserId::new_v7();
        let entity = Uuid::new_v4();
        store.grant_thread_privilege(user, entity, PrivilegeValue::new(10), 0, PrivilegeDuration::UNLIMITED);
        store.grant_thread_privilege(user, entity, PrivilegeValue::new(0), 0, PrivilegeDuration::UNLIMITED);

        let mut acc = PrivilegeAccumulator::default();
        store.calculate_thread_privilege(user, entity, 1, &mut acc);
        assert_eq!(acc.effective_value(), 0);
    }
}
