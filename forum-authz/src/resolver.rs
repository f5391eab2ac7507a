//! Scope-chain resolution: given a user and an entity, walk every scope
//! that can contribute a requirement or a grant (message -> thread ->
//! tags -> forum-wide; category -> ancestors -> forum-wide) and decide
//! whether the accumulated privilege clears the entity's required
//! threshold (spec 4.4, 4.5).

use crate::granted::{GrantedPrivilegeStore, PrivilegeAccumulator};
use forum_core::{AuthorizationStatus, CategoryId, Privilege, PrivilegeValue, ThreadId, Timestamp, UserId};
use forum_store::EntityCollection;
use std::sync::RwLockReadGuard;

/// Forum-wide default required-privilege thresholds, independent of any
/// single entity (spec 4.4's base of the scope chain).
#[derive(Debug, Clone, Default)]
pub struct ForumWidePrivilegeStore {
    pub required: forum_core::PrivilegeThresholds,
}

fn is_allowed(acc: PrivilegeAccumulator, required: Option<PrivilegeValue>) -> AuthorizationStatus {
    let required = required.map(|v| v.get() as i32).unwrap_or(0).max(0);
    if acc.effective_value() >= required {
        AuthorizationStatus::Ok
    } else {
        AuthorizationStatus::NotAllowed
    }
}

/// Resolves `required_privileges` across a scope chain: each scope may
/// set `Some(value)` (authoritative) or leave `None` (fall through to the
/// next, less specific scope) - spec 4.4 invariant 1.
fn first_required(chain: &[Option<PrivilegeValue>]) -> Option<PrivilegeValue> {
    chain.iter().find_map(|v| *v)
}

pub struct Resolver<'a> {
    pub grants: RwLockReadGuard<'a, GrantedPrivilegeStore>,
    pub forum_wide: RwLockReadGuard<'a, ForumWidePrivilegeStore>,
}

impl<'a> Resolver<'a> {
    pub fn new(grants: RwLockReadGuard<'a, GrantedPrivilegeStore>, forum_wide: RwLockReadGuard<'a, ForumWidePrivilegeStore>) -> Self {
        Self { grants, forum_wide }
    }

    fn accumulate_forum_wide(&self, user: UserId, now: Timestamp, acc: &mut PrivilegeAccumulator) {
        self.grants.calculate_forum_wide_privilege(user, now, acc);
    }

    fn accumulate_category_chain(
        &self,
        entities: &EntityCollection,
        user: UserId,
        category: CategoryId,
        now: Timestamp,
        acc: &mut PrivilegeAccumulator,
    ) {
        let mut current = Some(category);
        while let Some(id) = current {
            self.grants.calculate_category_privilege(user, id.as_uuid(), now, acc);
            current = entities.categories.get(id).and_then(|c| c.parent);
        }
    }

    fn accumulate_tag(&self, user: UserId, tag: forum_core::TagId, now: Timestamp, acc: &mut PrivilegeAccumulator) {
        self.grants.calculate_tag_privilege(user, tag.as_uuid(), now, acc);
    }

    /// `canDoX` on a `DiscussionThread`: thread grant + every tag's grant
    /// + forum-wide, checked against the thread's own required threshold
    /// falling through to tag then forum-wide (spec 4.4's
    /// `DiscussionThreadPrivilege` resolution).
    pub fn can_do_on_thread(
        &self,
        entities: &EntityCollection,
        user: UserId,
        thread: ThreadId,
        privilege: Privilege,
        now: Timestamp,
    ) -> AuthorizationStatus {
        let Some(thread_entity) = entities.threads.get(thread) else {
            return AuthorizationStatus::NotAllowed;
        };

        let mut acc = PrivilegeAccumulator::default();
        self.grants.calculate_thread_privilege(user, thread.as_uuid(), now, &mut acc);
        for tag in &thread_entity.tags {
            self.accumulate_tag(user, *tag, now, &mut acc);
        }
        self.accumulate_forum_wide(user, now, &mut acc);

        let mut chain = vec![thread_entity.required_privileges.get(privilege)];
        for tag in &thread_entity.tags {
            if let Some(tag_entity) = entities.tags.get(*tag) {
                chain.push(tag_entity.required_privileges.get(privilege));
            }
        }
        chain.push(self.forum_wide.required.get(privilege));

        is_allowed(acc, first_required(&chain))
    }

    /// `canDoX` on a `DiscussionThreadMessage`: message grant + parent
    /// thread's full chain (spec 4.4's `DiscussionThreadMessagePrivilege`
    /// resolution, which always includes the parent thread).
    pub fn can_do_on_message(
        &self,
        entities: &EntityCollection,
        user: UserId,
        message: forum_core::MessageId,
        privilege: Privilege,
        now: Timestamp,
    ) -> AuthorizationStatus {
        let Some(message_entity) = entities.messages.get(message) else {
            return AuthorizationStatus::NotAllowed;
        };
        let thread = message_entity.parent_thread;
        let Some(thread_entity) = entities.threads.get(thread) else {
            return AuthorizationStatus::NotAllowed;
        };

        let mut acc = PrivilegeAccumulator::default();
        self.grants.calculate_message_privilege(user, message.as_uuid(), now, &mut acc);
        self.grants.calculate_thread_privilege(user, thread.as_uuid(), now, &mut acc);
        for tag in &thread_entity.tags {
            self.accumulate_tag(user, *tag, now, &mut acc);
        }
        self.accumulate_forum_wide(user, now, &mut acc);

        let mut chain = vec![thread_entity.required_privileges.get(privilege)];
        for tag in &thread_entity.tags {
            if let Some(tag_entity) = entities.tags.get(*tag) {
                chain.push(tag_entity.required_privileges.get(privilege));
            }
        }
        chain.push(self.forum_wide.required.get(privilege));

        is_allowed(acc, first_required(&chain))
    }

    pub fn can_do_on_tag(
        &self,
        entities: &EntityCollection,
        user: UserId,
        tag: forum_core::TagId,
        privilege: Privilege,
        now: Timestamp,
    ) -> AuthorizationStatus {
        let Some(tag_entity) = entities.tags.get(tag) else {
            return AuthorizationStatus::NotAllowed;
        };

        let mut acc = PrivilegeAccumulator::default();
        self.accumulate_tag(user, tag, now, &mut acc);
        self.accumulate_forum_wide(user, now, &mut acc);

        let chain = [tag_entity.required_privileges.get(privilege), self.forum_wide.required.get(privilege)];
        is_allowed(acc, first_required(&chain))
    }

    /// `canDoX` on a `DiscussionCategory`: category grant + every ancestor
    /// + forum-wide (spec 4.3's category hierarchy, mirrored from
    /// `isAllowed(..., DiscussionCategory&, ...)` walking `parent()`).
    pub fn can_do_on_category(
        &self,
        entities: &EntityCollection,
        user: UserId,
        category: CategoryId,
        privilege: Privilege,
        now: Timestamp,
    ) -> AuthorizationStatus {
        let Some(category_entity) = entities.categories.get(category) else {
            return AuthorizationStatus::NotAllowed;
        };

        let mut acc = PrivilegeAccumulator::default();
        self.accumulate_category_chain(entities, user, category, now, &mut acc);
        self.accumulate_forum_wide(user, now, &mut acc);

        let mut chain = Vec::new();
        let mut current = Some(category);
        while let Some(id) = current {
            if let Some(c) = entities.categories.get(id) {
                chain.push(c.required_privileges.get(privilege));
                current = c.parent;
            } else {
                break;
            }
        }
        chain.push(self.forum_wide.required.get(privilege));
        let _ = category_entity;

        is_allowed(acc, first_required(&chain))
    }

    pub fn can_do_forum_wide(&self, user: UserId, privilege: Privilege, now: Timestamp) -> AuthorizationStatus {
        let mut acc = PrivilegeAccumulator::default();
        self.accumulate_forum_wide(user, now, &mut acc);
        is_allowed(acc, self.forum_wide.required.get(privilege))
    }

    /// Batched visibility check for a page of messages within one thread,
    /// mirroring `computeDiscussionThreadMessageVisibilityAllowed`: the
    /// thread-level accumulation is computed once and reused for every
    /// message, since it never varies across the batch.
    pub fn message_visibility_batch(
        &self,
        entities: &EntityCollection,
        user: UserId,
        messages: &[forum_core::MessageId],
        now: Timestamp,
    ) -> Vec<MessageVisibility> {
        let Some(&first) = messages.first() else { return Vec::new() };
        let Some(thread_id) = entities.messages.get(first).map(|m| m.parent_thread) else {
            return messages.iter().map(|_| MessageVisibility::default()).collect();
        };
        let Some(thread_entity) = entities.threads.get(thread_id) else {
            return messages.iter().map(|_| MessageVisibility::default()).collect();
        };

        let mut thread_acc = PrivilegeAccumulator::default();
        self.grants.calculate_thread_privilege(user, thread_id.as_uuid(), now, &mut thread_acc);
        for tag in &thread_entity.tags {
            self.accumulate_tag(user, *tag, now, &mut thread_acc);
        }
        self.accumulate_forum_wide(user, now, &mut thread_acc);

        let required = |p: Privilege| {
            let mut chain = vec![thread_entity.required_privileges.get(p)];
            for tag in &thread_entity.tags {
                if let Some(tag_entity) = entities.tags.get(*tag) {
                    chain.push(tag_entity.required_privileges.get(p));
                }
            }
            chain.push(self.forum_wide.required.get(p));
            first_required(&chain)
        };
        let req_view = required(Privilege::ViewMessage);
        let req_creator = required(Privilege::ViewCreatorUser);
        let req_votes = required(Privilege::ViewVotes);
        let req_ip = required(Privilege::ViewIpAddress);
        let req_comments = required(Privilege::GetMessageComments);

        messages
            .iter()
            .map(|&message_id| {
                let mut acc = PrivilegeAccumulator::default();
                self.grants.calculate_message_privilege(user, message_id.as_uuid(), now, &mut acc);
                acc.accumulate_max(thread_acc);

                MessageVisibility {
                    message: message_id,
                    show_message: is_allowed(acc, req_view) == AuthorizationStatus::Ok,
                    show_creator: is_allowed(acc, req_creator) == AuthorizationStatus::Ok,
                    show_votes: is_allowed(acc, req_votes) == AuthorizationStatus::Ok,
                    show_ip_address: is_allowed(acc, req_ip) == AuthorizationStatus::Ok,
                    show_comments: is_allowed(acc, req_comments) == AuthorizationStatus::Ok,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MessageVisibility {
    pub message: forum_core::MessageId,
    pub show_message: bool,
    pub show_creator: bool,
    pub show_votes: bool,
    pub show_ip_address: bool,
    pub show_comments: bool,
}

impl PrivilegeAccumulator {
    /// Combine with another accumulator by taking the maximum positive
    /// and minimum negative of the two, matching
    /// `maximumPrivilegeValue`/`minimumPrivilegeValue` composition used
    /// when folding message-level and thread-level values together.
    pub fn accumulate_max(&mut self, other: PrivilegeAccumulator) {
        self.positive = self.positive.max(other.positive);
        self.negative = self.negative.min(other.negative);
    }
}
