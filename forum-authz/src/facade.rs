//! Authorization façade: the single entry point repository commands call
//! to turn "is this allowed" into an `AuthorizationStatus`, folding in
//! throttling on top of privilege resolution (spec 4.6's `SerializationRestriction`-
//! equivalent, minus the serialization bit - that lives in `forum-repo`).

use crate::granted::GrantedPrivilegeStore;
use crate::resolver::{ForumWidePrivilegeStore, Resolver};
use crate::throttle::{bucket_for_privilege, ThrottleStore};
use forum_core::{
    AuthorizationStatus, CategoryId, ForumConfig, Privilege, PrivilegeDuration, PrivilegeThresholds, PrivilegeValue,
    TagId, ThreadId, Timestamp, UserId,
};
use forum_store::EntityCollection;
use std::sync::RwLock;
use uuid::Uuid;

/// Grant mutation and the forum-wide default require a write lock;
/// resolution along the scope chain only ever reads, so every `can_do_*`
/// path below takes a read lock for the span of one resolution.
pub struct Authorization {
    pub grants: RwLock<GrantedPrivilegeStore>,
    pub forum_wide: RwLock<ForumWidePrivilegeStore>,
    pub throttle: ThrottleStore,
}

impl Authorization {
    pub fn new(default_privilege_value_for_logged_in_user: forum_core::PrivilegeValue) -> Self {
        Self {
            grants: RwLock::new(GrantedPrivilegeStore::new(default_privilege_value_for_logged_in_user)),
            forum_wide: RwLock::new(ForumWidePrivilegeStore::default()),
            throttle: ThrottleStore::new(),
        }
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(
            self.grants.read().unwrap_or_else(|e| e.into_inner()),
            self.forum_wide.read().unwrap_or_else(|e| e.into_inner()),
        )
    }

    pub fn grant_thread_privilege(&self, user: UserId, thread: ThreadId, value: PrivilegeValue, now: Timestamp, duration: PrivilegeDuration) {
        self.grants
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .grant_thread_privilege(user, thread.as_uuid(), value, now, duration);
    }

    pub fn grant_message_privilege(
        &self,
        user: UserId,
        message: forum_core::MessageId,
        value: PrivilegeValue,
        now: Timestamp,
        duration: PrivilegeDuration,
    ) {
        self.grants
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .grant_message_privilege(user, message.as_uuid(), value, now, duration);
    }

    pub fn grant_tag_privilege(&self, user: UserId, tag: TagId, value: PrivilegeValue, now: Timestamp, duration: PrivilegeDuration) {
        self.grants
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .grant_tag_privilege(user, tag.as_uuid(), value, now, duration);
    }

    pub fn grant_category_privilege(
        &self,
        user: UserId,
        category: CategoryId,
        value: PrivilegeValue,
        now: Timestamp,
        duration: PrivilegeDuration,
    ) {
        self.grants
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .grant_category_privilege(user, category.as_uuid(), value, now, duration);
    }

    pub fn grant_forum_wide_privilege(&self, user: UserId, value: PrivilegeValue, now: Timestamp, duration: PrivilegeDuration) {
        self.grants
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .grant_forum_wide_privilege(user, value, now, duration);
    }

    pub fn entities_granted_to_user(&self, user: UserId) -> Vec<Uuid> {
        self.grants.read().unwrap_or_else(|e| e.into_inner()).entities_granted_to_user(user).collect()
    }

    pub fn users_granted_on_entity(&self, entity: Uuid) -> Vec<UserId> {
        self.grants.read().unwrap_or_else(|e| e.into_inner()).users_granted_on_entity(entity).collect()
    }

    pub fn default_privilege_value_for_logged_in_user(&self) -> PrivilegeValue {
        self.grants.read().unwrap_or_else(|e| e.into_inner()).default_privilege_value_for_logged_in_user()
    }

    pub fn set_default_privilege_value_for_logged_in_user(&self, value: PrivilegeValue) {
        self.grants
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .set_default_privilege_value_for_logged_in_user(value);
    }

    pub fn forum_wide_required_privileges(&self) -> PrivilegeThresholds {
        self.forum_wide.read().unwrap_or_else(|e| e.into_inner()).required.clone()
    }

    pub fn set_forum_wide_required_privilege(&self, privilege: Privilege, value: Option<PrivilegeValue>) {
        self.forum_wide
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .required
            .set(privilege, value);
    }

    /// Apply the throttle bucket for `privilege`, if it has one, unless
    /// the user holds `NoThrottling` forum-wide (spec 4.6's escape
    /// hatch). Returns `Throttled` if this call should be rejected.
    fn check_throttle(
        &self,
        config: &ForumConfig,
        user: UserId,
        privilege: Privilege,
        now: Timestamp,
    ) -> AuthorizationStatus {
        if self.resolver().can_do_forum_wide(user, Privilege::NoThrottling, now) == AuthorizationStatus::Ok {
            return AuthorizationStatus::Ok;
        }
        let Some(bucket) = bucket_for_privilege(privilege) else {
            return AuthorizationStatus::Ok;
        };
        let Some(limit) = config.throttle_limit(bucket) else {
            return AuthorizationStatus::Ok;
        };
        if self.throttle.record_and_check(user, bucket, now, limit.max_count, limit.period_seconds) {
            AuthorizationStatus::Throttled
        } else {
            AuthorizationStatus::Ok
        }
    }

    pub fn can_do_on_thread(
        &self,
        entities: &EntityCollection,
        config: &ForumConfig,
        user: UserId,
        thread: ThreadId,
        privilege: Privilege,
        now: Timestamp,
    ) -> AuthorizationStatus {
        match self.resolver().can_do_on_thread(entities, user, thread, privilege, now) {
            AuthorizationStatus::Ok => self.check_throttle(config, user, privilege, now),
            other => other,
        }
    }

    pub fn can_do_on_message(
        &self,
        entities: &EntityCollection,
        config: &ForumConfig,
        user: UserId,
        message: forum_core::MessageId,
        privilege: Privilege,
        now: Timestamp,
    ) -> AuthorizationStatus {
        match self.resolver().can_do_on_message(entities, user, message, privilege, now) {
            AuthorizationStatus::Ok => self.check_throttle(config, user, privilege, now),
            other => other,
        }
    }

    pub fn can_do_on_tag(
        &self,
        entities: &EntityCollection,
        config: &ForumConfig,
        user: UserId,
        tag: TagId,
        privilege: Privilege,
        now: Timestamp,
    ) -> AuthorizationStatus {
        match self.resolver().can_do_on_tag(entities, user, tag, privilege, now) {
            AuthorizationStatus::Ok => self.check_throttle(config, user, privilege, now),
            other => other,
        }
    }

    pub fn can_do_on_category(
        &self,
        entities: &EntityCollection,
        config: &ForumConfig,
        user: UserId,
        category: CategoryId,
        privilege: Privilege,
        now: Timestamp,
    ) -> AuthorizationStatus {
        match self.resolver().can_do_on_category(entities, user, category, privilege, now) {
            AuthorizationStatus::Ok => self.check_throttle(config, user, privilege, now),
            other => other,
        }
    }

    pub fn can_do_forum_wide(
        &self,
        config: &ForumConfig,
        user: UserId,
        privilege: Privilege,
        now: Timestamp,
    ) -> AuthorizationStatus {
        match self.resolver().can_do_forum_wide(user, privilege, now) {
            AuthorizationStatus::Ok => self.check_throttle(config, user, privilege, now),
            other => other,
        }
    }

    /// Batched per-message visibility for a page of messages within one
    /// thread (spec 4.4's `computeDiscussionThreadMessageVisibilityAllowed`).
    pub fn message_visibility_batch(
        &self,
        entities: &EntityCollection,
        user: UserId,
        messages: &[forum_core::MessageId],
        now: Timestamp,
    ) -> Vec<crate::resolver::MessageVisibility> {
        self.resolver().message_visibility_batch(entities, user, messages, now)
    }

    /// True if `message` is visible to `user` at all: it's their own,
    /// it's approved, or they hold `ViewUnapproved` on the thread (spec
    /// 4.4's `checkMessageAllowViewApproval`).
    pub fn can_view_unapproved_message(
        &self,
        entities: &EntityCollection,
        user: UserId,
        message: forum_core::MessageId,
        now: Timestamp,
    ) -> bool {
        let Some(message_entity) = entities.messages.get(message) else { return false };
        if message_entity.approved {
            return true;
        }
        if message_entity.creator == user {
            return true;
        }
        self.resolver().can_do_on_thread(entities, user, message_entity.parent_thread, Privilege::ViewUnapproved, now)
            == AuthorizationStatus::Ok
    }
}
