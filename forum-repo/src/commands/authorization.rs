//! Privilege assignment and introspection commands: granting privileges
//! on an entity to a user, reading required thresholds, reading who
//! holds what, and adjusting the forum-wide defaults.

use crate::commands::users::auth_status_to_code;
use crate::events::{ReadEvents, WriteEvents};
use crate::ids::IdGenerator;
use crate::outstream::{write_json, OutStream};
use crate::Repository;
use forum_core::{
    AuthorizationStatus, CategoryId, MessageId, Privilege, PrivilegeDuration, PrivilegeValue, StatusCode, TagId,
    ThreadId, Timestamp, UserId,
};

impl<I: IdGenerator, R: ReadEvents, W: WriteEvents> Repository<I, R, W> {
    pub fn assign_discussion_thread_privilege(
        &self,
        requester: UserId,
        target_user: UserId,
        thread: ThreadId,
        value: PrivilegeValue,
        duration: PrivilegeDuration,
        now: Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        let entities = match self.store.read() {
            Ok(g) => g,
            Err(_) => {
                write_json(out, &StatusCode::NotFound);
                return StatusCode::NotFound;
            }
        };
        if entities.threads.get(thread).is_none() {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        }
        let authz = self.authorization.can_do_on_thread(
            &entities,
            &self.config,
            requester,
            thread,
            Privilege::AssignDiscussionThreadPrivilege,
            now,
        );
        drop(entities);
        if authz != AuthorizationStatus::Ok {
            let status = auth_status_to_code(authz);
            write_json(out, &status);
            return status;
        }
        self.authorization.grant_thread_privilege(target_user, thread, value, now, duration);
        write_json(out, &StatusCode::Ok);
        StatusCode::Ok
    }

    pub fn assign_discussion_message_privilege(
        &self,
        requester: UserId,
        target_user: UserId,
        message: MessageId,
        value: PrivilegeValue,
        duration: PrivilegeDuration,
        now: Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        let entities = match self.store.read() {
            Ok(g) => g,
            Err(_) => {
                write_json(out, &StatusCode::NotFound);
                return StatusCode::NotFound;
            }
        };
        if entities.messages.get(message).is_none() {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        }
        let authz = self.authorization.can_do_on_message(
            &entities,
            &self.config,
            requester,
            message,
            Privilege::AssignDiscussionThreadPrivilege,
            now,
        );
        drop(entities);
        if authz != AuthorizationStatus::Ok {
            let status = auth_status_to_code(authz);
            write_json(out, &status);
            return status;
        }
        self.authorization.grant_message_privilege(target_user, message, value, now, duration);
        write_json(out, &StatusCode::Ok);
        StatusCode::Ok
    }

    pub fn assign_discussion_tag_privilege(
        &self,
        requester: UserId,
        target_user: UserId,
        tag: TagId,
        value: PrivilegeValue,
        duration: PrivilegeDuration,
        now: Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        let entities = match self.store.read() {
            Ok(g) => g,
            Err(_) => {
                write_json(out, &StatusCode::NotFound);
                return StatusCode::NotFound;
            }
        };
        if entities.tags.get(tag).is_none() {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        }
        let authz = self.authorization.can_do_on_tag(
            &entities,
            &self.config,
            requester,
            tag,
            Privilege::AssignDiscussionTagPrivilege,
            now,
        );
        drop(entities);
        if authz != AuthorizationStatus::Ok {
            let status = auth_status_to_code(authz);
            write_json(out, &status);
            return status;
        }
        self.authorization.grant_tag_privilege(target_user, tag, value, now, duration);
        write_json(out, &StatusCode::Ok);
        StatusCode::Ok
    }

    pub fn assign_discussion_category_privilege(
        &self,
        requester: UserId,
        target_user: UserId,
        category: CategoryId,
        value: PrivilegeValue,
        duration: PrivilegeDuration,
        now: Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        let entities = match self.store.read() {
            Ok(g) => g,
            Err(_) => {
                write_json(out, &StatusCode::NotFound);
                return StatusCode::NotFound;
            }
        };
        if entities.categories.get(category).is_none() {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        }
        let authz = self.authorization.can_do_on_category(
            &entities,
            &self.config,
            requester,
            category,
            Privilege::AssignDiscussionCategoryPrivilege,
            now,
        );
        drop(entities);
        if authz != AuthorizationStatus::Ok {
            let status = auth_status_to_code(authz);
            write_json(out, &status);
            return status;
        }
        self.authorization.grant_category_privilege(target_user, category, value, now, duration);
        write_json(out, &StatusCode::Ok);
        StatusCode::Ok
    }

    pub fn assign_forum_wide_privilege(
        &self,
        requester: UserId,
        target_user: UserId,
        value: PrivilegeValue,
        duration: PrivilegeDuration,
        now: Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        let authz = self.authorization.can_do_forum_wide(&self.config, requester, Privilege::AssignForumWidePrivilege, now);
        if authz != AuthorizationStatus::Ok {
            let status = auth_status_to_code(authz);
            write_json(out, &status);
            return status;
        }
        self.authorization.grant_forum_wide_privilege(target_user, value, now, duration);
        write_json(out, &StatusCode::Ok);
        StatusCode::Ok
    }

    pub fn get_required_privileges_for_thread(
        &self,
        _requester: UserId,
        thread: ThreadId,
        out: &mut impl OutStream,
    ) -> StatusCode {
        let entities = match self.store.read() {
            Ok(g) => g,
            Err(_) => {
                write_json(out, &StatusCode::NotFound);
                return StatusCode::NotFound;
            }
        };
        let Some(thread_entity) = entities.threads.get(thread) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        write_json(out, &thread_entity.required_privileges);
        StatusCode::Ok
    }

    pub fn get_required_privileges_for_tag(&self, _requester: UserId, tag: TagId, out: &mut impl OutStream) -> StatusCode {
        let entities = match self.store.read() {
            Ok(g) => g,
            Err(_) => {
                write_json(out, &StatusCode::NotFound);
                return StatusCode::NotFound;
            }
        };
        let Some(tag_entity) = entities.tags.get(tag) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        write_json(out, &tag_entity.required_privileges);
        StatusCode::Ok
    }

    pub fn get_required_privileges_for_category(
        &self,
        _requester: UserId,
        category: CategoryId,
        out: &mut impl OutStream,
    ) -> StatusCode {
        let entities = match self.store.read() {
            Ok(g) => g,
            Err(_) => {
                write_json(out, &StatusCode::NotFound);
                return StatusCode::NotFound;
            }
        };
        let Some(category_entity) = entities.categories.get(category) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        write_json(out, &category_entity.required_privileges);
        StatusCode::Ok
    }

    pub fn change_required_privilege_for_thread(
        &self,
        requester: UserId,
        thread: ThreadId,
        privilege: Privilege,
        value: Option<PrivilegeValue>,
        now: Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        let entities = match self.store.read() {
            Ok(g) => g,
            Err(_) => {
                write_json(out, &StatusCode::NotFound);
                return StatusCode::NotFound;
            }
        };
        let authz = self.authorization.can_do_on_thread(
            &entities,
            &self.config,
            requester,
            thread,
            Privilege::AssignDiscussionThreadPrivilege,
            now,
        );
        drop(entities);
        if authz != AuthorizationStatus::Ok {
            let status = auth_status_to_code(authz);
            write_json(out, &status);
            return status;
        }

        let mut entities = match self.store.write() {
            Ok(g) => g,
            Err(_) => {
                write_json(out, &StatusCode::NotFound);
                return StatusCode::NotFound;
            }
        };
        let Some(thread_entity) = entities.threads.get_mut(thread) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        thread_entity.required_privileges.set(privilege, value);
        drop(entities);
        write_json(out, &StatusCode::Ok);
        StatusCode::Ok
    }

    pub fn entities_granted_to_user(&self, requester: UserId, out: &mut impl OutStream) -> StatusCode {
        let ids = self.authorization.entities_granted_to_user(requester);
        write_json(out, &ids);
        StatusCode::Ok
    }

    pub fn users_granted_on_entity(&self, entity: uuid::Uuid, out: &mut impl OutStream) -> StatusCode {
        let ids = self.authorization.users_granted_on_entity(entity);
        write_json(out, &ids);
        StatusCode::Ok
    }

    pub fn get_forum_wide_required_privileges(&self, out: &mut impl OutStream) -> StatusCode {
        write_json(out, &self.authorization.forum_wide_required_privileges());
        StatusCode::Ok
    }

    pub fn change_forum_wide_required_privilege(
        &self,
        requester: UserId,
        privilege: Privilege,
        value: Option<PrivilegeValue>,
        now: Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        let authz = self.authorization.can_do_forum_wide(&self.config, requester, Privilege::AssignForumWidePrivilege, now);
        if authz != AuthorizationStatus::Ok {
            let status = auth_status_to_code(authz);
            write_json(out, &status);
            return status;
        }
        self.authorization.set_forum_wide_required_privilege(privilege, value);
        write_json(out, &StatusCode::Ok);
        StatusCode::Ok
    }

    pub fn change_default_privilege_for_logged_in_user(
        &self,
        requester: UserId,
        value: PrivilegeValue,
        now: Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        let authz = self.authorization.can_do_forum_wide(&self.config, requester, Privilege::AssignForumWidePrivilege, now);
        if authz != AuthorizationStatus::Ok {
            let status = auth_status_to_code(authz);
            write_json(out, &status);
            return status;
        }
        self.authorization.set_default_privilege_value_for_logged_in_user(value);
        write_json(out, &StatusCode::Ok);
        StatusCode::Ok
    }
}
