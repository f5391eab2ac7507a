//! User commands: account creation, profile changes, deletion and the
//! three listing orders (`MemoryRepository::getUsersByName/ByCreated/ByLastSeen`).

use crate::events::{ReadEvents, WriteEvents};
use crate::ids::IdGenerator;
use crate::outstream::{write_json, OutStream};
use crate::pagination::{Page, PageRequest};
use crate::serialization::{Serializable, SerializationRestriction};
use crate::validation::validate_field;
use crate::Repository;
use forum_core::{EntityRef, EntityType, Privilege, StatusCode, UserId, ValidatedFieldKind, VisitDetails};

impl<I: IdGenerator, R: ReadEvents, W: WriteEvents> Repository<I, R, W> {
    pub fn add_user(
        &self,
        name: &str,
        visit: VisitDetails,
        now: forum_core::Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        let status = validate_field(&self.config, ValidatedFieldKind::UserName, name);
        if !status.is_ok() {
            write_json(out, &status);
            return status;
        }

        let mut entities = match self.store.write() {
            Ok(g) => g,
            Err(_) => {
                let status = StatusCode::NotAllowed;
                write_json(out, &status);
                return status;
            }
        };
        if entities.users.name_taken(name) {
            let status = StatusCode::AlreadyExists;
            write_json(out, &status);
            return status;
        }

        let id: UserId = self.ids.generate();
        let user = forum_core::User::new(id, name.to_string(), now, visit);
        if entities.insert_user(user).is_err() {
            let status = StatusCode::AlreadyExists;
            write_json(out, &status);
            return status;
        }
        drop(entities);

        self.write_events.on_entity_created(
            EntityRef { entity_type: EntityType::User, id: id.as_uuid() },
            id,
            now,
        );
        write_json(out, &id);
        StatusCode::Ok
    }

    pub fn get_user_by_id(
        &self,
        requester: UserId,
        id: UserId,
        now: forum_core::Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        let entities = match self.store.read() {
            Ok(g) => g,
            Err(_) => {
                write_json(out, &StatusCode::NotFound);
                return StatusCode::NotFound;
            }
        };
        let Some(user) = entities.users.get(id) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        let restriction = SerializationRestriction {
            authorization: &self.authorization,
            entities: &entities,
            config: &self.config,
            user: requester,
            now,
        };
        write_json(out, &user.to_json(&restriction));
        StatusCode::Ok
    }

    pub fn get_user_by_name(
        &self,
        requester: UserId,
        name: &str,
        now: forum_core::Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        let entities = match self.store.read() {
            Ok(g) => g,
            Err(_) => {
                write_json(out, &StatusCode::NotFound);
                return StatusCode::NotFound;
            }
        };
        let Some(id) = entities.users.find_by_name(name) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        let user = entities.users.get(id).expect("id from find_by_name must resolve");
        let restriction = SerializationRestriction {
            authorization: &self.authorization,
            entities: &entities,
            config: &self.config,
            user: requester,
            now,
        };
        write_json(out, &user.to_json(&restriction));
        StatusCode::Ok
    }

    /// `changeUserName`, applying `ChangeOwnUserName`/`ChangeAnyUserName`
    /// depending on whether `requester == target`.
    pub fn change_user_name(
        &self,
        requester: UserId,
        target: UserId,
        new_name: &str,
        now: forum_core::Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        let status = validate_field(&self.config, ValidatedFieldKind::UserName, new_name);
        if !status.is_ok() {
            write_json(out, &status);
            return status;
        }

        let entities = match self.store.read() {
            Ok(g) => g,
            Err(_) => {
                write_json(out, &StatusCode::NotFound);
                return StatusCode::NotFound;
            }
        };
        let privilege = if requester == target { Privilege::ChangeOwnUserName } else { Privilege::ChangeAnyUserName };
        let authz = self
            .authorization
            .can_do_forum_wide(&self.config, requester, privilege, now);
        drop(entities);
        if authz != forum_core::AuthorizationStatus::Ok {
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
        if entities.users.name_taken(new_name) {
            let status = StatusCode::AlreadyExists;
            write_json(out, &status);
            return status;
        }
        let status = match entities.users.rename(target, new_name.to_string()) {
            Ok(()) => StatusCode::Ok,
            Err(_) => StatusCode::NotFound,
        };
        drop(entities);
        if status.is_ok() {
            self.write_events.on_entity_changed(
                EntityRef { entity_type: EntityType::User, id: target.as_uuid() },
                requester,
                now,
            );
        }
        write_json(out, &status);
        status
    }

    pub fn delete_user(
        &self,
        requester: UserId,
        target: UserId,
        now: forum_core::Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        let authz = self
            .authorization
            .can_do_forum_wide(&self.config, requester, Privilege::DeleteAnyUser, now);
        if authz != forum_core::AuthorizationStatus::Ok {
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
        let status = match entities.cascade_delete_user(target) {
            Ok(()) => StatusCode::Ok,
            Err(_) => StatusCode::NotFound,
        };
        drop(entities);
        if status.is_ok() {
            self.write_events.on_entity_deleted(
                EntityRef { entity_type: EntityType::User, id: target.as_uuid() },
                requester,
                now,
            );
        }
        write_json(out, &status);
        status
    }

    /// Consolidates `getUsersByCreated`/`getUsersByLastSeen`/`getUsersByName`
    /// (each previously ascending/descending pairs) into one paginated,
    /// sort-order-parametrized listing.
    pub fn list_users(
        &self,
        requester: UserId,
        order_by: UserOrderBy,
        page: PageRequest,
        now: forum_core::Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        let entities = match self.store.read() {
            Ok(g) => g,
            Err(_) => {
                write_json(out, &StatusCode::NotFound);
                return StatusCode::NotFound;
            }
        };
        let page = page.clamped(&self.config, "user");
        let total_count = entities.users.len();
        let restriction = SerializationRestriction {
            authorization: &self.authorization,
            entities: &entities,
            config: &self.config,
            user: requester,
            now,
        };

        let mut ids = Vec::with_capacity(page.limit());
        for n in page.offset()..page.offset() + page.limit() {
            let id = match (order_by, page.sort) {
                (UserOrderBy::Created, forum_core::SortOrder::Ascending) => entities.users.nth_by_created(n),
                (UserOrderBy::Created, forum_core::SortOrder::Descending) => {
                    entities.users.nth_by_created(total_count.saturating_sub(1 + n))
                }
                (UserOrderBy::LastSeen, forum_core::SortOrder::Descending) => entities.users.nth_by_last_seen_descending(n),
                (UserOrderBy::LastSeen, forum_core::SortOrder::Ascending) => {
                    entities.users.nth_by_last_seen_descending(total_count.saturating_sub(1 + n))
                }
                (UserOrderBy::Name, forum_core::SortOrder::Ascending) => entities.users.nth_by_name_ascending(n),
                (UserOrderBy::Name, forum_core::SortOrder::Descending) => entities.users.nth_by_name_descending(n),
                (UserOrderBy::ThreadCount, forum_core::SortOrder::Descending) => {
                    entities.users.nth_by_thread_count_descending(n)
                }
                (UserOrderBy::ThreadCount, forum_core::SortOrder::Ascending) => {
                    entities.users.nth_by_thread_count_descending(total_count.saturating_sub(1 + n))
                }
                (UserOrderBy::MessageCount, forum_core::SortOrder::Descending) => {
                    entities.users.nth_by_message_count_descending(n)
                }
                (UserOrderBy::MessageCount, forum_core::SortOrder::Ascending) => {
                    entities.users.nth_by_message_count_descending(total_count.saturating_sub(1 + n))
                }
            };
            match id {
                Some(id) => ids.push(id),
                None => break,
            }
        }

        let items: Vec<_> = ids
            .iter()
            .filter_map(|id| entities.users.get(*id))
            .map(|u| u.to_json(&restriction))
            .collect();
        let result = Page { items, page: page.page, page_size: page.page_size, total_count };
        write_json(out, &result);
        StatusCode::Ok
    }
}

#[derive(Debug, Clone, Copy)]
pub enum UserOrderBy {
    Created,
    LastSeen,
    Name,
    ThreadCount,
    MessageCount,
}

pub(crate) fn auth_status_to_code(status: forum_core::AuthorizationStatus) -> StatusCode {
    match status {
        forum_core::AuthorizationStatus::Ok => StatusCode::Ok,
        forum_core::AuthorizationStatus::NotAllowed => StatusCode::NotAllowed,
        forum_core::AuthorizationStatus::Throttled => StatusCode::Throttled,
    }
}
