//! Discussion tag commands: creation, renaming, UI blob changes, deletion,
//! merging and attaching/detaching a tag from a thread.

use crate::commands::users::auth_status_to_code;
use crate::events::{ReadEvents, WriteEvents};
use crate::ids::IdGenerator;
use crate::outstream::{write_json, OutStream};
use crate::pagination::{Page, PageRequest};
use crate::serialization::{Serializable, SerializationRestriction};
use crate::validation::validate_field;
use crate::Repository;
use forum_core::{
    AuthorizationStatus, DiscussionTag, EntityRef, EntityType, Privilege, SortOrder, StatusCode, TagId, ThreadId,
    Timestamp, UserId, ValidatedFieldKind,
};

impl<I: IdGenerator, R: ReadEvents, W: WriteEvents> Repository<I, R, W> {
    pub fn add_tag(&self, creator: UserId, name: &str, now: Timestamp, out: &mut impl OutStream) -> StatusCode {
        let status = validate_field(&self.config, ValidatedFieldKind::TagName, name);
        if !status.is_ok() {
            write_json(out, &status);
            return status;
        }
        let authz = self.authorization.can_do_forum_wide(&self.config, creator, Privilege::AddDiscussionTag, now);
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
        if entities.tags.name_taken(name) {
            let status = StatusCode::AlreadyExists;
            write_json(out, &status);
            return status;
        }
        let id: TagId = self.ids.generate();
        let tag = DiscussionTag::new(id, name.to_string());
        if entities.tags.insert(tag).is_err() {
            let status = StatusCode::AlreadyExists;
            write_json(out, &status);
            return status;
        }
        drop(entities);

        self.write_events.on_entity_created(EntityRef { entity_type: EntityType::DiscussionTag, id: id.as_uuid() }, creator, now);
        write_json(out, &id);
        StatusCode::Ok
    }

    /// Consolidates `getDiscussionTags` (previously name-only, unpaginated)
    /// into a paginated, sort-order-parametrized listing matching
    /// `list_users`/`list_threads`.
    pub fn list_tags(
        &self,
        requester: UserId,
        order_by: TagOrderBy,
        page: PageRequest,
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
        let page = page.clamped(&self.config, "tag");
        let total_count = entities.tags.len();
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
                (TagOrderBy::Name, SortOrder::Ascending) => entities.tags.nth_by_name_ascending(n),
                (TagOrderBy::Name, SortOrder::Descending) => entities.tags.nth_by_name_descending(n),
                (TagOrderBy::ThreadCount, SortOrder::Descending) => entities.tags.nth_by_thread_count_descending(n),
                (TagOrderBy::ThreadCount, SortOrder::Ascending) => {
                    entities.tags.nth_by_thread_count_descending(total_count.saturating_sub(1 + n))
                }
                (TagOrderBy::MessageCount, SortOrder::Descending) => entities.tags.nth_by_message_count_descending(n),
                (TagOrderBy::MessageCount, SortOrder::Ascending) => {
                    entities.tags.nth_by_message_count_descending(total_count.saturating_sub(1 + n))
                }
            };
            match id {
                Some(id) => ids.push(id),
                None => break,
            }
        }

        let items: Vec<_> = ids
            .iter()
            .filter_map(|id| entities.tags.get(*id))
            .map(|t| t.to_json(&restriction))
            .collect();
        let result = Page { items, page: page.page, page_size: page.page_size, total_count };
        write_json(out, &result);
        StatusCode::Ok
    }

    pub fn change_tag_name(
        &self,
        requester: UserId,
        id: TagId,
        new_name: &str,
        now: Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        let status = validate_field(&self.config, ValidatedFieldKind::TagName, new_name);
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
        let authz = self
            .authorization
            .can_do_on_tag(&entities, &self.config, requester, id, Privilege::ChangeDiscussionTagName, now);
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
        if entities.tags.name_taken(new_name) {
            let status = StatusCode::AlreadyExists;
            write_json(out, &status);
            return status;
        }
        let status = match entities.tags.rename(id, new_name.to_string()) {
            Ok(()) => StatusCode::Ok,
            Err(_) => StatusCode::NotFound,
        };
        drop(entities);
        if status.is_ok() {
            self.write_events.on_entity_changed(EntityRef { entity_type: EntityType::DiscussionTag, id: id.as_uuid() }, requester, now);
        }
        write_json(out, &status);
        status
    }

    pub fn change_tag_ui_blob(
        &self,
        requester: UserId,
        id: TagId,
        blob: Vec<u8>,
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
        let authz = self
            .authorization
            .can_do_on_tag(&entities, &self.config, requester, id, Privilege::ChangeDiscussionTagName, now);
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
        let Some(tag) = entities.tags.get_mut(id) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        tag.ui_blob = blob;
        drop(entities);
        self.write_events.on_entity_changed(EntityRef { entity_type: EntityType::DiscussionTag, id: id.as_uuid() }, requester, now);
        write_json(out, &StatusCode::Ok);
        StatusCode::Ok
    }

    pub fn delete_tag(&self, requester: UserId, id: TagId, now: Timestamp, out: &mut impl OutStream) -> StatusCode {
        let entities = match self.store.read() {
            Ok(g) => g,
            Err(_) => {
                write_json(out, &StatusCode::NotFound);
                return StatusCode::NotFound;
            }
        };
        let authz = self
            .authorization
            .can_do_on_tag(&entities, &self.config, requester, id, Privilege::DeleteDiscussionTag, now);
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
        let Some(tag) = entities.tags.remove(id) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        for thread_id in &tag.threads {
            if let Some(thread) = entities.threads.get_mut(*thread_id) {
                thread.tags.remove(&id);
            }
        }
        for category_id in &tag.categories {
            if let Some(category) = entities.categories.get_mut(*category_id) {
                category.tags.remove(&id);
            }
        }
        drop(entities);
        self.write_events.on_entity_deleted(EntityRef { entity_type: EntityType::DiscussionTag, id: id.as_uuid() }, requester, now);
        write_json(out, &StatusCode::Ok);
        StatusCode::Ok
    }

    pub fn merge_tags(
        &self,
        requester: UserId,
        destination: TagId,
        source: TagId,
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
        let authz = self
            .authorization
            .can_do_on_tag(&entities, &self.config, requester, destination, Privilege::MergeDiscussionTags, now);
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
        let status = match entities.merge_discussion_tags(destination, source) {
            Ok(()) => StatusCode::Ok,
            Err(_) => StatusCode::NoEffect,
        };
        drop(entities);
        write_json(out, &status);
        status
    }

    pub fn add_tag_to_thread(
        &self,
        requester: UserId,
        thread: ThreadId,
        tag: TagId,
        now: Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        self.set_thread_tag(requester, thread, tag, true, now, out)
    }

    pub fn remove_tag_from_thread(
        &self,
        requester: UserId,
        thread: ThreadId,
        tag: TagId,
        now: Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        self.set_thread_tag(requester, thread, tag, false, now, out)
    }

    fn set_thread_tag(
        &self,
        requester: UserId,
        thread: ThreadId,
        tag: TagId,
        attach: bool,
        now: Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        let privilege = if attach { Privilege::AddDiscussionTagToThread } else { Privilege::RemoveDiscussionTagFromThread };
        let entities = match self.store.read() {
            Ok(g) => g,
            Err(_) => {
                write_json(out, &StatusCode::NotFound);
                return StatusCode::NotFound;
            }
        };
        let authz = self.authorization.can_do_on_thread(&entities, &self.config, requester, thread, privilege, now);
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
        if entities.tags.get(tag).is_none() || entities.threads.get(thread).is_none() {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        }
        let already_attached = entities.threads.get(thread).is_some_and(|t| t.tags.contains(&tag));
        let message_count = entities.threads.get(thread).map(|t| t.messages.len() as i64).unwrap_or(0);
        if let Some(thread_entity) = entities.threads.get_mut(thread) {
            if attach {
                thread_entity.tags.insert(tag);
            } else {
                thread_entity.tags.remove(&tag);
            }
        }
        if attach && !already_attached {
            entities.tags.attach_thread(tag, thread);
            entities.tags.adjust_message_count(tag, message_count);
        } else if !attach && already_attached {
            entities.tags.detach_thread(tag, &thread);
            entities.tags.adjust_message_count(tag, -message_count);
        }
        drop(entities);
        write_json(out, &StatusCode::Ok);
        StatusCode::Ok
    }
}

#[derive(Debug, Clone, Copy)]
pub enum TagOrderBy {
    Name,
    ThreadCount,
    MessageCount,
}
