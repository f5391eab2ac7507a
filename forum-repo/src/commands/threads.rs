//! Discussion thread commands: creation, renaming, pin order, deletion,
//! merging, subscription and the paginated listing orders.

use crate::commands::users::auth_status_to_code;
use crate::events::{ReadEvents, WriteEvents};
use crate::ids::IdGenerator;
use crate::outstream::{write_json, OutStream};
use crate::pagination::{Page, PageRequest};
use crate::serialization::{Serializable, SerializationRestriction};
use crate::validation::validate_field;
use crate::Repository;
use forum_core::{
    AuthorizationStatus, DiscussionThread, EntityRef, EntityType, Privilege, SortOrder, StatusCode, ThreadId,
    Timestamp, UserId, ValidatedFieldKind,
};

impl<I: IdGenerator, R: ReadEvents, W: WriteEvents> Repository<I, R, W> {
    pub fn add_thread(
        &self,
        creator: UserId,
        name: &str,
        now: Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        let status = validate_field(&self.config, ValidatedFieldKind::ThreadName, name);
        if !status.is_ok() {
            write_json(out, &status);
            return status;
        }
        let authz = self.authorization.can_do_forum_wide(&self.config, creator, Privilege::AddThread, now);
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
        let id: ThreadId = self.ids.generate();
        let mut thread = DiscussionThread::new(id, creator, name.to_string(), now);
        let auto_approve = self
            .authorization
            .can_do_forum_wide(&self.config, creator, Privilege::AutoApproveThread, now)
            == AuthorizationStatus::Ok;
        thread.approved = auto_approve;
        entities.insert_thread(thread);
        entities.users.add_own_thread(creator, id);
        drop(entities);

        self.write_events.on_entity_created(
            EntityRef { entity_type: EntityType::DiscussionThread, id: id.as_uuid() },
            creator,
            now,
        );
        write_json(out, &id);
        StatusCode::Ok
    }

    pub fn get_thread_by_id(
        &self,
        requester: UserId,
        id: ThreadId,
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
        let Some(thread) = entities.threads.get(id) else {
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
        write_json(out, &thread.to_json(&restriction));
        self.store.apply_deferred(vec![forum_store::DeferredWrite::TouchThreadActivity { thread: id, at: now }]).ok();
        StatusCode::Ok
    }

    pub fn change_thread_name(
        &self,
        requester: UserId,
        id: ThreadId,
        new_name: &str,
        now: Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        let status = validate_field(&self.config, ValidatedFieldKind::ThreadName, new_name);
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
            .can_do_on_thread(&entities, &self.config, requester, id, Privilege::ChangeDiscussionThreadName, now);
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
        let status = match entities.threads.rename(id, new_name.to_string()) {
            Ok(()) => StatusCode::Ok,
            Err(_) => StatusCode::NotFound,
        };
        drop(entities);
        if status.is_ok() {
            self.write_events.on_entity_changed(
                EntityRef { entity_type: EntityType::DiscussionThread, id: id.as_uuid() },
                requester,
                now,
            );
        }
        write_json(out, &status);
        status
    }

    pub fn change_thread_pin_display_order(
        &self,
        requester: UserId,
        id: ThreadId,
        order: u16,
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
            id,
            Privilege::ChangeDiscussionThreadPinDisplayOrder,
            now,
        );
        let exists = entities.threads.get(id).is_some();
        drop(entities);
        if !exists {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        }
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
        entities.threads.set_pin_order(id, order);
        drop(entities);
        self.write_events.on_entity_changed(
            EntityRef { entity_type: EntityType::DiscussionThread, id: id.as_uuid() },
            requester,
            now,
        );
        write_json(out, &StatusCode::Ok);
        StatusCode::Ok
    }

    pub fn delete_thread(
        &self,
        requester: UserId,
        id: ThreadId,
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
            .can_do_on_thread(&entities, &self.config, requester, id, Privilege::DeleteDiscussionThread, now);
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
        let status = match entities.cascade_delete_thread(id) {
            Ok(()) => StatusCode::Ok,
            Err(_) => StatusCode::NotFound,
        };
        drop(entities);
        if status.is_ok() {
            self.write_events.on_entity_deleted(
                EntityRef { entity_type: EntityType::DiscussionThread, id: id.as_uuid() },
                requester,
                now,
            );
        }
        write_json(out, &status);
        status
    }

    pub fn merge_threads(
        &self,
        requester: UserId,
        destination: ThreadId,
        source: ThreadId,
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
            destination,
            Privilege::MergeDiscussionThreads,
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
        let status = match entities.merge_discussion_threads(destination, source) {
            Ok(()) => StatusCode::Ok,
            Err(_) => StatusCode::NoEffect,
        };
        drop(entities);
        if status.is_ok() {
            self.write_events.on_entity_deleted(
                EntityRef { entity_type: EntityType::DiscussionThread, id: source.as_uuid() },
                requester,
                now,
            );
            self.write_events.on_entity_changed(
                EntityRef { entity_type: EntityType::DiscussionThread, id: destination.as_uuid() },
                requester,
                now,
            );
        }
        write_json(out, &status);
        status
    }

    pub fn subscribe_to_thread(
        &self,
        requester: UserId,
        id: ThreadId,
        now: Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        self.set_subscription(requester, id, true, Privilege::SubscribeToThread, now, out)
    }

    pub fn unsubscribe_from_thread(
        &self,
        requester: UserId,
        id: ThreadId,
        now: Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        self.set_subscription(requester, id, false, Privilege::UnsubscribeFromThread, now, out)
    }

    fn set_subscription(
        &self,
        requester: UserId,
        id: ThreadId,
        subscribe: bool,
        privilege: Privilege,
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
        let authz = self.authorization.can_do_on_thread(&entities, &self.config, requester, id, privilege, now);
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
        let Some(thread) = entities.threads.get_mut(id) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        if subscribe {
            thread.subscribed_users.insert(requester);
        } else {
            thread.subscribed_users.remove(&requester);
        }
        if let Some(user) = entities.users.get_mut(requester) {
            if subscribe {
                user.subscribed_threads.insert(id);
            } else {
                user.subscribed_threads.remove(&id);
            }
        }
        write_json(out, &StatusCode::Ok);
        StatusCode::Ok
    }

    /// Consolidates `getDiscussionThreadsByCreated/ByLastUpdated/ByName`
    /// (each previously ascending/descending pairs) into one paginated
    /// listing.
    pub fn list_threads(
        &self,
        requester: UserId,
        order_by: ThreadOrderBy,
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
        let page = page.clamped(&self.config, "thread");
        let total_count = entities.threads.len();
        let restriction = SerializationRestriction {
            authorization: &self.authorization,
            entities: &entities,
            config: &self.config,
            user: requester,
            now,
        };

        let mut ids = Vec::with_capacity(page.limit());
        for n in page.offset()..page.offset() + page.limit() {
            let id = match order_by {
                ThreadOrderBy::LatestActivity => match page.sort {
                    SortOrder::Descending => entities.threads.nth_by_latest_activity_descending(n),
                    SortOrder::Ascending => {
                        entities.threads.nth_by_latest_activity_descending(total_count.saturating_sub(1 + n))
                    }
                },
                ThreadOrderBy::MessageCount => match page.sort {
                    SortOrder::Descending => entities.threads.nth_by_message_count_descending(n),
                    SortOrder::Ascending => {
                        entities.threads.nth_by_message_count_descending(total_count.saturating_sub(1 + n))
                    }
                },
                ThreadOrderBy::LatestMessageCreated => match page.sort {
                    SortOrder::Descending => entities.threads.nth_by_latest_message_created_descending(n),
                    SortOrder::Ascending => {
                        entities.threads.nth_by_latest_message_created_descending(total_count.saturating_sub(1 + n))
                    }
                },
                ThreadOrderBy::Created | ThreadOrderBy::Name => None,
            };
            match id {
                Some(id) => ids.push(id),
                None => break,
            }
        }
        if matches!(order_by, ThreadOrderBy::Created | ThreadOrderBy::Name) {
            let all: Vec<ThreadId> = match order_by {
                ThreadOrderBy::Created => {
                    let mut v: Vec<_> = entities.threads.iter().collect();
                    v.sort_by_key(|t| t.created);
                    if matches!(page.sort, SortOrder::Descending) {
                        v.reverse();
                    }
                    v.into_iter().map(|t| t.id).collect()
                }
                ThreadOrderBy::Name => {
                    let mut v: Vec<_> = entities.threads.iter().collect();
                    v.sort_by(|a, b| a.name.cmp(&b.name));
                    if matches!(page.sort, SortOrder::Descending) {
                        v.reverse();
                    }
                    v.into_iter().map(|t| t.id).collect()
                }
                ThreadOrderBy::LatestActivity => unreachable!(),
            };
            ids = all.into_iter().skip(page.offset()).take(page.limit()).collect();
        }

        let items: Vec<_> = ids
            .iter()
            .filter_map(|id| entities.threads.get(*id))
            .map(|t| t.to_json(&restriction))
            .collect();
        let result = Page { items, page: page.page, page_size: page.page_size, total_count };
        write_json(out, &result);
        StatusCode::Ok
    }

    /// `getDiscussionThreadsOfUser`: every thread the given user authored.
    pub fn threads_of_user(
        &self,
        requester: UserId,
        user: UserId,
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
        let page = page.clamped(&self.config, "thread");
        let restriction = SerializationRestriction {
            authorization: &self.authorization,
            entities: &entities,
            config: &self.config,
            user: requester,
            now,
        };
        let Some(author) = entities.users.get(user) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        let total_count = author.own_threads.len();
        let items: Vec<_> = author
            .own_threads
            .iter()
            .skip(page.offset())
            .take(page.limit())
            .filter_map(|id| entities.threads.get(*id))
            .map(|t| t.to_json(&restriction))
            .collect();
        let result = Page { items, page: page.page, page_size: page.page_size, total_count };
        write_json(out, &result);
        StatusCode::Ok
    }

    /// `getDiscussionThreadsWithTag`: every thread carrying the given tag.
    pub fn threads_with_tag(
        &self,
        requester: UserId,
        tag: forum_core::TagId,
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
        let page = page.clamped(&self.config, "thread");
        let restriction = SerializationRestriction {
            authorization: &self.authorization,
            entities: &entities,
            config: &self.config,
            user: requester,
            now,
        };
        let Some(tag_entity) = entities.tags.get(tag) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        let total_count = tag_entity.threads.len();
        let items: Vec<_> = tag_entity
            .threads
            .iter()
            .skip(page.offset())
            .take(page.limit())
            .filter_map(|id| entities.threads.get(*id))
            .map(|t| t.to_json(&restriction))
            .collect();
        let result = Page { items, page: page.page, page_size: page.page_size, total_count };
        write_json(out, &result);
        StatusCode::Ok
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ThreadOrderBy {
    Created,
    LatestActivity,
    Name,
    MessageCount,
    LatestMessageCreated,
}
