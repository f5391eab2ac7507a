//! Discussion category commands: creation, renaming, description and
//! parent changes (cycle-checked), display order, deletion, and listing
//! a category's children.

use crate::commands::users::auth_status_to_code;
use crate::events::{ReadEvents, WriteEvents};
use crate::ids::IdGenerator;
use crate::outstream::{write_json, OutStream};
use crate::serialization::{Serializable, SerializationRestriction};
use crate::validation::validate_field;
use crate::Repository;
use forum_core::{
    AuthorizationStatus, CategoryId, DiscussionCategory, EntityRef, EntityType, Privilege, StatusCode, Timestamp,
    UserId, ValidatedFieldKind,
};

impl<I: IdGenerator, R: ReadEvents, W: WriteEvents> Repository<I, R, W> {
    pub fn add_category(
        &self,
        creator: UserId,
        name: &str,
        parent: Option<CategoryId>,
        now: Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        let status = validate_field(&self.config, ValidatedFieldKind::CategoryName, name);
        if !status.is_ok() {
            write_json(out, &status);
            return status;
        }
        let authz = self.authorization.can_do_forum_wide(&self.config, creator, Privilege::AddDiscussionCategory, now);
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
        if let Some(parent_id) = parent {
            if entities.categories.get(parent_id).is_none() {
                write_json(out, &StatusCode::NotFound);
                return StatusCode::NotFound;
            }
        }
        if entities.categories.name_taken_under(parent, name) {
            let status = StatusCode::AlreadyExists;
            write_json(out, &status);
            return status;
        }
        let id: CategoryId = self.ids.generate();
        let category = DiscussionCategory::new(id, name.to_string(), parent);
        if entities.categories.insert(category).is_err() {
            let status = StatusCode::AlreadyExists;
            write_json(out, &status);
            return status;
        }
        drop(entities);

        self.write_events.on_entity_created(
            EntityRef { entity_type: EntityType::DiscussionCategory, id: id.as_uuid() },
            creator,
            now,
        );
        write_json(out, &id);
        StatusCode::Ok
    }

    pub fn get_category_by_id(
        &self,
        requester: UserId,
        id: CategoryId,
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
        let Some(category) = entities.categories.get(id) else {
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
        write_json(out, &category.to_json(&restriction));
        StatusCode::Ok
    }

    pub fn children_of_category(
        &self,
        requester: UserId,
        parent: Option<CategoryId>,
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
        let restriction = SerializationRestriction {
            authorization: &self.authorization,
            entities: &entities,
            config: &self.config,
            user: requester,
            now,
        };
        let items: Vec<_> = entities
            .categories
            .children_of(parent)
            .iter()
            .filter_map(|id| entities.categories.get(*id))
            .map(|c| c.to_json(&restriction))
            .collect();
        write_json(out, &items);
        StatusCode::Ok
    }

    pub fn change_category_name(
        &self,
        requester: UserId,
        id: CategoryId,
        new_name: &str,
        now: Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        let status = validate_field(&self.config, ValidatedFieldKind::CategoryName, new_name);
        if !status.is_ok() {
            write_json(out, &status);
            return status;
        }
        self.change_category(
            requester,
            id,
            Privilege::ChangeDiscussionCategoryName,
            now,
            out,
            |entities| entities.categories.rename(id, new_name.to_string()),
        )
    }

    pub fn change_category_description(
        &self,
        requester: UserId,
        id: CategoryId,
        description: Option<String>,
        now: Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        self.change_category(
            requester,
            id,
            Privilege::ChangeDiscussionCategoryDescription,
            now,
            out,
            |entities| {
                let Some(category) = entities.categories.get_mut(id) else {
                    return Err(forum_core::StoreError::NotFound {
                        entity_type: EntityType::DiscussionCategory,
                        id: id.as_uuid(),
                    });
                };
                category.description = description;
                Ok(())
            },
        )
    }

    pub fn change_category_display_order(
        &self,
        requester: UserId,
        id: CategoryId,
        order: u16,
        now: Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        self.change_category(
            requester,
            id,
            Privilege::ChangeDiscussionCategoryDisplayOrder,
            now,
            out,
            |entities| {
                if entities.categories.get(id).is_none() {
                    return Err(forum_core::StoreError::NotFound {
                        entity_type: EntityType::DiscussionCategory,
                        id: id.as_uuid(),
                    });
                }
                entities.categories.set_display_order(id, order);
                Ok(())
            },
        )
    }

    pub fn change_category_parent(
        &self,
        requester: UserId,
        id: CategoryId,
        new_parent: Option<CategoryId>,
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
        let authz = self.authorization.can_do_on_category(
            &entities,
            &self.config,
            requester,
            id,
            Privilege::ChangeDiscussionCategoryParent,
            now,
        );
        let cycle = new_parent.is_some_and(|p| entities.would_create_category_cycle(id, p));
        drop(entities);
        if authz != AuthorizationStatus::Ok {
            let status = auth_status_to_code(authz);
            write_json(out, &status);
            return status;
        }
        if cycle {
            let status = StatusCode::CircularReferenceNotAllowed;
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
        let status = match entities.categories.reparent(id, new_parent) {
            Ok(()) => StatusCode::Ok,
            Err(_) => StatusCode::NotFound,
        };
        drop(entities);
        if status.is_ok() {
            self.write_events.on_entity_changed(
                EntityRef { entity_type: EntityType::DiscussionCategory, id: id.as_uuid() },
                requester,
                now,
            );
        }
        write_json(out, &status);
        status
    }

    fn change_category(
        &self,
        requester: UserId,
        id: CategoryId,
        privilege: Privilege,
        now: Timestamp,
        out: &mut impl OutStream,
        apply: impl FnOnce(&mut forum_store::EntityCollection) -> Result<(), forum_core::StoreError>,
    ) -> StatusCode {
        let entities = match self.store.read() {
            Ok(g) => g,
            Err(_) => {
                write_json(out, &StatusCode::NotFound);
                return StatusCode::NotFound;
            }
        };
        let authz = self.authorization.can_do_on_category(&entities, &self.config, requester, id, privilege, now);
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
        let status = match apply(&mut entities) {
            Ok(()) => StatusCode::Ok,
            Err(_) => StatusCode::NotFound,
        };
        drop(entities);
        if status.is_ok() {
            self.write_events.on_entity_changed(
                EntityRef { entity_type: EntityType::DiscussionCategory, id: id.as_uuid() },
                requester,
                now,
            );
        }
        write_json(out, &status);
        status
    }

    pub fn delete_category(
        &self,
        requester: UserId,
        id: CategoryId,
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
        let authz = self.authorization.can_do_on_category(
            &entities,
            &self.config,
            requester,
            id,
            Privilege::DeleteDiscussionCategory,
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
        let Some(category) = entities.categories.remove(id) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        for thread_id in category.direct_threads.keys() {
            if let Some(thread) = entities.threads.get_mut(*thread_id) {
                thread.categories.remove(&id);
            }
        }
        for tag_id in &category.tags {
            if let Some(tag) = entities.tags.get_mut(*tag_id) {
                tag.categories.remove(&id);
            }
        }
        drop(entities);
        self.write_events.on_entity_deleted(
            EntityRef { entity_type: EntityType::DiscussionCategory, id: id.as_uuid() },
            requester,
            now,
        );
        write_json(out, &StatusCode::Ok);
        StatusCode::Ok
    }
}
