//! Message comment commands: adding a remark to a message, marking it
//! solved, deleting it, and listing a message's comments.

use crate::commands::users::auth_status_to_code;
use crate::events::{ReadEvents, WriteEvents};
use crate::ids::IdGenerator;
use crate::outstream::{write_json, OutStream};
use crate::serialization::{Serializable, SerializationRestriction};
use crate::validation::validate_field;
use crate::Repository;
use forum_core::{
    AuthorizationStatus, CommentId, EntityRef, EntityType, MessageComment, MessageId, Privilege, StatusCode,
    Timestamp, UserId, ValidatedFieldKind,
};

impl<I: IdGenerator, R: ReadEvents, W: WriteEvents> Repository<I, R, W> {
    pub fn add_comment(
        &self,
        creator: UserId,
        message: MessageId,
        content: &str,
        now: Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        let status = validate_field(&self.config, ValidatedFieldKind::CommentContent, content);
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
        let authz = self.authorization.can_do_on_message(&entities, &self.config, creator, message, Privilege::AddComment, now);
        let message_exists = entities.messages.get(message).is_some();
        drop(entities);
        if !message_exists {
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
        let id: CommentId = self.ids.generate();
        let comment = MessageComment {
            id,
            parent_message: message,
            creator,
            created: now,
            content: forum_core::Content::from(content.to_string()),
            solved: false,
        };
        entities.comments.insert(comment);
        if let Some(message_entity) = entities.messages.get_mut(message) {
            message_entity.comments.push(id);
        }
        if let Some(user) = entities.users.get_mut(creator) {
            user.own_comments.push(id);
        }
        drop(entities);

        self.write_events.on_entity_created(
            EntityRef { entity_type: EntityType::MessageComment, id: id.as_uuid() },
            creator,
            now,
        );
        write_json(out, &id);
        StatusCode::Ok
    }

    pub fn get_comments_for_message(
        &self,
        requester: UserId,
        message: MessageId,
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
            Privilege::GetMessageComments,
            now,
        );
        if authz != AuthorizationStatus::Ok {
            let status = auth_status_to_code(authz);
            write_json(out, &status);
            return status;
        }
        let restriction = SerializationRestriction {
            authorization: &self.authorization,
            entities: &entities,
            config: &self.config,
            user: requester,
            now,
        };
        let items: Vec<_> = entities
            .comments
            .for_message(message)
            .iter()
            .filter_map(|id| entities.comments.get(*id))
            .map(|c| c.to_json(&restriction))
            .collect();
        write_json(out, &items);
        StatusCode::Ok
    }

    pub fn solve_comment(
        &self,
        requester: UserId,
        id: CommentId,
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
        let Some(comment) = entities.comments.get(id) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        let authz = self.authorization.can_do_on_message(
            &entities,
            &self.config,
            requester,
            comment.parent_message,
            Privilege::SolveComment,
            now,
        );
        let parent_message = comment.parent_message;
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
        let Some(comment) = entities.comments.get_mut(id) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        if !comment.solved {
            comment.solved = true;
            if let Some(message) = entities.messages.get_mut(parent_message) {
                message.solved_comments += 1;
            }
        }
        drop(entities);
        self.write_events.on_entity_changed(
            EntityRef { entity_type: EntityType::MessageComment, id: id.as_uuid() },
            requester,
            now,
        );
        write_json(out, &StatusCode::Ok);
        StatusCode::Ok
    }

    pub fn delete_comment(
        &self,
        requester: UserId,
        id: CommentId,
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
        let Some(comment) = entities.comments.get(id) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        if comment.creator != requester {
            write_json(out, &StatusCode::NotAllowed);
            return StatusCode::NotAllowed;
        }
        let parent_message = comment.parent_message;
        drop(entities);

        let mut entities = match self.store.write() {
            Ok(g) => g,
            Err(_) => {
                write_json(out, &StatusCode::NotFound);
                return StatusCode::NotFound;
            }
        };
        let Some(comment) = entities.comments.remove(id) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        if let Some(message) = entities.messages.get_mut(parent_message) {
            message.comments.retain(|c| *c != id);
            if comment.solved {
                message.solved_comments = message.solved_comments.saturating_sub(1);
            }
        }
        if let Some(user) = entities.users.get_mut(comment.creator) {
            user.own_comments.retain(|c| *c != id);
        }
        drop(entities);
        self.write_events.on_entity_deleted(
            EntityRef { entity_type: EntityType::MessageComment, id: id.as_uuid() },
            requester,
            now,
        );
        write_json(out, &StatusCode::Ok);
        StatusCode::Ok
    }
}
