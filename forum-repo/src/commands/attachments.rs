//! Attachment commands: upload (with auto-approve based on privilege),
//! approval, detaching from a message, deletion, and listing the
//! moderation queue of unapproved uploads.

use crate::commands::users::auth_status_to_code;
use crate::events::{ReadEvents, WriteEvents};
use crate::ids::IdGenerator;
use crate::outstream::{write_json, OutStream};
use crate::serialization::{Serializable, SerializationRestriction};
use crate::Repository;
use forum_core::{
    Attachment, AttachmentId, AuthorizationStatus, EntityRef, EntityType, MessageId, Privilege, StatusCode,
    Timestamp, UserId,
};

impl<I: IdGenerator, R: ReadEvents, W: WriteEvents> Repository<I, R, W> {
    pub fn add_attachment(
        &self,
        creator: UserId,
        message: MessageId,
        name: &str,
        size: u64,
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
            creator,
            message,
            Privilege::AddAttachmentToMessage,
            now,
        );
        let auto_approve = self.authorization.can_do_on_message(
            &entities,
            &self.config,
            creator,
            message,
            Privilege::AutoApproveAttachmentUpload,
            now,
        ) == AuthorizationStatus::Ok;
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
        let id: AttachmentId = self.ids.generate();
        let mut attachment = Attachment::new(id, creator, name.to_string(), size, now);
        attachment.approved = auto_approve;
        attachment.messages.insert(message);
        entities.insert_attachment(attachment);
        if let Some(message_entity) = entities.messages.get_mut(message) {
            message_entity.attachments.insert(id);
        }
        drop(entities);

        self.write_events.on_entity_created(EntityRef { entity_type: EntityType::Attachment, id: id.as_uuid() }, creator, now);
        write_json(out, &id);
        StatusCode::Ok
    }

    pub fn get_attachment(
        &self,
        requester: UserId,
        id: AttachmentId,
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
        let Some(attachment) = entities.attachments.get(id) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        if !attachment.approved && attachment.creator != requester {
            let allowed = attachment.messages.iter().any(|message| {
                self.authorization.can_do_on_message(
                    &entities,
                    &self.config,
                    requester,
                    *message,
                    Privilege::ViewUnapproved,
                    now,
                ) == AuthorizationStatus::Ok
            });
            if !allowed {
                write_json(out, &StatusCode::Unauthorized);
                return StatusCode::Unauthorized;
            }
        }
        let restriction = SerializationRestriction {
            authorization: &self.authorization,
            entities: &entities,
            config: &self.config,
            user: requester,
            now,
        };
        write_json(out, &attachment.to_json(&restriction));
        StatusCode::Ok
    }

    pub fn list_unapproved_attachments(
        &self,
        requester: UserId,
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
            .attachments
            .unapproved()
            .iter()
            .filter_map(|id| entities.attachments.get(*id))
            .map(|a| a.to_json(&restriction))
            .collect();
        write_json(out, &items);
        StatusCode::Ok
    }

    pub fn approve_attachment(
        &self,
        requester: UserId,
        id: AttachmentId,
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
        let Some(attachment) = entities.attachments.get(id) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        let allowed = attachment.messages.iter().any(|message| {
            self.authorization.can_do_on_message(
                &entities,
                &self.config,
                requester,
                *message,
                Privilege::AutoApproveAttachment,
                now,
            ) == AuthorizationStatus::Ok
        });
        drop(entities);
        if !allowed {
            write_json(out, &StatusCode::Unauthorized);
            return StatusCode::Unauthorized;
        }

        let mut entities = match self.store.write() {
            Ok(g) => g,
            Err(_) => {
                write_json(out, &StatusCode::NotFound);
                return StatusCode::NotFound;
            }
        };
        let Some(attachment) = entities.attachments.get_mut(id) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        let status = if attachment.approved {
            StatusCode::NoEffect
        } else {
            attachment.approved = true;
            StatusCode::Ok
        };
        drop(entities);
        if status.is_ok() {
            self.write_events.on_entity_changed(EntityRef { entity_type: EntityType::Attachment, id: id.as_uuid() }, requester, now);
        }
        write_json(out, &status);
        status
    }

    pub fn remove_attachment_from_message(
        &self,
        requester: UserId,
        id: AttachmentId,
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
        let authz = self.authorization.can_do_on_message(
            &entities,
            &self.config,
            requester,
            message,
            Privilege::RemoveAttachmentFromMessage,
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
        if entities.attachments.get(id).is_none() {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        }
        if let Some(attachment) = entities.attachments.get_mut(id) {
            attachment.messages.remove(&message);
        }
        if let Some(message_entity) = entities.messages.get_mut(message) {
            message_entity.attachments.remove(&id);
        }
        drop(entities);
        write_json(out, &StatusCode::Ok);
        StatusCode::Ok
    }

    pub fn delete_attachment(
        &self,
        requester: UserId,
        id: AttachmentId,
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
        let Some(attachment) = entities.attachments.get(id) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        let allowed = attachment.creator == requester
            || attachment.messages.iter().any(|message| {
                self.authorization.can_do_on_message(
                    &entities,
                    &self.config,
                    requester,
                    *message,
                    Privilege::DeleteAttachment,
                    now,
                ) == AuthorizationStatus::Ok
            });
        drop(entities);
        if !allowed {
            write_json(out, &StatusCode::Unauthorized);
            return StatusCode::Unauthorized;
        }

        let mut entities = match self.store.write() {
            Ok(g) => g,
            Err(_) => {
                write_json(out, &StatusCode::NotFound);
                return StatusCode::NotFound;
            }
        };
        let Some(attachment) = entities.attachments.remove(id) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        for message in &attachment.messages {
            if let Some(message_entity) = entities.messages.get_mut(*message) {
                message_entity.attachments.remove(&id);
            }
        }
        drop(entities);
        self.write_events.on_entity_deleted(EntityRef { entity_type: EntityType::Attachment, id: id.as_uuid() }, requester, now);
        write_json(out, &StatusCode::Ok);
        StatusCode::Ok
    }
}
