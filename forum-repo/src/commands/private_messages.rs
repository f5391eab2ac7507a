//! Private message commands: sending a direct message between two users
//! and paginating a user's inbox/outbox.

use crate::events::{ReadEvents, WriteEvents};
use crate::ids::IdGenerator;
use crate::outstream::{write_json, OutStream};
use crate::pagination::{Page, PageRequest};
use crate::serialization::{Serializable, SerializationRestriction};
use crate::validation::validate_field;
use crate::Repository;
use forum_core::{
    Content, EntityRef, EntityType, PrivateMessage, PrivateMessageId, StatusCode, Timestamp, UserId,
    ValidatedFieldKind,
};

impl Serializable for PrivateMessage {
    fn to_json(&self, _restriction: &SerializationRestriction<'_>) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "source": self.source,
            "destination": self.destination,
            "created": self.created,
            "content": self.content.as_str(),
        })
    }
}

impl<I: IdGenerator, R: ReadEvents, W: WriteEvents> Repository<I, R, W> {
    pub fn send_private_message(
        &self,
        source: UserId,
        destination: UserId,
        content: &str,
        now: Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        let status = validate_field(&self.config, ValidatedFieldKind::MessageContent, content);
        if !status.is_ok() {
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
        if entities.users.get(source).is_none() || entities.users.get(destination).is_none() {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        }
        let id: PrivateMessageId = self.ids.generate();
        let message = PrivateMessage { id, source, destination, created: now, content: Content::from(content.to_string()) };
        entities.private_messages.insert(message);
        drop(entities);

        self.write_events.on_entity_created(
            EntityRef { entity_type: EntityType::PrivateMessage, id: id.as_uuid() },
            source,
            now,
        );
        write_json(out, &id);
        StatusCode::Ok
    }

    pub fn get_inbox(
        &self,
        requester: UserId,
        page: PageRequest,
        now: Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        let page = page.clamped(&self.config, "privatemessage");
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
        let ids = entities.private_messages.inbox(requester, page.offset(), page.limit());
        let items: Vec<_> = ids.iter().filter_map(|id| entities.private_messages.get(*id)).map(|m| m.to_json(&restriction)).collect();
        let total_count = items.len();
        write_json(out, &Page { items, page: page.page, page_size: page.page_size, total_count });
        StatusCode::Ok
    }

    pub fn get_outbox(
        &self,
        requester: UserId,
        page: PageRequest,
        now: Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        let page = page.clamped(&self.config, "privatemessage");
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
        let ids = entities.private_messages.outbox(requester, page.offset(), page.limit());
        let items: Vec<_> = ids.iter().filter_map(|id| entities.private_messages.get(*id)).map(|m| m.to_json(&restriction)).collect();
        let total_count = items.len();
        write_json(out, &Page { items, page: page.page, page_size: page.page_size, total_count });
        StatusCode::Ok
    }

    pub fn delete_private_message(
        &self,
        requester: UserId,
        id: PrivateMessageId,
        now: Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        let mut entities = match self.store.write() {
            Ok(g) => g,
            Err(_) => {
                write_json(out, &StatusCode::NotFound);
                return StatusCode::NotFound;
            }
        };
        let Some(message) = entities.private_messages.get(id) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        if message.source != requester && message.destination != requester {
            write_json(out, &StatusCode::NotAllowed);
            return StatusCode::NotAllowed;
        }
        entities.private_messages.remove(id);
        drop(entities);
        self.write_events.on_entity_deleted(
            EntityRef { entity_type: EntityType::PrivateMessage, id: id.as_uuid() },
            requester,
            now,
        );
        write_json(out, &StatusCode::Ok);
        StatusCode::Ok
    }
}
