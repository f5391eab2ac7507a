//! Discussion thread message commands: posting, editing, moving, voting
//! and the paginated per-thread listing (spec 4.4's message-visibility
//! batching is exposed here via `list_messages_in_thread`).

use crate::commands::users::auth_status_to_code;
use crate::events::{ReadEvents, WriteEvents};
use crate::ids::IdGenerator;
use crate::outstream::{write_json, OutStream};
use crate::pagination::{Page, PageRequest};
use crate::serialization::{Serializable, SerializationRestriction};
use crate::validation::validate_field;
use crate::Repository;
use forum_core::{
    AuthorizationStatus, Content, DiscussionThreadMessage, EntityRef, EntityType, MessageId, Privilege, StatusCode,
    ThreadId, Timestamp, UserId, ValidatedFieldKind, VoteState,
};

impl<I: IdGenerator, R: ReadEvents, W: WriteEvents> Repository<I, R, W> {
    pub fn add_message_in_thread(
        &self,
        creator: UserId,
        thread: ThreadId,
        content: &str,
        now: Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        let status = validate_field(&self.config, ValidatedFieldKind::MessageContent, content);
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
            .can_do_on_thread(&entities, &self.config, creator, thread, Privilege::AddMessage, now);
        let thread_exists = entities.threads.get(thread).is_some();
        let auto_approve = self
            .authorization
            .can_do_forum_wide(&self.config, creator, Privilege::AutoApproveMessage, now)
            == AuthorizationStatus::Ok;
        drop(entities);
        if !thread_exists {
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
        let id: MessageId = self.ids.generate();
        let mut message = DiscussionThreadMessage::new(id, creator, thread, Content::from(content.to_string()), now);
        message.approved = auto_approve;
        entities.messages.insert(message);
        entities.users.add_own_message(creator, id);
        entities.threads.push_message(thread, id, now);
        entities.adjust_thread_message_count_delta(thread, 1);
        drop(entities);

        self.write_events.on_entity_created(
            EntityRef { entity_type: EntityType::DiscussionThreadMessage, id: id.as_uuid() },
            creator,
            now,
        );
        write_json(out, &id);
        StatusCode::Ok
    }

    pub fn get_message(
        &self,
        requester: UserId,
        id: MessageId,
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
        let Some(message) = entities.messages.get(id) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        if !self.authorization.can_view_unapproved_message(&entities, requester, id, now) {
            write_json(out, &StatusCode::NotAllowed);
            return StatusCode::NotAllowed;
        }
        let restriction = SerializationRestriction {
            authorization: &self.authorization,
            entities: &entities,
            config: &self.config,
            user: requester,
            now,
        };
        write_json(out, &message.to_json(&restriction));
        StatusCode::Ok
    }

    pub fn change_message_content(
        &self,
        requester: UserId,
        id: MessageId,
        new_content: &str,
        now: Timestamp,
        out: &mut impl OutStream,
    ) -> StatusCode {
        let status = validate_field(&self.config, ValidatedFieldKind::MessageContent, new_content);
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
        let Some(message) = entities.messages.get(id) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        let privilege = if message.creator == requester {
            Privilege::ChangeOwnMessageContent
        } else {
            Privilege::ChangeAnyMessageContent
        };
        let authz = self.authorization.can_do_on_message(&entities, &self.config, requester, id, privilege, now);
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
        let Some(message) = entities.messages.get_mut(id) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        message.content = Content::from(new_content.to_string());
        message.last_updated = Some(forum_core::LastUpdate { by: requester, at: now, reason: None, ip: [0; 16] });
        let parent_thread = message.parent_thread;
        entities.threads.touch_activity(parent_thread, now);
        drop(entities);
        self.write_events.on_entity_changed(
            EntityRef { entity_type: EntityType::DiscussionThreadMessage, id: id.as_uuid() },
            requester,
            now,
        );
        write_json(out, &StatusCode::Ok);
        StatusCode::Ok
    }

    pub fn delete_message(
        &self,
        requester: UserId,
        id: MessageId,
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
        let Some(message) = entities.messages.get(id) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        let privilege = if message.creator == requester { Privilege::DeleteOwnMessage } else { Privilege::DeleteAnyMessage };
        let authz = self.authorization.can_do_on_message(&entities, &self.config, requester, id, privilege, now);
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
        let status = match entities.cascade_delete_message(id) {
            Ok(()) => StatusCode::Ok,
            Err(_) => StatusCode::NotFound,
        };
        drop(entities);
        if status.is_ok() {
            self.write_events.on_entity_deleted(
                EntityRef { entity_type: EntityType::DiscussionThreadMessage, id: id.as_uuid() },
                requester,
                now,
            );
        }
        write_json(out, &status);
        status
    }

    pub fn move_message(
        &self,
        requester: UserId,
        id: MessageId,
        new_thread: ThreadId,
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
            id,
            Privilege::MoveDiscussionThreadMessage,
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
        let status = match entities.move_discussion_thread_message(id, new_thread, now) {
            Ok(()) => StatusCode::Ok,
            Err(_) => StatusCode::NotFound,
        };
        drop(entities);
        if status.is_ok() {
            self.write_events.on_entity_changed(
                EntityRef { entity_type: EntityType::DiscussionThreadMessage, id: id.as_uuid() },
                requester,
                now,
            );
        }
        write_json(out, &status);
        status
    }

    /// `upVoteDiscussionThreadMessage`/`downVoteDiscussionThreadMessage`,
    /// consolidated on the vote direction.
    pub fn vote_message(
        &self,
        requester: UserId,
        id: MessageId,
        up: bool,
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
        let Some(message) = entities.messages.get(id) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        if message.creator == requester {
            write_json(out, &StatusCode::NotAllowed);
            return StatusCode::NotAllowed;
        }
        let privilege = if up { Privilege::UpVote } else { Privilege::DownVote };
        let authz = self.authorization.can_do_on_message(&entities, &self.config, requester, id, privilege, now);
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
        let Some(message) = entities.messages.get_mut(id) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        message.up_votes.remove(&requester);
        message.down_votes.remove(&requester);
        if up {
            message.up_votes.insert(requester, now);
        } else {
            message.down_votes.insert(requester, now);
        }
        let creator = message.creator;
        if let Some(author) = entities.users.get_mut(creator) {
            if up {
                author.up_votes_received += 1;
            } else {
                author.down_votes_received += 1;
            }
            author.vote_history.push(forum_core::VoteReceipt { message: id, voter: requester, up, at: now });
        }
        if let Some(voter) = entities.users.get_mut(requester) {
            voter.voted_messages.insert(id);
        }
        drop(entities);
        write_json(out, &StatusCode::Ok);
        StatusCode::Ok
    }

    /// `resetVoteDiscussionThreadMessage`: only allowed within
    /// `reset_vote_expires_in_seconds` of the vote being cast.
    pub fn reset_vote(
        &self,
        requester: UserId,
        id: MessageId,
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
        let Some(message) = entities.messages.get(id) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        let vote_cast_at = match message.vote_state(requester) {
            VoteState::Up => message.up_votes.get(&requester).copied(),
            VoteState::Down => message.down_votes.get(&requester).copied(),
            VoteState::None => None,
        };
        let Some(vote_cast_at) = vote_cast_at else {
            write_json(out, &StatusCode::NoEffect);
            return StatusCode::NoEffect;
        };
        if now - vote_cast_at > self.config.reset_vote_expires_in_seconds {
            write_json(out, &StatusCode::NotAllowed);
            return StatusCode::NotAllowed;
        }
        let authz = self.authorization.can_do_on_message(&entities, &self.config, requester, id, Privilege::ResetVote, now);
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
        let Some(message) = entities.messages.get_mut(id) else {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        };
        let was_up = message.up_votes.remove(&requester).is_some();
        let was_down = message.down_votes.remove(&requester).is_some();
        let creator = message.creator;
        if let Some(author) = entities.users.get_mut(creator) {
            if was_up {
                author.up_votes_received = author.up_votes_received.saturating_sub(1);
            }
            if was_down {
                author.down_votes_received = author.down_votes_received.saturating_sub(1);
            }
        }
        if let Some(voter) = entities.users.get_mut(requester) {
            voter.voted_messages.remove(&id);
        }
        drop(entities);
        write_json(out, &StatusCode::Ok);
        StatusCode::Ok
    }

    /// Paginated listing of one thread's messages, with per-message
    /// visibility resolved via the batched resolver call so the
    /// thread-level accumulation is computed once for the whole page.
    pub fn list_messages_in_thread(
        &self,
        requester: UserId,
        thread: ThreadId,
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
        if entities.threads.get(thread).is_none() {
            write_json(out, &StatusCode::NotFound);
            return StatusCode::NotFound;
        }
        let page = page.clamped(&self.config, "message");
        let total_count = entities.messages.count_for_thread(thread);
        let ids = entities.messages.page_for_thread(thread, page.offset(), page.limit());
        let visibility = self.authorization.message_visibility_batch(&entities, requester, &ids, now);
        let restriction = SerializationRestriction {
            authorization: &self.authorization,
            entities: &entities,
            config: &self.config,
            user: requester,
            now,
        };

        let items: Vec<_> = ids
            .iter()
            .zip(visibility.iter())
            .filter(|(_, v)| v.show_message)
            .filter_map(|(id, _)| entities.messages.get(*id))
            .map(|m| m.to_json(&restriction))
            .collect();
        let result = Page { items, page: page.page, page_size: page.page_size, total_count };
        write_json(out, &result);
        StatusCode::Ok
    }
}
