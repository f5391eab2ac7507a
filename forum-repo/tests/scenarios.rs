//! Repository-level scenario tests driving the command surface the way a
//! real caller would: build a `Repository`, issue commands, read the
//! `StatusCode` and the JSON an `OutStream` captured.

use forum_authz::Authorization;
use forum_core::{
    now, CategoryId, EntityIdType, ForumConfig, Privilege, PrivilegeDuration, PrivilegeValue, SortOrder, StatusCode,
    UserId, VisitDetails,
};
use forum_repo::commands::threads::ThreadOrderBy;
use forum_repo::{NoOpObserver, OutStream, PageRequest, Repository, UuidV7Generator};
use serde_json::Value;

struct VecOutStream(Vec<u8>);

impl VecOutStream {
    fn new() -> Self {
        Self(Vec::new())
    }

    fn json(&self) -> Value {
        serde_json::from_slice(&self.0).expect("command output must be valid JSON")
    }
}

impl OutStream for VecOutStream {
    fn write_bytes(&mut self, bytes: &[u8]) {
        self.0.extend_from_slice(bytes);
    }
}

fn repo() -> Repository<UuidV7Generator, NoOpObserver, NoOpObserver> {
    Repository::new(
        ForumConfig::for_tests(),
        UuidV7Generator,
        NoOpObserver,
        NoOpObserver,
        Authorization::new(PrivilegeValue::new(0)),
    )
}

fn add_user(repo: &Repository<UuidV7Generator, NoOpObserver, NoOpObserver>, name: &str) -> UserId {
    let mut out = VecOutStream::new();
    let visit = VisitDetails::new([0; 16], "test-agent", 1024);
    let status = repo.add_user(name, visit, now(), &mut out);
    assert_eq!(status, StatusCode::Ok, "add_user({name}) failed: {:?}", out.json());
    let uuid: uuid::Uuid = serde_json::from_value(out.json()).unwrap();
    UserId::new(uuid)
}

#[test]
fn user_uniqueness() {
    let repo = repo();
    let _ = add_user(&repo, "alice");

    let mut out = VecOutStream::new();
    let visit = VisitDetails::new([0; 16], "test-agent", 1024);
    let status = repo.add_user("alice", visit, now(), &mut out);
    assert_eq!(status, StatusCode::AlreadyExists);
}

#[test]
fn cascade_delete_user_deletes_own_threads_and_messages() {
    let repo = repo();
    let alice = add_user(&repo, "alice");

    let mut out = VecOutStream::new();
    assert_eq!(repo.add_thread(alice, "hello world", now(), &mut out), StatusCode::Ok);
    let thread_id: uuid::Uuid = serde_json::from_value(out.json()).unwrap();
    let thread_id = forum_core::ThreadId::new(thread_id);

    let mut out = VecOutStream::new();
    assert_eq!(
        repo.add_message_in_thread(alice, thread_id, "first post", now(), &mut out),
        StatusCode::Ok
    );
    let message_id: uuid::Uuid = serde_json::from_value(out.json()).unwrap();
    let message_id = forum_core::MessageId::new(message_id);

    let mut out = VecOutStream::new();
    assert_eq!(repo.delete_user(alice, alice, now(), &mut out), StatusCode::Ok);

    let mut out = VecOutStream::new();
    let status = repo.get_thread_by_id(UserId::empty(), thread_id, now(), &mut out);
    assert_eq!(status, StatusCode::NotFound, "a user's own threads are deleted along with them");

    let mut out = VecOutStream::new();
    let status = repo.get_message(UserId::empty(), message_id, now(), &mut out);
    assert_eq!(status, StatusCode::NotFound, "a user's own messages are deleted along with them");
}

#[test]
fn category_reparent_cycle_rejected() {
    let repo = repo();
    let admin = add_user(&repo, "admin");

    let mk = |parent: Option<CategoryId>, name: &str| -> CategoryId {
        let mut out = VecOutStream::new();
        assert_eq!(repo.add_category(admin, name, parent, now(), &mut out), StatusCode::Ok);
        let uuid: uuid::Uuid = serde_json::from_value(out.json()).unwrap();
        CategoryId::new(uuid)
    };

    let root = mk(None, "root");
    let child = mk(Some(root), "child");
    let grandchild = mk(Some(child), "grandchild");

    // root -> grandchild would close the loop root -> child -> grandchild -> root.
    let mut out = VecOutStream::new();
    let status = repo.change_category_parent(admin, root, Some(grandchild), now(), &mut out);
    assert_eq!(status, StatusCode::CircularReferenceNotAllowed);

    // A non-cyclic reparent still succeeds.
    let mut out = VecOutStream::new();
    let status = repo.change_category_parent(admin, grandchild, None, now(), &mut out);
    assert_eq!(status, StatusCode::Ok);
}

#[test]
fn merge_threads_moves_messages_and_deletes_source() {
    let repo = repo();
    let alice = add_user(&repo, "alice");

    let mut out = VecOutStream::new();
    repo.add_thread(alice, "destination", now(), &mut out);
    let dest: uuid::Uuid = serde_json::from_value(out.json()).unwrap();
    let dest = forum_core::ThreadId::new(dest);

    let mut out = VecOutStream::new();
    repo.add_thread(alice, "source", now(), &mut out);
    let src: uuid::Uuid = serde_json::from_value(out.json()).unwrap();
    let src = forum_core::ThreadId::new(src);

    let mut out = VecOutStream::new();
    assert_eq!(repo.add_message_in_thread(alice, src, "moved along with the thread", now(), &mut out), StatusCode::Ok);

    let mut out = VecOutStream::new();
    assert_eq!(repo.merge_threads(alice, dest, src, now(), &mut out), StatusCode::Ok);

    let mut out = VecOutStream::new();
    let status = repo.get_thread_by_id(alice, src, now(), &mut out);
    assert_eq!(status, StatusCode::NotFound, "source thread must be gone after merge");

    let mut out = VecOutStream::new();
    let status = repo.list_messages_in_thread(
        alice,
        dest,
        PageRequest { page: 0, page_size: 25, sort: SortOrder::Ascending },
        now(),
        &mut out,
    );
    assert_eq!(status, StatusCode::Ok);
    let items = out.json()["items"].as_array().unwrap().len();
    assert_eq!(items, 1, "the merged message must now list under the destination thread");
}

#[test]
fn vote_reset_allowed_within_window_rejected_after() {
    let repo = repo();
    let alice = add_user(&repo, "alice");
    let bob = add_user(&repo, "bob");

    let mut out = VecOutStream::new();
    repo.add_thread(alice, "thread", now(), &mut out);
    let thread: uuid::Uuid = serde_json::from_value(out.json()).unwrap();
    let thread = forum_core::ThreadId::new(thread);

    let mut out = VecOutStream::new();
    repo.add_message_in_thread(alice, thread, "vote on me", now(), &mut out);
    let message: uuid::Uuid = serde_json::from_value(out.json()).unwrap();
    let message = forum_core::MessageId::new(message);

    let cast_at = now();
    let mut out = VecOutStream::new();
    assert_eq!(repo.vote_message(bob, message, true, cast_at, &mut out), StatusCode::Ok);

    let window = repo.config.reset_vote_expires_in_seconds;

    let mut out = VecOutStream::new();
    let status = repo.reset_vote(bob, message, cast_at + window - 1, &mut out);
    assert_eq!(status, StatusCode::Ok, "reset must still be allowed just inside the window");

    // Recast and let it age past the window this time.
    let mut out = VecOutStream::new();
    assert_eq!(repo.vote_message(bob, message, true, cast_at, &mut out), StatusCode::Ok);
    let mut out = VecOutStream::new();
    let status = repo.reset_vote(bob, message, cast_at + window + 1, &mut out);
    assert_eq!(status, StatusCode::NotAllowed, "reset must be rejected once the window has passed");
}

#[test]
fn self_vote_is_rejected() {
    let repo = repo();
    let alice = add_user(&repo, "alice");

    let mut out = VecOutStream::new();
    repo.add_thread(alice, "thread", now(), &mut out);
    let thread: uuid::Uuid = serde_json::from_value(out.json()).unwrap();
    let thread = forum_core::ThreadId::new(thread);

    let mut out = VecOutStream::new();
    repo.add_message_in_thread(alice, thread, "my own post", now(), &mut out);
    let message: uuid::Uuid = serde_json::from_value(out.json()).unwrap();
    let message = forum_core::MessageId::new(message);

    let mut out = VecOutStream::new();
    let status = repo.vote_message(alice, message, true, now(), &mut out);
    assert_eq!(status, StatusCode::NotAllowed);
}

#[test]
fn privilege_inheritance_thread_grant_unblocks_tag_gated_action() {
    let repo = repo();
    let admin = add_user(&repo, "admin");
    let alice = add_user(&repo, "alice");

    let mut out = VecOutStream::new();
    repo.add_tag(admin, "restricted", now(), &mut out);
    let tag: uuid::Uuid = serde_json::from_value(out.json()).unwrap();
    let tag = forum_core::TagId::new(tag);

    let mut out = VecOutStream::new();
    repo.add_thread(admin, "gated thread", now(), &mut out);
    let thread: uuid::Uuid = serde_json::from_value(out.json()).unwrap();
    let thread = forum_core::ThreadId::new(thread);

    let mut out = VecOutStream::new();
    assert_eq!(repo.add_tag_to_thread(admin, thread, tag, now(), &mut out), StatusCode::Ok);

    // Raise the tag's required threshold for posting above what the
    // logged-in-user default grants.
    let mut out = VecOutStream::new();
    let status = repo.change_required_privilege_for_thread(
        admin,
        thread,
        Privilege::AddMessage,
        Some(PrivilegeValue::new(10)),
        now(),
        &mut out,
    );
    assert_eq!(status, StatusCode::Ok);

    // Without a grant, alice is now blocked from posting in the thread.
    let mut out = VecOutStream::new();
    let status = repo.add_message_in_thread(alice, thread, "blocked by the tag threshold", now(), &mut out);
    assert_eq!(status, StatusCode::NotAllowed);

    // A thread-level grant alone, resolved through the scope chain, clears it.
    let mut out = VecOutStream::new();
    let status = repo.assign_discussion_thread_privilege(
        admin,
        alice,
        thread,
        PrivilegeValue::new(10),
        PrivilegeDuration::UNLIMITED,
        now(),
        &mut out,
    );
    assert_eq!(status, StatusCode::Ok);

    let mut out = VecOutStream::new();
    let status = repo.add_message_in_thread(alice, thread, "now allowed via the grant", now(), &mut out);
    assert_eq!(status, StatusCode::Ok);
}

#[test]
fn tag_merge_reassigns_thread_membership() {
    let repo = repo();
    let admin = add_user(&repo, "admin");

    let mut out = VecOutStream::new();
    repo.add_tag(admin, "dup-a", now(), &mut out);
    let dest: uuid::Uuid = serde_json::from_value(out.json()).unwrap();
    let dest = forum_core::TagId::new(dest);

    let mut out = VecOutStream::new();
    repo.add_tag(admin, "dup-b", now(), &mut out);
    let src: uuid::Uuid = serde_json::from_value(out.json()).unwrap();
    let src = forum_core::TagId::new(src);

    let mut out = VecOutStream::new();
    repo.add_thread(admin, "thread", now(), &mut out);
    let thread: uuid::Uuid = serde_json::from_value(out.json()).unwrap();
    let thread = forum_core::ThreadId::new(thread);

    let mut out = VecOutStream::new();
    assert_eq!(repo.add_tag_to_thread(admin, thread, src, now(), &mut out), StatusCode::Ok);

    let mut out = VecOutStream::new();
    assert_eq!(repo.merge_tags(admin, dest, src, now(), &mut out), StatusCode::Ok);

    let mut out = VecOutStream::new();
    assert_eq!(repo.get_thread_by_id(admin, thread, now(), &mut out), StatusCode::Ok);
    let tags = out.json()["tags"].as_array().unwrap().clone();
    assert_eq!(tags, vec![serde_json::to_value(dest).unwrap()], "thread must carry the destination tag, not the merged-away one");
}

#[test]
fn listing_pagination_respects_page_size() {
    let repo = repo();
    let admin = add_user(&repo, "admin");
    for n in 0..5 {
        let mut out = VecOutStream::new();
        assert_eq!(repo.add_thread(admin, &format!("thread {n}"), now(), &mut out), StatusCode::Ok);
    }

    let mut out = VecOutStream::new();
    let status = repo.list_threads(
        admin,
        ThreadOrderBy::Created,
        PageRequest { page: 0, page_size: 2, sort: SortOrder::Ascending },
        now(),
        &mut out,
    );
    assert_eq!(status, StatusCode::Ok);
    let json = out.json();
    assert_eq!(json["items"].as_array().unwrap().len(), 2);
    assert_eq!(json["total_count"], 5);
}
