//! Per-user sliding-window request throttling (spec 4.6).
//!
//! One ring buffer of timestamps per `(user, bucket)`, stored in a
//! `DashMap` so concurrent requests from different users never contend
//! on the same shard lock.

use dashmap::DashMap;
use forum_core::{Privilege, ThrottleBucket, Timestamp, UserId};
use std::collections::VecDeque;

#[derive(Debug, Default)]
struct Window {
    hits: VecDeque<Timestamp>,
}

#[derive(Debug, Default)]
pub struct ThrottleStore {
    windows: DashMap<(UserId, ThrottleBucket), Window>,
}

impl ThrottleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a hit and reports whether it should be throttled.
    /// `NoThrottling` held by the user (checked by the caller via the
    /// resolver before reaching here) always short-circuits this, per
    /// spec 4.6's escape hatch - this type has no knowledge of privileges
    /// and only tracks the raw sliding window.
    pub fn record_and_check(
        &self,
        user: UserId,
        bucket: ThrottleBucket,
        now: Timestamp,
        max_count: u32,
        period_seconds: i64,
    ) -> bool {
        let mut window = self.windows.entry((user, bucket)).or_default();
        let cutoff = now - period_seconds;
        while window.hits.front().is_some_and(|&t| t < cutoff) {
            window.hits.pop_front();
        }
        window.hits.push_back(now);
        window.hits.len() as u32 > max_count
    }

    pub fn hit_count(&self, user: UserId, bucket: ThrottleBucket, now: Timestamp, period_seconds: i64) -> usize {
        let cutoff = now - period_seconds;
        self.windows
            .get(&(user, bucket))
            .map(|w| w.hits.iter().filter(|&&t| t >= cutoff).count())
            .unwrap_or(0)
    }
}

/// Forum-wide action -> throttle bucket mapping (spec 4.6's "new content"
/// vs "edit" vs "privilege-assignment" vs "vote" vs "subscribe" buckets).
pub fn bucket_for_privilege(privilege: Privilege) -> Option<ThrottleBucket> {
    use Privilege::*;
    match privilege {
        AddThread | AddThreadMessage | AddMessage | AddComment | AddDiscussionTag | AddDiscussionCategory => {
            Some(ThrottleBucket::NewContent)
        }
        ChangeOwnMessageContent | ChangeAnyMessageContent | ChangeDiscussionThreadName
        | ChangeDiscussionTagName | ChangeDiscussionCategoryName | ChangeDiscussionCategoryDescription => {
            Some(ThrottleBucket::EditContent)
        }
        AssignDiscussionThreadPrivilege
        | AssignDiscussionTagPrivilege
        | AssignDiscussionCategoryPrivilege
        | AssignForumWidePrivilege => Some(ThrottleBucket::EditPrivileges),
        UpVote | DownVote | ResetVote => Some(ThrottleBucket::Vote),
        SubscribeToThread | UnsubscribeFromThread => Some(ThrottleBucket::Subscribe),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_evicts_expired_hits() {
        let store = ThrottleStore::new();
        let user = UserId::new_v7();
        assert!(!store.record_and_check(user, ThrottleBucket::Vote, 0, 2, 60));
        assert!(!store.record_and_check(user, ThrottleBucket::Vote, 10, 2, 60));
        assert!(store.record_and_check(user, ThrottleBucket::Vote, 20, 2, 60));
        assert!(!store.record_and_check(user, ThrottleBucket::Vote, 200, 2, 60));
    }
}
