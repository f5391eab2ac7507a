//! Configuration types.
//!
//! One `ForumConfig`, read once at startup by the (out-of-scope) edge
//! process and threaded explicitly into every repository/authorization
//! constructor - no ambient globals, matching the "thread-local settings
//! become explicit parameters" design note.

use crate::{PrivilegeDuration, PrivilegeValue, ThrottleBucket, ValidatedFieldKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Min/max character-count bounds and a regex pattern for one validated
/// field kind (user names, thread names, message content, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValidationRule {
    pub min_length: usize,
    pub max_length: usize,
    /// Regex the field must match, in whatever dialect the deployment's
    /// `regex` crate build supports. Confirmed against locale data at
    /// deployment time, per spec 9's open question - not baked in here.
    pub pattern: String,
}

impl FieldValidationRule {
    pub fn new(min_length: usize, max_length: usize, pattern: impl Into<String>) -> Self {
        Self {
            min_length,
            max_length,
            pattern: pattern.into(),
        }
    }
}

/// `(max_count, period_seconds)` sliding-window throttle limit for one
/// bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleLimit {
    pub max_count: u32,
    pub period_seconds: i64,
}

/// Default privilege value+duration granted to a freshly-created user for
/// a specific forum-wide action (e.g. "new user creating a thread").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultPrivilege {
    pub value: PrivilegeValue,
    pub duration: PrivilegeDuration,
}

/// Page size bounds for one entity kind's paginated listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSizeLimit {
    pub default_size: u32,
    pub max_size: u32,
}

/// Master configuration struct. All values are required - no defaults
/// buried in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForumConfig {
    /// Keyed by `ValidatedFieldKind::as_str()` (TOML map keys must be
    /// strings, so the enum itself can't be a map key).
    pub field_rules: HashMap<String, FieldValidationRule>,
    /// Keyed by `ThrottleBucket::as_str()`.
    pub throttle_limits: HashMap<String, ThrottleLimit>,
    pub page_sizes: HashMap<String, PageSizeLimit>,
    /// Keyed by the forum-wide action name (e.g. `"add_thread"`,
    /// `"add_message"`) rather than `Privilege`, for the same reason.
    pub default_new_user_privileges: HashMap<String, DefaultPrivilege>,
    /// Seconds after a vote that `resetVoteMessage` remains allowed.
    pub reset_vote_expires_in_seconds: i64,
    /// Bound on `DiscussionThread.visitors_since_last_edit`.
    pub max_visitors_since_last_edit: usize,
    pub max_user_agent_length: usize,
}

impl ForumConfig {
    /// Parse a `ForumConfig` from TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn field_rule(&self, kind: ValidatedFieldKind) -> Option<&FieldValidationRule> {
        self.field_rules.get(kind.as_str())
    }

    pub fn throttle_limit(&self, bucket: ThrottleBucket) -> Option<ThrottleLimit> {
        self.throttle_limits.get(bucket.as_str()).copied()
    }

    pub fn page_size(&self, entity_kind: &str) -> Option<PageSizeLimit> {
        self.page_sizes.get(entity_kind).copied()
    }

    /// A conservative built-in configuration, useful for tests and as a
    /// documented starting point - not a silent runtime default, since
    /// nothing calls this implicitly.
    pub fn for_tests() -> Self {
        let mut field_rules = HashMap::new();
        field_rules.insert(
            ValidatedFieldKind::UserName.as_str().to_string(),
            FieldValidationRule::new(3, 32, r"^[\p{L}\p{N}_\-\. ]+$"),
        );
        field_rules.insert(
            ValidatedFieldKind::ThreadName.as_str().to_string(),
            FieldValidationRule::new(3, 128, r"^.+$"),
        );
        field_rules.insert(
            ValidatedFieldKind::TagName.as_str().to_string(),
            FieldValidationRule::new(2, 32, r"^[\p{L}\p{N}_\-]+$"),
        );
        field_rules.insert(
            ValidatedFieldKind::CategoryName.as_str().to_string(),
            FieldValidationRule::new(2, 64, r"^.+$"),
        );
        field_rules.insert(
            ValidatedFieldKind::MessageContent.as_str().to_string(),
            FieldValidationRule::new(1, 65536, r"^.+$"),
        );
        field_rules.insert(
            ValidatedFieldKind::CommentContent.as_str().to_string(),
            FieldValidationRule::new(1, 4096, r"^.+$"),
        );
        field_rules.insert(
            ValidatedFieldKind::UserInfo.as_str().to_string(),
            FieldValidationRule::new(0, 1024, r"^.*$"),
        );
        field_rules.insert(
            ValidatedFieldKind::UserTitle.as_str().to_string(),
            FieldValidationRule::new(0, 64, r"^.*$"),
        );
        field_rules.insert(
            ValidatedFieldKind::UserSignature.as_str().to_string(),
            FieldValidationRule::new(0, 256, r"^.*$"),
        );

        let mut throttle_limits = HashMap::new();
        throttle_limits.insert(
            ThrottleBucket::NewContent.as_str().to_string(),
            ThrottleLimit { max_count: 10, period_seconds: 60 },
        );
        throttle_limits.insert(
            ThrottleBucket::EditContent.as_str().to_string(),
            ThrottleLimit { max_count: 20, period_seconds: 60 },
        );
        throttle_limits.insert(
            ThrottleBucket::EditPrivileges.as_str().to_string(),
            ThrottleLimit { max_count: 30, period_seconds: 60 },
        );
        throttle_limits.insert(
            ThrottleBucket::Vote.as_str().to_string(),
            ThrottleLimit { max_count: 60, period_seconds: 60 },
        );
        throttle_limits.insert(
            ThrottleBucket::Subscribe.as_str().to_string(),
            ThrottleLimit { max_count: 60, period_seconds: 60 },
        );

        let mut page_sizes = HashMap::new();
        page_sizes.insert("thread".to_string(), PageSizeLimit { default_size: 25, max_size: 50 });
        page_sizes.insert("message".to_string(), PageSizeLimit { default_size: 25, max_size: 50 });
        page_sizes.insert("user".to_string(), PageSizeLimit { default_size: 25, max_size: 50 });
        page_sizes.insert("tag".to_string(), PageSizeLimit { default_size: 25, max_size: 50 });
        page_sizes.insert("category".to_string(), PageSizeLimit { default_size: 50, max_size: 100 });

        Self {
            field_rules,
            throttle_limits,
            page_sizes,
            default_new_user_privileges: HashMap::new(),
            reset_vote_expires_in_seconds: 600,
            max_visitors_since_last_edit: 1000,
            max_user_agent_length: 1024,
        }
    }
}
