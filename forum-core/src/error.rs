//! Error types for forum core operations.
//!
//! `StatusCode` (in `enums.rs`) carries expected command outcomes
//! (validation/authorization/domain results) as plain data written into the
//! response JSON. The error types here are for genuinely unexpected
//! failures - a poisoned lock, a malformed config, a regex that failed to
//! compile - that abort the in-flight transaction instead of producing a
//! status.

use crate::EntityType;
use thiserror::Error;
use uuid::Uuid;

/// Entity-store errors: lock poisoning, index inconsistency caught by a
/// debug assertion, batch-mode misuse.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("entity not found: {entity_type:?} with id {id}")]
    NotFound { entity_type: EntityType, id: Uuid },

    #[error("index error on {index_name}: {reason}")]
    IndexError { index_name: String, reason: String },

    #[error("store lock poisoned")]
    LockPoisoned,

    #[error("operation not permitted during batch-insert mode: {reason}")]
    BatchInsertActive { reason: String },
}

/// Input-validation errors (field shape, not authorization).
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("value too long for {field}: {len} chars (max {max})")]
    TooLong { field: String, len: usize, max: usize },

    #[error("value too short for {field}: {len} chars (min {min})")]
    TooShort { field: String, len: usize, min: usize },
}

/// Authorization/privilege-resolution errors (distinct from the plain
/// `AuthorizationStatus::NotAllowed`/`Throttled` outcomes, which are
/// expected results, not errors).
#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("unknown privilege scope for entity {entity_type:?}")]
    UnknownScope { entity_type: EntityType },

    #[error("throttle bucket state poisoned")]
    ThrottleStatePoisoned,
}

/// Configuration errors, surfaced at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("failed to compile regex for {field}: {reason}")]
    InvalidRegex { field: String, reason: String },
}

/// Master error type for all forum-core operations.
#[derive(Debug, Error)]
pub enum ForumError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("authorization error: {0}")]
    Authz(#[from] AuthzError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for forum-core operations.
pub type ForumResult<T> = Result<T, ForumError>;
