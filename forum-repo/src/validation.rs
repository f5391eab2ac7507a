//! Input-shape validation against `ForumConfig`'s per-field rules
//! (length bounds + regex), producing the `StatusCode` variant a command
//! should return rather than an error - a too-long title is an expected,
//! client-correctable outcome, not a `ForumError`.

use forum_core::{StatusCode, ValidatedFieldKind};
use regex::Regex;

pub fn validate_field(
    config: &forum_core::ForumConfig,
    kind: ValidatedFieldKind,
    value: &str,
) -> StatusCode {
    let Some(rule) = config.field_rule(kind) else {
        return StatusCode::Ok;
    };
    let len = value.chars().count();
    if len < rule.min_length {
        return StatusCode::ValueTooShort;
    }
    if len > rule.max_length {
        return StatusCode::ValueTooLong;
    }
    match Regex::new(&rule.pattern) {
        Ok(re) if !re.is_match(value) => StatusCode::InvalidParameters,
        Ok(_) => StatusCode::Ok,
        Err(err) => {
            tracing::warn!(%err, pattern = %rule.pattern, "field validation pattern failed to compile");
            StatusCode::Ok
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_too_short_name() {
        let config = forum_core::ForumConfig::for_tests();
        assert_eq!(validate_field(&config, ValidatedFieldKind::UserName, "ab"), StatusCode::ValueTooShort);
    }

    #[test]
    fn accepts_well_formed_name() {
        let config = forum_core::ForumConfig::for_tests();
        assert_eq!(validate_field(&config, ValidatedFieldKind::UserName, "alice"), StatusCode::Ok);
    }
}
