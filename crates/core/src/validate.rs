//! Input validation for tool arguments.
//!
//! Validation happens before any HTTP call so malformed input never reaches
//! the Sync server.

use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;

/// Pattern accepted for resource names, also advertised in tool schemas.
pub const RESOURCE_NAME_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9 _.\-]{0,99}$";

static RESOURCE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(RESOURCE_NAME_PATTERN).unwrap());

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid {field}: '{value}' (letters, digits, spaces, '_', '.', '-', max 100 chars)")]
    ResourceName { field: &'static str, value: String },

    #[error("invalid {field}: '{value}' is not a UUID")]
    Uuid { field: &'static str, value: String },

    #[error("invalid cron expression '{value}': {reason}")]
    Cron { value: String, reason: String },
}

/// Validate a resource name (job, connection, user, workspace, ...).
pub fn resource_name(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if RESOURCE_NAME.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::ResourceName {
            field,
            value: value.to_string(),
        })
    }
}

/// Validate a UUID-shaped identifier (federation IDs, certificate serials).
pub fn uuid(field: &'static str, value: &str) -> Result<(), ValidationError> {
    uuid::Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|_| ValidationError::Uuid {
            field,
            value: value.to_string(),
        })
}

/// Validate a Sync schedule cron expression.
///
/// Sync accepts classic 5-field crontab lines; the `cron` crate wants a
/// seconds column, so 5-field input is normalized before parsing.
pub fn cron_expression(value: &str) -> Result<(), ValidationError> {
    let fields = value.split_whitespace().count();
    let normalized = match fields {
        5 => format!("0 {value}"),
        6 | 7 => value.to_string(),
        n => {
            return Err(ValidationError::Cron {
                value: value.to_string(),
                reason: format!("expected 5 to 7 fields, got {n}"),
            })
        }
    };

    cron::Schedule::from_str(&normalized)
        .map(|_| ())
        .map_err(|e| ValidationError::Cron {
            value: value.to_string(),
            reason: e.to_string(),
        })
}
