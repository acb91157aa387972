//! Input validation for mutation payloads.
//!
//! Everything here runs before an optimistic change is applied, so a
//! rejected payload never touches the collection and never reaches the
//! backend.

use crate::error::SyncError;

/// Trim and bound a free-text field by character count. Returns the
/// trimmed value.
pub fn validate_bounded_string(
    value: &str,
    field: &'static str,
    min: usize,
    max: usize,
) -> Result<String, SyncError> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len < min {
        return Err(SyncError::Validation {
            field,
            reason: format!("must be at least {} character(s)", min),
        });
    }
    if len > max {
        return Err(SyncError::Validation {
            field,
            reason: format!("must be at most {} characters", max),
        });
    }
    Ok(trimmed.to_string())
}

/// Identifiers are opaque but must be shaped like identifiers: non-empty,
/// no whitespace, printable ASCII subset.
pub fn validate_id_slug(value: &str, field: &'static str) -> Result<(), SyncError> {
    if value.is_empty() {
        return Err(SyncError::Validation {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    let ok = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'));
    if !ok {
        return Err(SyncError::Validation {
            field,
            reason: format!("'{}' is not a valid identifier", value),
        });
    }
    Ok(())
}
