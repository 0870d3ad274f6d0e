//! Request validation for the mutating endpoints.
//!
//! Validation runs before any relational or ledger write; a rejection
//! here means the request had no side effects at all.

use super::errors::ApiError;

/// Upper bound on a business field, to keep asset payloads small.
pub const MAX_FIELD_LEN: usize = 1024;

/// Validate one required business field.
pub fn validate_field(name: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("{name} is required")));
    }
    if value.len() > MAX_FIELD_LEN {
        return Err(ApiError::validation(format!(
            "{name} cannot exceed {MAX_FIELD_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate the full record payload.
pub fn validate_record_payload(field1: &str, field2: &str) -> Result<(), ApiError> {
    validate_field("field1", field1)?;
    validate_field("field2", field2)
}
