//! Input validation for omni_sqlite
//!
//! Validates the host-side identifiers the extension writes into generated
//! SQL (the schema functions are installed into), so they can be emitted
//! unquoted.

use thiserror::Error;

/// Validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid identifier '{0}': {1}")]
    InvalidIdentifier(String, &'static str),

    #[error("Identifier '{0}' is too long (max {1} bytes)")]
    TooLong(String, usize),

    #[error("Identifier cannot be empty")]
    Empty,

    #[error("Reserved name: '{0}'")]
    Reserved(String),
}

/// Maximum identifier length in bytes (the host's NAMEDATALEN - 1)
pub const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Schema names the host keeps for itself
const RESERVED_NAMES: &[&str] = &["information_schema", "pg_catalog", "pg_toast"];

/// Prefix reserved for system schemas
const RESERVED_PREFIX: &str = "pg_";

/// Validate a schema name
///
/// Rules:
/// - Must be 1-63 bytes
/// - Only ASCII letters, digits, and underscore allowed
/// - Cannot start with a digit
/// - Cannot be a reserved name or start with `pg_`
/// - Case-insensitive reserved name check
pub fn validate_schema_name(name: &str) -> Result<(), ValidationError> {
    validate_identifier(name)?;

    let lower = name.to_ascii_lowercase();
    if RESERVED_NAMES.contains(&lower.as_str()) || lower.starts_with(RESERVED_PREFIX) {
        return Err(ValidationError::Reserved(name.to_string()));
    }

    Ok(())
}

/// Core identifier validation
fn validate_identifier(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::Empty);
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ValidationError::TooLong(name.to_string(), MAX_IDENTIFIER_LENGTH));
    }

    for (i, c) in name.chars().enumerate() {
        if !c.is_ascii_alphanumeric() && c != '_' {
            return Err(ValidationError::InvalidIdentifier(
                name.to_string(),
                "contains invalid characters (only letters, digits, and underscore allowed)",
            ));
        }
        if i == 0 && c.is_ascii_digit() {
            return Err(ValidationError::InvalidIdentifier(
                name.to_string(),
                "cannot start with a digit",
            ));
        }
    }

    Ok(())
}
