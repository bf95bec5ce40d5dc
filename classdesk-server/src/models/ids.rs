//! Identifier parsing for request bodies
//!
//! Bodies carry ids as strings so that an absent id and a malformed id can
//! produce different messages.

use uuid::Uuid;

use super::{require, ValidationError};

/// Parse a required UUID field.
pub fn parse_id(value: Option<&str>, field: &'static str) -> Result<Uuid, ValidationError> {
    let raw = require(value, field)?;
    Uuid::parse_str(raw).map_err(|_| ValidationError::InvalidFormat {
        field,
        reason: "invalid UUID format",
    })
}
