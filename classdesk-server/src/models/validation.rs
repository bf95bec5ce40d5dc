//! Validation error types

use std::fmt;

/// Validation error for request fields
#[derive(Debug, Clone)]
pub enum ValidationError {
    /// Required field absent from the request
    Missing { field: &'static str },

    /// Field is present but blank
    Empty { field: &'static str },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// String doesn't match required format (e.g., slug, email, UUID)
    InvalidFormat { field: &'static str, reason: &'static str },

    /// Numeric field below its lower bound
    BelowMinimum { field: &'static str, min: i64 },

    /// Invalid enum variant
    InvalidVariant { field: &'static str, value: String },

    /// Request body could not be parsed
    Body { message: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { field } => write!(f, "{} is required", field),
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::InvalidFormat { field, reason } => {
                write!(f, "{}: {}", field, reason)
            }
            Self::BelowMinimum { field, min } => {
                write!(f, "{} must be at least {}", field, min)
            }
            Self::InvalidVariant { field, value } => {
                write!(f, "invalid {} value: '{}'", field, value)
            }
            Self::Body { message } => write!(f, "invalid request body: {}", message),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Require an optional field to be present and non-blank.
///
/// Missing and whitespace-only values both report as missing, which is what
/// the front-ends display to the user.
pub fn require<'a>(
    value: Option<&'a str>,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::Missing { field }),
    }
}

/// Trim a free-text field and enforce a maximum length.
pub fn bounded_text(
    value: &str,
    field: &'static str,
    max: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_owned())
}
