//! Course slug validation
//!
//! Slug format: lowercase alphanumeric with hyphens. The same slug is used
//! for the course's page on the marketing site.

use once_cell::sync::Lazy;
use regex::Regex;

use super::ValidationError;

/// Maximum length for course slugs
const MAX_SLUG_LEN: usize = 80;

/// Matches DB constraint: ^[a-z0-9][a-z0-9-]{0,79}$
static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]{0,79}$").expect("invalid slug regex"));

/// Validated course slug
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CourseSlug(String);

impl CourseSlug {
    /// Create a new slug, validating format.
    ///
    /// # Example
    /// ```
    /// use classdesk_server::models::CourseSlug;
    ///
    /// assert!(CourseSlug::new("intro-to-welding").is_ok());
    /// assert!(CourseSlug::new("Intro").is_err());  // uppercase
    /// assert!(CourseSlug::new("-intro").is_err());  // starts with dash
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "slug" });
        }

        if s.len() > MAX_SLUG_LEN {
            return Err(ValidationError::TooLong {
                field: "slug",
                max: MAX_SLUG_LEN,
            });
        }

        if !SLUG_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "slug",
                reason: "must be lowercase alphanumeric with hyphens, starting with alphanumeric",
            });
        }

        Ok(Self(s.to_owned()))
    }

    /// Derive a slug from a free-text title ("Intro to CAD!" -> "intro-to-cad").
    pub fn from_title(title: &str) -> Result<Self, ValidationError> {
        let mut out = String::with_capacity(title.len());
        for c in title.chars() {
            if c.is_ascii_alphanumeric() {
                out.push(c.to_ascii_lowercase());
            } else if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
        }
        let trimmed: String = out.trim_end_matches('-').chars().take(MAX_SLUG_LEN).collect();
        Self::new(trimmed.trim_end_matches('-'))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CourseSlug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_slugs() {
        assert!(CourseSlug::new("welding-101").is_ok());
        assert!(CourseSlug::new("a").is_ok());
        assert!(CourseSlug::new("2025-summer").is_ok());
    }

    #[test]
    fn rejects_bad_format() {
        for bad in ["Welding", "welding 101", "-welding", "welding_101"] {
            let err = CourseSlug::new(bad).unwrap_err();
            assert!(matches!(err, ValidationError::InvalidFormat { .. }), "{bad}");
        }
    }

    #[test]
    fn rejects_empty() {
        let err = CourseSlug::new("").unwrap_err();
        assert!(matches!(err, ValidationError::Empty { .. }));
    }

    #[test]
    fn max_length() {
        assert!(CourseSlug::new(&"a".repeat(80)).is_ok());
        let err = CourseSlug::new(&"a".repeat(81)).unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { max: 80, .. }));
    }

    #[test]
    fn from_title() {
        let slug = CourseSlug::from_title("Intro to CAD & 3D Printing!").unwrap();
        assert_eq!(slug.as_str(), "intro-to-cad-3d-printing");
    }
}
