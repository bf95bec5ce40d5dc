//! Enrollment status values
//!
//! Stored as lowercase text; no transition rules are enforced.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    #[default]
    Pending,
    Enrolled,
    Cancelled,
    Completed,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Enrolled => "enrolled",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

impl FromStr for EnrollmentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "enrolled" => Ok(Self::Enrolled),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            _ => Err(ValidationError::InvalidVariant {
                field: "status",
                value: s.to_owned(),
            }),
        }
    }
}

impl TryFrom<String> for EnrollmentStatus {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_values() {
        assert_eq!("Enrolled".parse::<EnrollmentStatus>().unwrap(), EnrollmentStatus::Enrolled);
        assert_eq!("canceled".parse::<EnrollmentStatus>().unwrap(), EnrollmentStatus::Cancelled);
    }

    #[test]
    fn rejects_unknown() {
        let err = "waitlisted".parse::<EnrollmentStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid status value: 'waitlisted'");
    }

    #[test]
    fn as_str_round_trips_through_from_str() {
        for s in [
            EnrollmentStatus::Pending,
            EnrollmentStatus::Enrolled,
            EnrollmentStatus::Cancelled,
            EnrollmentStatus::Completed,
        ] {
            assert_eq!(s.as_str().parse::<EnrollmentStatus>().unwrap(), s);
        }
    }
}
