//! Repository error type

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict: {message}")]
    Conflict { message: String },
}

impl DbError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Map a unique-constraint violation to `Conflict`, anything else to `Sqlx`.
    pub fn on_unique(err: sqlx::Error, message: &str) -> Self {
        let unique = matches!(&err, sqlx::Error::Database(db) if db.is_unique_violation());
        if unique {
            Self::Conflict {
                message: message.to_owned(),
            }
        } else {
            Self::Sqlx(err)
        }
    }

    /// Map a foreign-key violation to `NotFound` for the referenced resource.
    pub fn on_foreign_key(self, resource: &'static str, id: impl ToString) -> Self {
        let foreign_key = matches!(
            &self,
            Self::Sqlx(sqlx::Error::Database(db)) if db.is_foreign_key_violation()
        );
        if foreign_key {
            Self::not_found(resource, id)
        } else {
            self
        }
    }
}
