//! Admin allowlist repository

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::DbError;

/// Admin allowlist entry
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: Uuid,
    pub auth_user_id: Option<Uuid>,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Admin repository
pub struct AdminRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find the allowlist entry for an identity, matching on auth user id
    /// or (case-insensitively) on email.
    pub async fn find(
        &self,
        auth_user_id: Uuid,
        email: Option<&str>,
    ) -> Result<Option<Admin>, DbError> {
        let admin = sqlx::query_as(
            r#"
            SELECT id, auth_user_id, email, created_at
            FROM admins
            WHERE auth_user_id = $1
               OR ($2::text IS NOT NULL AND lower(email) = lower($2))
            LIMIT 1
            "#,
        )
        .bind(auth_user_id)
        .bind(email)
        .fetch_optional(self.pool)
        .await?;
        Ok(admin)
    }

    /// Add an email to the allowlist (idempotent).
    pub async fn grant(&self, email: &str, auth_user_id: Option<Uuid>) -> Result<Admin, DbError> {
        let admin = sqlx::query_as(
            r#"
            INSERT INTO admins (email, auth_user_id)
            VALUES (lower($1), $2)
            ON CONFLICT (email)
            DO UPDATE SET auth_user_id = COALESCE(EXCLUDED.auth_user_id, admins.auth_user_id)
            RETURNING id, auth_user_id, email, created_at
            "#,
        )
        .bind(email)
        .bind(auth_user_id)
        .fetch_one(self.pool)
        .await?;
        Ok(admin)
    }
}
