//! Waitlist repository
//!
//! Records a student's interest in a course that has no open class.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::DbError;

/// Waitlist entry from database
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistEntry {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Waitlist entry with student contact details, for admins
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistEntryWithStudent {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub entry: WaitlistEntry,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub course_title: String,
}

/// Waitlist repository
pub struct WaitlistRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> WaitlistRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Join the waitlist; joining twice returns the existing entry.
    pub async fn join(&self, student_id: Uuid, course_id: Uuid) -> Result<WaitlistEntry, DbError> {
        sqlx::query_as(
            r#"
            INSERT INTO waitlist (student_id, course_id)
            VALUES ($1, $2)
            ON CONFLICT (student_id, course_id) DO UPDATE SET student_id = EXCLUDED.student_id
            RETURNING id, student_id, course_id, created_at
            "#,
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::from(e).on_foreign_key("course", course_id))
    }

    /// List entries, oldest first, optionally for one course.
    pub async fn list(
        &self,
        course_id: Option<Uuid>,
    ) -> Result<Vec<WaitlistEntryWithStudent>, DbError> {
        let rows = sqlx::query_as(
            r#"
            SELECT w.id, w.student_id, w.course_id, w.created_at,
                   s.first_name, s.last_name, s.email,
                   co.title AS course_title
            FROM waitlist w
            JOIN students s ON s.id = w.student_id
            JOIN courses co ON co.id = w.course_id
            WHERE $1::uuid IS NULL OR w.course_id = $1
            ORDER BY w.created_at
            "#,
        )
        .bind(course_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM waitlist WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("waitlist entry", id));
        }
        Ok(())
    }
}
