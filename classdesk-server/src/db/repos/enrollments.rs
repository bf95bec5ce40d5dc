//! Enrollment repository
//!
//! One enrollment per (student, class) pair, enforced by a unique constraint.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres};
use uuid::Uuid;

use super::DbError;
use crate::models::EnrollmentStatus;

/// Enrollment record from database
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub class_id: Uuid,
    #[sqlx(try_from = "String")]
    pub enrollment_status: EnrollmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Enrollment with the class and course it belongs to
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentWithClass {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub enrollment: Enrollment,
    pub class_title: String,
    pub course_title: String,
    pub starts_at: DateTime<Utc>,
}

/// Enrollment repository
pub struct EnrollmentRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> EnrollmentRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        student_id: Uuid,
        class_id: Uuid,
        status: EnrollmentStatus,
    ) -> Result<Enrollment, DbError> {
        let result = sqlx::query_as(
            r#"
            INSERT INTO enrollments (student_id, class_id, enrollment_status)
            VALUES ($1, $2, $3)
            RETURNING id, student_id, class_id, enrollment_status, created_at, updated_at
            "#,
        )
        .bind(student_id)
        .bind(class_id)
        .bind(status.as_str())
        .fetch_one(self.pool)
        .await;

        match result {
            Ok(enrollment) => Ok(enrollment),
            Err(e) => {
                let err = DbError::on_unique(e, "student is already enrolled in this class");
                Err(err.on_foreign_key("student or class", format!("{student_id}/{class_id}")))
            }
        }
    }

    pub async fn set_status(
        &self,
        id: Uuid,
        status: EnrollmentStatus,
    ) -> Result<Enrollment, DbError> {
        sqlx::query_as(
            r#"
            UPDATE enrollments
            SET enrollment_status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, student_id, class_id, enrollment_status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("enrollment", id))
    }

    pub async fn list_for_student(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<EnrollmentWithClass>, DbError> {
        let rows = sqlx::query_as(
            r#"
            SELECT e.id, e.student_id, e.class_id, e.enrollment_status, e.created_at, e.updated_at,
                   c.title AS class_title,
                   co.title AS course_title,
                   c.starts_at
            FROM enrollments e
            JOIN classes c ON c.id = e.class_id
            JOIN courses co ON co.id = c.course_id
            WHERE e.student_id = $1
            ORDER BY c.starts_at DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}

/// Mark (student, class) enrolled inside an open transaction, creating the
/// row if needed. Used by checkout completion.
pub(crate) async fn upsert_enrolled(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    student_id: Uuid,
    class_id: Uuid,
) -> Result<Enrollment, DbError> {
    let enrollment = sqlx::query_as(
        r#"
        INSERT INTO enrollments (student_id, class_id, enrollment_status)
        VALUES ($1, $2, 'enrolled')
        ON CONFLICT (student_id, class_id)
        DO UPDATE SET enrollment_status = 'enrolled', updated_at = NOW()
        RETURNING id, student_id, class_id, enrollment_status, created_at, updated_at
        "#,
    )
    .bind(student_id)
    .bind(class_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(enrollment)
}
