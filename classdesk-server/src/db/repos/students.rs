//! Student repository
//!
//! A student row is created once per auth identity at signup and edited
//! by admins afterwards.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool, Row};
use uuid::Uuid;

use super::DbError;
use crate::models::{Email, Paginated, Pagination};

const STUDENT_COLUMNS: &str = "id, auth_user_id, first_name, last_name, email, phone, \
                               stripe_customer_id, created_at, updated_at";

/// Student record from database
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Uuid,
    pub auth_user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Validated input for signup
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub auth_user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: Option<String>,
}

/// Partial update; `None` leaves the column unchanged
///
/// Nullable columns can be changed but not cleared through a patch.
#[derive(Debug, Clone, Default)]
pub struct StudentPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<Email>,
    pub phone: Option<String>,
}

/// `ILIKE` pattern matching `search` anywhere, with wildcards escaped.
fn like_pattern(search: &str) -> Option<String> {
    let search = search.trim();
    if search.is_empty() {
        return None;
    }
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Some(format!("%{}%", escaped))
}

/// Student repository
pub struct StudentRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> StudentRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a student. A second signup for the same identity or email
    /// is a conflict.
    pub async fn create(&self, student: NewStudent) -> Result<Student, DbError> {
        sqlx::query_as(&format!(
            r#"
            INSERT INTO students (auth_user_id, first_name, last_name, email, phone)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {STUDENT_COLUMNS}
            "#
        ))
        .bind(student.auth_user_id)
        .bind(&student.first_name)
        .bind(&student.last_name)
        .bind(student.email.as_str())
        .bind(student.phone.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::on_unique(e, "a student with this account or email already exists"))
    }

    pub async fn get(&self, id: Uuid) -> Result<Student, DbError> {
        sqlx::query_as(&format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("student", id))
    }

    pub async fn get_by_auth_user(&self, auth_user_id: Uuid) -> Result<Student, DbError> {
        sqlx::query_as(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE auth_user_id = $1"
        ))
        .bind(auth_user_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("student", auth_user_id))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Student>, DbError> {
        let student = sqlx::query_as(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE email = lower($1)"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;
        Ok(student)
    }

    /// List students, optionally filtered by a case-insensitive search over
    /// name and email.
    pub async fn list(
        &self,
        search: Option<&str>,
        page: Pagination,
    ) -> Result<Paginated<Student>, DbError> {
        let pattern = search.and_then(like_pattern);

        let rows = sqlx::query(&format!(
            r#"
            SELECT {STUDENT_COLUMNS}, COUNT(*) OVER() AS total
            FROM students
            WHERE $1::text IS NULL
               OR first_name ILIKE $1
               OR last_name ILIKE $1
               OR email ILIKE $1
            ORDER BY last_name, first_name
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(pattern.as_deref())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = match rows.first() {
            Some(row) => row.get::<i64, _>("total"),
            None if page.past_end(rows.len()) => {
                sqlx::query_scalar(
                    r#"
                    SELECT COUNT(*) FROM students
                    WHERE $1::text IS NULL
                       OR first_name ILIKE $1
                       OR last_name ILIKE $1
                       OR email ILIKE $1
                    "#,
                )
                .bind(pattern.as_deref())
                .fetch_one(self.pool)
                .await?
            }
            None => 0,
        };
        let items = rows
            .iter()
            .map(Student::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(page.wrap(items, total))
    }

    pub async fn update(&self, id: Uuid, patch: StudentPatch) -> Result<Student, DbError> {
        sqlx::query_as(&format!(
            r#"
            UPDATE students SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {STUDENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.first_name)
        .bind(patch.last_name)
        .bind(patch.email.as_ref().map(Email::as_str))
        .bind(patch.phone)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| DbError::on_unique(e, "a student with this email already exists"))?
        .ok_or_else(|| DbError::not_found("student", id))
    }

    /// Remember the payment provider's customer id for later checkouts.
    pub async fn set_stripe_customer(&self, id: Uuid, customer_id: &str) -> Result<(), DbError> {
        let result = sqlx::query(
            "UPDATE students SET stripe_customer_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(customer_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("student", id));
        }
        Ok(())
    }
}
