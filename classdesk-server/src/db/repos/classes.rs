//! Class repository
//!
//! A class is one scheduled run of a course. List and detail queries join
//! the course and count non-cancelled enrollments in the same statement.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool, Row};
use uuid::Uuid;

use super::DbError;
use crate::models::{Paginated, Pagination};

const CLASS_COLUMNS: &str = "c.id, c.course_id, c.title, c.starts_at, c.ends_at, c.location, \
                             c.instructor_name, c.capacity, c.price_cents, c.webflow_item_id, \
                             c.created_at, c.updated_at";

/// Class record from database
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub instructor_name: Option<String>,
    pub capacity: Option<i32>,
    pub price_cents: Option<i64>,
    pub webflow_item_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Class with course title and seat usage, for listings
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ClassWithCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub class: Class,
    pub course_title: String,
    pub enrolled_count: i64,
}

/// Class joined with everything checkout and publishing need
#[derive(Debug, Clone, FromRow)]
pub struct ClassWithCourse {
    #[sqlx(flatten)]
    pub class: Class,
    pub course_title: String,
    pub course_slug: String,
    pub course_description: Option<String>,
    pub course_price_cents: i64,
    pub enrolled_count: i64,
}

impl ClassWithCourse {
    /// Class price override, falling back to the course price.
    pub fn price_cents(&self) -> i64 {
        self.class.price_cents.unwrap_or(self.course_price_cents)
    }

    pub fn is_full(&self) -> bool {
        self.class
            .capacity
            .is_some_and(|cap| self.enrolled_count >= i64::from(cap))
    }

    /// Line-item name shown on the checkout page and invoice.
    pub fn display_name(&self) -> String {
        if self.class.title == self.course_title {
            self.class.title.clone()
        } else {
            format!("{}: {}", self.course_title, self.class.title)
        }
    }
}

/// Enrolled student on a class roster
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub enrollment_id: Uuid,
    pub student_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub enrollment_status: String,
    pub enrolled_at: DateTime<Utc>,
}

/// Validated input for class creation
#[derive(Debug, Clone)]
pub struct NewClass {
    pub course_id: Uuid,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub instructor_name: Option<String>,
    pub capacity: Option<i32>,
    pub price_cents: Option<i64>,
}

/// Partial update; `None` leaves the column unchanged
///
/// Nullable columns can be changed but not cleared through a patch.
#[derive(Debug, Clone, Default)]
pub struct ClassPatch {
    pub title: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub instructor_name: Option<String>,
    pub capacity: Option<i32>,
    pub price_cents: Option<i64>,
}

/// Filters for class listings
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassFilter {
    pub course_id: Option<Uuid>,
    pub upcoming_only: bool,
}

/// Class repository
pub struct ClassRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ClassRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, class: NewClass) -> Result<Class, DbError> {
        sqlx::query_as(
            r#"
            INSERT INTO classes
                (course_id, title, starts_at, ends_at, location, instructor_name,
                 capacity, price_cents)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, course_id, title, starts_at, ends_at, location, instructor_name,
                      capacity, price_cents, webflow_item_id, created_at, updated_at
            "#,
        )
        .bind(class.course_id)
        .bind(&class.title)
        .bind(class.starts_at)
        .bind(class.ends_at)
        .bind(class.location.as_deref())
        .bind(class.instructor_name.as_deref())
        .bind(class.capacity)
        .bind(class.price_cents)
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::from(e).on_foreign_key("course", class.course_id))
    }

    /// List classes with enrolled counts (single query, no N+1).
    pub async fn list(
        &self,
        filter: ClassFilter,
        page: Pagination,
    ) -> Result<Paginated<ClassWithCount>, DbError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {CLASS_COLUMNS},
                   co.title AS course_title,
                   COUNT(e.id) FILTER (WHERE e.enrollment_status <> 'cancelled') AS enrolled_count,
                   COUNT(*) OVER() AS total
            FROM classes c
            JOIN courses co ON co.id = c.course_id
            LEFT JOIN enrollments e ON e.class_id = c.id
            WHERE ($1::uuid IS NULL OR c.course_id = $1)
              AND (NOT $2 OR c.starts_at >= NOW())
            GROUP BY c.id, co.title
            ORDER BY c.starts_at
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(filter.course_id)
        .bind(filter.upcoming_only)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = match rows.first() {
            Some(row) => row.get::<i64, _>("total"),
            None if page.past_end(rows.len()) => {
                sqlx::query_scalar(
                    r#"
                    SELECT COUNT(*) FROM classes c
                    WHERE ($1::uuid IS NULL OR c.course_id = $1)
                      AND (NOT $2 OR c.starts_at >= NOW())
                    "#,
                )
                .bind(filter.course_id)
                .bind(filter.upcoming_only)
                .fetch_one(self.pool)
                .await?
            }
            None => 0,
        };
        let items = rows
            .iter()
            .map(ClassWithCount::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(page.wrap(items, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<ClassWithCount, DbError> {
        sqlx::query_as(&format!(
            r#"
            SELECT {CLASS_COLUMNS},
                   co.title AS course_title,
                   COUNT(e.id) FILTER (WHERE e.enrollment_status <> 'cancelled') AS enrolled_count
            FROM classes c
            JOIN courses co ON co.id = c.course_id
            LEFT JOIN enrollments e ON e.class_id = c.id
            WHERE c.id = $1
            GROUP BY c.id, co.title
            "#
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("class", id))
    }

    /// Load a class with its course pricing and seat usage.
    pub async fn get_with_course(&self, id: Uuid) -> Result<ClassWithCourse, DbError> {
        sqlx::query_as(&format!(
            r#"
            SELECT {CLASS_COLUMNS},
                   co.title AS course_title,
                   co.slug AS course_slug,
                   co.description AS course_description,
                   co.price_cents AS course_price_cents,
                   COUNT(e.id) FILTER (WHERE e.enrollment_status <> 'cancelled') AS enrolled_count
            FROM classes c
            JOIN courses co ON co.id = c.course_id
            LEFT JOIN enrollments e ON e.class_id = c.id
            WHERE c.id = $1
            GROUP BY c.id, co.id
            "#
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("class", id))
    }

    pub async fn update(&self, id: Uuid, patch: ClassPatch) -> Result<Class, DbError> {
        sqlx::query_as(
            r#"
            UPDATE classes SET
                title = COALESCE($2, title),
                starts_at = COALESCE($3, starts_at),
                ends_at = COALESCE($4, ends_at),
                location = COALESCE($5, location),
                instructor_name = COALESCE($6, instructor_name),
                capacity = COALESCE($7, capacity),
                price_cents = COALESCE($8, price_cents),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, course_id, title, starts_at, ends_at, location, instructor_name,
                      capacity, price_cents, webflow_item_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(patch.title)
        .bind(patch.starts_at)
        .bind(patch.ends_at)
        .bind(patch.location)
        .bind(patch.instructor_name)
        .bind(patch.capacity)
        .bind(patch.price_cents)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("class", id))
    }

    /// Students with a non-cancelled enrollment in the class.
    pub async fn roster(&self, class_id: Uuid) -> Result<Vec<RosterEntry>, DbError> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM classes WHERE id = $1)")
            .bind(class_id)
            .fetch_one(self.pool)
            .await?;
        if !exists.0 {
            return Err(DbError::not_found("class", class_id));
        }

        let roster = sqlx::query_as(
            r#"
            SELECT e.id AS enrollment_id,
                   s.id AS student_id,
                   s.first_name,
                   s.last_name,
                   s.email,
                   s.phone,
                   e.enrollment_status,
                   e.created_at AS enrolled_at
            FROM enrollments e
            JOIN students s ON s.id = e.student_id
            WHERE e.class_id = $1 AND e.enrollment_status <> 'cancelled'
            ORDER BY s.last_name, s.first_name
            "#,
        )
        .bind(class_id)
        .fetch_all(self.pool)
        .await?;
        Ok(roster)
    }

    pub async fn set_webflow_item(&self, id: Uuid, item_id: &str) -> Result<(), DbError> {
        let result = sqlx::query(
            "UPDATE classes SET webflow_item_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(item_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("class", id));
        }
        Ok(())
    }
}
