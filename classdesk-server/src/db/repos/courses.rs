//! Course repository

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::DbError;
use crate::models::CourseSlug;

/// Course record from database
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// Validated input for course creation
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub title: String,
    pub slug: CourseSlug,
    pub description: Option<String>,
    pub price_cents: i64,
}

/// Course repository
pub struct CourseRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> CourseRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, course: NewCourse) -> Result<Course, DbError> {
        sqlx::query_as(
            r#"
            INSERT INTO courses (title, slug, description, price_cents)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, slug, description, price_cents, created_at
            "#,
        )
        .bind(&course.title)
        .bind(course.slug.as_str())
        .bind(course.description.as_deref())
        .bind(course.price_cents)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            DbError::on_unique(e, &format!("course slug '{}' is taken", course.slug.as_str()))
        })
    }

    pub async fn list(&self) -> Result<Vec<Course>, DbError> {
        let courses = sqlx::query_as(
            r#"
            SELECT id, title, slug, description, price_cents, created_at
            FROM courses
            ORDER BY title
            "#,
        )
        .fetch_all(self.pool)
        .await?;
        Ok(courses)
    }

    pub async fn get(&self, id: Uuid) -> Result<Course, DbError> {
        sqlx::query_as(
            r#"
            SELECT id, title, slug, description, price_cents, created_at
            FROM courses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("course", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires database"]
    async fn duplicate_slug_is_conflict() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.unwrap();
        crate::db::run_migrations(&pool).await.unwrap();

        let slug = format!("course-{}", Uuid::new_v4().simple());
        let course = NewCourse {
            title: "Welding 101".into(),
            slug: CourseSlug::new(&slug).unwrap(),
            description: None,
            price_cents: 25_000,
        };

        let repo = CourseRepo::new(&pool);
        let created = repo.create(course.clone()).await.unwrap();
        assert_eq!(repo.get(created.id).await.unwrap().slug, slug);

        let err = repo.create(course).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
    }
}
