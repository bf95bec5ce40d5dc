//! Log table repository
//!
//! Append-only rows written by background jobs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::DbError;

/// Log row from database
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: i64,
    pub source: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Log repository
pub struct LogRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> LogRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, source: &str, message: &str) -> Result<LogEntry, DbError> {
        let entry = sqlx::query_as(
            r#"
            INSERT INTO logs (source, message)
            VALUES ($1, $2)
            RETURNING id, source, message, created_at
            "#,
        )
        .bind(source)
        .bind(message)
        .fetch_one(self.pool)
        .await?;
        Ok(entry)
    }

    /// Most recent row for a source, if any.
    pub async fn latest(&self, source: &str) -> Result<Option<LogEntry>, DbError> {
        let entry = sqlx::query_as(
            r#"
            SELECT id, source, message, created_at
            FROM logs
            WHERE source = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(source)
        .fetch_optional(self.pool)
        .await?;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires database"]
    async fn insert_then_latest() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.unwrap();
        crate::db::run_migrations(&pool).await.unwrap();

        let repo = LogRepo::new(&pool);
        let written = repo.insert("test-source", "hello").await.unwrap();
        let latest = repo.latest("test-source").await.unwrap().unwrap();
        assert_eq!(latest.id, written.id);
    }
}
