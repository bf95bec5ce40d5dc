//! Router test helpers

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use crate::auth::test_tokens::{sign, SECRET};
use crate::auth::{AuthConfig, TokenVerifier};
use crate::db::{AdminRepo, PgPool};
use crate::state::{lazy_pool, AppStateBuilder};

/// Verifier for tokens minted by `test_tokens::sign`.
pub fn verifier() -> TokenVerifier {
    TokenVerifier::new(&AuthConfig::new(SECRET))
}

/// State builder over a pool that never connects, with token checks on.
pub fn state_builder() -> AppStateBuilder {
    AppStateBuilder::new(lazy_pool()).verifier(verifier())
}

/// A valid token for a fresh user id.
pub fn user_token() -> String {
    sign(Uuid::new_v4(), "ada@example.com", 3600)
}

/// Migrated pool from `DATABASE_URL`, a state builder over it and a token
/// for a freshly granted admin.
pub async fn database_admin() -> (PgPool, AppStateBuilder, String) {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let pool = crate::db::create_pool(&url).await.unwrap();
    crate::db::run_migrations(&pool).await.unwrap();

    let user_id = Uuid::new_v4();
    let email = format!("admin-{}@example.com", user_id.simple());
    AdminRepo::new(&pool).grant(&email, Some(user_id)).await.unwrap();

    let builder = AppStateBuilder::new(pool.clone()).verifier(verifier());
    (pool, builder, sign(user_id, &email, 3600))
}

/// Insert a student with a unique email and return its id.
pub async fn insert_student(pool: &PgPool, email: &str) -> Uuid {
    let (id,): (Uuid,) = sqlx::query_as(
        "INSERT INTO students (auth_user_id, first_name, last_name, email) \
         VALUES ($1, 'Ada', 'Lovelace', $2) RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .fetch_one(pool)
    .await
    .unwrap();
    id
}

/// Drive one request through the router and decode the JSON reply.
///
/// Empty bodies decode as `Value::Null`.
pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => request
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}
