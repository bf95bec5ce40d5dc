//! Transaction listing and reconciliation (admin)

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{Transaction, TransactionRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{AdminUser, ApiJson};
use crate::models::{parse_id, Paginated, Pagination, PaginationParams};
use crate::state::AppState;

/// List query
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTransactionsQuery {
    pub reconciled: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Reconcile / unreconcile request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileRequest {
    pub transaction_id: Option<String>,
}

/// Reconcile / unreconcile response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileResponse {
    pub success: bool,
    pub transaction_id: Uuid,
}

/// GET /api/transactions
async fn list_transactions(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<Paginated<Transaction>>, ApiError> {
    let page = Pagination::from(PaginationParams {
        page: query.page,
        per_page: query.per_page,
    });
    let transactions = TransactionRepo::new(state.pool())
        .list(query.reconciled, page)
        .await?;
    Ok(Json(transactions))
}

/// POST /api/transactions/reconcile
async fn reconcile(
    State(state): State<AppState>,
    admin: AdminUser,
    ApiJson(req): ApiJson<ReconcileRequest>,
) -> Result<Json<ReconcileResponse>, ApiError> {
    let id = parse_id(req.transaction_id.as_deref(), "Transaction ID")?;
    TransactionRepo::new(state.pool()).reconcile(id).await?;

    tracing::info!(transaction_id = %id, admin = %admin.admin.email, "transaction reconciled");
    Ok(Json(ReconcileResponse {
        success: true,
        transaction_id: id,
    }))
}

/// POST /api/transactions/unreconcile
async fn unreconcile(
    State(state): State<AppState>,
    admin: AdminUser,
    ApiJson(req): ApiJson<ReconcileRequest>,
) -> Result<Json<ReconcileResponse>, ApiError> {
    let id = parse_id(req.transaction_id.as_deref(), "Transaction ID")?;
    TransactionRepo::new(state.pool()).unreconcile(id).await?;

    tracing::info!(transaction_id = %id, admin = %admin.admin.email, "reconciliation undone");
    Ok(Json(ReconcileResponse {
        success: true,
        transaction_id: id,
    }))
}

/// Transaction routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/transactions", get(list_transactions))
        .route("/api/transactions/reconcile", post(reconcile))
        .route("/api/transactions/unreconcile", post(unreconcile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::{database_admin, send, state_builder};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn reconcile_requires_token() {
        let app = router().with_state(state_builder().build());
        let body = json!({"transactionId": Uuid::new_v4()});
        let (status, _) = send(
            app,
            Method::POST,
            "/api/transactions/reconcile",
            None,
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    async fn admin_app() -> (Router, String) {
        let (_pool, builder, token) = database_admin().await;
        (router().with_state(builder.build()), token)
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn reconcile_unknown_transaction_is_404() {
        let (app, token) = admin_app().await;
        let body = json!({"transactionId": Uuid::new_v4()});
        let (status, json) = send(
            app,
            Method::POST,
            "/api/transactions/reconcile",
            Some(&token),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "not_found");
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn reconcile_then_unreconcile() {
        let (app, token) = admin_app().await;
        let url = std::env::var("DATABASE_URL").unwrap();
        let pool = crate::db::create_pool(&url).await.unwrap();
        let (id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO transactions (amount_cents, description) \
             VALUES (1000, 'route test') RETURNING id",
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        let body = json!({"transactionId": id});
        let (status, json) = send(
            app.clone(),
            Method::POST,
            "/api/transactions/reconcile",
            Some(&token),
            Some(body.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["transactionId"], id.to_string());

        let (status, _) = send(
            app,
            Method::POST,
            "/api/transactions/unreconcile",
            Some(&token),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let tx = TransactionRepo::new(&pool).get(id).await.unwrap();
        assert!(!tx.reconciled);
        assert!(tx.reconciliation_date.is_none());
    }

    #[tokio::test]
    async fn garbage_token_is_401() {
        let app = router().with_state(state_builder().build());
        let (status, json) = send(
            app,
            Method::POST,
            "/api/transactions/unreconcile",
            Some("garbage"),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["message"], "malformed token");
    }
}
