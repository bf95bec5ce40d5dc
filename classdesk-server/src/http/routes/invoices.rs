//! QuickBooks invoice creation for a transaction (admin)

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::TransactionRepo;
use crate::http::error::ApiError;
use crate::http::extractors::{AdminUser, ApiJson};
use crate::models::parse_id;
use crate::services::invoicing::{self, CategoryPath};
use crate::state::AppState;

/// Invoice request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub transaction_id: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
}

/// Invoice response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceResponse {
    pub success: bool,
    pub invoice_id: String,
    pub doc_number: Option<String>,
    pub transaction_id: Uuid,
    /// Category steps that were skipped
    pub warnings: Vec<String>,
}

/// POST /api/invoices
async fn create_invoice(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(req): ApiJson<CreateInvoiceRequest>,
) -> Result<Json<CreateInvoiceResponse>, ApiError> {
    let transaction_id = parse_id(req.transaction_id.as_deref(), "Transaction ID")?;
    let gateway = state
        .invoicing()
        .ok_or(ApiError::NotConfigured { feature: "quickbooks" })?;
    let repo = TransactionRepo::new(state.pool());

    let context = repo.invoice_context(transaction_id).await?;
    let path = CategoryPath {
        category: req.category,
        subcategory: req.subcategory,
    };
    let outcome = invoicing::create_invoice(gateway, &context, &path).await?;
    repo.set_invoice(transaction_id, &outcome.invoice.id).await?;

    Ok(Json(CreateInvoiceResponse {
        success: true,
        invoice_id: outcome.invoice.id,
        doc_number: outcome.invoice.doc_number,
        transaction_id,
        warnings: outcome.warnings,
    }))
}

/// Invoice routes
pub fn router() -> Router<AppState> {
    Router::new().route("/api/invoices", post(create_invoice))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db::PgPool;
    use crate::http::testing::{database_admin, insert_student, send, state_builder};
    use crate::services::invoicing::fakes::FakeInvoicing;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn requires_token() {
        let app = router().with_state(state_builder().build());
        let body = json!({"transactionId": Uuid::new_v4()});
        let (status, _) = send(app, Method::POST, "/api/invoices", None, Some(body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    async fn insert_transaction(pool: &PgPool, student_id: Option<Uuid>) -> Uuid {
        let (id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO transactions (student_id, amount_cents, description) \
             VALUES ($1, 40000, 'Welding 101') RETURNING id",
        )
        .bind(student_id)
        .fetch_one(pool)
        .await
        .unwrap();
        id
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn creates_invoice_and_stores_its_id() {
        let (pool, builder, token) = database_admin().await;
        let fake = Arc::new(FakeInvoicing::default());
        let app = router().with_state(builder.invoicing(fake.clone()).build());

        let email = format!("{}@example.com", Uuid::new_v4().simple());
        let student_id = insert_student(&pool, &email).await;
        let transaction_id = insert_transaction(&pool, Some(student_id)).await;

        let body = json!({
            "transactionId": transaction_id,
            "category": "Classes",
            "subcategory": "Welding",
        });
        let (status, json) = send(
            app.clone(),
            Method::POST,
            "/api/invoices",
            Some(&token),
            Some(body.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["invoiceId"], "inv-1");
        assert_eq!(json["docNumber"], "1001");
        assert_eq!(json["transactionId"], transaction_id.to_string());
        assert_eq!(json["warnings"], json!([]));
        assert!(fake.calls().contains(&"category:Welding:cat-1".to_string()));

        let stored = TransactionRepo::new(&pool).get(transaction_id).await.unwrap();
        assert_eq!(stored.quickbooks_invoice_id.as_deref(), Some("inv-1"));

        let (status, json) = send(
            app,
            Method::POST,
            "/api/invoices",
            Some(&token),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"], "conflict");
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn transaction_without_student_is_400() {
        let (pool, builder, token) = database_admin().await;
        let state = builder.invoicing(Arc::new(FakeInvoicing::default())).build();
        let app = router().with_state(state);
        let transaction_id = insert_transaction(&pool, None).await;

        let body = json!({"transactionId": transaction_id});
        let (status, json) = send(
            app,
            Method::POST,
            "/api/invoices",
            Some(&token),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn unknown_transaction_is_404() {
        let (_pool, builder, token) = database_admin().await;
        let state = builder.invoicing(Arc::new(FakeInvoicing::default())).build();
        let app = router().with_state(state);

        let body = json!({"transactionId": Uuid::new_v4()});
        let (status, _) = send(app, Method::POST, "/api/invoices", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn without_quickbooks_is_503() {
        let (_pool, builder, token) = database_admin().await;
        let app = router().with_state(builder.build());

        let body = json!({"transactionId": Uuid::new_v4()});
        let (status, json) = send(
            app,
            Method::POST,
            "/api/invoices",
            Some(&token),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"], "not_configured");
    }
}
