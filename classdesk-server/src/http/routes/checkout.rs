//! Public checkout endpoints (Stripe)
//!
//! - POST /api/create-checkout-session: start a hosted checkout for a class
//! - POST /api/checkout/complete: record a paid session as an enrollment
//! - GET /api/payment-intents/{id}: payment status lookup

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::{ClassRepo, DbError, Enrollment, StudentRepo, Transaction, TransactionRepo};
use crate::http::error::ApiError;
use crate::http::extractors::ApiJson;
use crate::models::{parse_id, require, Email};
use crate::providers::PaymentGateway;
use crate::services::checkout::{self, Payer};
use crate::state::AppState;

/// Create session request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub class_id: Option<String>,
    pub student_id: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub url: Option<String>,
}

/// Complete request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CompleteResponse {
    pub enrollment: Enrollment,
    pub transaction: Transaction,
}

#[derive(Debug, Serialize)]
pub struct PaymentStatusResponse {
    pub id: String,
    pub status: String,
    pub amount: i64,
}

fn payments(state: &AppState) -> Result<&dyn PaymentGateway, ApiError> {
    state
        .payments()
        .ok_or(ApiError::NotConfigured { feature: "payments" })
}

/// POST /api/create-checkout-session
async fn create_session(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, ApiError> {
    let class_id = parse_id(req.class_id.as_deref(), "Class ID")?;
    let student_id = req
        .student_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|raw| parse_id(Some(raw), "Student ID"))
        .transpose()?;
    let email = req
        .email
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(Email::new)
        .transpose()?;
    let gateway = payments(&state)?;

    let class = ClassRepo::new(state.pool()).get_with_course(class_id).await?;

    let payer = match student_id {
        Some(id) => {
            let students = StudentRepo::new(state.pool());
            let student = students.get(id).await?;
            let customer_id = match student.stripe_customer_id.clone() {
                Some(existing) => existing,
                None => {
                    let created = gateway
                        .find_or_create_customer(&student.email, Some(&student.full_name()))
                        .await?;
                    students.set_stripe_customer(student.id, &created).await?;
                    created
                }
            };
            Payer {
                student_id: Some(student.id),
                stripe_customer_id: Some(customer_id),
                email: Some(student.email),
            }
        }
        None => Payer {
            student_id: None,
            stripe_customer_id: None,
            email: email.map(|e| e.as_str().to_owned()),
        },
    };

    let request = checkout::session_request(&class, &payer, state.checkout())?;
    let session = gateway.create_checkout_session(&request).await?;

    tracing::info!(
        session_id = %session.id,
        class_id = %class_id,
        amount_cents = request.unit_amount_cents,
        "checkout session created"
    );
    Ok(Json(CreateSessionResponse {
        session_id: session.id,
        url: session.url,
    }))
}

/// POST /api/checkout/complete
///
/// Safe to call more than once for the same session.
async fn complete(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CompleteRequest>,
) -> Result<Json<CompleteResponse>, ApiError> {
    let session_id = require(req.session_id.as_deref(), "Session ID")?;
    let gateway = payments(&state)?;

    let session = gateway.retrieve_checkout_session(session_id).await?;
    let (class_id, student_id) = checkout::paid_session_ids(&session)?;

    let student_id = match student_id {
        Some(id) => id,
        None => {
            let email = session
                .customer_email()
                .ok_or_else(|| DbError::not_found("student", "checkout email"))?;
            StudentRepo::new(state.pool())
                .find_by_email(email)
                .await?
                .ok_or_else(|| DbError::not_found("student", email))?
                .id
        }
    };

    let class = ClassRepo::new(state.pool()).get_with_course(class_id).await?;
    let paid = checkout::paid_checkout(&session, &class, student_id, &state.checkout().currency)?;
    let (enrollment, transaction) = TransactionRepo::new(state.pool())
        .record_checkout(&paid)
        .await?;

    tracing::info!(
        session_id = %session.id,
        enrollment_id = %enrollment.id,
        transaction_id = %transaction.id,
        "checkout recorded"
    );
    Ok(Json(CompleteResponse {
        enrollment,
        transaction,
    }))
}

/// GET /api/payment-intents/{id}
async fn payment_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PaymentStatusResponse>, ApiError> {
    let intent = payments(&state)?.retrieve_payment_intent(&id).await?;
    Ok(Json(PaymentStatusResponse {
        id: intent.id,
        status: intent.status,
        amount: intent.amount,
    }))
}

/// Checkout routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/create-checkout-session", post(create_session))
        .route("/api/checkout/complete", post(complete))
        .route("/api/payment-intents/{id}", get(payment_status))
}
