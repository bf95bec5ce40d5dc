//! API error types with IntoResponse
//!
//! Errors are converted to JSON `{error, message}` bodies with appropriate
//! status codes. Database and internal details are logged, never returned.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::auth::AuthError;
use crate::db::DbError;
use crate::models::ValidationError;
use crate::providers::ProviderError;
use crate::services::checkout::CheckoutError;
use crate::services::invoicing::InvoiceError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Missing or invalid credentials (401)
    Unauthorized(AuthError),

    /// Authenticated but not allowed (403)
    Forbidden { reason: String },

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Duplicate or state conflict (409)
    Conflict { message: String },

    /// Upstream provider failed (502, logged)
    Provider(ProviderError),

    /// Feature needs configuration that is absent (503)
    NotConfigured { feature: &'static str },

    /// Database error (500, logged)
    Database(DbError),

    /// Internal error (500, logged)
    Internal { message: String },
}

impl ApiError {
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Provider(_) => StatusCode::BAD_GATEWAY,
            Self::NotConfigured { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_) | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Validation(e) => json!({
                "error": "validation_error",
                "message": e.to_string()
            }),
            Self::Unauthorized(e) => json!({
                "error": "unauthorized",
                "message": e.to_string()
            }),
            Self::Forbidden { reason } => json!({
                "error": "forbidden",
                "message": reason
            }),
            Self::NotFound { resource, id } => json!({
                "error": "not_found",
                "message": format!("{} '{}' not found", resource, id)
            }),
            Self::Conflict { message } => json!({
                "error": "conflict",
                "message": message
            }),
            Self::Provider(e) => {
                tracing::error!(provider = e.provider(), error = %e, "provider call failed");
                json!({
                    "error": "provider_error",
                    "provider": e.provider(),
                    "message": e.to_string()
                })
            }
            Self::NotConfigured { feature } => json!({
                "error": "not_configured",
                "message": format!("{} is not configured on this server", feature)
            }),
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!("Database error: {}", e);
                json!({
                    "error": "internal_error",
                    "message": "an internal error occurred"
                })
            }
            Self::Internal { message } => {
                tracing::error!("Internal error: {}", message);
                json!({
                    "error": "internal_error",
                    "message": "an internal error occurred"
                })
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::Conflict { message } => Self::Conflict { message },
            _ => Self::Database(e),
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(e: ProviderError) -> Self {
        Self::Provider(e)
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        Self::Unauthorized(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(ValidationError::Body {
            message: rejection.body_text(),
        })
    }
}

impl From<CheckoutError> for ApiError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::NotPaid(_) | CheckoutError::ClassFull => Self::conflict(e.to_string()),
            CheckoutError::Metadata(_) => Self::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl From<InvoiceError> for ApiError {
    fn from(e: InvoiceError) -> Self {
        match e {
            InvoiceError::NoCustomer(_) => Self::Validation(ValidationError::InvalidFormat {
                field: "transactionId",
                reason: "transaction has no student to invoice",
            }),
            InvoiceError::AlreadyInvoiced(..) => Self::conflict(e.to_string()),
            InvoiceError::Provider(e) => Self::Provider(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use uuid::Uuid;

    async fn body(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_error_is_400_with_message() {
        let err = ApiError::Validation(ValidationError::Missing { field: "Class ID" });
        let (status, json) = body(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
        assert_eq!(json["message"], "Class ID is required");
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let err: ApiError = DbError::not_found("transaction", Uuid::nil()).into();
        let (status, json) = body(err).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "not_found");
    }

    #[tokio::test]
    async fn conflict_is_409() {
        let err: ApiError = DbError::Conflict {
            message: "student already exists".into(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn auth_error_is_401() {
        let (status, json) = body(AuthError::MissingToken.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["message"], "missing bearer token");
    }

    #[tokio::test]
    async fn invoice_without_student_is_400() {
        let (status, json) = body(InvoiceError::NoCustomer(Uuid::nil()).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn already_invoiced_is_409() {
        let err = InvoiceError::AlreadyInvoiced(Uuid::nil(), "inv-9".into());
        let (status, json) = body(err.into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"], "conflict");
    }

    #[tokio::test]
    async fn provider_error_is_502() {
        let err = ProviderError::Api {
            provider: "quickbooks",
            status: 400,
            message: "Duplicate Name Exists Error".into(),
        };
        let (status, json) = body(err.into()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["provider"], "quickbooks");
    }

    #[tokio::test]
    async fn internal_error_hides_details() {
        let err = ApiError::Internal {
            message: "secret detail".into(),
        };
        let (status, json) = body(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], "an internal error occurred");
    }

    #[test]
    fn unpaid_checkout_is_conflict() {
        let err: ApiError = CheckoutError::NotPaid("unpaid".into()).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn not_configured_is_503() {
        let err = ApiError::NotConfigured { feature: "stripe" };
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
