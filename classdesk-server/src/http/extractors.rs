//! Custom Axum extractors

use axum::extract::{FromRequest, FromRequestParts, Path};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use super::error::ApiError;
use crate::auth::{Claims, TokenVerifier};
use crate::db::{Admin, AdminRepo};
use crate::models::ValidationError;
use crate::state::AppState;

/// JSON body whose rejections render as `ApiError` (400 validation_error)
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Caller authenticated by a bearer token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: Option<String>,
}

impl AuthUser {
    fn from_claims(claims: Claims) -> Result<Self, ApiError> {
        Ok(Self {
            user_id: claims.user_id()?,
            email: claims.email.map(|e| e.trim().to_lowercase()),
        })
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let verifier = state
            .verifier()
            .ok_or(ApiError::NotConfigured {
                feature: "authentication",
            })?;

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let token = TokenVerifier::bearer(header)?;
        let claims = verifier.verify(token)?;
        Self::from_claims(claims)
    }
}

/// Caller on the admin allowlist
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub user: AuthUser,
    pub admin: Admin,
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        let admin = AdminRepo::new(state.pool())
            .find(user.user_id, user.email.as_deref())
            .await?
            .ok_or_else(|| ApiError::forbidden("admin access required"))?;

        tracing::debug!(user_id = %user.user_id, "admin request");
        Ok(Self { user, admin })
    }
}

/// Extract and validate a UUID from path
pub struct ValidUuid(pub Uuid);

impl<S> FromRequestParts<S> for ValidUuid
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Validation(ValidationError::Missing { field: "id" }))?;

        let uuid = Uuid::parse_str(&id).map_err(|_| {
            ApiError::Validation(ValidationError::InvalidFormat {
                field: "id",
                reason: "invalid UUID format",
            })
        })?;

        Ok(Self(uuid))
    }
}
