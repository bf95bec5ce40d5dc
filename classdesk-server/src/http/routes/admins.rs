//! Admin status for the signed-in user

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::db::AdminRepo;
use crate::http::error::ApiError;
use crate::http::extractors::AuthUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatusResponse {
    pub is_admin: bool,
    pub email: Option<String>,
}

/// GET /api/admins/me
async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<AdminStatusResponse>, ApiError> {
    let admin = AdminRepo::new(state.pool())
        .find(user.user_id, user.email.as_deref())
        .await?;

    Ok(Json(AdminStatusResponse {
        is_admin: admin.is_some(),
        email: user.email,
    }))
}

/// Admin routes
pub fn router() -> Router<AppState> {
    Router::new().route("/api/admins/me", get(me))
}
