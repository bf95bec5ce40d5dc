//! Service status: which dependencies are reachable and configured
//!
//! GET /api/status

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Status response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub database: bool,
    pub auth: bool,
    pub payments: bool,
    pub invoicing: bool,
    pub cms: bool,
}

/// GET /api/status
async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let database = match sqlx::query("SELECT 1").execute(state.pool()).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "database ping failed");
            false
        }
    };

    Json(StatusResponse {
        database,
        auth: state.verifier().is_some(),
        payments: state.payments().is_some(),
        invoicing: state.invoicing().is_some(),
        cms: state.cms().is_some(),
    })
}

/// Status routes
pub fn router() -> Router<AppState> {
    Router::new().route("/api/status", get(status))
}
