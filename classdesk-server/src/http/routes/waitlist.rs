//! Course waitlist endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{StudentRepo, WaitlistEntry, WaitlistEntryWithStudent, WaitlistRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{AdminUser, ApiJson, AuthUser, ValidUuid};
use crate::models::parse_id;
use crate::state::AppState;

/// Join request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinWaitlistRequest {
    pub course_id: Option<String>,
}

/// List query
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListWaitlistQuery {
    pub course_id: Option<String>,
}

/// Delete response
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub success: bool,
    pub id: Uuid,
}

/// POST /api/waitlist - add the caller to a course waitlist
async fn join(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<JoinWaitlistRequest>,
) -> Result<(StatusCode, Json<WaitlistEntry>), ApiError> {
    let course_id = parse_id(req.course_id.as_deref(), "Course ID")?;
    let student = StudentRepo::new(state.pool())
        .get_by_auth_user(user.user_id)
        .await?;

    let entry = WaitlistRepo::new(state.pool())
        .join(student.id, course_id)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /api/waitlist
async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ListWaitlistQuery>,
) -> Result<Json<Vec<WaitlistEntryWithStudent>>, ApiError> {
    let course_id = query
        .course_id
        .as_deref()
        .map(|raw| parse_id(Some(raw), "Course ID"))
        .transpose()?;
    let entries = WaitlistRepo::new(state.pool()).list(course_id).await?;
    Ok(Json(entries))
}

/// DELETE /api/waitlist/{id}
async fn remove(
    State(state): State<AppState>,
    _admin: AdminUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<DeletedResponse>, ApiError> {
    WaitlistRepo::new(state.pool()).delete(id).await?;
    Ok(Json(DeletedResponse { success: true, id }))
}

/// Waitlist routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/waitlist", get(list).post(join))
        .route("/api/waitlist/{id}", delete(remove))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::{send, state_builder, user_token};
    use axum::http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn join_requires_course_id() {
        let app = router().with_state(state_builder().build());
        let token = user_token();
        let (status, json) = send(
            app,
            Method::POST,
            "/api/waitlist",
            Some(&token),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Course ID is required");
    }

    #[tokio::test]
    async fn join_rejects_malformed_course_id() {
        let app = router().with_state(state_builder().build());
        let token = user_token();
        let (status, _) = send(
            app,
            Method::POST,
            "/api/waitlist",
            Some(&token),
            Some(json!({"courseId": "welding"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
