//! Enrollment endpoints (admin)

use axum::{
    extract::State,
    http::StatusCode,
    routing::{patch, post},
    Json, Router,
};
use serde::Deserialize;

use crate::db::{ClassRepo, Enrollment, EnrollmentRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{AdminUser, ApiJson, ValidUuid};
use crate::models::{parse_id, require, EnrollmentStatus};
use crate::state::AppState;

/// Manual enrollment request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEnrollmentRequest {
    pub student_id: Option<String>,
    pub class_id: Option<String>,
    pub status: Option<String>,
}

/// Status change request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEnrollmentRequest {
    pub status: Option<String>,
}

/// POST /api/enrollments
///
/// A class at capacity only accepts `pending` enrollments.
async fn create_enrollment(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(req): ApiJson<CreateEnrollmentRequest>,
) -> Result<(StatusCode, Json<Enrollment>), ApiError> {
    let student_id = parse_id(req.student_id.as_deref(), "Student ID")?;
    let class_id = parse_id(req.class_id.as_deref(), "Class ID")?;
    let status = match req.status.as_deref() {
        Some(raw) => raw.parse::<EnrollmentStatus>()?,
        None => EnrollmentStatus::Enrolled,
    };

    if status == EnrollmentStatus::Enrolled {
        let class = ClassRepo::new(state.pool()).get_with_course(class_id).await?;
        if class.is_full() {
            return Err(ApiError::conflict("class is full"));
        }
    }

    let enrollment = EnrollmentRepo::new(state.pool())
        .create(student_id, class_id, status)
        .await?;

    tracing::info!(
        enrollment_id = %enrollment.id,
        status = %enrollment.enrollment_status,
        "enrollment created"
    );
    Ok((StatusCode::CREATED, Json(enrollment)))
}

/// PATCH /api/enrollments/{id}
async fn update_enrollment(
    State(state): State<AppState>,
    _admin: AdminUser,
    ValidUuid(id): ValidUuid,
    ApiJson(req): ApiJson<UpdateEnrollmentRequest>,
) -> Result<Json<Enrollment>, ApiError> {
    let status: EnrollmentStatus = require(req.status.as_deref(), "Status")?.parse()?;
    let enrollment = EnrollmentRepo::new(state.pool()).set_status(id, status).await?;
    Ok(Json(enrollment))
}

/// Enrollment routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/enrollments", post(create_enrollment))
        .route("/api/enrollments/{id}", patch(update_enrollment))
}
