//! Student endpoints
//!
//! Signed-in users create and read their own profile; admins list, read
//! and edit any student.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::db::{
    AdminRepo, EnrollmentRepo, EnrollmentWithClass, NewStudent, Student, StudentPatch, StudentRepo,
};
use crate::http::error::ApiError;
use crate::http::extractors::{AdminUser, ApiJson, AuthUser, ValidUuid};
use crate::models::{bounded_text, require, Email, Paginated, Pagination, PaginationParams};
use crate::state::AppState;

const MAX_NAME_LEN: usize = 100;
const MAX_PHONE_LEN: usize = 40;

/// Signup request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Partial update request
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudentRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// List query
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListStudentsQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
}

fn optional_phone(phone: Option<String>) -> Result<Option<String>, ApiError> {
    match phone.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(p) => Ok(Some(bounded_text(p, "Phone", MAX_PHONE_LEN)?)),
    }
}

/// POST /api/students - create the caller's student profile
async fn create_student(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CreateStudentRequest>,
) -> Result<(StatusCode, Json<Student>), ApiError> {
    let first_name = require(req.first_name.as_deref(), "First name")?;
    let first_name = bounded_text(first_name, "First name", MAX_NAME_LEN)?;
    let last_name = require(req.last_name.as_deref(), "Last name")?;
    let last_name = bounded_text(last_name, "Last name", MAX_NAME_LEN)?;
    let email = Email::new(require(req.email.as_deref(), "Email")?)?;
    let phone = optional_phone(req.phone)?;

    let student = StudentRepo::new(state.pool())
        .create(NewStudent {
            auth_user_id: user.user_id,
            first_name,
            last_name,
            email,
            phone,
        })
        .await?;

    tracing::info!(student_id = %student.id, "student created");
    Ok((StatusCode::CREATED, Json(student)))
}

/// GET /api/students/me - the caller's own profile
async fn get_me(State(state): State<AppState>, user: AuthUser) -> Result<Json<Student>, ApiError> {
    let student = StudentRepo::new(state.pool())
        .get_by_auth_user(user.user_id)
        .await?;
    Ok(Json(student))
}

/// GET /api/students - paginated, searchable list
async fn list_students(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ListStudentsQuery>,
) -> Result<Json<Paginated<Student>>, ApiError> {
    let page = Pagination::from(PaginationParams {
        page: query.page,
        per_page: query.per_page,
    });
    let students = StudentRepo::new(state.pool())
        .list(query.search.as_deref(), page)
        .await?;
    Ok(Json(students))
}

/// GET /api/students/{id}
async fn get_student(
    State(state): State<AppState>,
    _admin: AdminUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Student>, ApiError> {
    let student = StudentRepo::new(state.pool()).get(id).await?;
    Ok(Json(student))
}

/// PATCH /api/students/{id}
async fn update_student(
    State(state): State<AppState>,
    _admin: AdminUser,
    ValidUuid(id): ValidUuid,
    ApiJson(req): ApiJson<UpdateStudentRequest>,
) -> Result<Json<Student>, ApiError> {
    let patch = StudentPatch {
        first_name: req
            .first_name
            .map(|n| bounded_text(&n, "First name", MAX_NAME_LEN))
            .transpose()?,
        last_name: req
            .last_name
            .map(|n| bounded_text(&n, "Last name", MAX_NAME_LEN))
            .transpose()?,
        email: req.email.map(|e| Email::new(&e)).transpose()?,
        phone: optional_phone(req.phone)?,
    };

    let student = StudentRepo::new(state.pool()).update(id, patch).await?;
    Ok(Json(student))
}

/// GET /api/students/{id}/enrollments - admins, or the student themself
async fn list_enrollments(
    State(state): State<AppState>,
    user: AuthUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Vec<EnrollmentWithClass>>, ApiError> {
    let student = StudentRepo::new(state.pool()).get(id).await?;
    if student.auth_user_id != user.user_id {
        let admin = AdminRepo::new(state.pool())
            .find(user.user_id, user.email.as_deref())
            .await?;
        if admin.is_none() {
            return Err(ApiError::forbidden("not your enrollments"));
        }
    }

    let enrollments = EnrollmentRepo::new(state.pool())
        .list_for_student(student.id)
        .await?;
    Ok(Json(enrollments))
}

/// Student routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/students", get(list_students).post(create_student))
        .route("/api/students/me", get(get_me))
        .route("/api/students/{id}", get(get_student).patch(update_student))
        .route("/api/students/{id}/enrollments", get(list_enrollments))
}
