//! Class endpoints
//!
//! Listings are public; scheduling, rosters and publishing are admin-only.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::db::{
    Class, ClassFilter, ClassPatch, ClassRepo, ClassWithCount, NewClass, RosterEntry,
};
use crate::http::error::ApiError;
use crate::http::extractors::{AdminUser, ApiJson, ValidUuid};
use crate::models::{
    bounded_text, parse_id, require, Paginated, Pagination, PaginationParams, ValidationError,
};
use crate::services::publishing;
use crate::state::AppState;

const MAX_TITLE_LEN: usize = 200;
const MAX_TEXT_LEN: usize = 200;

/// List query
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListClassesQuery {
    pub course_id: Option<String>,
    #[serde(default)]
    pub upcoming: bool,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Create class request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClassRequest {
    pub course_id: Option<String>,
    pub title: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub instructor_name: Option<String>,
    pub capacity: Option<i32>,
    pub price_cents: Option<i64>,
}

/// Partial update request
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClassRequest {
    pub title: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub instructor_name: Option<String>,
    pub capacity: Option<i32>,
    pub price_cents: Option<i64>,
}

fn optional_text(
    value: Option<String>,
    field: &'static str,
) -> Result<Option<String>, ValidationError> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| bounded_text(&v, field, MAX_TEXT_LEN))
        .transpose()
}

fn check_capacity(capacity: Option<i32>) -> Result<(), ValidationError> {
    match capacity {
        Some(c) if c < 1 => Err(ValidationError::BelowMinimum {
            field: "Capacity",
            min: 1,
        }),
        _ => Ok(()),
    }
}

fn check_price(price_cents: Option<i64>) -> Result<(), ValidationError> {
    match price_cents {
        Some(p) if p < 0 => Err(ValidationError::BelowMinimum {
            field: "Price",
            min: 0,
        }),
        _ => Ok(()),
    }
}

fn check_schedule(
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    match ends_at {
        Some(end) if end < starts_at => Err(ValidationError::InvalidFormat {
            field: "End time",
            reason: "must not be before the start time",
        }),
        _ => Ok(()),
    }
}

/// Check a patch's schedule against the stored class it will be merged into.
fn check_patch_schedule(patch: &ClassPatch, stored: &Class) -> Result<(), ValidationError> {
    let starts_at = patch.starts_at.unwrap_or(stored.starts_at);
    check_schedule(starts_at, patch.ends_at.or(stored.ends_at))
}

impl CreateClassRequest {
    fn validate(self) -> Result<NewClass, ValidationError> {
        let course_id = parse_id(self.course_id.as_deref(), "Course ID")?;
        let title = bounded_text(require(self.title.as_deref(), "Title")?, "Title", MAX_TITLE_LEN)?;
        let starts_at = self
            .starts_at
            .ok_or(ValidationError::Missing { field: "Start time" })?;
        check_schedule(starts_at, self.ends_at)?;
        check_capacity(self.capacity)?;
        check_price(self.price_cents)?;

        Ok(NewClass {
            course_id,
            title,
            starts_at,
            ends_at: self.ends_at,
            location: optional_text(self.location, "Location")?,
            instructor_name: optional_text(self.instructor_name, "Instructor")?,
            capacity: self.capacity,
            price_cents: self.price_cents,
        })
    }
}

impl UpdateClassRequest {
    fn validate(self) -> Result<ClassPatch, ValidationError> {
        let title = self
            .title
            .map(|t| bounded_text(&t, "Title", MAX_TITLE_LEN))
            .transpose()?;
        if let (Some(start), end) = (self.starts_at, self.ends_at) {
            check_schedule(start, end)?;
        }
        check_capacity(self.capacity)?;
        check_price(self.price_cents)?;

        Ok(ClassPatch {
            title,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            location: optional_text(self.location, "Location")?,
            instructor_name: optional_text(self.instructor_name, "Instructor")?,
            capacity: self.capacity,
            price_cents: self.price_cents,
        })
    }
}

/// GET /api/classes
async fn list_classes(
    State(state): State<AppState>,
    Query(query): Query<ListClassesQuery>,
) -> Result<Json<Paginated<ClassWithCount>>, ApiError> {
    let course_id = match query.course_id.as_deref() {
        Some(raw) => Some(parse_id(Some(raw), "Course ID")?),
        None => None,
    };
    let filter = ClassFilter {
        course_id,
        upcoming_only: query.upcoming,
    };
    let page = Pagination::from(PaginationParams {
        page: query.page,
        per_page: query.per_page,
    });

    let classes = ClassRepo::new(state.pool()).list(filter, page).await?;
    Ok(Json(classes))
}

/// GET /api/classes/{id}
async fn get_class(
    State(state): State<AppState>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<ClassWithCount>, ApiError> {
    let class = ClassRepo::new(state.pool()).get(id).await?;
    Ok(Json(class))
}

/// POST /api/classes
async fn create_class(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(req): ApiJson<CreateClassRequest>,
) -> Result<(StatusCode, Json<Class>), ApiError> {
    let class = ClassRepo::new(state.pool()).create(req.validate()?).await?;
    tracing::info!(class_id = %class.id, course_id = %class.course_id, "class created");
    Ok((StatusCode::CREATED, Json(class)))
}

/// PATCH /api/classes/{id}
async fn update_class(
    State(state): State<AppState>,
    _admin: AdminUser,
    ValidUuid(id): ValidUuid,
    ApiJson(req): ApiJson<UpdateClassRequest>,
) -> Result<Json<Class>, ApiError> {
    let repo = ClassRepo::new(state.pool());
    let patch = req.validate()?;
    if patch.starts_at.is_some() || patch.ends_at.is_some() {
        let stored = repo.get(id).await?;
        check_patch_schedule(&patch, &stored.class)?;
    }

    let class = repo.update(id, patch).await?;
    Ok(Json(class))
}

/// GET /api/classes/{id}/roster
async fn roster(
    State(state): State<AppState>,
    _admin: AdminUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Vec<RosterEntry>>, ApiError> {
    let roster = ClassRepo::new(state.pool()).roster(id).await?;
    Ok(Json(roster))
}

/// POST /api/classes/{id}/publish - create or update the CMS item
async fn publish(
    State(state): State<AppState>,
    _admin: AdminUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<ClassWithCount>, ApiError> {
    let cms = state
        .cms()
        .ok_or(ApiError::NotConfigured { feature: "webflow" })?;
    let repo = ClassRepo::new(state.pool());

    let class = repo.get_with_course(id).await?;
    let listing = publishing::listing(&class);
    let item_id = cms
        .upsert_class_item(class.class.webflow_item_id.as_deref(), &listing)
        .await?;
    repo.set_webflow_item(id, &item_id).await?;

    tracing::info!(class_id = %id, webflow_item_id = %item_id, "class published");
    Ok(Json(repo.get(id).await?))
}

/// Class routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/classes", get(list_classes).post(create_class))
        .route("/api/classes/{id}", get(get_class).patch(update_class))
        .route("/api/classes/{id}/roster", get(roster))
        .route("/api/classes/{id}/publish", post(publish))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::{send, state_builder};
    use axum::http::Method;
    use chrono::Duration;
    use uuid::Uuid;

    fn create_request() -> CreateClassRequest {
        CreateClassRequest {
            course_id: Some(Uuid::new_v4().to_string()),
            title: Some("Evening".into()),
            starts_at: Some(Utc::now()),
            ends_at: None,
            location: Some("Shop B".into()),
            instructor_name: None,
            capacity: Some(12),
            price_cents: None,
        }
    }

    #[test]
    fn valid_create_request() {
        let class = create_request().validate().unwrap();
        assert_eq!(class.title, "Evening");
        assert_eq!(class.capacity, Some(12));
    }

    #[test]
    fn create_requires_course_id() {
        let mut req = create_request();
        req.course_id = None;
        assert_eq!(req.validate().unwrap_err().to_string(), "Course ID is required");
    }

    #[test]
    fn end_before_start_is_rejected() {
        let mut req = create_request();
        req.ends_at = Some(Utc::now() - Duration::days(1));
        req.starts_at = Some(Utc::now());
        assert!(matches!(
            req.validate().unwrap_err(),
            ValidationError::InvalidFormat { field: "End time", .. }
        ));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let mut req = create_request();
        req.capacity = Some(0);
        assert!(matches!(
            req.validate().unwrap_err(),
            ValidationError::BelowMinimum { field: "Capacity", min: 1 }
        ));
    }

    #[test]
    fn empty_patch_is_valid() {
        let patch = UpdateClassRequest::default().validate().unwrap();
        assert!(patch.title.is_none());
    }

    fn stored_class(ends_in_hours: Option<i64>) -> Class {
        let now = Utc::now();
        Class {
            id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            title: "Evening".into(),
            starts_at: now,
            ends_at: ends_in_hours.map(|h| now + Duration::hours(h)),
            location: None,
            instructor_name: None,
            capacity: None,
            price_cents: None,
            webflow_item_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn patch_end_before_stored_start_is_rejected() {
        let stored = stored_class(None);
        let patch = ClassPatch {
            ends_at: Some(stored.starts_at - Duration::hours(1)),
            ..ClassPatch::default()
        };
        assert!(matches!(
            check_patch_schedule(&patch, &stored).unwrap_err(),
            ValidationError::InvalidFormat { field: "End time", .. }
        ));
    }

    #[test]
    fn patch_start_after_stored_end_is_rejected() {
        let stored = stored_class(Some(3));
        let patch = ClassPatch {
            starts_at: Some(stored.starts_at + Duration::hours(4)),
            ..ClassPatch::default()
        };
        assert!(check_patch_schedule(&patch, &stored).is_err());
    }

    #[test]
    fn patch_moving_both_ends_is_checked_on_its_own_values() {
        let stored = stored_class(Some(3));
        let patch = ClassPatch {
            starts_at: Some(stored.starts_at + Duration::days(7)),
            ends_at: Some(stored.starts_at + Duration::days(7) + Duration::hours(3)),
            ..ClassPatch::default()
        };
        assert!(check_patch_schedule(&patch, &stored).is_ok());
    }

    #[tokio::test]
    async fn list_rejects_malformed_course_id() {
        let app = router().with_state(state_builder().build());
        let (status, json) = send(app, Method::GET, "/api/classes?courseId=abc", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn create_requires_admin_token() {
        let app = router().with_state(state_builder().build());
        let (status, _) = send(
            app,
            Method::POST,
            "/api/classes",
            None,
            Some(serde_json::json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
