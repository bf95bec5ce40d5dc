//! Course catalogue endpoints

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Deserialize;

use crate::db::{Course, CourseRepo, NewCourse};
use crate::http::error::ApiError;
use crate::http::extractors::{AdminUser, ApiJson};
use crate::models::{bounded_text, require, CourseSlug, ValidationError};
use crate::state::AppState;

const MAX_TITLE_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 5000;

/// Create course request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    pub title: Option<String>,
    /// Derived from the title when omitted
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
}

impl CreateCourseRequest {
    fn validate(self) -> Result<NewCourse, ValidationError> {
        let title = bounded_text(require(self.title.as_deref(), "Title")?, "Title", MAX_TITLE_LEN)?;
        let slug = match self.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(slug) => CourseSlug::new(slug)?,
            None => CourseSlug::from_title(&title)?,
        };
        let description = self
            .description
            .filter(|d| !d.trim().is_empty())
            .map(|d| bounded_text(&d, "Description", MAX_DESCRIPTION_LEN))
            .transpose()?;
        let price_cents = self
            .price_cents
            .ok_or(ValidationError::Missing { field: "Price" })?;
        if price_cents < 0 {
            return Err(ValidationError::BelowMinimum {
                field: "Price",
                min: 0,
            });
        }

        Ok(NewCourse {
            title,
            slug,
            description,
            price_cents,
        })
    }
}

/// GET /api/courses
async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>, ApiError> {
    let courses = CourseRepo::new(state.pool()).list().await?;
    Ok(Json(courses))
}

/// POST /api/courses
async fn create_course(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiJson(req): ApiJson<CreateCourseRequest>,
) -> Result<(StatusCode, Json<Course>), ApiError> {
    let course = CourseRepo::new(state.pool()).create(req.validate()?).await?;
    tracing::info!(course_id = %course.id, slug = %course.slug, "course created");
    Ok((StatusCode::CREATED, Json(course)))
}

/// Course routes
pub fn router() -> Router<AppState> {
    Router::new().route("/api/courses", get(list_courses).post(create_course))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: Option<&str>, slug: Option<&str>, price: Option<i64>) -> CreateCourseRequest {
        CreateCourseRequest {
            title: title.map(str::to_owned),
            slug: slug.map(str::to_owned),
            description: Some("  ".into()),
            price_cents: price,
        }
    }

    #[test]
    fn slug_derived_from_title() {
        let course = request(Some("Intro to CAD!"), None, Some(10_000)).validate().unwrap();
        assert_eq!(course.slug.as_str(), "intro-to-cad");
        assert_eq!(course.description, None);
    }

    #[test]
    fn explicit_slug_is_validated() {
        let err = request(Some("CAD"), Some("Bad Slug"), Some(0)).validate().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { field: "slug", .. }));
    }

    #[test]
    fn price_is_required_and_non_negative() {
        let err = request(Some("CAD"), None, None).validate().unwrap_err();
        assert_eq!(err.to_string(), "Price is required");

        let err = request(Some("CAD"), None, Some(-1)).validate().unwrap_err();
        assert!(matches!(err, ValidationError::BelowMinimum { min: 0, .. }));
    }

    #[test]
    fn title_is_required() {
        let err = request(None, None, Some(100)).validate().unwrap_err();
        assert_eq!(err.to_string(), "Title is required");
    }
}
