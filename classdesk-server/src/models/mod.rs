//! Domain models with validation at construction
//!
//! Request input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod email;
pub mod enrollment_status;
pub mod ids;
pub mod pagination;
pub mod slug;
pub mod validation;

pub use email::Email;
pub use enrollment_status::EnrollmentStatus;
pub use ids::parse_id;
pub use pagination::{Pagination, Paginated, PaginationParams};
pub use slug::CourseSlug;
pub use validation::{bounded_text, require, ValidationError};
