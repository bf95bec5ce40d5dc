//! Class listings for the marketing site

use crate::db::ClassWithCourse;
use crate::providers::ClassListing;

/// Build the CMS listing for a class.
///
/// The item slug is the course slug plus the first block of the class id,
/// so several runs of one course stay unique in the collection.
pub fn listing(class: &ClassWithCourse) -> ClassListing {
    let id = class.class.id.to_string();
    let short_id = id.split('-').next().unwrap_or(&id);

    ClassListing {
        name: class.display_name(),
        slug: format!("{}-{}", class.course_slug, short_id),
        course: class.course_title.clone(),
        description: class.course_description.clone(),
        start_date: class.class.starts_at.to_rfc3339(),
        end_date: class.class.ends_at.map(|d| d.to_rfc3339()),
        location: class.class.location.clone(),
        instructor: class.class.instructor_name.clone(),
        price: format_price(class.price_cents()),
        class_id: id,
    }
}

/// Cents to a display price, e.g. `40000` -> `"$400.00"`.
pub fn format_price(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{}${}.{:02}", sign, cents / 100, cents % 100)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::db::Class;

    #[test]
    fn price_formatting() {
        assert_eq!(format_price(40_000), "$400.00");
        assert_eq!(format_price(1_999), "$19.99");
        assert_eq!(format_price(5), "$0.05");
        assert_eq!(format_price(-250), "-$2.50");
    }

    #[test]
    fn listing_from_class() {
        let starts = Utc.with_ymd_and_hms(2025, 3, 1, 18, 0, 0).unwrap();
        let id = Uuid::parse_str("1b4e28ba-2fa1-11d2-883f-0016d3cca427").unwrap();
        let class = ClassWithCourse {
            class: Class {
                id,
                course_id: Uuid::new_v4(),
                title: "Evening".into(),
                starts_at: starts,
                ends_at: None,
                location: Some("Shop B".into()),
                instructor_name: Some("Grace".into()),
                capacity: Some(12),
                price_cents: None,
                webflow_item_id: None,
                created_at: starts,
                updated_at: starts,
            },
            course_title: "Welding 101".into(),
            course_slug: "welding-101".into(),
            course_description: Some("Intro to MIG".into()),
            course_price_cents: 40_000,
            enrolled_count: 3,
        };

        let listing = listing(&class);
        assert_eq!(listing.slug, "welding-101-1b4e28ba");
        assert_eq!(listing.name, "Welding 101: Evening");
        assert_eq!(listing.price, "$400.00");
        assert_eq!(listing.start_date, "2025-03-01T18:00:00+00:00");
        assert_eq!(listing.class_id, id.to_string());
    }
}
