//! Checkout session building and completion
//!
//! A session carries `class_id` and (when known) `student_id` in its
//! metadata; completion reads them back to record the enrollment.

use uuid::Uuid;

use crate::config::CheckoutConfig;
use crate::db::{ClassWithCourse, PaidCheckout};
use crate::providers::{CheckoutSession, CheckoutSessionRequest};

pub const CLASS_ID_KEY: &str = "class_id";
pub const STUDENT_ID_KEY: &str = "student_id";

/// Who is paying, as far as we know before checkout
#[derive(Debug, Clone, Default)]
pub struct Payer {
    pub student_id: Option<Uuid>,
    pub stripe_customer_id: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("checkout session is not paid (payment status: {0})")]
    NotPaid(String),

    #[error("checkout session metadata has no valid {0}")]
    Metadata(&'static str),

    #[error("class is full")]
    ClassFull,
}

/// Build the Stripe session request for one seat in `class`.
pub fn session_request(
    class: &ClassWithCourse,
    payer: &Payer,
    config: &CheckoutConfig,
) -> Result<CheckoutSessionRequest, CheckoutError> {
    if class.is_full() {
        return Err(CheckoutError::ClassFull);
    }

    let class_id = class.class.id.to_string();
    let mut metadata = vec![(CLASS_ID_KEY.to_owned(), class_id.clone())];
    if let Some(student_id) = payer.student_id {
        metadata.push((STUDENT_ID_KEY.to_owned(), student_id.to_string()));
    }

    Ok(CheckoutSessionRequest {
        customer_id: payer.stripe_customer_id.clone(),
        customer_email: payer.email.clone(),
        product_name: class.display_name(),
        unit_amount_cents: class.price_cents(),
        currency: config.currency.clone(),
        success_url: config.success_url.clone(),
        cancel_url: config.cancel_url.clone(),
        client_reference_id: class_id,
        metadata,
    })
}

/// Ids carried by a paid session.
///
/// The student id is optional: sessions started anonymously are matched to
/// a student by the payer's email afterwards.
pub fn paid_session_ids(session: &CheckoutSession) -> Result<(Uuid, Option<Uuid>), CheckoutError> {
    if !session.is_paid() {
        return Err(CheckoutError::NotPaid(session.payment_status.clone()));
    }

    let class_id =
        metadata_id(session, CLASS_ID_KEY)?.ok_or(CheckoutError::Metadata(CLASS_ID_KEY))?;
    let student_id = metadata_id(session, STUDENT_ID_KEY)?;
    Ok((class_id, student_id))
}

fn metadata_id(
    session: &CheckoutSession,
    key: &'static str,
) -> Result<Option<Uuid>, CheckoutError> {
    match session.metadata.get(key) {
        None => Ok(None),
        Some(raw) => Uuid::parse_str(raw)
            .map(Some)
            .map_err(|_| CheckoutError::Metadata(key)),
    }
}

/// Turn a paid session into the rows to record.
///
/// The amount falls back to the class price when Stripe omits the total.
pub fn paid_checkout(
    session: &CheckoutSession,
    class: &ClassWithCourse,
    student_id: Uuid,
    default_currency: &str,
) -> Result<PaidCheckout, CheckoutError> {
    let payment_intent_id = session
        .payment_intent
        .clone()
        .ok_or(CheckoutError::Metadata("payment_intent"))?;

    Ok(PaidCheckout {
        student_id,
        class_id: class.class.id,
        amount_cents: session.amount_total.unwrap_or_else(|| class.price_cents()),
        currency: session
            .currency
            .clone()
            .unwrap_or_else(|| default_currency.to_owned()),
        description: class.display_name(),
        payment_intent_id,
        checkout_session_id: session.id.clone(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;

    use super::*;
    use crate::db::Class;

    fn class(capacity: Option<i32>, enrolled: i64) -> ClassWithCourse {
        let now = Utc::now();
        ClassWithCourse {
            class: Class {
                id: Uuid::new_v4(),
                course_id: Uuid::new_v4(),
                title: "Evening".into(),
                starts_at: now,
                ends_at: None,
                location: None,
                instructor_name: None,
                capacity,
                price_cents: Some(35_000),
                webflow_item_id: None,
                created_at: now,
                updated_at: now,
            },
            course_title: "Welding 101".into(),
            course_slug: "welding-101".into(),
            course_description: None,
            course_price_cents: 40_000,
            enrolled_count: enrolled,
        }
    }

    fn session(status: &str, metadata: &[(&str, &str)]) -> CheckoutSession {
        CheckoutSession {
            id: "cs_1".into(),
            url: None,
            payment_status: status.into(),
            payment_intent: Some("pi_1".into()),
            amount_total: Some(35_000),
            currency: Some("usd".into()),
            customer: None,
            customer_details: None,
            metadata: metadata
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn request_uses_class_price_and_metadata() {
        let class = class(None, 0);
        let student_id = Uuid::new_v4();
        let payer = Payer {
            student_id: Some(student_id),
            stripe_customer_id: Some("cus_1".into()),
            email: None,
        };

        let request = session_request(&class, &payer, &CheckoutConfig::default()).unwrap();
        assert_eq!(request.unit_amount_cents, 35_000);
        assert_eq!(request.product_name, "Welding 101: Evening");
        assert_eq!(request.customer_id.as_deref(), Some("cus_1"));
        assert!(request
            .metadata
            .contains(&(STUDENT_ID_KEY.to_owned(), student_id.to_string())));
        assert_eq!(request.client_reference_id, class.class.id.to_string());
    }

    #[test]
    fn full_class_is_rejected() {
        let err = session_request(&class(Some(2), 2), &Payer::default(), &CheckoutConfig::default())
            .unwrap_err();
        assert_eq!(err, CheckoutError::ClassFull);
    }

    #[test]
    fn unpaid_session_is_rejected() {
        let err = paid_session_ids(&session("unpaid", &[])).unwrap_err();
        assert_eq!(err, CheckoutError::NotPaid("unpaid".into()));
    }

    #[test]
    fn paid_session_ids_read_metadata() {
        let class_id = Uuid::new_v4();
        let id = class_id.to_string();
        let (class, student) = paid_session_ids(&session("paid", &[(CLASS_ID_KEY, &id)])).unwrap();
        assert_eq!(class, class_id);
        assert_eq!(student, None);

        let err = paid_session_ids(&session("paid", &[(CLASS_ID_KEY, "nope")])).unwrap_err();
        assert_eq!(err, CheckoutError::Metadata(CLASS_ID_KEY));
    }

    #[test]
    fn paid_checkout_takes_amount_from_session() {
        let class = class(None, 0);
        let paid = paid_checkout(&session("paid", &[]), &class, Uuid::new_v4(), "usd").unwrap();
        assert_eq!(paid.amount_cents, 35_000);
        assert_eq!(paid.class_id, class.class.id);
        assert_eq!(paid.payment_intent_id, "pi_1");
        assert_eq!(paid.checkout_session_id, "cs_1");
        assert_eq!(paid.description, "Welding 101: Evening");
    }

    #[test]
    fn paid_checkout_falls_back_to_class_price() {
        let mut session = session("paid", &[]);
        session.amount_total = None;
        session.currency = None;
        let paid = paid_checkout(&session, &class(None, 0), Uuid::new_v4(), "cad").unwrap();
        assert_eq!(paid.amount_cents, 35_000);
        assert_eq!(paid.currency, "cad");
    }
}
