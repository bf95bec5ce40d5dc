//! Stripe REST client
//!
//! Direct REST API integration (form-encoded requests, JSON responses).
//! Only the calls the checkout flow makes are wrapped.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use super::{read_json, ProviderError};

const PROVIDER: &str = "stripe";
const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// Stripe configuration
#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub api_base: String,
}

impl StripeConfig {
    /// Read `STRIPE_SECRET_KEY` (and optionally `STRIPE_API_BASE`).
    ///
    /// Returns `None` when no key is configured; checkout routes then
    /// answer 503.
    pub fn from_env() -> Option<Self> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())?;
        let api_base = std::env::var("STRIPE_API_BASE")
            .unwrap_or_else(|_| DEFAULT_API_BASE.to_owned());
        Some(Self {
            secret_key,
            api_base,
        })
    }
}

/// Input for a one-line, payment-mode checkout session
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSessionRequest {
    pub customer_id: Option<String>,
    pub customer_email: Option<String>,
    pub product_name: String,
    pub unit_amount_cents: i64,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
    pub client_reference_id: String,
    pub metadata: Vec<(String, String)>,
}

impl CheckoutSessionRequest {
    /// Flatten into Stripe's bracketed form encoding.
    pub fn to_form(&self) -> Vec<(String, String)> {
        let mut form = vec![
            ("mode".to_owned(), "payment".to_owned()),
            ("success_url".to_owned(), self.success_url.clone()),
            ("cancel_url".to_owned(), self.cancel_url.clone()),
            ("client_reference_id".to_owned(), self.client_reference_id.clone()),
            ("line_items[0][quantity]".to_owned(), "1".to_owned()),
            (
                "line_items[0][price_data][currency]".to_owned(),
                self.currency.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_owned(),
                self.unit_amount_cents.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_owned(),
                self.product_name.clone(),
            ),
        ];

        match (&self.customer_id, &self.customer_email) {
            (Some(customer), _) => form.push(("customer".to_owned(), customer.clone())),
            (None, Some(email)) => form.push(("customer_email".to_owned(), email.clone())),
            (None, None) => {}
        }

        for (key, value) in &self.metadata {
            form.push((format!("metadata[{}]", key), value.clone()));
            form.push((format!("payment_intent_data[metadata][{}]", key), value.clone()));
        }

        form
    }
}

/// Checkout session as returned by Stripe
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
    pub payment_status: String,
    pub payment_intent: Option<String>,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    pub customer: Option<String>,
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSession {
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }

    pub fn customer_email(&self) -> Option<&str> {
        self.customer_details.as_ref()?.email.as_deref()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerDetails {
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Payment intent as returned by Stripe
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub status: String,
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
struct Customer {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CustomerList {
    data: Vec<Customer>,
}

/// Payment provider operations used by checkout
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Find a customer by email, creating one when absent. Returns the id.
    async fn find_or_create_customer(
        &self,
        email: &str,
        name: Option<&str>,
    ) -> Result<String, ProviderError>;

    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, ProviderError>;

    async fn retrieve_checkout_session(&self, id: &str) -> Result<CheckoutSession, ProviderError>;

    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, ProviderError>;
}

/// Stripe client
pub struct StripeClient {
    client: Client,
    config: StripeConfig,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.api_base.trim_end_matches('/'), path)
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.config.secret_key)
            .query(query)
            .send()
            .await
            .map_err(ProviderError::http(PROVIDER))?;
        read_json(PROVIDER, response, error_message).await
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<T, ProviderError> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.config.secret_key)
            .form(form)
            .send()
            .await
            .map_err(ProviderError::http(PROVIDER))?;
        read_json(PROVIDER, response, error_message).await
    }
}

/// Stripe errors look like `{"error": {"message": "...", "type": "..."}}`.
fn error_message(body: &serde_json::Value) -> Option<String> {
    body.get("error")?
        .get("message")?
        .as_str()
        .map(str::to_owned)
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn find_or_create_customer(
        &self,
        email: &str,
        name: Option<&str>,
    ) -> Result<String, ProviderError> {
        let existing: CustomerList = self
            .get("customers", &[("email", email), ("limit", "1")])
            .await?;
        if let Some(customer) = existing.data.into_iter().next() {
            return Ok(customer.id);
        }

        let mut form = vec![("email".to_owned(), email.to_owned())];
        if let Some(name) = name {
            form.push(("name".to_owned(), name.to_owned()));
        }
        let created: Customer = self.post("customers", &form).await?;
        tracing::info!(customer_id = %created.id, "created stripe customer");
        Ok(created.id)
    }

    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, ProviderError> {
        self.post("checkout/sessions", &request.to_form()).await
    }

    async fn retrieve_checkout_session(&self, id: &str) -> Result<CheckoutSession, ProviderError> {
        self.get(&format!("checkout/sessions/{}", id), &[]).await
    }

    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, ProviderError> {
        self.get(&format!("payment_intents/{}", id), &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CheckoutSessionRequest {
        CheckoutSessionRequest {
            customer_id: None,
            customer_email: Some("ada@example.com".into()),
            product_name: "Welding 101".into(),
            unit_amount_cents: 40_000,
            currency: "usd".into(),
            success_url: "https://example.com/ok".into(),
            cancel_url: "https://example.com/cancel".into(),
            client_reference_id: "class-1".into(),
            metadata: vec![("class_id".into(), "class-1".into())],
        }
    }

    fn value<'a>(form: &'a [(String, String)], key: &str) -> Option<&'a str> {
        form.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn form_encodes_line_item_and_metadata() {
        let form = request().to_form();
        assert_eq!(value(&form, "mode"), Some("payment"));
        assert_eq!(value(&form, "line_items[0][price_data][unit_amount]"), Some("40000"));
        assert_eq!(value(&form, "customer_email"), Some("ada@example.com"));
        assert_eq!(value(&form, "metadata[class_id]"), Some("class-1"));
        assert_eq!(
            value(&form, "payment_intent_data[metadata][class_id]"),
            Some("class-1")
        );
    }

    #[test]
    fn customer_id_wins_over_email() {
        let mut req = request();
        req.customer_id = Some("cus_123".into());
        let form = req.to_form();
        assert_eq!(value(&form, "customer"), Some("cus_123"));
        assert_eq!(value(&form, "customer_email"), None);
    }

    #[test]
    fn parses_checkout_session() {
        let json = r#"{
            "id": "cs_test_1",
            "url": null,
            "payment_status": "paid",
            "payment_intent": "pi_1",
            "amount_total": 40000,
            "currency": "usd",
            "customer": "cus_1",
            "customer_details": {"email": "ada@example.com", "name": "Ada"},
            "metadata": {"class_id": "abc"}
        }"#;
        let session: CheckoutSession = serde_json::from_str(json).unwrap();
        assert!(session.is_paid());
        assert_eq!(session.customer_email(), Some("ada@example.com"));
        assert_eq!(session.metadata.get("class_id").map(String::as_str), Some("abc"));
    }

    #[test]
    fn extracts_error_message() {
        let body = serde_json::json!({
            "error": {"message": "No such session", "type": "invalid_request_error"}
        });
        assert_eq!(error_message(&body).as_deref(), Some("No such session"));
        assert_eq!(error_message(&serde_json::json!({})), None);
    }
}
