//! Third-party provider clients
//!
//! Each provider is reached over its REST API with `reqwest` and sits
//! behind a trait so handlers can be exercised with in-memory fakes:
//! - stripe: customers, checkout sessions, payment intents
//! - quickbooks: customers, categories, items, invoices
//! - webflow: CMS collection items for published classes

pub mod quickbooks;
pub mod stripe;
pub mod webflow;

pub use quickbooks::{
    CreatedInvoice, InvoiceLine, InvoicingGateway, NewInvoice, QuickBooksClient, QuickBooksConfig,
};
pub use stripe::{
    CheckoutSession, CheckoutSessionRequest, PaymentGateway, PaymentIntent, StripeClient,
    StripeConfig,
};
pub use webflow::{ClassListing, CmsGateway, WebflowClient, WebflowConfig};

/// Error from a provider call
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Transport failure (DNS, TLS, timeout, undecodable body)
    #[error("{provider} request failed: {source}")]
    Http {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The provider answered with an error status
    #[error("{provider} returned {status}: {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    /// The provider answered 2xx but without the data we asked for
    #[error("{provider} response missing {what}")]
    MissingData {
        provider: &'static str,
        what: &'static str,
    },
}

impl ProviderError {
    pub fn provider(&self) -> &'static str {
        match self {
            Self::Http { provider, .. }
            | Self::Api { provider, .. }
            | Self::MissingData { provider, .. } => provider,
        }
    }

    pub(crate) fn http(provider: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::Http { provider, source }
    }
}

/// Read a JSON body, turning non-2xx statuses into `ProviderError::Api`.
///
/// `extract_message` pulls the human-readable message out of the
/// provider's error envelope; the raw body is used when it returns `None`.
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    provider: &'static str,
    response: reqwest::Response,
    extract_message: fn(&serde_json::Value) -> Option<String>,
) -> Result<T, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return response.json::<T>().await.map_err(ProviderError::http(provider));
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| extract_message(&v))
        .unwrap_or(body);

    Err(ProviderError::Api {
        provider,
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display() {
        let err = ProviderError::Api {
            provider: "stripe",
            status: 402,
            message: "Your card was declined.".into(),
        };
        assert_eq!(err.to_string(), "stripe returned 402: Your card was declined.");
        assert_eq!(err.provider(), "stripe");
    }
}
