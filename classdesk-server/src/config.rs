//! Runtime configuration loaded from the environment
//!
//! Provider credentials are optional: a missing provider disables only the
//! routes that need it.

use crate::auth::AuthConfig;
use crate::providers::{QuickBooksConfig, StripeConfig, WebflowConfig};

const DEFAULT_SUCCESS_URL: &str =
    "http://localhost:3000/checkout/success?session_id={CHECKOUT_SESSION_ID}";
const DEFAULT_CANCEL_URL: &str = "http://localhost:3000/checkout/cancel";
const DEFAULT_CURRENCY: &str = "usd";

/// Checkout redirect and currency settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// Stripe substitutes `{CHECKOUT_SESSION_ID}` in this URL
    pub success_url: String,
    pub cancel_url: String,
    pub currency: String,
}

impl CheckoutConfig {
    /// Read `CHECKOUT_SUCCESS_URL`, `CHECKOUT_CANCEL_URL` and `CHECKOUT_CURRENCY`.
    pub fn from_env() -> Self {
        Self {
            success_url: env_or("CHECKOUT_SUCCESS_URL", DEFAULT_SUCCESS_URL),
            cancel_url: env_or("CHECKOUT_CANCEL_URL", DEFAULT_CANCEL_URL),
            currency: env_or("CHECKOUT_CURRENCY", DEFAULT_CURRENCY).to_lowercase(),
        }
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            success_url: DEFAULT_SUCCESS_URL.to_owned(),
            cancel_url: DEFAULT_CANCEL_URL.to_owned(),
            currency: DEFAULT_CURRENCY.to_owned(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_owned())
}

/// Everything the API needs besides the database pool
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub auth: Option<AuthConfig>,
    pub stripe: Option<StripeConfig>,
    pub quickbooks: Option<QuickBooksConfig>,
    pub webflow: Option<WebflowConfig>,
    pub checkout: CheckoutConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            auth: AuthConfig::from_env(),
            stripe: StripeConfig::from_env(),
            quickbooks: QuickBooksConfig::from_env(),
            webflow: WebflowConfig::from_env(),
            checkout: CheckoutConfig::from_env(),
        }
    }

    /// Log which integrations are enabled.
    pub fn log_summary(&self) {
        tracing::info!(
            auth = self.auth.is_some(),
            stripe = self.stripe.is_some(),
            quickbooks = self.quickbooks.is_some(),
            webflow = self.webflow.is_some(),
            currency = %self.checkout.currency,
            "configuration loaded"
        );
        if self.auth.is_none() {
            tracing::warn!("SUPABASE_JWT_SECRET not set - authenticated routes will return 503");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_defaults() {
        let config = CheckoutConfig::default();
        assert!(config.success_url.contains("{CHECKOUT_SESSION_ID}"));
        assert_eq!(config.currency, "usd");
    }

    #[test]
    fn default_app_config_has_no_providers() {
        let config = AppConfig::default();
        assert!(config.auth.is_none());
        assert!(config.stripe.is_none());
        assert!(config.quickbooks.is_none());
        assert!(config.webflow.is_none());
    }
}
