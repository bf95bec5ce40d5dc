//! Webflow CMS client
//!
//! Publishes classes as items in the marketing site's classes collection
//! (Data API v2).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{read_json, ProviderError};

const PROVIDER: &str = "webflow";
const DEFAULT_API_BASE: &str = "https://api.webflow.com";

/// Webflow configuration
#[derive(Debug, Clone)]
pub struct WebflowConfig {
    pub api_token: String,
    pub collection_id: String,
    pub api_base: String,
}

impl WebflowConfig {
    /// Read `WEBFLOW_API_TOKEN` and `WEBFLOW_COLLECTION_ID`.
    pub fn from_env() -> Option<Self> {
        let api_token = std::env::var("WEBFLOW_API_TOKEN")
            .ok()
            .filter(|v| !v.trim().is_empty())?;
        let collection_id = std::env::var("WEBFLOW_COLLECTION_ID")
            .ok()
            .filter(|v| !v.trim().is_empty())?;
        Some(Self {
            api_token,
            collection_id,
            api_base: DEFAULT_API_BASE.to_owned(),
        })
    }
}

/// Field data for a class item
///
/// Field slugs match the collection schema on the marketing site.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ClassListing {
    pub name: String,
    pub slug: String,
    pub course: String,
    pub description: Option<String>,
    pub start_date: String,
    pub end_date: Option<String>,
    pub location: Option<String>,
    pub instructor: Option<String>,
    pub price: String,
    pub class_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemBody<'a> {
    is_archived: bool,
    is_draft: bool,
    field_data: &'a ClassListing,
}

#[derive(Debug, Deserialize)]
struct Item {
    id: String,
}

/// CMS operations used when publishing classes
#[async_trait]
pub trait CmsGateway: Send + Sync {
    /// Create the item, or update it when `item_id` is known. Returns the
    /// item id.
    async fn upsert_class_item(
        &self,
        item_id: Option<&str>,
        listing: &ClassListing,
    ) -> Result<String, ProviderError>;
}

/// Webflow client
pub struct WebflowClient {
    client: Client,
    config: WebflowConfig,
}

impl WebflowClient {
    pub fn new(config: WebflowConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn items_url(&self) -> String {
        format!(
            "{}/v2/collections/{}/items",
            self.config.api_base.trim_end_matches('/'),
            self.config.collection_id
        )
    }
}

/// Webflow errors: `{"code": "validation_error", "message": "..."}`
fn error_message(body: &serde_json::Value) -> Option<String> {
    body.get("message")?.as_str().map(str::to_owned)
}

#[async_trait]
impl CmsGateway for WebflowClient {
    async fn upsert_class_item(
        &self,
        item_id: Option<&str>,
        listing: &ClassListing,
    ) -> Result<String, ProviderError> {
        let body = ItemBody {
            is_archived: false,
            is_draft: false,
            field_data: listing,
        };

        let request = match item_id {
            Some(id) => self.client.patch(format!("{}/{}", self.items_url(), id)),
            None => self.client.post(self.items_url()),
        };

        let response = request
            .bearer_auth(&self.config.api_token)
            .json(&body)
            .send()
            .await
            .map_err(ProviderError::http(PROVIDER))?;
        let item: Item = read_json(PROVIDER, response, error_message).await?;
        Ok(item.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_uses_collection_field_slugs() {
        let listing = ClassListing {
            name: "Welding 101: Evening".into(),
            slug: "welding-101-abc123".into(),
            course: "Welding 101".into(),
            description: None,
            start_date: "2025-03-01T18:00:00+00:00".into(),
            end_date: None,
            location: Some("Shop B".into()),
            instructor: None,
            price: "$400.00".into(),
            class_id: "abc".into(),
        };
        let body = ItemBody {
            is_archived: false,
            is_draft: false,
            field_data: &listing,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["isDraft"], false);
        assert_eq!(json["fieldData"]["start-date"], "2025-03-01T18:00:00+00:00");
        assert_eq!(json["fieldData"]["class-id"], "abc");
    }
}
