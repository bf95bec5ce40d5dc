//! QuickBooks Online accounting client
//!
//! Find-or-create helpers for customers, categories and service items, plus
//! invoice creation. Authenticates with a pre-issued OAuth access token;
//! refreshing it is outside this client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{read_json, ProviderError};

const PROVIDER: &str = "quickbooks";
const SANDBOX_API_BASE: &str = "https://sandbox-quickbooks.api.intuit.com";
const PRODUCTION_API_BASE: &str = "https://quickbooks.api.intuit.com";
const MINOR_VERSION: &str = "75";

/// QuickBooks configuration
#[derive(Debug, Clone)]
pub struct QuickBooksConfig {
    pub access_token: String,
    pub realm_id: String,
    pub api_base: String,
    /// Income account new service items post to
    pub income_account_id: String,
}

impl QuickBooksConfig {
    /// Read `QUICKBOOKS_ACCESS_TOKEN` and `QUICKBOOKS_REALM_ID`.
    ///
    /// `QUICKBOOKS_ENVIRONMENT=production` selects the production API;
    /// anything else uses the sandbox.
    pub fn from_env() -> Option<Self> {
        let access_token = non_empty_env("QUICKBOOKS_ACCESS_TOKEN")?;
        let realm_id = non_empty_env("QUICKBOOKS_REALM_ID")?;
        let environment = std::env::var("QUICKBOOKS_ENVIRONMENT").unwrap_or_default();
        let income_account_id =
            non_empty_env("QUICKBOOKS_INCOME_ACCOUNT_ID").unwrap_or_else(|| "1".to_owned());

        Some(Self {
            access_token,
            realm_id,
            api_base: api_base_for(&environment).to_owned(),
            income_account_id,
        })
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn api_base_for(environment: &str) -> &'static str {
    if environment.eq_ignore_ascii_case("production") {
        PRODUCTION_API_BASE
    } else {
        SANDBOX_API_BASE
    }
}

/// Reference to another QuickBooks entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ref {
    pub value: String,
}

impl Ref {
    fn to(id: &str) -> Self {
        Self {
            value: id.to_owned(),
        }
    }
}

/// One invoice line
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceLine {
    pub item_id: String,
    pub description: String,
    pub amount_cents: i64,
}

/// Invoice to create
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoice {
    pub customer_id: String,
    pub bill_email: Option<String>,
    pub lines: Vec<InvoiceLine>,
    pub private_note: Option<String>,
}

/// Created invoice identifiers
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CreatedInvoice {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "DocNumber")]
    pub doc_number: Option<String>,
}

/// Invoicing operations used by the invoice flow
#[async_trait]
pub trait InvoicingGateway: Send + Sync {
    /// Returns the customer id.
    async fn find_or_create_customer(
        &self,
        display_name: &str,
        email: Option<&str>,
    ) -> Result<String, ProviderError>;

    /// Returns the category id. `parent_id` makes it a subcategory.
    async fn find_or_create_category(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<String, ProviderError>;

    /// Returns the service item id. `category_id` files it under a category.
    async fn find_or_create_item(
        &self,
        name: &str,
        unit_price_cents: i64,
        category_id: Option<&str>,
    ) -> Result<String, ProviderError>;

    async fn create_invoice(&self, invoice: &NewInvoice) -> Result<CreatedInvoice, ProviderError>;
}

// Wire types (PascalCase, dollars as decimals)

#[derive(Debug, Deserialize)]
struct Entity {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "ParentRef", default)]
    parent_ref: Option<Ref>,
}

impl Entity {
    fn has_parent(&self, parent_id: Option<&str>) -> bool {
        self.parent_ref.as_ref().map(|r| r.value.as_str()) == parent_id
    }
}

#[derive(Debug, Deserialize)]
struct QueryEnvelope {
    #[serde(rename = "QueryResponse", default)]
    query_response: QueryResponse,
}

#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(rename = "Customer", default)]
    customer: Vec<Entity>,
    #[serde(rename = "Item", default)]
    item: Vec<Entity>,
}

#[derive(Debug, Deserialize)]
struct CustomerEnvelope {
    #[serde(rename = "Customer")]
    customer: Entity,
}

#[derive(Debug, Deserialize)]
struct ItemEnvelope {
    #[serde(rename = "Item")]
    item: Entity,
}

#[derive(Debug, Deserialize)]
struct InvoiceEnvelope {
    #[serde(rename = "Invoice")]
    invoice: CreatedInvoice,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct EmailAddr<'a> {
    address: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CustomerBody<'a> {
    display_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    primary_email_addr: Option<EmailAddr<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ItemBody<'a> {
    name: &'a str,
    #[serde(rename = "Type")]
    item_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    income_account_ref: Option<Ref>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit_price: Option<f64>,
    sub_item: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_ref: Option<Ref>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct InvoiceBody<'a> {
    customer_ref: Ref,
    line: Vec<LineBody<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bill_email: Option<EmailAddr<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    private_note: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct LineBody<'a> {
    amount: f64,
    description: &'a str,
    detail_type: &'static str,
    sales_item_line_detail: SalesItemLineDetail,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SalesItemLineDetail {
    item_ref: Ref,
    qty: u32,
    unit_price: f64,
}

fn dollars(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Escape a value for a QuickBooks query string literal.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Categories with the same name can sit under different parents; callers
/// pick the match by `ParentRef`.
fn category_query(name: &str) -> String {
    format!("select * from Item where Type = 'Category' and Name = {}", quote(name))
}

fn invoice_body(invoice: &NewInvoice) -> InvoiceBody<'_> {
    InvoiceBody {
        customer_ref: Ref::to(&invoice.customer_id),
        line: invoice
            .lines
            .iter()
            .map(|line| LineBody {
                amount: dollars(line.amount_cents),
                description: &line.description,
                detail_type: "SalesItemLineDetail",
                sales_item_line_detail: SalesItemLineDetail {
                    item_ref: Ref::to(&line.item_id),
                    qty: 1,
                    unit_price: dollars(line.amount_cents),
                },
            })
            .collect(),
        bill_email: invoice
            .bill_email
            .as_deref()
            .map(|address| EmailAddr { address }),
        private_note: invoice.private_note.as_deref(),
    }
}

/// Fault envelope: `{"Fault": {"Error": [{"Message": "...", "Detail": "..."}]}}`
fn error_message(body: &serde_json::Value) -> Option<String> {
    let first = body.get("Fault")?.get("Error")?.get(0)?;
    first
        .get("Detail")
        .or_else(|| first.get("Message"))?
        .as_str()
        .map(str::to_owned)
}

/// QuickBooks Online client
pub struct QuickBooksClient {
    client: Client,
    config: QuickBooksConfig,
}

impl QuickBooksClient {
    pub fn new(config: QuickBooksConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/v3/company/{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.realm_id,
            path
        )
    }

    async fn query(&self, statement: &str) -> Result<QueryResponse, ProviderError> {
        tracing::debug!(statement, "quickbooks query");
        let response = self
            .client
            .get(self.url("query"))
            .bearer_auth(&self.config.access_token)
            .header("Accept", "application/json")
            .query(&[("query", statement), ("minorversion", MINOR_VERSION)])
            .send()
            .await
            .map_err(ProviderError::http(PROVIDER))?;
        let envelope: QueryEnvelope = read_json(PROVIDER, response, error_message).await?;
        Ok(envelope.query_response)
    }

    async fn create<B: Serialize + Sync, T: serde::de::DeserializeOwned>(
        &self,
        entity: &str,
        body: &B,
    ) -> Result<T, ProviderError> {
        let response = self
            .client
            .post(self.url(entity))
            .bearer_auth(&self.config.access_token)
            .header("Accept", "application/json")
            .query(&[("minorversion", MINOR_VERSION)])
            .json(body)
            .send()
            .await
            .map_err(ProviderError::http(PROVIDER))?;
        read_json(PROVIDER, response, error_message).await
    }
}

#[async_trait]
impl InvoicingGateway for QuickBooksClient {
    async fn find_or_create_customer(
        &self,
        display_name: &str,
        email: Option<&str>,
    ) -> Result<String, ProviderError> {
        let found = self
            .query(&format!(
                "select * from Customer where DisplayName = {}",
                quote(display_name)
            ))
            .await?;
        if let Some(customer) = found.customer.into_iter().next() {
            return Ok(customer.id);
        }

        let body = CustomerBody {
            display_name,
            primary_email_addr: email.map(|address| EmailAddr { address }),
        };
        let created: CustomerEnvelope = self.create("customer", &body).await?;
        tracing::info!(customer_id = %created.customer.id, "created quickbooks customer");
        Ok(created.customer.id)
    }

    async fn find_or_create_category(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<String, ProviderError> {
        let found = self.query(&category_query(name)).await?;
        if let Some(item) = found.item.into_iter().find(|item| item.has_parent(parent_id)) {
            return Ok(item.id);
        }

        let body = ItemBody {
            name,
            item_type: "Category",
            income_account_ref: None,
            unit_price: None,
            sub_item: parent_id.is_some(),
            parent_ref: parent_id.map(Ref::to),
        };
        let created: ItemEnvelope = self.create("item", &body).await?;
        Ok(created.item.id)
    }

    async fn find_or_create_item(
        &self,
        name: &str,
        unit_price_cents: i64,
        category_id: Option<&str>,
    ) -> Result<String, ProviderError> {
        let found = self
            .query(&format!(
                "select * from Item where Type = 'Service' and Name = {}",
                quote(name)
            ))
            .await?;
        if let Some(item) = found.item.into_iter().next() {
            return Ok(item.id);
        }

        let body = ItemBody {
            name,
            item_type: "Service",
            income_account_ref: Some(Ref::to(&self.config.income_account_id)),
            unit_price: Some(dollars(unit_price_cents)),
            sub_item: category_id.is_some(),
            parent_ref: category_id.map(Ref::to),
        };
        let created: ItemEnvelope = self.create("item", &body).await?;
        Ok(created.item.id)
    }

    async fn create_invoice(&self, invoice: &NewInvoice) -> Result<CreatedInvoice, ProviderError> {
        if invoice.lines.is_empty() {
            return Err(ProviderError::MissingData {
                provider: PROVIDER,
                what: "invoice lines",
            });
        }
        let created: InvoiceEnvelope = self.create("invoice", &invoice_body(invoice)).await?;
        Ok(created.invoice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_query_literals() {
        assert_eq!(quote("O'Brien"), r"'O\'Brien'");
        assert_eq!(quote("plain"), "'plain'");
    }

    #[test]
    fn environment_selects_base() {
        assert_eq!(api_base_for("production"), PRODUCTION_API_BASE);
        assert_eq!(api_base_for("Production"), PRODUCTION_API_BASE);
        assert_eq!(api_base_for(""), SANDBOX_API_BASE);
        assert_eq!(api_base_for("sandbox"), SANDBOX_API_BASE);
    }

    #[test]
    fn invoice_body_uses_dollars_and_pascal_case() {
        let invoice = NewInvoice {
            customer_id: "58".into(),
            bill_email: Some("ada@example.com".into()),
            lines: vec![InvoiceLine {
                item_id: "7".into(),
                description: "Welding 101".into(),
                amount_cents: 40_050,
            }],
            private_note: None,
        };
        let json = serde_json::to_value(invoice_body(&invoice)).unwrap();
        assert_eq!(json["CustomerRef"]["value"], "58");
        assert_eq!(json["Line"][0]["Amount"], 400.5);
        assert_eq!(json["Line"][0]["DetailType"], "SalesItemLineDetail");
        assert_eq!(json["Line"][0]["SalesItemLineDetail"]["ItemRef"]["value"], "7");
        assert_eq!(json["BillEmail"]["Address"], "ada@example.com");
        assert!(json.get("PrivateNote").is_none());
    }

    #[test]
    fn parses_query_response() {
        let json =
            r#"{"QueryResponse": {"Customer": [{"Id": "12", "DisplayName": "Ada"}]}, "time": "x"}"#;
        let envelope: QueryEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.query_response.customer[0].id, "12");
        assert!(envelope.query_response.item.is_empty());

        let empty: QueryEnvelope = serde_json::from_str(r#"{"QueryResponse": {}}"#).unwrap();
        assert!(empty.query_response.customer.is_empty());
    }

    #[test]
    fn category_lookup_matches_parent() {
        assert_eq!(
            category_query("Welding"),
            "select * from Item where Type = 'Category' and Name = 'Welding'"
        );

        let json = r#"{"QueryResponse": {"Item": [
            {"Id": "30", "Name": "Welding", "ParentRef": {"value": "10"}},
            {"Id": "31", "Name": "Welding", "ParentRef": {"value": "20"}},
            {"Id": "32", "Name": "Welding"}
        ]}}"#;
        let envelope: QueryEnvelope = serde_json::from_str(json).unwrap();
        let pick = |parent: Option<&str>| {
            envelope
                .query_response
                .item
                .iter()
                .find(|item| item.has_parent(parent))
                .map(|item| item.id.as_str())
        };
        assert_eq!(pick(Some("20")), Some("31"));
        assert_eq!(pick(Some("10")), Some("30"));
        assert_eq!(pick(None), Some("32"));
        assert_eq!(pick(Some("99")), None);
    }

    #[test]
    fn extracts_fault_detail() {
        let body = serde_json::json!({
            "Fault": {"Error": [{
                "Message": "Duplicate Name Exists Error",
                "Detail": "The name supplied already exists."
            }]}
        });
        assert_eq!(
            error_message(&body).as_deref(),
            Some("The name supplied already exists.")
        );
    }
}
