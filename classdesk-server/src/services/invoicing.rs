//! Invoice creation for a recorded transaction
//!
//! Customer -> category -> subcategory -> item -> invoice. Category and
//! subcategory failures are logged and skipped; the invoice is still
//! created, just without the category on its item. Every other step failing
//! aborts the flow. Nothing is retried or rolled back.

use uuid::Uuid;

use crate::db::InvoiceContext;
use crate::providers::{CreatedInvoice, InvoiceLine, InvoicingGateway, NewInvoice, ProviderError};

/// Optional category path for the invoiced item
#[derive(Debug, Clone, Default)]
pub struct CategoryPath {
    pub category: Option<String>,
    pub subcategory: Option<String>,
}

/// Result of a successful invoice run
#[derive(Debug, Clone)]
pub struct InvoiceOutcome {
    pub invoice: CreatedInvoice,
    pub customer_id: String,
    pub item_id: String,
    /// Category the item was filed under, if categorisation succeeded
    pub category_id: Option<String>,
    /// Skipped steps, for the response body
    pub warnings: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum InvoiceError {
    #[error("transaction {0} has no student to bill")]
    NoCustomer(Uuid),

    #[error("transaction {0} is already invoiced as {1}")]
    AlreadyInvoiced(Uuid, String),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Run the invoice flow for one transaction.
pub async fn create_invoice(
    gateway: &dyn InvoicingGateway,
    context: &InvoiceContext,
    path: &CategoryPath,
) -> Result<InvoiceOutcome, InvoiceError> {
    let transaction = &context.transaction;
    if let Some(existing) = &transaction.quickbooks_invoice_id {
        return Err(InvoiceError::AlreadyInvoiced(transaction.id, existing.clone()));
    }
    let customer_name = context
        .customer_name()
        .ok_or(InvoiceError::NoCustomer(transaction.id))?;

    let customer_id = gateway
        .find_or_create_customer(&customer_name, context.student_email.as_deref())
        .await?;

    let mut warnings = Vec::new();
    let category_id = resolve_category(gateway, path, &mut warnings).await;

    let item_name = context.item_name();
    let item_id = gateway
        .find_or_create_item(&item_name, transaction.amount_cents, category_id.as_deref())
        .await?;

    let invoice = NewInvoice {
        customer_id: customer_id.clone(),
        bill_email: context.student_email.clone(),
        lines: vec![InvoiceLine {
            item_id: item_id.clone(),
            description: context.line_description(),
            amount_cents: transaction.amount_cents,
        }],
        private_note: Some(format!("classdesk transaction {}", transaction.id)),
    };
    let created = gateway.create_invoice(&invoice).await?;

    tracing::info!(
        transaction_id = %transaction.id,
        invoice_id = %created.id,
        skipped = warnings.len(),
        "invoice created"
    );

    Ok(InvoiceOutcome {
        invoice: created,
        customer_id,
        item_id,
        category_id,
        warnings,
    })
}

/// Resolve the category path, swallowing failures.
///
/// Returns the deepest category that exists (or was created).
async fn resolve_category(
    gateway: &dyn InvoicingGateway,
    path: &CategoryPath,
    warnings: &mut Vec<String>,
) -> Option<String> {
    let name = path.category.as_deref().map(str::trim).filter(|s| !s.is_empty())?;

    let category_id = match gateway.find_or_create_category(name, None).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(
                category = name,
                error = %e,
                "category lookup failed, continuing without it"
            );
            warnings.push(format!("category '{}' skipped: {}", name, e));
            return None;
        }
    };

    let Some(sub) = path.subcategory.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        return Some(category_id);
    };

    match gateway.find_or_create_category(sub, Some(&category_id)).await {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::warn!(
                subcategory = sub,
                error = %e,
                "subcategory lookup failed, using parent"
            );
            warnings.push(format!("subcategory '{}' skipped: {}", sub, e));
            Some(category_id)
        }
    }
}
