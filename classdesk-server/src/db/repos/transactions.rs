//! Transaction repository
//!
//! Payment records and their reconciliation state. `reconciled` and
//! `reconciliation_date` always move together (also enforced by a CHECK
//! constraint).

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool, Row};
use uuid::Uuid;

use super::enrollments::{upsert_enrolled, Enrollment};
use super::DbError;
use crate::models::{Paginated, Pagination};

const TRANSACTION_COLUMNS: &str = "id, enrollment_id, student_id, amount_cents, currency, \
                                   description, stripe_payment_intent_id, \
                                   stripe_checkout_session_id, reconciled, reconciliation_date, \
                                   quickbooks_invoice_id, created_at";

/// Transaction record from database
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub enrollment_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
    pub amount_cents: i64,
    pub currency: String,
    pub description: Option<String>,
    pub stripe_payment_intent_id: Option<String>,
    pub stripe_checkout_session_id: Option<String>,
    pub reconciled: bool,
    pub reconciliation_date: Option<DateTime<Utc>>,
    pub quickbooks_invoice_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Everything the invoice flow needs about one transaction
#[derive(Debug, Clone, FromRow)]
pub struct InvoiceContext {
    #[sqlx(flatten)]
    pub transaction: Transaction,
    pub student_first_name: Option<String>,
    pub student_last_name: Option<String>,
    pub student_email: Option<String>,
    pub class_title: Option<String>,
    pub course_title: Option<String>,
}

impl InvoiceContext {
    /// Customer display name: "First Last", or `None` when the transaction
    /// has no student.
    pub fn customer_name(&self) -> Option<String> {
        match (&self.student_first_name, &self.student_last_name) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            _ => None,
        }
    }

    /// Item name: course title, else the transaction description.
    pub fn item_name(&self) -> String {
        self.course_title
            .clone()
            .or_else(|| self.transaction.description.clone())
            .unwrap_or_else(|| "Tuition".to_owned())
    }

    /// Invoice line description.
    pub fn line_description(&self) -> String {
        match (&self.course_title, &self.class_title) {
            (Some(course), Some(class)) if course != class => format!("{}: {}", course, class),
            (Some(course), _) => course.clone(),
            _ => self
                .transaction
                .description
                .clone()
                .unwrap_or_else(|| "Tuition".to_owned()),
        }
    }
}

/// A paid checkout session, ready to be recorded
#[derive(Debug, Clone)]
pub struct PaidCheckout {
    pub student_id: Uuid,
    pub class_id: Uuid,
    pub amount_cents: i64,
    pub currency: String,
    pub description: String,
    pub payment_intent_id: String,
    pub checkout_session_id: String,
}

/// Transaction repository
pub struct TransactionRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> TransactionRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List transactions, newest first, optionally by reconciliation state.
    pub async fn list(
        &self,
        reconciled: Option<bool>,
        page: Pagination,
    ) -> Result<Paginated<Transaction>, DbError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}, COUNT(*) OVER() AS total
            FROM transactions
            WHERE $1::boolean IS NULL OR reconciled = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(reconciled)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = match rows.first() {
            Some(row) => row.get::<i64, _>("total"),
            None if page.past_end(rows.len()) => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM transactions \
                     WHERE $1::boolean IS NULL OR reconciled = $1",
                )
                .bind(reconciled)
                .fetch_one(self.pool)
                .await?
            }
            None => 0,
        };
        let items = rows
            .iter()
            .map(Transaction::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(page.wrap(items, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<Transaction, DbError> {
        sqlx::query_as(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("transaction", id))
    }

    /// Mark a transaction as matched against a payout.
    ///
    /// Single conditional UPDATE; an unknown id is `NotFound`.
    pub async fn reconcile(&self, id: Uuid) -> Result<Transaction, DbError> {
        self.set_reconciled(id, true).await
    }

    /// Clear the reconciliation flag and date.
    pub async fn unreconcile(&self, id: Uuid) -> Result<Transaction, DbError> {
        self.set_reconciled(id, false).await
    }

    async fn set_reconciled(&self, id: Uuid, reconciled: bool) -> Result<Transaction, DbError> {
        sqlx::query_as(&format!(
            r#"
            UPDATE transactions
            SET reconciled = $2,
                reconciliation_date = CASE WHEN $2 THEN NOW() ELSE NULL END
            WHERE id = $1
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(reconciled)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("transaction", id))
    }

    /// Load a transaction with its student and class/course names.
    pub async fn invoice_context(&self, id: Uuid) -> Result<InvoiceContext, DbError> {
        sqlx::query_as(
            r#"
            SELECT t.id, t.enrollment_id, t.student_id, t.amount_cents, t.currency,
                   t.description, t.stripe_payment_intent_id, t.stripe_checkout_session_id,
                   t.reconciled, t.reconciliation_date, t.quickbooks_invoice_id, t.created_at,
                   s.first_name AS student_first_name,
                   s.last_name AS student_last_name,
                   s.email AS student_email,
                   c.title AS class_title,
                   co.title AS course_title
            FROM transactions t
            LEFT JOIN students s ON s.id = t.student_id
            LEFT JOIN enrollments e ON e.id = t.enrollment_id
            LEFT JOIN classes c ON c.id = e.class_id
            LEFT JOIN courses co ON co.id = c.course_id
            WHERE t.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("transaction", id))
    }

    pub async fn set_invoice(&self, id: Uuid, invoice_id: &str) -> Result<(), DbError> {
        let result = sqlx::query("UPDATE transactions SET quickbooks_invoice_id = $2 WHERE id = $1")
            .bind(id)
            .bind(invoice_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("transaction", id));
        }
        Ok(())
    }

    /// Record a paid checkout: enrollment + transaction, atomically.
    ///
    /// Idempotent on the payment intent id, so completing the same session
    /// twice returns the same rows.
    pub async fn record_checkout(
        &self,
        paid: &PaidCheckout,
    ) -> Result<(Enrollment, Transaction), DbError> {
        let mut tx = self.pool.begin().await?;

        let enrollment = upsert_enrolled(&mut tx, paid.student_id, paid.class_id)
            .await
            .map_err(|e| {
                e.on_foreign_key(
                    "student or class",
                    format!("{}/{}", paid.student_id, paid.class_id),
                )
            })?;

        let transaction: Transaction = sqlx::query_as(&format!(
            r#"
            INSERT INTO transactions
                (enrollment_id, student_id, amount_cents, currency, description,
                 stripe_payment_intent_id, stripe_checkout_session_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (stripe_payment_intent_id)
            DO UPDATE SET enrollment_id = EXCLUDED.enrollment_id
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(enrollment.id)
        .bind(paid.student_id)
        .bind(paid.amount_cents)
        .bind(&paid.currency)
        .bind(&paid.description)
        .bind(&paid.payment_intent_id)
        .bind(&paid.checkout_session_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((enrollment, transaction))
    }
}
