//! PostgreSQL implementation of BillingStore.
//!
//! Talks to the hosted database directly over its Postgres connection.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::billing::{AccountUpdate, PaymentTransactionUpdate, RefundUpdate};
use crate::domain::foundation::DomainError;
use crate::ports::BillingStore;

/// PostgreSQL implementation of the BillingStore port.
pub struct PostgresBillingStore {
    pool: PgPool,
}

impl PostgresBillingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BillingStore for PostgresBillingStore {
    async fn update_payment_transaction(
        &self,
        payment_intent_id: &str,
        update: &PaymentTransactionUpdate,
    ) -> Result<(), DomainError> {
        // A missing message leaves the stored one in place.
        let result = sqlx::query(
            r#"
            UPDATE payment_transactions SET
                status = $2,
                error_message = COALESCE($3, error_message),
                processed_at = $4
            WHERE stripe_payment_intent_id = $1
            "#,
        )
        .bind(payment_intent_id)
        .bind(update.status.as_str())
        .bind(update.error_message.as_deref())
        .bind(update.processed_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        tracing::debug!(
            payment_intent_id,
            rows = result.rows_affected(),
            "Updated payment transaction"
        );
        Ok(())
    }

    async fn update_refund(
        &self,
        charge_id: &str,
        update: &RefundUpdate,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE refunds SET
                status = $2,
                processed_at = $3
            WHERE stripe_charge_id = $1
            "#,
        )
        .bind(charge_id)
        .bind(update.status.as_str())
        .bind(update.processed_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        tracing::debug!(charge_id, rows = result.rows_affected(), "Updated refund");
        Ok(())
    }

    async fn update_account(
        &self,
        account_id: &str,
        update: &AccountUpdate,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                stripe_account_status = $2,
                stripe_requirements = $3
            WHERE stripe_account_id = $1
            "#,
        )
        .bind(account_id)
        .bind(update.status.as_str())
        .bind(&update.requirements)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        tracing::debug!(account_id, rows = result.rows_affected(), "Updated account");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

/// Keeps the server's own message for database errors, which is what the
/// webhook response reports.
fn store_error(error: sqlx::Error) -> DomainError {
    match &error {
        sqlx::Error::Database(db_error) => {
            let mut domain = DomainError::database(db_error.message());
            if let Some(code) = db_error.code() {
                domain = domain.with_detail("sqlstate", code);
            }
            domain
        }
        _ => DomainError::database(error.to_string()),
    }
}
