//! In-memory BillingStore.
//!
//! Keeps one map per table and applies the same conditional updates as the
//! remote backends: a write to an id with no seeded row changes nothing and
//! still succeeds. Every accepted call is captured for assertions.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::billing::{AccountUpdate, PaymentTransactionUpdate, RefundUpdate};
use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::BillingStore;

/// Row in `payment_transactions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentTransactionRow {
    pub status: String,
    pub error_message: Option<String>,
    pub processed_at: Option<Timestamp>,
}

/// Row in `refunds`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundRow {
    pub status: String,
    pub processed_at: Option<Timestamp>,
}

/// Connected-account columns of a `users` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRow {
    pub status: Option<String>,
    pub requirements: Vec<String>,
}

/// A single update call as received by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedWrite {
    PaymentTransaction {
        payment_intent_id: String,
        update: PaymentTransactionUpdate,
    },
    Refund {
        charge_id: String,
        update: RefundUpdate,
    },
    Account {
        account_id: String,
        update: AccountUpdate,
    },
}

/// In-memory store for tests and local runs.
///
/// # Example
///
/// ```ignore
/// let store = Arc::new(InMemoryBillingStore::new());
/// store.seed_payment_transaction("pi_123").await;
///
/// // ... deliver a webhook ...
///
/// assert_eq!(store.writes().await.len(), 1);
/// ```
#[derive(Default)]
pub struct InMemoryBillingStore {
    payment_transactions: RwLock<HashMap<String, PaymentTransactionRow>>,
    refunds: RwLock<HashMap<String, RefundRow>>,
    accounts: RwLock<HashMap<String, AccountRow>>,
    writes: RwLock<Vec<RecordedWrite>>,
    failure: Option<String>,
}

impl InMemoryBillingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every update fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    // === Seeding ===

    pub async fn seed_payment_transaction(&self, payment_intent_id: &str) {
        self.payment_transactions.write().await.insert(
            payment_intent_id.to_string(),
            PaymentTransactionRow {
                status: "pending".to_string(),
                error_message: None,
                processed_at: None,
            },
        );
    }

    pub async fn seed_refund(&self, charge_id: &str) {
        self.refunds.write().await.insert(
            charge_id.to_string(),
            RefundRow {
                status: "pending".to_string(),
                processed_at: None,
            },
        );
    }

    pub async fn seed_account(&self, account_id: &str) {
        self.accounts.write().await.insert(
            account_id.to_string(),
            AccountRow {
                status: None,
                requirements: Vec::new(),
            },
        );
    }

    // === Test Helpers ===

    pub async fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.read().await.clone()
    }

    pub async fn payment_transaction(&self, payment_intent_id: &str) -> Option<PaymentTransactionRow> {
        self.payment_transactions
            .read()
            .await
            .get(payment_intent_id)
            .cloned()
    }

    pub async fn refund(&self, charge_id: &str) -> Option<RefundRow> {
        self.refunds.read().await.get(charge_id).cloned()
    }

    pub async fn account(&self, account_id: &str) -> Option<AccountRow> {
        self.accounts.read().await.get(account_id).cloned()
    }

    fn check_failure(&self) -> Result<(), DomainError> {
        match &self.failure {
            Some(message) => Err(DomainError::database(message.clone())),
            None => Ok(()),
        }
    }

    async fn record(&self, write: RecordedWrite) {
        self.writes.write().await.push(write);
    }
}

#[async_trait]
impl BillingStore for InMemoryBillingStore {
    async fn update_payment_transaction(
        &self,
        payment_intent_id: &str,
        update: &PaymentTransactionUpdate,
    ) -> Result<(), DomainError> {
        self.check_failure()?;

        if let Some(row) = self
            .payment_transactions
            .write()
            .await
            .get_mut(payment_intent_id)
        {
            row.status = update.status.as_str().to_string();
            if let Some(message) = &update.error_message {
                row.error_message = Some(message.clone());
            }
            row.processed_at = Some(update.processed_at);
        }

        self.record(RecordedWrite::PaymentTransaction {
            payment_intent_id: payment_intent_id.to_string(),
            update: update.clone(),
        })
        .await;
        Ok(())
    }

    async fn update_refund(
        &self,
        charge_id: &str,
        update: &RefundUpdate,
    ) -> Result<(), DomainError> {
        self.check_failure()?;

        if let Some(row) = self.refunds.write().await.get_mut(charge_id) {
            row.status = update.status.as_str().to_string();
            row.processed_at = Some(update.processed_at);
        }

        self.record(RecordedWrite::Refund {
            charge_id: charge_id.to_string(),
            update: update.clone(),
        })
        .await;
        Ok(())
    }

    async fn update_account(
        &self,
        account_id: &str,
        update: &AccountUpdate,
    ) -> Result<(), DomainError> {
        self.check_failure()?;

        if let Some(row) = self.accounts.write().await.get_mut(account_id) {
            row.status = Some(update.status.as_str().to_string());
            row.requirements = update.requirements.clone();
        }

        self.record(RecordedWrite::Account {
            account_id: account_id.to_string(),
            update: update.clone(),
        })
        .await;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
