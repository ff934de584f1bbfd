//! BillingStore port - Conditional row updates against the hosted database.
//!
//! The store owns three tables. This service never reads or inserts rows; it
//! only updates the row whose processor-assigned id matches the event.
//!
//! An update that matches no row is not an error: the predicate simply
//! selects nothing, the same as a hosted-database `update ... eq(...)` call.
//!
//! ## Redelivery
//!
//! Stripe may deliver the same event more than once. The updates are
//! overwrites keyed by id, so a redelivery re-applies the same values; there
//! is no event-level deduplication behind this port.

use async_trait::async_trait;

use crate::domain::billing::{AccountUpdate, PaymentTransactionUpdate, RefundUpdate};
use crate::domain::foundation::DomainError;

/// Table holding one row per payment intent.
pub const PAYMENT_TRANSACTIONS_TABLE: &str = "payment_transactions";
/// Column matched against the payment intent id.
pub const PAYMENT_INTENT_KEY: &str = "stripe_payment_intent_id";

/// Table holding one row per refunded charge.
pub const REFUNDS_TABLE: &str = "refunds";
/// Column matched against the charge id.
pub const CHARGE_KEY: &str = "stripe_charge_id";

/// Table holding users with connected accounts.
pub const USERS_TABLE: &str = "users";
/// Column matched against the connected account id.
pub const ACCOUNT_KEY: &str = "stripe_account_id";

/// Port for applying billing state transitions to the remote store.
///
/// Each method issues exactly one conditional update.
#[async_trait]
pub trait BillingStore: Send + Sync {
    /// Update the payment transaction for `payment_intent_id`.
    async fn update_payment_transaction(
        &self,
        payment_intent_id: &str,
        update: &PaymentTransactionUpdate,
    ) -> Result<(), DomainError>;

    /// Update the refund for `charge_id`.
    async fn update_refund(&self, charge_id: &str, update: &RefundUpdate)
        -> Result<(), DomainError>;

    /// Overwrite the account status and requirements for `account_id`.
    async fn update_account(
        &self,
        account_id: &str,
        update: &AccountUpdate,
    ) -> Result<(), DomainError>;

    /// Short name of the backend, reported by the health endpoint.
    fn backend_name(&self) -> &'static str;
}
