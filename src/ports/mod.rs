//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Store Ports
//!
//! - `BillingStore` - Conditional updates of payment, refund and account rows

mod billing_store;

pub use billing_store::{
    BillingStore, ACCOUNT_KEY, CHARGE_KEY, PAYMENT_INTENT_KEY, PAYMENT_TRANSACTIONS_TABLE,
    REFUNDS_TABLE, USERS_TABLE,
};
