//! In-memory adapters.

mod in_memory_billing_store;

pub use in_memory_billing_store::{
    AccountRow, InMemoryBillingStore, PaymentTransactionRow, RecordedWrite, RefundRow,
};
