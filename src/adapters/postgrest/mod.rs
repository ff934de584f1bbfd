//! PostgREST adapters for the hosted database's REST interface.

mod billing_store;

pub use billing_store::{PostgrestBillingStore, PostgrestConfig};
