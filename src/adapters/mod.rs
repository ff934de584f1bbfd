//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - axum router exposing the webhook and health endpoints
//! - `postgres` - BillingStore over a direct PostgreSQL connection
//! - `postgrest` - BillingStore over the hosted database's REST interface
//! - `memory` - BillingStore held in process

pub mod http;
pub mod memory;
pub mod postgres;
pub mod postgrest;

pub use http::{app_router, AppState};
pub use memory::InMemoryBillingStore;
pub use postgres::PostgresBillingStore;
pub use postgrest::{PostgrestBillingStore, PostgrestConfig};
