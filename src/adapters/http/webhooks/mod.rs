//! Webhook HTTP adapter.

mod handlers;
mod routes;

pub use handlers::{handle_stripe_webhook, WebhookApiError, STRIPE_SIGNATURE_HEADER};
pub use routes::webhook_routes;
