//! Axum router configuration for webhook endpoints.

use axum::{routing::post, Router};

use crate::adapters::http::AppState;
use super::handlers::handle_stripe_webhook;

/// Create the webhook router.
///
/// Webhooks carry no user authentication; they are verified via signature.
///
/// # Routes
/// - `POST /stripe` - Handle Stripe webhooks
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/stripe", post(handle_stripe_webhook))
}
