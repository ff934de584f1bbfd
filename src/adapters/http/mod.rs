//! HTTP adapters - axum router for the webhook ingestor.

pub mod health;
pub mod webhooks;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::domain::billing::StripeWebhookVerifier;
use crate::ports::BillingStore;

pub use health::{health, HealthResponse};
pub use webhooks::{webhook_routes, WebhookApiError, STRIPE_SIGNATURE_HEADER};

/// Shared application state.
///
/// Cloned for each request; holds Arc-wrapped dependencies only.
#[derive(Clone)]
pub struct AppState {
    pub billing_store: Arc<dyn BillingStore>,
    /// `None` when no webhook signing secret is configured.
    pub verifier: Option<Arc<StripeWebhookVerifier>>,
}

impl AppState {
    pub fn new(
        billing_store: Arc<dyn BillingStore>,
        verifier: Option<StripeWebhookVerifier>,
    ) -> Self {
        Self {
            billing_store,
            verifier: verifier.map(Arc::new),
        }
    }
}

/// Create the complete application router.
///
/// # Routes
/// - `GET /health` - Liveness
/// - `POST /webhooks/stripe` - Stripe webhooks
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/webhooks", webhook_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
