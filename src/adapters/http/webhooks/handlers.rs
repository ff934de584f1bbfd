//! HTTP handlers for webhook endpoints.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::application::{HandleStripeWebhookCommand, HandleStripeWebhookHandler};
use crate::domain::billing::{WebhookError, HANDLED_BODY};

use crate::adapters::http::AppState;

/// Header carrying Stripe's timestamped signature.
pub const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";

/// POST /webhooks/stripe - Handle Stripe webhook events
///
/// The body is taken as raw bytes; it must reach the verifier unaltered.
pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    // Opaque bytes are kept so a malformed header fails parsing rather than
    // reading as absent.
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());

    let handler = HandleStripeWebhookHandler::new(state.billing_store.clone(), state.verifier.clone());
    let cmd = HandleStripeWebhookCommand {
        payload: body.to_vec(),
        signature,
    };

    handler.handle(cmd).await?;

    Ok((StatusCode::OK, HANDLED_BODY))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that renders webhook failures as plain-text 400s.
#[derive(Debug)]
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        match &self.0 {
            WebhookError::Store(message) => {
                tracing::error!(error = %message, "Webhook store update failed");
            }
            err if err.is_verification_failure() => {
                tracing::warn!(error = %err, "Webhook signature verification failed");
            }
            err => {
                tracing::warn!(error = %err, "Webhook rejected");
            }
        }

        (self.0.status_code(), self.0.response_body()).into_response()
    }
}
