//! Webhook error types for Stripe webhook handling.
//!
//! Every failure the ingestor can hit is answered synchronously with a 400;
//! the sender's redelivery policy is the only retry mechanism.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::DomainError;

/// Body returned when the signature header or the signing secret is absent.
pub const MISSING_SIGNATURE_BODY: &str = "Missing signature";

/// Body returned for any successfully dispatched event.
pub const HANDLED_BODY: &str = "Webhook handled";

/// Fallback used when a store error carries no message.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

/// Errors that occur during webhook processing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// Signature header or signing secret not available.
    #[error("Missing signature")]
    MissingSignature,

    /// Signature header could not be parsed.
    #[error("Unable to extract timestamp and signatures from header")]
    InvalidHeader,

    /// No v1 signature in the header matches the payload.
    #[error("No signatures found matching the expected signature for payload")]
    NoMatchingSignature,

    /// Signature timestamp is older than the tolerance window.
    #[error("Timestamp outside the tolerance zone")]
    TimestampOutOfRange,

    /// Verified payload could not be decoded into an event.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// The record store rejected the update.
    #[error("{}", store_message(.0))]
    Store(String),
}

fn store_message(message: &str) -> &str {
    if message.trim().is_empty() {
        UNKNOWN_ERROR_MESSAGE
    } else {
        message
    }
}

impl WebhookError {
    /// Maps the error to an HTTP status code.
    ///
    /// All failures are client errors from the sender's point of view.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    /// Renders the plain-text response body.
    pub fn response_body(&self) -> String {
        match self {
            WebhookError::MissingSignature => MISSING_SIGNATURE_BODY.to_string(),
            other => format!("Webhook Error: {}", other),
        }
    }

    /// True when the failure happened before the event was trusted.
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            WebhookError::MissingSignature
                | WebhookError::InvalidHeader
                | WebhookError::NoMatchingSignature
                | WebhookError::TimestampOutOfRange
        )
    }
}

/// Store failures keep only the message; the code stays in the logs.
impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Store(err.message)
    }
}
