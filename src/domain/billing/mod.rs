//! Billing domain module.
//!
//! Everything the webhook ingestor knows about Stripe deliveries: the event
//! envelope and its typed payloads, signature verification, the failure
//! taxonomy, and the row updates each event maps to.

mod records;
mod stripe_event;
mod webhook_errors;
mod webhook_verifier;

pub use records::{
    AccountStatus, AccountUpdate, PaymentStatus, PaymentTransactionUpdate, RefundStatus,
    RefundUpdate,
};
pub use stripe_event::{
    AccountObject, AccountRequirements, BillingEvent, ChargeObject, LastPaymentError,
    PaymentIntentObject, StripeEvent, StripeEventData, StripeEventType,
};
pub use webhook_errors::{
    WebhookError, HANDLED_BODY, MISSING_SIGNATURE_BODY, UNKNOWN_ERROR_MESSAGE,
};
pub use webhook_verifier::{
    sign_payload, SignatureHeader, StripeWebhookVerifier, DEFAULT_TOLERANCE_SECS,
};
