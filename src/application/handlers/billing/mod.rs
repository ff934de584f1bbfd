//! Billing handlers.
//!
//! ## Commands
//! - Processing Stripe webhook deliveries

mod handle_stripe_webhook;

pub use handle_stripe_webhook::{
    HandleStripeWebhookCommand, HandleStripeWebhookHandler, HandleStripeWebhookResult,
};
