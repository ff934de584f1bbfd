//! HandleStripeWebhookHandler - Command handler for Stripe webhook deliveries.

use std::sync::Arc;

use crate::domain::billing::{
    AccountStatus, AccountUpdate, BillingEvent, PaymentTransactionUpdate, RefundUpdate,
    StripeWebhookVerifier, WebhookError,
};
use crate::domain::foundation::Timestamp;
use crate::ports::BillingStore;

/// Command to handle one webhook delivery.
#[derive(Debug, Clone)]
pub struct HandleStripeWebhookCommand {
    /// Raw request body, exactly as received.
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header, if the request carried one. Empty or
    /// whitespace-only values are treated as absent.
    pub signature: Option<String>,
}

/// Result of webhook processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleStripeWebhookResult {
    /// Payment transaction marked completed.
    PaymentCompleted { payment_intent_id: String },
    /// Payment transaction marked failed.
    PaymentFailed {
        payment_intent_id: String,
        error_message: Option<String>,
    },
    /// Refund marked completed.
    RefundCompleted { charge_id: String },
    /// Account status and requirements overwritten.
    AccountUpdated {
        account_id: String,
        status: AccountStatus,
    },
    /// Event type outside the fixed mapping; nothing written.
    Ignored { event_type: String },
}

/// Handler for processing Stripe webhooks.
///
/// Verifies the delivery, decodes it into a [`BillingEvent`] and applies the
/// matching single-row update through the [`BillingStore`] port. Holds no
/// per-request state, so one instance serves concurrent deliveries.
pub struct HandleStripeWebhookHandler {
    store: Arc<dyn BillingStore>,
    verifier: Option<Arc<StripeWebhookVerifier>>,
}

impl HandleStripeWebhookHandler {
    /// `verifier` is `None` when no signing secret is configured; every
    /// delivery is then rejected as unsigned.
    pub fn new(store: Arc<dyn BillingStore>, verifier: Option<Arc<StripeWebhookVerifier>>) -> Self {
        Self { store, verifier }
    }

    pub async fn handle(
        &self,
        cmd: HandleStripeWebhookCommand,
    ) -> Result<HandleStripeWebhookResult, WebhookError> {
        // 1. Both halves of the signature check must be present
        let signature = cmd.signature.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let (verifier, signature) = match (&self.verifier, signature) {
            (Some(verifier), Some(signature)) => (verifier, signature),
            _ => return Err(WebhookError::MissingSignature),
        };

        // 2. Verify against the raw bytes and parse the envelope
        let event = verifier.verify_and_parse(&cmd.payload, signature)?;

        tracing::info!(
            event_id = %event.id,
            event_type = %event.event_type,
            livemode = event.is_live(),
            "Received Stripe webhook"
        );

        // 3. Decode the typed payload and dispatch
        match event.into_billing_event()? {
            BillingEvent::PaymentIntentSucceeded(intent) => {
                let update = PaymentTransactionUpdate::completed(Timestamp::now());
                self.store
                    .update_payment_transaction(&intent.id, &update)
                    .await?;

                tracing::info!(payment_intent_id = %intent.id, "Payment transaction completed");
                Ok(HandleStripeWebhookResult::PaymentCompleted {
                    payment_intent_id: intent.id,
                })
            }
            BillingEvent::PaymentIntentFailed(intent) => {
                let error_message = intent.error_message().map(str::to_string);
                let update =
                    PaymentTransactionUpdate::failed(Timestamp::now(), error_message.clone());
                self.store
                    .update_payment_transaction(&intent.id, &update)
                    .await?;

                tracing::info!(
                    payment_intent_id = %intent.id,
                    error_message = error_message.as_deref().unwrap_or(""),
                    "Payment transaction failed"
                );
                Ok(HandleStripeWebhookResult::PaymentFailed {
                    payment_intent_id: intent.id,
                    error_message,
                })
            }
            BillingEvent::ChargeRefunded(charge) => {
                let update = RefundUpdate::completed(Timestamp::now());
                self.store.update_refund(&charge.id, &update).await?;

                tracing::info!(charge_id = %charge.id, "Refund completed");
                Ok(HandleStripeWebhookResult::RefundCompleted {
                    charge_id: charge.id,
                })
            }
            BillingEvent::AccountUpdated(account) => {
                let update = AccountUpdate::from(&account);
                self.store.update_account(&account.id, &update).await?;

                tracing::info!(
                    account_id = %account.id,
                    status = update.status.as_str(),
                    requirements = update.requirements.len(),
                    "Account updated"
                );
                Ok(HandleStripeWebhookResult::AccountUpdated {
                    account_id: account.id,
                    status: update.status,
                })
            }
            BillingEvent::Unhandled(event_type) => {
                tracing::debug!(event_type = %event_type, "Unhandled webhook event type");
                Ok(HandleStripeWebhookResult::Ignored { event_type })
            }
        }
    }
}
