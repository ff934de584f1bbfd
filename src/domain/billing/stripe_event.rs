//! Stripe webhook event types.
//!
//! Defines the envelope Stripe delivers and the typed billing events the
//! ingestor acts on. Only fields relevant to our processing are captured.

use serde::{Deserialize, Serialize};

use super::webhook_errors::WebhookError;

/// Stripe webhook event (simplified).
///
/// Additional fields from Stripe's full event schema are ignored.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type of event (e.g., "payment_intent.succeeded").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    #[serde(default)]
    pub created: i64,

    /// Object containing event-specific data.
    pub data: StripeEventData,

    /// Whether this is a live mode event (vs test mode).
    #[serde(default)]
    pub livemode: bool,

    /// API version used to render this event. Null for some account events.
    #[serde(default)]
    pub api_version: Option<String>,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object that triggered the event (polymorphic based on event type).
    pub object: serde_json::Value,
}

impl StripeEvent {
    /// Returns true if this is a live mode event.
    pub fn is_live(&self) -> bool {
        self.livemode
    }

    /// Attempts to deserialize the data object as the specified type.
    pub fn deserialize_object<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data.object)
    }

    /// Parse the event type into a known enum variant.
    pub fn parsed_type(&self) -> StripeEventType {
        StripeEventType::from_tag(&self.event_type)
    }

    /// Decodes the typed payload for the event's tag.
    ///
    /// Unknown tags never fail; they become [`BillingEvent::Unhandled`].
    pub fn into_billing_event(self) -> Result<BillingEvent, WebhookError> {
        let invalid = |e: serde_json::Error| WebhookError::InvalidPayload(e.to_string());

        let event = match self.parsed_type() {
            StripeEventType::PaymentIntentSucceeded => {
                BillingEvent::PaymentIntentSucceeded(self.deserialize_object().map_err(invalid)?)
            }
            StripeEventType::PaymentIntentPaymentFailed => {
                BillingEvent::PaymentIntentFailed(self.deserialize_object().map_err(invalid)?)
            }
            StripeEventType::ChargeRefunded => {
                BillingEvent::ChargeRefunded(self.deserialize_object().map_err(invalid)?)
            }
            StripeEventType::AccountUpdated => {
                BillingEvent::AccountUpdated(self.deserialize_object().map_err(invalid)?)
            }
            StripeEventType::Unknown => BillingEvent::Unhandled(self.event_type),
        };

        Ok(event)
    }
}

/// Known Stripe event types that we handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripeEventType {
    /// Payment intent reached `succeeded`.
    PaymentIntentSucceeded,
    /// Payment intent attempt failed.
    PaymentIntentPaymentFailed,
    /// Charge was (fully or partially) refunded.
    ChargeRefunded,
    /// Connected account changed.
    AccountUpdated,
    /// Unknown or unhandled event type.
    Unknown,
}

impl StripeEventType {
    /// Parse event type from its literal tag.
    pub fn from_tag(s: &str) -> Self {
        match s {
            "payment_intent.succeeded" => Self::PaymentIntentSucceeded,
            "payment_intent.payment_failed" => Self::PaymentIntentPaymentFailed,
            "charge.refunded" => Self::ChargeRefunded,
            "account.updated" => Self::AccountUpdated,
            _ => Self::Unknown,
        }
    }

    /// Convert to the Stripe event type string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PaymentIntentSucceeded => "payment_intent.succeeded",
            Self::PaymentIntentPaymentFailed => "payment_intent.payment_failed",
            Self::ChargeRefunded => "charge.refunded",
            Self::AccountUpdated => "account.updated",
            Self::Unknown => "unknown",
        }
    }
}

/// `data.object` of a payment_intent event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PaymentIntentObject {
    pub id: String,
    #[serde(default)]
    pub last_payment_error: Option<LastPaymentError>,
}

impl PaymentIntentObject {
    /// Human-readable failure reason, when Stripe attached one.
    pub fn error_message(&self) -> Option<&str> {
        self.last_payment_error
            .as_ref()
            .and_then(|e| e.message.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LastPaymentError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

/// `data.object` of a charge event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChargeObject {
    pub id: String,
}

/// `data.object` of an account event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AccountObject {
    pub id: String,
    #[serde(default)]
    pub charges_enabled: bool,
    #[serde(default)]
    pub requirements: Option<AccountRequirements>,
}

impl AccountObject {
    /// Requirement codes Stripe reports as currently due; empty when absent.
    pub fn currently_due(&self) -> Vec<String> {
        self.requirements
            .as_ref()
            .and_then(|r| r.currently_due.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AccountRequirements {
    #[serde(default)]
    pub currently_due: Option<Vec<String>>,
}

/// A verified event decoded into the variants the ingestor dispatches on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingEvent {
    PaymentIntentSucceeded(PaymentIntentObject),
    PaymentIntentFailed(PaymentIntentObject),
    ChargeRefunded(ChargeObject),
    AccountUpdated(AccountObject),
    /// Any tag outside the fixed mapping; carries the raw tag.
    Unhandled(String),
}

/// Builder for creating test StripeEvent instances.
#[cfg(test)]
pub struct StripeEventBuilder {
    id: String,
    event_type: String,
    object: serde_json::Value,
    livemode: bool,
}

#[cfg(test)]
impl Default for StripeEventBuilder {
    fn default() -> Self {
        Self {
            id: "evt_test_123".to_string(),
            event_type: "payment_intent.succeeded".to_string(),
            object: serde_json::json!({ "id": "pi_123" }),
            livemode: false,
        }
    }
}

#[cfg(test)]
impl StripeEventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn object(mut self, object: serde_json::Value) -> Self {
        self.object = object;
        self
    }

    pub fn build(self) -> StripeEvent {
        StripeEvent {
            id: self.id,
            event_type: self.event_type,
            created: chrono::Utc::now().timestamp(),
            data: StripeEventData {
                object: self.object,
            },
            livemode: self.livemode,
            api_version: Some("2023-10-16".to_string()),
        }
    }
}
