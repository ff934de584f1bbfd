//! Payment configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::billing::{StripeWebhookVerifier, DEFAULT_TOLERANCE_SECS};

/// Payment configuration (Stripe)
///
/// Both credentials are optional at load time. Without a webhook secret the
/// service still starts, but rejects every delivery as unsigned.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Stripe API key (restricted `rk_...` or secret `sk_...`)
    #[serde(default)]
    pub stripe_api_key: Option<SecretString>,

    /// Stripe webhook signing secret (`whsec_...`)
    #[serde(default)]
    pub stripe_webhook_secret: Option<SecretString>,

    /// Maximum accepted age of a signed delivery, in seconds; zero or less
    /// turns the age check off
    #[serde(default = "default_webhook_tolerance")]
    pub webhook_tolerance_secs: i64,
}

impl PaymentConfig {
    /// Non-empty webhook secret, if one was configured.
    pub fn webhook_secret(&self) -> Option<&SecretString> {
        self.stripe_webhook_secret
            .as_ref()
            .filter(|s| !s.expose_secret().is_empty())
    }

    /// Verifier for incoming deliveries, or `None` without a usable secret.
    pub fn webhook_verifier(&self) -> Option<StripeWebhookVerifier> {
        self.webhook_secret().cloned().map(|secret| {
            StripeWebhookVerifier::new(secret).with_tolerance_secs(self.webhook_tolerance_secs)
        })
    }

    fn api_key(&self) -> Option<&str> {
        self.stripe_api_key
            .as_ref()
            .map(|s| s.expose_secret().as_str())
            .filter(|s| !s.is_empty())
    }

    /// Check if both Stripe credentials are present
    pub fn is_configured(&self) -> bool {
        self.api_key().is_some() && self.webhook_secret().is_some()
    }

    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.api_key()
            .map(|k| k.starts_with("sk_test_") || k.starts_with("rk_test_"))
            .unwrap_or(false)
    }

    /// Check if using Stripe live mode
    pub fn is_live_mode(&self) -> bool {
        self.api_key()
            .map(|k| k.starts_with("sk_live_") || k.starts_with("rk_live_"))
            .unwrap_or(false)
    }

    /// Validate payment configuration
    ///
    /// Startup treats a failure here as a warning, not a fatal error.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let api_key = self
            .api_key()
            .ok_or(ValidationError::MissingRequired("STRIPE_API_KEY"))?;
        let webhook_secret = self
            .webhook_secret()
            .ok_or(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"))?;

        // Verify key prefixes for safety
        if !api_key.starts_with("sk_") && !api_key.starts_with("rk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !webhook_secret.expose_secret().starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }

        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            stripe_api_key: None,
            stripe_webhook_secret: None,
            webhook_tolerance_secs: default_webhook_tolerance(),
        }
    }
}

fn default_webhook_tolerance() -> i64 {
    DEFAULT_TOLERANCE_SECS
}
