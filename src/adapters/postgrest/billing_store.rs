//! PostgREST implementation of BillingStore.
//!
//! Updates rows through the hosted database's REST interface:
//! `PATCH {base}/rest/v1/<table>?<key>=eq.<id>` with a JSON body holding only
//! the columns being written.

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::domain::billing::{AccountUpdate, PaymentTransactionUpdate, RefundUpdate};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{
    BillingStore, ACCOUNT_KEY, CHARGE_KEY, PAYMENT_INTENT_KEY, PAYMENT_TRANSACTIONS_TABLE,
    REFUNDS_TABLE, USERS_TABLE,
};

/// Connection settings for the REST interface.
#[derive(Clone)]
pub struct PostgrestConfig {
    /// Project URL, without the `/rest/v1` suffix.
    base_url: String,
    /// Service-role key; sent as both `apikey` and bearer token.
    service_key: SecretString,
}

impl PostgrestConfig {
    pub fn new(base_url: impl Into<String>, service_key: SecretString) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            service_key,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }
}

impl std::fmt::Debug for PostgrestConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgrestConfig")
            .field("base_url", &self.base_url)
            .field("service_key", &"[REDACTED]")
            .finish()
    }
}

/// Error body returned by PostgREST on a failed request.
#[derive(Debug, Default, Deserialize)]
struct PostgrestErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

pub struct PostgrestBillingStore {
    config: PostgrestConfig,
    http_client: reqwest::Client,
}

impl PostgrestBillingStore {
    pub fn new(config: PostgrestConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Builds the conditional PATCH for one row.
    fn patch_request(
        &self,
        table: &str,
        key: &str,
        id: &str,
        body: &Value,
    ) -> Result<reqwest::Request, DomainError> {
        let service_key = self.config.service_key.expose_secret();

        self.http_client
            .patch(self.config.table_url(table))
            .query(&[(key, format!("eq.{}", id))])
            .header("apikey", service_key)
            .bearer_auth(service_key)
            .header("Prefer", "return=minimal")
            .json(body)
            .build()
            .map_err(|e| DomainError::new(ErrorCode::InternalError, e.to_string()))
    }

    async fn patch(&self, table: &str, key: &str, id: &str, body: Value) -> Result<(), DomainError> {
        let request = self.patch_request(table, key, id, &body)?;

        let response = self.http_client.execute(request).await.map_err(|e| {
            tracing::error!(error = %e, table, "PostgREST request failed");
            DomainError::new(ErrorCode::ExternalServiceError, e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let error_text = response.text().await.unwrap_or_default();
        tracing::error!(status = %status, error = %error_text, table, "PostgREST update failed");
        Err(error_from_response(status, &error_text))
    }
}

/// Maps a non-2xx response to a store error carrying the body's `message`.
///
/// The message is empty when the body has none, so callers can substitute
/// their own wording.
fn error_from_response(status: StatusCode, body: &str) -> DomainError {
    let parsed: PostgrestErrorBody = serde_json::from_str(body).unwrap_or_default();

    let mut error = DomainError::database(parsed.message.unwrap_or_default())
        .with_detail("status", status.as_u16().to_string());
    if let Some(code) = parsed.code {
        error = error.with_detail("code", code);
    }
    if let Some(hint) = parsed.hint {
        error = error.with_detail("hint", hint);
    }
    error
}

fn payment_body(update: &PaymentTransactionUpdate) -> Value {
    let mut body = Map::new();
    body.insert("status".to_string(), json!(update.status.as_str()));
    if let Some(message) = &update.error_message {
        body.insert("error_message".to_string(), json!(message));
    }
    body.insert(
        "processed_at".to_string(),
        json!(update.processed_at.to_rfc3339()),
    );
    Value::Object(body)
}

fn refund_body(update: &RefundUpdate) -> Value {
    json!({
        "status": update.status.as_str(),
        "processed_at": update.processed_at.to_rfc3339(),
    })
}

fn account_body(update: &AccountUpdate) -> Value {
    json!({
        "stripe_account_status": update.status.as_str(),
        "stripe_requirements": update.requirements,
    })
}

#[async_trait]
impl BillingStore for PostgrestBillingStore {
    async fn update_payment_transaction(
        &self,
        payment_intent_id: &str,
        update: &PaymentTransactionUpdate,
    ) -> Result<(), DomainError> {
        self.patch(
            PAYMENT_TRANSACTIONS_TABLE,
            PAYMENT_INTENT_KEY,
            payment_intent_id,
            payment_body(update),
        )
        .await
    }

    async fn update_refund(
        &self,
        charge_id: &str,
        update: &RefundUpdate,
    ) -> Result<(), DomainError> {
        self.patch(REFUNDS_TABLE, CHARGE_KEY, charge_id, refund_body(update))
            .await
    }

    async fn update_account(
        &self,
        account_id: &str,
        update: &AccountUpdate,
    ) -> Result<(), DomainError> {
        self.patch(USERS_TABLE, ACCOUNT_KEY, account_id, account_body(update))
            .await
    }

    fn backend_name(&self) -> &'static str {
        "postgrest"
    }
}
