//! Integration tests for the webhook HTTP surface.
//!
//! Requests go through the real axum router backed by the in-memory store,
//! signed the same way Stripe signs deliveries.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{HeaderValue, Request, StatusCode};
use axum::Router;
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

use payment_relay::adapters::memory::RecordedWrite;
use payment_relay::adapters::{app_router, AppState, InMemoryBillingStore};
use payment_relay::domain::billing::{sign_payload, StripeWebhookVerifier};

const SECRET: &str = "whsec_integration_secret";

// =============================================================================
// Test Infrastructure
// =============================================================================

fn router_with(store: Arc<InMemoryBillingStore>, secret: Option<&str>) -> Router {
    let verifier =
        secret.map(|s| StripeWebhookVerifier::new(SecretString::new(s.to_string())));
    app_router(AppState::new(store, verifier))
}

fn event(event_type: &str, object: Value) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": "evt_integration",
        "object": "event",
        "type": event_type,
        "created": 1704067200,
        "data": { "object": object },
        "livemode": false,
        "api_version": "2023-10-16"
    }))
    .unwrap()
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn webhook_request(payload: Vec<u8>, signature: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhooks/stripe")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header("Stripe-Signature", signature);
    }
    builder.body(Body::from(payload)).unwrap()
}

fn signed_request(payload: Vec<u8>) -> Request<Body> {
    let signature = sign_payload(SECRET, now(), &payload);
    webhook_request(payload, Some(signature))
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

// =============================================================================
// Preconditions
// =============================================================================

#[tokio::test]
async fn request_without_signature_header_is_rejected() {
    let store = Arc::new(InMemoryBillingStore::new());
    let payload = event("payment_intent.succeeded", json!({ "id": "pi_123" }));

    let (status, body) = send(
        router_with(store.clone(), Some(SECRET)),
        webhook_request(payload, None),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Missing signature");
    assert!(store.writes().await.is_empty());
}

#[tokio::test]
async fn empty_signature_header_counts_as_missing() {
    let store = Arc::new(InMemoryBillingStore::new());

    for header in ["", "   "] {
        let payload = event("payment_intent.succeeded", json!({ "id": "pi_123" }));

        let (status, body) = send(
            router_with(store.clone(), Some(SECRET)),
            webhook_request(payload, Some(header.to_string())),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Missing signature");
    }
    assert!(store.writes().await.is_empty());
}

#[tokio::test]
async fn non_ascii_signature_header_is_present_but_unparseable() {
    let store = Arc::new(InMemoryBillingStore::new());
    let payload = event("payment_intent.succeeded", json!({ "id": "pi_123" }));
    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/stripe")
        .header(
            "Stripe-Signature",
            HeaderValue::from_bytes(b"t=\xff,v1=\xfe").unwrap(),
        )
        .body(Body::from(payload))
        .unwrap();

    let (status, body) = send(router_with(store.clone(), Some(SECRET)), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        "Webhook Error: Unable to extract timestamp and signatures from header"
    );
    assert!(store.writes().await.is_empty());
}

#[tokio::test]
async fn request_without_configured_secret_is_rejected() {
    let store = Arc::new(InMemoryBillingStore::new());
    let payload = event("payment_intent.succeeded", json!({ "id": "pi_123" }));

    let (status, body) = send(router_with(store.clone(), None), signed_request(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Missing signature");
    assert!(store.writes().await.is_empty());
}

// =============================================================================
// Verification Failures
// =============================================================================

#[tokio::test]
async fn signature_from_another_secret_is_rejected() {
    let store = Arc::new(InMemoryBillingStore::new());
    let payload = event("payment_intent.succeeded", json!({ "id": "pi_123" }));
    let signature = sign_payload("whsec_someone_else", now(), &payload);

    let (status, body) = send(
        router_with(store.clone(), Some(SECRET)),
        webhook_request(payload, Some(signature)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with("Webhook Error:"));
    assert_eq!(
        body,
        "Webhook Error: No signatures found matching the expected signature for payload"
    );
    assert!(store.writes().await.is_empty());
}

#[tokio::test]
async fn body_altered_after_signing_is_rejected() {
    let store = Arc::new(InMemoryBillingStore::new());
    let payload = event("payment_intent.succeeded", json!({ "id": "pi_123" }));
    let signature = sign_payload(SECRET, now(), &payload);
    let tampered = event("payment_intent.succeeded", json!({ "id": "pi_999" }));

    let (status, body) = send(
        router_with(store.clone(), Some(SECRET)),
        webhook_request(tampered, Some(signature)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with("Webhook Error:"));
    assert!(store.writes().await.is_empty());
}

#[tokio::test]
async fn malformed_signature_header_is_rejected() {
    let store = Arc::new(InMemoryBillingStore::new());
    let payload = event("payment_intent.succeeded", json!({ "id": "pi_123" }));

    let (status, body) = send(
        router_with(store, Some(SECRET)),
        webhook_request(payload, Some("garbage".to_string())),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        "Webhook Error: Unable to extract timestamp and signatures from header"
    );
}

#[tokio::test]
async fn stale_delivery_is_rejected() {
    let store = Arc::new(InMemoryBillingStore::new());
    let payload = event("payment_intent.succeeded", json!({ "id": "pi_123" }));
    let signature = sign_payload(SECRET, now() - 3600, &payload);

    let (status, body) = send(
        router_with(store, Some(SECRET)),
        webhook_request(payload, Some(signature)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Webhook Error: Timestamp outside the tolerance zone");
}

#[tokio::test]
async fn delivery_signed_ahead_of_local_clock_is_accepted() {
    let store = Arc::new(InMemoryBillingStore::new());
    store.seed_payment_transaction("pi_123").await;
    let payload = event("payment_intent.succeeded", json!({ "id": "pi_123" }));
    let signature = sign_payload(SECRET, now() + 120, &payload);

    let (status, body) = send(
        router_with(store.clone(), Some(SECRET)),
        webhook_request(payload, Some(signature)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Webhook handled");
    assert_eq!(store.payment_transaction("pi_123").await.unwrap().status, "completed");
}

#[tokio::test]
async fn zero_tolerance_accepts_old_delivery() {
    let store = Arc::new(InMemoryBillingStore::new());
    let payload = event("charge.refunded", json!({ "id": "ch_789" }));
    let signature = sign_payload(SECRET, now() - 3600, &payload);
    let verifier =
        StripeWebhookVerifier::new(SecretString::new(SECRET.to_string())).with_tolerance_secs(0);
    let router = app_router(AppState::new(store.clone(), Some(verifier)));

    let (status, _) = send(router, webhook_request(payload, Some(signature))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.writes().await.len(), 1);
}

#[tokio::test]
async fn signed_non_json_body_is_invalid_payload() {
    let store = Arc::new(InMemoryBillingStore::new());
    let payload = b"not json".to_vec();

    let (status, body) = send(router_with(store, Some(SECRET)), signed_request(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with("Webhook Error: Invalid payload:"));
}

// =============================================================================
// Event Handling
// =============================================================================

#[tokio::test]
async fn payment_succeeded_completes_transaction() {
    let store = Arc::new(InMemoryBillingStore::new());
    store.seed_payment_transaction("pi_123").await;
    let payload = event("payment_intent.succeeded", json!({ "id": "pi_123" }));

    let (status, body) = send(
        router_with(store.clone(), Some(SECRET)),
        signed_request(payload),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Webhook handled");
    let row = store.payment_transaction("pi_123").await.unwrap();
    assert_eq!(row.status, "completed");
    assert!(row.processed_at.is_some());
}

#[tokio::test]
async fn payment_failed_records_error_message() {
    let store = Arc::new(InMemoryBillingStore::new());
    store.seed_payment_transaction("pi_456").await;
    let payload = event(
        "payment_intent.payment_failed",
        json!({
            "id": "pi_456",
            "last_payment_error": { "code": "card_declined", "message": "card_declined" }
        }),
    );

    let (status, _) = send(
        router_with(store.clone(), Some(SECRET)),
        signed_request(payload),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let row = store.payment_transaction("pi_456").await.unwrap();
    assert_eq!(row.status, "failed");
    assert_eq!(row.error_message.as_deref(), Some("card_declined"));
    assert!(row.processed_at.is_some());
}

#[tokio::test]
async fn charge_refunded_completes_refund() {
    let store = Arc::new(InMemoryBillingStore::new());
    store.seed_refund("ch_789").await;
    let payload = event("charge.refunded", json!({ "id": "ch_789", "amount_refunded": 500 }));

    let (status, body) = send(
        router_with(store.clone(), Some(SECRET)),
        signed_request(payload),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Webhook handled");
    let row = store.refund("ch_789").await.unwrap();
    assert_eq!(row.status, "completed");
    assert!(row.processed_at.is_some());
}

#[tokio::test]
async fn account_updated_sets_pending_with_requirements() {
    let store = Arc::new(InMemoryBillingStore::new());
    store.seed_account("acct_1").await;
    let payload = event(
        "account.updated",
        json!({
            "id": "acct_1",
            "charges_enabled": false,
            "requirements": { "currently_due": ["individual.id_number"] }
        }),
    );

    let (status, _) = send(
        router_with(store.clone(), Some(SECRET)),
        signed_request(payload),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let row = store.account("acct_1").await.unwrap();
    assert_eq!(row.status.as_deref(), Some("pending"));
    assert_eq!(row.requirements, vec!["individual.id_number".to_string()]);
}

#[tokio::test]
async fn account_updated_without_currently_due_clears_requirements() {
    let store = Arc::new(InMemoryBillingStore::new());
    store.seed_account("acct_1").await;
    let first = event(
        "account.updated",
        json!({
            "id": "acct_1",
            "charges_enabled": false,
            "requirements": { "currently_due": ["external_account"] }
        }),
    );
    let second = event(
        "account.updated",
        json!({ "id": "acct_1", "charges_enabled": true, "requirements": {} }),
    );
    let router = router_with(store.clone(), Some(SECRET));

    send(router.clone(), signed_request(first)).await;
    let (status, _) = send(router, signed_request(second)).await;

    assert_eq!(status, StatusCode::OK);
    let row = store.account("acct_1").await.unwrap();
    assert_eq!(row.status.as_deref(), Some("active"));
    assert!(row.requirements.is_empty());
}

#[tokio::test]
async fn unrecognized_event_type_succeeds_without_writes() {
    let store = Arc::new(InMemoryBillingStore::new());
    let payload = event("customer.subscription.created", json!({ "id": "sub_1" }));

    let (status, body) = send(
        router_with(store.clone(), Some(SECRET)),
        signed_request(payload),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Webhook handled");
    assert!(store.writes().await.is_empty());
}

#[tokio::test]
async fn update_for_unknown_id_still_succeeds() {
    let store = Arc::new(InMemoryBillingStore::new());
    let payload = event("payment_intent.succeeded", json!({ "id": "pi_unknown" }));

    let (status, _) = send(
        router_with(store.clone(), Some(SECRET)),
        signed_request(payload),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(store.payment_transaction("pi_unknown").await.is_none());
    match store.writes().await.as_slice() {
        [RecordedWrite::PaymentTransaction {
            payment_intent_id, ..
        }] => assert_eq!(payment_intent_id, "pi_unknown"),
        other => panic!("unexpected writes: {:?}", other),
    }
}

#[tokio::test]
async fn redelivery_reapplies_the_same_update() {
    let store = Arc::new(InMemoryBillingStore::new());
    store.seed_refund("ch_789").await;
    let payload = event("charge.refunded", json!({ "id": "ch_789" }));
    let router = router_with(store.clone(), Some(SECRET));

    send(router.clone(), signed_request(payload.clone())).await;
    let (status, _) = send(router, signed_request(payload)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.writes().await.len(), 2);
    assert_eq!(store.refund("ch_789").await.unwrap().status, "completed");
}

// =============================================================================
// Store Failures
// =============================================================================

#[tokio::test]
async fn store_failure_is_reported_in_response() {
    let store = Arc::new(InMemoryBillingStore::failing("permission denied for table refunds"));
    let payload = event("charge.refunded", json!({ "id": "ch_789" }));

    let (status, body) = send(router_with(store, Some(SECRET)), signed_request(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Webhook Error: permission denied for table refunds");
}

#[tokio::test]
async fn store_failure_without_message_reports_unknown_error() {
    let store = Arc::new(InMemoryBillingStore::failing(""));
    let payload = event("payment_intent.succeeded", json!({ "id": "pi_123" }));

    let (status, body) = send(router_with(store, Some(SECRET)), signed_request(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Webhook Error: Unknown error");
}

#[tokio::test]
async fn unrecognized_event_skips_failing_store() {
    let store = Arc::new(InMemoryBillingStore::failing("unreachable"));
    let payload = event("invoice.paid", json!({ "id": "in_1" }));

    let (status, _) = send(router_with(store, Some(SECRET)), signed_request(payload)).await;

    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn health_reports_store_backend() {
    let store = Arc::new(InMemoryBillingStore::new());
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(router_with(store, None), request).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json, json!({ "status": "ok", "store": "memory" }));
}
