//! Stripe client tests against a mock payment intents endpoint.

use std::collections::BTreeMap;

use serde_json::json;
use storefront::payments::{PaymentError, PaymentGateway, StripeClient};
use wiremock::{
    matchers::{body_string_contains, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn metadata() -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    metadata.insert("username".to_string(), "ann".to_string());
    metadata
}

#[tokio::test]
async fn test_create_intent_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/payment_intents"))
        .and(header("authorization", "Bearer sk_test_123"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("amount=2200"))
        .and(body_string_contains("currency=usd"))
        .and(body_string_contains("metadata%5Busername%5D=ann"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pi_123",
            "object": "payment_intent",
            "client_secret": "pi_123_secret_abc",
            "amount": 2200,
            "currency": "usd",
            "status": "requires_payment_method"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = StripeClient::new(mock_server.uri(), "sk_test_123");
    let intent = client.create_intent(2200, "USD", &metadata()).await.unwrap();

    assert_eq!(intent.id, "pi_123");
    assert_eq!(intent.client_secret, "pi_123_secret_abc");
    assert_eq!(intent.amount, 2200);
    assert_eq!(intent.currency, "usd");
}

#[tokio::test]
async fn test_create_intent_surfaces_provider_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/payment_intents"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({
            "error": { "type": "card_error", "message": "Your card was declined." }
        })))
        .mount(&mock_server)
        .await;

    let client = StripeClient::new(mock_server.uri(), "sk_test_123");
    let err = client.create_intent(2200, "usd", &metadata()).await.unwrap_err();

    match err {
        PaymentError::Rejected(message) => assert_eq!(message, "Your card was declined."),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_create_intent_unparseable_error_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/payment_intents"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream failure"))
        .mount(&mock_server)
        .await;

    let client = StripeClient::new(mock_server.uri(), "sk_test_123");
    let err = client.create_intent(100, "usd", &BTreeMap::new()).await.unwrap_err();

    match err {
        PaymentError::Rejected(message) => assert_eq!(message, "500 Internal Server Error"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_create_intent_unreachable_provider() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = StripeClient::new(format!("http://{addr}"), "sk_test_123");
    let err = client.create_intent(100, "usd", &BTreeMap::new()).await.unwrap_err();
    assert!(matches!(err, PaymentError::Transport(_)));
}
