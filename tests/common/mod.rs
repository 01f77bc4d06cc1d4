//! Shared harness: an in-memory storefront served on an ephemeral port.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use storefront::config::AdminBootstrap;
use storefront::infrastructure::{EventPublisher, InMemoryStore};
use storefront::payments::{PaymentError, PaymentGateway, PaymentIntent};
use storefront::{api, AppState, Settings};

pub const ADMIN_TOKEN: &str = "admin-token";

/// Hands out predictable intents and counts calls. Declines every request once `decline` is set.
#[derive(Default)]
pub struct FakeGateway {
    pub calls: AtomicUsize,
    pub decline: AtomicBool,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_intent(&self, amount: i64, currency: &str, _metadata: &BTreeMap<String, String>) -> Result<PaymentIntent, PaymentError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.decline.load(Ordering::SeqCst) {
            return Err(PaymentError::Rejected("Your card was declined.".to_string()));
        }
        Ok(PaymentIntent {
            id: format!("pi_{n}"),
            client_secret: format!("pi_{n}_secret_test"),
            amount,
            currency: currency.to_string(),
        })
    }
}

pub struct TestApp {
    pub base: String,
    pub client: reqwest::Client,
    pub payments: Arc<FakeGateway>,
}

/// Bind to port 0 and return the running app.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(configure: impl FnOnce(&mut Settings)) -> TestApp {
    let mut settings = Settings {
        stripe_public_key: "pk_test_storefront".to_string(),
        admin: Some(AdminBootstrap { username: "admin".to_string(), token: ADMIN_TOKEN.to_string() }),
        ..Settings::default()
    };
    configure(&mut settings);
    let payments = Arc::new(FakeGateway::default());
    let state = AppState::new(Arc::new(InMemoryStore::new()), payments.clone(), EventPublisher::disabled(), settings);
    api::accounts::ensure_admin(&state).await.unwrap();

    let app = api::router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestApp { base: format!("http://{addr}/api/v1"), client: reqwest::Client::new(), payments }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Registers a shopper and returns their bearer token.
    pub async fn register(&self, username: &str) -> String {
        let resp = self
            .client
            .post(self.url("/accounts"))
            .json(&json!({ "username": username, "email": format!("{username}@example.com") }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let body: Value = resp.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn create_category(&self, name: &str) -> String {
        let resp = self
            .client
            .post(self.url("/categories"))
            .bearer_auth(ADMIN_TOKEN)
            .json(&json!({ "name": name, "friendly_name": name.replace('_', " ") }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let body: Value = resp.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn create_product(&self, body: Value) -> String {
        let resp = self.client.post(self.url("/products")).bearer_auth(ADMIN_TOKEN).json(&body).send().await.unwrap();
        assert_eq!(resp.status(), 201);
        let body: Value = resp.json().await.unwrap();
        body["product"]["id"].as_str().unwrap().to_string()
    }

    pub async fn add_to_bag(&self, session: &str, item_id: &str, quantity: i64) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/bag/{session}/add/{item_id}")))
            .json(&json!({ "quantity": quantity }))
            .send()
            .await
            .unwrap()
    }
}

pub fn order_form(save_info: bool, client_secret: &str) -> Value {
    json!({
        "full_name": "Ann Shopper",
        "email": "ann@example.com",
        "phone_number": "0123456789",
        "country": "IE",
        "postcode": "D01 F5P2",
        "town_or_city": "Dublin",
        "street_address1": "1 Main Street",
        "street_address2": null,
        "save_info": save_info,
        "client_secret": client_secret,
    })
}
