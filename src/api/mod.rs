//! HTTP surface: routing, shared state and flash-style messages.

pub mod accounts;
pub mod auth;
pub mod bag;
pub mod checkout;
pub mod news;
pub mod products;
pub mod profiles;

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Settings;
use crate::domain::ports::{SessionData, Store};
use crate::error::{Result, StorefrontError};
use crate::infrastructure::EventPublisher;
use crate::payments::PaymentGateway;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub payments: Arc<dyn PaymentGateway>,
    pub events: EventPublisher,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, payments: Arc<dyn PaymentGateway>, events: EventPublisher, settings: Settings) -> Self {
        Self { store, payments, events, settings: Arc::new(settings) }
    }

    pub(crate) async fn session(&self, key: &str) -> Result<SessionData> {
        Ok(self.store.load_session(session_key(key)?).await?)
    }

    pub(crate) async fn save_session(&self, key: &str, data: &SessionData) -> Result<()> {
        Ok(self.store.save_session(session_key(key)?, data).await?)
    }
}

/// Session keys are opaque client-chosen tokens: 1 to 64 characters of `[A-Za-z0-9_-]`.
fn session_key(key: &str) -> Result<&str> {
    let valid = !key.is_empty() && key.len() <= 64 && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid { Ok(key) } else { Err(StorefrontError::BadRequest("Invalid session key".to_string())) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level { Success, Info, Warning, Error }

/// User-facing notice returned alongside a response body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Message { pub level: Level, pub text: String }

impl Message {
    pub fn success(text: impl Into<String>) -> Self { Self { level: Level::Success, text: text.into() } }
    pub fn info(text: impl Into<String>) -> Self { Self { level: Level::Info, text: text.into() } }
    pub fn warning(text: impl Into<String>) -> Self { Self { level: Level::Warning, text: text.into() } }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/accounts", post(accounts::register))
        .route("/categories", get(products::list_categories).post(products::create_category))
        .route("/products", get(products::all_products).post(products::add_product))
        .route("/products/:id", get(products::product_detail).put(products::edit_product).delete(products::delete_product))
        .route("/products/:id/reviews", post(products::add_review))
        .route("/reviews/:id", delete(products::delete_review))
        .route("/bag/:session", get(bag::view_bag))
        .route("/bag/:session/add/:item_id", post(bag::add_to_bag))
        .route("/bag/:session/adjust/:item_id", post(bag::adjust_bag))
        .route("/bag/:session/remove/:item_id", post(bag::remove_from_bag))
        .route("/checkout/:session", get(checkout::checkout_page).post(checkout::place_order))
        .route("/checkout/:session/success/:order_number", get(checkout::checkout_success))
        .route("/profile", get(profiles::profile).put(profiles::update_profile))
        .route("/profile/orders/:order_number", get(profiles::order_history))
        .route("/news", get(news::list_news))
        .route("/news/:slug", get(news::news_detail))
        .route("/admin/news", get(news::admin_list_news).post(news::admin_create_news))
        .route("/admin/news/:id", put(news::admin_update_news).delete(news::admin_delete_news));

    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "storefront"})) }))
        .nest("/api/v1", api)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key() {
        assert!(session_key("abc-123_X").is_ok());
        assert!(session_key("").is_err());
        assert!(session_key("has space").is_err());
        assert!(session_key(&"a".repeat(65)).is_err());
    }
}
