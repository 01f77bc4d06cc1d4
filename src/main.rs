//! Storefront - session bag, checkout and catalog over HTTP

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront::domain::ports::Store;
use storefront::infrastructure::{EventPublisher, InMemoryStore, PgStore};
use storefront::payments::StripeClient;
use storefront::{api, AppState, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;
    let store: Arc<dyn Store> = match &settings.database_url {
        Some(url) => Arc::new(PgStore::connect(url).await?),
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store");
            Arc::new(InMemoryStore::new())
        }
    };
    let events = EventPublisher::connect(settings.nats_url.as_deref()).await;
    if settings.stripe_secret_key.is_empty() {
        tracing::warn!("STRIPE_SECRET_KEY not set, checkout will fail to create payment intents");
    }
    let payments = Arc::new(StripeClient::new(&settings.stripe_api_base, &settings.stripe_secret_key));

    let port = settings.port;
    let state = AppState::new(store, payments, events, settings);
    api::accounts::ensure_admin(&state).await?;
    let app = api::router(state);

    tracing::info!("storefront listening on 0.0.0.0:{}", port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?, app).await?;
    Ok(())
}
