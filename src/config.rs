//! Runtime settings read from the environment (after `.env` is loaded).

use std::str::FromStr;

use crate::domain::value_objects::DeliveryPolicy;

#[derive(Clone, Debug)]
pub struct Settings {
    pub port: u16,
    pub database_url: Option<String>,
    pub nats_url: Option<String>,
    pub stripe_public_key: String,
    pub stripe_secret_key: String,
    pub stripe_currency: String,
    pub stripe_api_base: String,
    pub delivery: DeliveryPolicy,
    pub admin: Option<AdminBootstrap>,
}

/// Superuser created at startup when both variables are present.
#[derive(Clone, Debug)]
pub struct AdminBootstrap {
    pub username: String,
    pub token: String,
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid value for {name}: {value:?}")]
pub struct ConfigError {
    pub name: &'static str,
    pub value: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: 8083,
            database_url: None,
            nats_url: None,
            stripe_public_key: String::new(),
            stripe_secret_key: String::new(),
            stripe_currency: "usd".to_string(),
            stripe_api_base: "https://api.stripe.com".to_string(),
            delivery: DeliveryPolicy::default(),
            admin: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds settings from any variable source; unset or blank values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let admin = match (var("STOREFRONT_ADMIN_USERNAME"), var("STOREFRONT_ADMIN_TOKEN")) {
            (Some(username), Some(token)) => Some(AdminBootstrap { username, token }),
            _ => None,
        };

        Ok(Self {
            port: parse(&var, "PORT", defaults.port)?,
            database_url: var("DATABASE_URL"),
            nats_url: var("NATS_URL"),
            stripe_public_key: var("STRIPE_PUBLIC_KEY").unwrap_or_default(),
            stripe_secret_key: var("STRIPE_SECRET_KEY").unwrap_or_default(),
            stripe_currency: var("STRIPE_CURRENCY").unwrap_or(defaults.stripe_currency),
            stripe_api_base: var("STRIPE_API_BASE").unwrap_or(defaults.stripe_api_base),
            delivery: DeliveryPolicy::new(
                parse(&var, "FREE_DELIVERY_THRESHOLD", defaults.delivery.free_delivery_threshold)?,
                parse(&var, "STANDARD_DELIVERY_PERCENTAGE", defaults.delivery.standard_delivery_percentage)?,
            ),
            admin,
        })
    }
}

fn parse<T: FromStr>(var: &impl Fn(&str) -> Option<String>, name: &'static str, default: T) -> Result<T, ConfigError> {
    match var(name) {
        Some(value) => value.parse().map_err(|_| ConfigError { name, value }),
        None => Ok(default),
    }
}
