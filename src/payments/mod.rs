//! Payment provider integration
//!
//! Checkout asks the provider for a payment intent covering the bag's grand
//! total; the card details never touch this service.

pub mod stripe;

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use stripe::StripeClient;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment provider rejected the request: {0}")]
    Rejected(String),
    #[error("Payment provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Invalid payment amount {0}")]
    InvalidAmount(Decimal),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, amount: i64, currency: &str, metadata: &BTreeMap<String, String>) -> Result<PaymentIntent, PaymentError>;
}

/// Converts a decimal total to the provider's minor units, rounding half away from zero.
pub fn to_minor_units(total: Decimal) -> Result<i64, PaymentError> {
    (total * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .filter(|amount| *amount >= 0)
        .ok_or(PaymentError::InvalidAmount(total))
}
