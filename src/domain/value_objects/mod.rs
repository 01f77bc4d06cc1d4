//! Value objects for the storefront

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::ValidationError;

/// SKU (Stock Keeping Unit) value object
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Sku(String);

impl Sku {
    pub fn new(value: impl Into<String>) -> Result<Self, SkuError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() { return Err(SkuError::Empty); }
        if value.len() > 254 { return Err(SkuError::TooLong); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl From<Sku> for String {
    fn from(sku: Sku) -> Self { sku.0 }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SkuError {
    #[error("SKU empty")]
    Empty,
    #[error("SKU too long")]
    TooLong,
}

/// URL slug derived from a title: lower-case ASCII alphanumerics separated by single dashes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slug(String);

impl Slug {
    pub fn from_title(title: &str) -> Self {
        let mut slug = String::with_capacity(title.len());
        let mut pending_dash = false;
        for c in title.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_dash && !slug.is_empty() { slug.push('-'); }
                pending_dash = false;
                slug.push(c.to_ascii_lowercase());
            } else {
                pending_dash = true;
            }
        }
        Self(slug)
    }
    pub fn as_str(&self) -> &str { &self.0 }
    pub fn into_inner(self) -> String { self.0 }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Order number: 32 upper-case hex characters, generated once per order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    pub fn generate() -> Self { Self(Uuid::new_v4().simple().to_string().to_uppercase()) }
    pub fn from_stored(value: impl Into<String>) -> Self { Self(value.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Accepts assigned ISO-3166 alpha-2 country codes in upper case, such as `GB` or `US`.
pub fn validate_country_code(code: &str) -> Result<(), ValidationError> {
    let upper = code.len() == 2 && code.chars().all(|c| c.is_ascii_uppercase());
    match isocountry::CountryCode::for_alpha2(code) {
        Ok(_) if upper => Ok(()),
        _ => Err(ValidationError::new("country_code")),
    }
}

/// Delivery charged on orders below the free-delivery threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeliveryPolicy {
    pub free_delivery_threshold: Decimal,
    pub standard_delivery_percentage: Decimal,
}

impl DeliveryPolicy {
    pub fn new(free_delivery_threshold: Decimal, standard_delivery_percentage: Decimal) -> Self {
        Self { free_delivery_threshold, standard_delivery_percentage }
    }

    pub fn delivery_for(&self, total: Decimal) -> Decimal {
        if total < self.free_delivery_threshold {
            (total * self.standard_delivery_percentage / Decimal::ONE_HUNDRED).round_dp(2)
        } else {
            Decimal::ZERO
        }
    }

    pub fn free_delivery_delta(&self, total: Decimal) -> Decimal {
        if total < self.free_delivery_threshold {
            self.free_delivery_threshold - total
        } else {
            Decimal::ZERO
        }
    }
}

impl Default for DeliveryPolicy {
    fn default() -> Self { Self::new(Decimal::from(50), Decimal::from(10)) }
}
