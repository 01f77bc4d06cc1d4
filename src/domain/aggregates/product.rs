//! Catalog: products, categories and reviews

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;
use validator::{Validate, ValidationError};
use crate::domain::value_objects::Sku;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category { pub id: Uuid, pub name: String, pub friendly_name: Option<String> }

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub sku: Option<String>,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub rating: Option<Decimal>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductReview {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub stars: i16,
    pub content: String,
    pub created_on: DateTime<Utc>,
}

/// Admin form for adding or editing a product.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct ProductForm {
    pub category_id: Option<Uuid>,
    #[validate(custom = "validate_sku")]
    pub sku: Option<String>,
    #[validate(length(min = 1, max = 254))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(custom = "validate_price")]
    pub price: Decimal,
    #[validate(custom = "validate_rating")]
    pub rating: Option<Decimal>,
    #[validate(length(max = 1024))]
    pub image_url: Option<String>,
}

fn validate_sku(sku: &str) -> Result<(), ValidationError> {
    Sku::new(sku).map(|_| ()).map_err(|_| ValidationError::new("sku"))
}

/// Prices are stored as `NUMERIC(6, 2)`.
fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() { return Err(ValidationError::new("negative_price")); }
    if *price > Decimal::new(999_999, 2) { return Err(ValidationError::new("price_too_large")); }
    if price.scale() > 2 && price.round_dp(2) != *price { return Err(ValidationError::new("price_precision")); }
    Ok(())
}

fn validate_rating(rating: &Decimal) -> Result<(), ValidationError> {
    if *rating < Decimal::ZERO || *rating > Decimal::from(5) { return Err(ValidationError::new("rating_range")); }
    Ok(())
}

impl Product {
    /// Builds a new product from a validated form.
    pub fn from_form(form: ProductForm) -> Self {
        let now = Utc::now();
        let mut product = Self {
            id: Uuid::now_v7(), category_id: None, sku: None, name: String::new(), description: String::new(),
            price: Decimal::ZERO, rating: None, image_url: None, created_at: now, updated_at: now,
        };
        product.apply_form(form);
        product
    }

    pub fn apply_form(&mut self, form: ProductForm) {
        self.category_id = form.category_id;
        self.sku = form.sku.and_then(|s| Sku::new(s).ok()).map(String::from);
        self.name = form.name.trim().to_string();
        self.description = form.description;
        self.price = form.price.round_dp(2);
        self.rating = form.rating;
        self.image_url = form.image_url;
        self.updated_at = Utc::now();
    }
}

/// Review form posted from the product page.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct ReviewForm {
    #[validate(range(min = 1, max = 5))]
    pub stars: Option<i16>,
    #[validate(length(max = 2000))]
    pub content: Option<String>,
}

impl ProductReview {
    pub fn new(product_id: Uuid, user_id: Uuid, username: impl Into<String>, form: ReviewForm) -> Self {
        Self {
            id: Uuid::now_v7(), product_id, user_id, username: username.into(),
            stars: form.stars.unwrap_or(3), content: form.content.unwrap_or_default(), created_on: Utc::now(),
        }
    }
}

// =============================================================================
// Listing: sorting, category filter and search
// =============================================================================

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub sort: Option<String>,
    pub direction: Option<String>,
    pub category: Option<String>,
    pub q: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey { Name, Price, Rating, Category }

impl std::str::FromStr for SortKey {
    type Err = CatalogError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "price" => Ok(Self::Price),
            "rating" => Ok(Self::Rating),
            "category" => Ok(Self::Category),
            other => Err(CatalogError::UnknownSortKey(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct CatalogListing {
    pub products: Vec<Product>,
    pub search_term: Option<String>,
    pub current_categories: Option<Vec<Category>>,
    pub current_sorting: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("No search criteria")]
    EmptySearch,
    #[error("Unknown sort key: {0}")]
    UnknownSortKey(String),
}

/// Applies the listing query to the full catalog.
pub fn search_catalog(mut products: Vec<Product>, categories: &[Category], query: &ProductQuery) -> Result<CatalogListing, CatalogError> {
    let mut current_categories = None;
    let mut search_term = None;

    if let Some(requested) = &query.category {
        let names: Vec<&str> = requested.split(',').map(str::trim).filter(|n| !n.is_empty()).collect();
        let matched: Vec<Category> = categories.iter().filter(|c| names.contains(&c.name.as_str())).cloned().collect();
        products.retain(|p| p.category_id.is_some_and(|id| matched.iter().any(|c| c.id == id)));
        current_categories = Some(matched);
    }

    if let Some(q) = &query.q {
        if q.trim().is_empty() { return Err(CatalogError::EmptySearch); }
        let needle = q.to_lowercase();
        products.retain(|p| p.name.to_lowercase().contains(&needle) || p.description.to_lowercase().contains(&needle));
        search_term = Some(q.clone());
    }

    if let Some(sort) = &query.sort {
        let key: SortKey = sort.parse()?;
        let descending = query.direction.as_deref() == Some("desc");
        sort_products(&mut products, key, descending, categories);
    }

    let current_sorting = format!(
        "{}_{}",
        query.sort.as_deref().unwrap_or("None"),
        query.direction.as_deref().unwrap_or("None"),
    );

    Ok(CatalogListing { products, search_term, current_categories, current_sorting })
}

fn sort_products(products: &mut [Product], key: SortKey, descending: bool, categories: &[Category]) {
    let category_name = |p: &Product| -> Option<String> {
        p.category_id.and_then(|id| categories.iter().find(|c| c.id == id)).map(|c| c.name.to_lowercase())
    };
    products.sort_by(|a, b| match key {
        SortKey::Name => directed(a.name.to_lowercase().cmp(&b.name.to_lowercase()), descending),
        SortKey::Price => directed(a.price.cmp(&b.price), descending),
        SortKey::Rating => missing_last(a.rating, b.rating, descending),
        SortKey::Category => missing_last(category_name(a), category_name(b), descending),
    });
}

fn directed(ordering: Ordering, descending: bool) -> Ordering {
    if descending { ordering.reverse() } else { ordering }
}

// Products without a value stay at the end in either direction.
fn missing_last<T: Ord>(a: Option<T>, b: Option<T>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => directed(a.cmp(&b), descending),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
