use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::auth::{AuthUser, Superuser};
use super::{AppState, Message};
use crate::domain::aggregates::{search_catalog, CatalogListing, Category, Product, ProductForm, ProductQuery, ProductReview, ReviewForm};
use crate::domain::events::{DomainEvent, ProductEvent};
use crate::error::{Result, StorefrontError};

#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub product: Product,
    pub category: Option<Category>,
    pub reviews: Vec<ProductReview>,
}

#[derive(Debug, Serialize)]
pub struct ProductSaved {
    pub product: Product,
    pub messages: Vec<Message>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryForm {
    #[validate(length(min = 1, max = 254))]
    pub name: String,
    #[validate(length(max = 254))]
    pub friendly_name: Option<String>,
}

/// Catalog listing with sorting, category filter and search.
#[tracing::instrument(skip_all)]
pub async fn all_products(State(s): State<AppState>, Query(q): Query<ProductQuery>) -> Result<Json<CatalogListing>> {
    let products = s.store.products().await?;
    let categories = s.store.categories().await?;
    Ok(Json(search_catalog(products, &categories, &q)?))
}

pub async fn list_categories(State(s): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(s.store.categories().await?))
}

pub async fn create_category(State(s): State<AppState>, _admin: Superuser, Json(form): Json<CategoryForm>) -> Result<(StatusCode, Json<Category>)> {
    form.validate().map_err(|e| StorefrontError::invalid("Failed, check your form and try again!", e))?;
    let category = Category { id: Uuid::now_v7(), name: form.name.trim().to_string(), friendly_name: form.friendly_name };
    s.store.insert_category(category.clone()).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn product_detail(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<ProductPage>> {
    let product = s.store.product(id).await?.ok_or_else(|| StorefrontError::not_found("Product not found"))?;
    let category = match product.category_id {
        Some(category_id) => s.store.category(category_id).await?,
        None => None,
    };
    let reviews = s.store.reviews_for(id).await?;
    Ok(Json(ProductPage { product, category, reviews }))
}

#[tracing::instrument(skip_all, fields(product_id = %id))]
pub async fn add_review(State(s): State<AppState>, AuthUser(user): AuthUser, Path(id): Path<Uuid>, Json(form): Json<ReviewForm>) -> Result<(StatusCode, Json<ProductReview>)> {
    form.validate().map_err(|e| StorefrontError::invalid("Failed, check your review and try again!", e))?;
    s.store.product(id).await?.ok_or_else(|| StorefrontError::not_found("Product not found"))?;
    let review = ProductReview::new(id, user.id, user.username, form);
    s.store.insert_review(review.clone()).await?;
    s.events.publish([DomainEvent::Product(ProductEvent::ReviewPosted { product_id: id, review_id: review.id, stars: review.stars })]).await;
    Ok((StatusCode::CREATED, Json(review)))
}

/// Authors may delete their own reviews; superusers may delete any.
pub async fn delete_review(State(s): State<AppState>, AuthUser(user): AuthUser, Path(id): Path<Uuid>) -> Result<Json<Vec<Message>>> {
    let review = s.store.review(id).await?.ok_or_else(|| StorefrontError::not_found("Review not found"))?;
    if review.user_id != user.id && !user.is_superuser {
        return Err(StorefrontError::Forbidden("You can only delete your own reviews".to_string()));
    }
    s.store.delete_review(id).await?;
    Ok(Json(vec![Message::success("Your review has been deleted!")]))
}

async fn check_product_form(s: &AppState, form: &ProductForm) -> Result<()> {
    form.validate().map_err(|e| StorefrontError::invalid("Failed, check your form and try again!", e))?;
    if let Some(category_id) = form.category_id {
        if s.store.category(category_id).await?.is_none() {
            let mut errors = validator::ValidationErrors::new();
            errors.add("category_id", validator::ValidationError::new("unknown_category"));
            return Err(StorefrontError::invalid("Failed, check your form and try again!", errors));
        }
    }
    Ok(())
}

#[tracing::instrument(skip_all)]
pub async fn add_product(State(s): State<AppState>, _admin: Superuser, Json(form): Json<ProductForm>) -> Result<(StatusCode, Json<ProductSaved>)> {
    check_product_form(&s, &form).await?;
    let product = Product::from_form(form);
    s.store.insert_product(product.clone()).await?;
    tracing::info!(product_id = %product.id, "product added");
    s.events.publish([DomainEvent::Product(ProductEvent::Created { product_id: product.id, name: product.name.clone() })]).await;
    Ok((StatusCode::CREATED, Json(ProductSaved { product, messages: vec![Message::success("Product added successfully!")] })))
}

#[tracing::instrument(skip_all, fields(product_id = %id))]
pub async fn edit_product(State(s): State<AppState>, _admin: Superuser, Path(id): Path<Uuid>, Json(form): Json<ProductForm>) -> Result<Json<ProductSaved>> {
    let mut product = s.store.product(id).await?.ok_or_else(|| StorefrontError::not_found("Product not found"))?;
    check_product_form(&s, &form)
        .await
        .map_err(|e| match e {
            StorefrontError::Validation { errors, .. } => StorefrontError::invalid("Failed to update product, Check that form is valid!", errors),
            other => other,
        })?;
    product.apply_form(form);
    if !s.store.update_product(product.clone()).await? {
        return Err(StorefrontError::not_found("Product not found"));
    }
    s.events.publish([DomainEvent::Product(ProductEvent::Updated { product_id: id })]).await;
    Ok(Json(ProductSaved { product, messages: vec![Message::success("Successfully updated!")] }))
}

#[tracing::instrument(skip_all, fields(product_id = %id))]
pub async fn delete_product(State(s): State<AppState>, _admin: Superuser, Path(id): Path<Uuid>) -> Result<Json<Vec<Message>>> {
    if !s.store.delete_product(id).await? {
        return Err(StorefrontError::not_found("Product not found"));
    }
    tracing::info!("product deleted");
    s.events.publish([DomainEvent::Product(ProductEvent::Deleted { product_id: id })]).await;
    Ok(Json(vec![Message::success("Product deleted!")]))
}
