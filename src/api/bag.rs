use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AppState, Message};
use crate::domain::aggregates::{Bag, BagChange, BagContents, Product};
use crate::error::{Result, StorefrontError};

#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct BagResponse {
    #[serde(flatten)]
    pub contents: BagContents,
    pub messages: Vec<Message>,
}

/// Prices the bag and drops entries whose product no longer exists.
pub(crate) async fn bag_contents(s: &AppState, bag: &mut Bag) -> Result<BagContents> {
    let products = s.store.products_by_ids(&bag.item_ids()).await?;
    let known: Vec<Uuid> = products.iter().map(|p| p.id).collect();
    bag.retain_known(&known);
    Ok(BagContents::compute(bag, &products, &s.settings.delivery)?)
}

async fn product_or_404(s: &AppState, item_id: Uuid) -> Result<Product> {
    s.store.product(item_id).await?.ok_or_else(|| StorefrontError::not_found("Product not found"))
}

fn change_message(product: &Product, change: BagChange) -> Message {
    match change {
        BagChange::Added { .. } => Message::success(format!("Added {} to your bag", product.name)),
        BagChange::Updated { quantity } => Message::success(format!("Updated {} quantity to {}", product.name, quantity)),
        BagChange::Removed => Message::success(format!("Removed {} from your bag", product.name)),
    }
}

pub async fn view_bag(State(s): State<AppState>, Path(session): Path<String>) -> Result<Json<BagResponse>> {
    let mut data = s.session(&session).await?;
    let before = data.bag.len();
    let contents = bag_contents(&s, &mut data.bag).await?;
    if data.bag.len() != before {
        s.save_session(&session, &data).await?;
    }
    Ok(Json(BagResponse { contents, messages: vec![] }))
}

#[tracing::instrument(skip_all, fields(item_id = %item_id))]
pub async fn add_to_bag(State(s): State<AppState>, Path((session, item_id)): Path<(String, Uuid)>, Json(form): Json<QuantityForm>) -> Result<Json<BagResponse>> {
    let product = product_or_404(&s, item_id).await?;
    let mut data = s.session(&session).await?;
    let change = data.bag.add(item_id, form.quantity)?;
    let contents = bag_contents(&s, &mut data.bag).await?;
    s.save_session(&session, &data).await?;
    Ok(Json(BagResponse { contents, messages: vec![change_message(&product, change)] }))
}

/// Sets the quantity of an item; a quantity of zero or less removes it.
#[tracing::instrument(skip_all, fields(item_id = %item_id))]
pub async fn adjust_bag(State(s): State<AppState>, Path((session, item_id)): Path<(String, Uuid)>, Json(form): Json<QuantityForm>) -> Result<Json<BagResponse>> {
    let mut data = s.session(&session).await?;
    let change = data.bag.adjust(item_id, form.quantity)?;
    let messages = match s.store.product(item_id).await? {
        Some(product) => vec![change_message(&product, change)],
        None => vec![],
    };
    let contents = bag_contents(&s, &mut data.bag).await?;
    s.save_session(&session, &data).await?;
    Ok(Json(BagResponse { contents, messages }))
}

#[tracing::instrument(skip_all, fields(item_id = %item_id))]
pub async fn remove_from_bag(State(s): State<AppState>, Path((session, item_id)): Path<(String, Uuid)>) -> Result<Json<BagResponse>> {
    let mut data = s.session(&session).await?;
    data.bag.remove(item_id)?;
    let messages = match s.store.product(item_id).await? {
        Some(product) => vec![change_message(&product, BagChange::Removed)],
        None => vec![],
    };
    let contents = bag_contents(&s, &mut data.bag).await?;
    s.save_session(&session, &data).await?;
    Ok(Json(BagResponse { contents, messages }))
}
