use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use validator::Validate;

use super::auth::CurrentUser;
use super::bag::bag_contents;
use super::{AppState, Message};
use crate::domain::aggregates::{BagContents, Order, OrderForm, OrderError, UserProfile};
use crate::error::{Result, StorefrontError};
use crate::payments::to_minor_units;

#[derive(Debug, Serialize)]
pub struct CheckoutPage {
    pub bag: BagContents,
    pub order_form: OrderForm,
    pub stripe_public_key: String,
    pub client_secret: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct OrderPlaced {
    pub order_number: String,
    pub order: Order,
}

#[derive(Debug, Serialize)]
pub struct CheckoutSuccess {
    pub order: Order,
    pub messages: Vec<Message>,
}

/// Prices the bag and opens a payment intent for its grand total.
#[tracing::instrument(skip_all)]
pub async fn checkout_page(State(s): State<AppState>, CurrentUser(user): CurrentUser, Path(session): Path<String>) -> Result<Json<CheckoutPage>> {
    let mut data = s.session(&session).await?;
    if data.bag.is_empty() {
        return Err(OrderError::EmptyBag.into());
    }
    let bag = bag_contents(&s, &mut data.bag).await?;
    if data.bag.is_empty() {
        s.save_session(&session, &data).await?;
        return Err(OrderError::EmptyBag.into());
    }

    let amount = to_minor_units(bag.grand_total)?;
    let mut metadata = BTreeMap::new();
    metadata.insert("username".to_string(), user.as_ref().map_or("AnonymousUser".to_string(), |u| u.username.clone()));
    metadata.insert("bag".to_string(), serde_json::to_string(&data.bag).unwrap_or_default());
    let intent = s.payments.create_intent(amount, &s.settings.stripe_currency, &metadata).await?;
    tracing::info!(intent_id = %intent.id, amount, "payment intent created");

    let order_form = match &user {
        Some(user) => {
            let profile = s.store.profile(user.id).await?.unwrap_or_else(|| UserProfile::for_user(user.id));
            profile.prefill(user)
        }
        None => OrderForm::default(),
    };

    let mut messages = vec![];
    if s.settings.stripe_public_key.is_empty() {
        messages.push(Message::warning("Stripe public key is missing. Did you forget to set it in your environment?"));
    }

    Ok(Json(CheckoutPage {
        bag,
        order_form,
        stripe_public_key: s.settings.stripe_public_key.clone(),
        client_secret: intent.client_secret,
        messages,
    }))
}

/// Turns the session bag into a persisted order.
#[tracing::instrument(skip_all)]
pub async fn place_order(State(s): State<AppState>, CurrentUser(user): CurrentUser, Path(session): Path<String>, Json(form): Json<OrderForm>) -> Result<(StatusCode, Json<OrderPlaced>)> {
    form.validate().map_err(|e| {
        StorefrontError::invalid("An error was found in your form, please double check your information and try again.", e)
    })?;
    let mut data = s.session(&session).await?;
    let products = s.store.products_by_ids(&data.bag.item_ids()).await?;
    let save_info = form.save_info;

    let mut order = Order::place(form, &data.bag, &products, &s.settings.delivery, user.as_ref().map(|u| u.id))?;
    s.store.insert_order(&order).await?;
    tracing::info!(order_number = %order.order_number, grand_total = %order.grand_total, "order placed");

    data.save_info = save_info;
    s.save_session(&session, &data).await?;
    s.events.publish(order.take_events()).await;

    Ok((StatusCode::CREATED, Json(OrderPlaced { order_number: order.order_number.to_string(), order })))
}

#[tracing::instrument(skip_all, fields(order_number = %order_number))]
pub async fn checkout_success(State(s): State<AppState>, CurrentUser(user): CurrentUser, Path((session, order_number)): Path<(String, String)>) -> Result<Json<CheckoutSuccess>> {
    let mut order = s.store.order_by_number(&order_number).await?.ok_or_else(|| StorefrontError::not_found("Order not found"))?;
    let mut data = s.session(&session).await?;

    // An order already owned by someone else is never reassigned.
    if let Some(user) = user.as_ref().filter(|u| order.user_id.map_or(true, |owner| owner == u.id)) {
        s.store.assign_order_owner(&order_number, user.id).await?;
        order.attach_to(user.id);
        if data.save_info {
            let mut profile = s.store.profile(user.id).await?.unwrap_or_else(|| UserProfile::for_user(user.id));
            profile.remember_delivery(&order);
            s.store.save_profile(profile).await?;
        }
    }

    data.bag.clear();
    s.save_session(&session, &data).await?;

    let message = Message::success(format!(
        "Order successfully placed! Your order number is {}. A confirmation email will be sent to {}.",
        order.order_number, order.email
    ));
    Ok(Json(CheckoutSuccess { order, messages: vec![message] }))
}
