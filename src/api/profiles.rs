use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use validator::Validate;

use super::auth::AuthUser;
use super::{AppState, Message};
use crate::domain::aggregates::{Order, ProfileForm, User, UserProfile};
use crate::error::{Result, StorefrontError};

#[derive(Debug, Serialize)]
pub struct ProfilePage {
    pub user: User,
    pub profile: UserProfile,
    pub orders: Vec<Order>,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct OrderHistory {
    pub order: Order,
    pub messages: Vec<Message>,
}

async fn load_profile(s: &AppState, user: &User) -> Result<UserProfile> {
    Ok(s.store.profile(user.id).await?.unwrap_or_else(|| UserProfile::for_user(user.id)))
}

pub async fn profile(State(s): State<AppState>, AuthUser(user): AuthUser) -> Result<Json<ProfilePage>> {
    let profile = load_profile(&s, &user).await?;
    let orders = s.store.orders_for_user(user.id).await?;
    Ok(Json(ProfilePage { user, profile, orders, messages: vec![] }))
}

#[tracing::instrument(skip_all, fields(username = %user.username))]
pub async fn update_profile(State(s): State<AppState>, AuthUser(user): AuthUser, Json(form): Json<ProfileForm>) -> Result<Json<ProfilePage>> {
    form.validate().map_err(|e| StorefrontError::invalid("Update failed. Please ensure the form is valid.", e))?;
    let mut profile = load_profile(&s, &user).await?;
    profile.apply_form(form);
    s.store.save_profile(profile.clone()).await?;
    let orders = s.store.orders_for_user(user.id).await?;
    Ok(Json(ProfilePage { user, profile, orders, messages: vec![Message::success("Profile updated successfully")] }))
}

/// A past order confirmation, visible to its owner or a superuser.
pub async fn order_history(State(s): State<AppState>, AuthUser(user): AuthUser, Path(order_number): Path<String>) -> Result<Json<OrderHistory>> {
    let order = s.store.order_by_number(&order_number).await?.ok_or_else(|| StorefrontError::not_found("Order not found"))?;
    if order.user_id != Some(user.id) && !user.is_superuser {
        return Err(StorefrontError::not_found("Order not found"));
    }
    let message = Message::info(format!("This is a past confirmation for order number {order_number}."));
    Ok(Json(OrderHistory { order, messages: vec![message] }))
}
