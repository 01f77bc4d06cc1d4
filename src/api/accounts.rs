use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use validator::Validate;

use super::AppState;
use crate::domain::aggregates::{RegistrationForm, User};
use crate::error::{Result, StorefrontError};

#[derive(Debug, Serialize)]
pub struct Registered {
    pub user: User,
    pub token: String,
}

/// Creates a user (and, with it, an empty profile). The token is only ever returned here.
#[tracing::instrument(skip_all)]
pub async fn register(State(s): State<AppState>, Json(form): Json<RegistrationForm>) -> Result<(StatusCode, Json<Registered>)> {
    form.validate().map_err(|e| StorefrontError::invalid("Please check your details and try again.", e))?;
    let user = User::register(form.username.trim(), form.email.trim(), false);
    s.store.insert_user(user.clone()).await?;
    tracing::info!(username = %user.username, "user registered");
    let token = user.token.clone();
    Ok((StatusCode::CREATED, Json(Registered { user, token })))
}

/// Ensures the configured bootstrap superuser exists.
pub async fn ensure_admin(s: &AppState) -> Result<()> {
    let Some(admin) = s.settings.admin.clone() else { return Ok(()) };
    if s.store.user_by_username(&admin.username).await?.is_some() {
        return Ok(());
    }
    let mut user = User::register(admin.username, "", true);
    user.token = admin.token;
    s.store.insert_user(user).await?;
    tracing::info!("bootstrap superuser created");
    Ok(())
}
