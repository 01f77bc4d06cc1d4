//! Bearer-token authentication extractors.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::AppState;
use crate::domain::aggregates::User;
use crate::error::StorefrontError;

/// The signed-in user, if any. A malformed or unknown token is rejected rather than treated as anonymous.
pub struct CurrentUser(pub Option<User>);

/// Requires a signed-in user.
pub struct AuthUser(pub User);

/// Requires a signed-in superuser.
pub struct Superuser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = StorefrontError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else { return Ok(Self(None)) };
        let token = header
            .to_str()
            .ok()
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(StorefrontError::Unauthorized)?;
        let user = state.store.user_by_token(token).await?.ok_or(StorefrontError::Unauthorized)?;
        Ok(Self(Some(user)))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = StorefrontError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await? {
            CurrentUser(Some(user)) => Ok(Self(user)),
            CurrentUser(None) => Err(StorefrontError::Unauthorized),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Superuser {
    type Rejection = StorefrontError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_superuser {
            return Err(StorefrontError::admin_only());
        }
        Ok(Self(user))
    }
}
