use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::domain::aggregates::{BagError, CatalogError, OrderError};
use crate::domain::ports::StoreError;
use crate::payments::PaymentError;

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{message}")]
    Validation { message: String, errors: ValidationErrors },

    #[error("Authentication credentials were not provided or are invalid")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;

impl StorefrontError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid(message: impl Into<String>, errors: ValidationErrors) -> Self {
        Self::Validation { message: message.into(), errors }
    }

    pub fn admin_only() -> Self {
        Self::Forbidden("Only store admins can access this page!".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Payment(_) => StatusCode::BAD_GATEWAY,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for StorefrontError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(what) => Self::Conflict(format!("{what} already exists")),
            StoreError::Backend(msg) => Self::Storage(msg),
        }
    }
}

fn quantity_error(message: String, code: &'static str) -> StorefrontError {
    let mut errors = ValidationErrors::new();
    errors.add("quantity", validator::ValidationError::new(code));
    StorefrontError::invalid(message, errors)
}

impl From<BagError> for StorefrontError {
    fn from(e: BagError) -> Self {
        match e {
            BagError::ItemNotInBag => Self::NotFound(e.to_string()),
            BagError::InvalidQuantity => quantity_error(e.to_string(), "quantity_range"),
            BagError::TotalOverflow => quantity_error(e.to_string(), "total_overflow"),
        }
    }
}

impl From<CatalogError> for StorefrontError {
    fn from(e: CatalogError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl From<OrderError> for StorefrontError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::EmptyBag => Self::BadRequest(e.to_string()),
            OrderError::ProductMissing(_) => Self::NotFound(
                "One of the products in your bag wasn't found in our database. Please call us for assistance!".to_string(),
            ),
            OrderError::TotalOverflow => quantity_error(e.to_string(), "total_overflow"),
        }
    }
}

impl IntoResponse for StorefrontError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        let body = match &self {
            Self::Validation { message, errors } => json!({ "error": message, "fields": errors }),
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
