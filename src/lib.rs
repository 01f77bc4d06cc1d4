//! Storefront service
//!
//! A single-shop web store exposed as a JSON API.
//!
//! ## Features
//! - Product catalog with categories, sorting, search and reviews
//! - Session shopping bag with delivery pricing
//! - Checkout backed by Stripe payment intents
//! - User profiles with saved delivery details and order history
//! - News posts with an admin changelist

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod payments;

pub use api::{router, AppState};
pub use config::Settings;
pub use error::{Result, StorefrontError};
