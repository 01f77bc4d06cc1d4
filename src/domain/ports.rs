//! Persistence ports implemented by the in-memory and Postgres stores.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::domain::aggregates::{Bag, Category, News, NewsFilter, Order, Product, ProductReview, User, UserProfile};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} already exists")]
    Conflict(String),
    #[error("Storage error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Server-side state of one visitor session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub bag: Bag,
    #[serde(default)]
    pub save_info: bool,
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn categories(&self) -> StoreResult<Vec<Category>>;
    async fn insert_category(&self, category: Category) -> StoreResult<()>;
    async fn category(&self, id: Uuid) -> StoreResult<Option<Category>>;
    async fn products(&self) -> StoreResult<Vec<Product>>;
    async fn products_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Product>>;
    async fn product(&self, id: Uuid) -> StoreResult<Option<Product>>;
    async fn insert_product(&self, product: Product) -> StoreResult<()>;
    async fn update_product(&self, product: Product) -> StoreResult<bool>;
    async fn delete_product(&self, id: Uuid) -> StoreResult<bool>;
    /// Reviews of a product, newest first.
    async fn reviews_for(&self, product_id: Uuid) -> StoreResult<Vec<ProductReview>>;
    async fn review(&self, id: Uuid) -> StoreResult<Option<ProductReview>>;
    async fn insert_review(&self, review: ProductReview) -> StoreResult<()>;
    async fn delete_review(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists the order and its line items atomically.
    async fn insert_order(&self, order: &Order) -> StoreResult<()>;
    async fn order_by_number(&self, order_number: &str) -> StoreResult<Option<Order>>;
    async fn assign_order_owner(&self, order_number: &str, user_id: Uuid) -> StoreResult<bool>;
    /// Orders of a user, newest first.
    async fn orders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Inserts the user together with an empty profile.
    async fn insert_user(&self, user: User) -> StoreResult<()>;
    async fn user_by_token(&self, token: &str) -> StoreResult<Option<User>>;
    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn profile(&self, user_id: Uuid) -> StoreResult<Option<UserProfile>>;
    async fn save_profile(&self, profile: UserProfile) -> StoreResult<()>;
}

#[async_trait]
pub trait NewsStore: Send + Sync {
    /// Posts matching the filter, newest first.
    async fn news(&self, filter: &NewsFilter) -> StoreResult<Vec<News>>;
    async fn news_by_slug(&self, slug: &str) -> StoreResult<Option<News>>;
    async fn news_by_id(&self, id: Uuid) -> StoreResult<Option<News>>;
    async fn insert_news(&self, news: News) -> StoreResult<()>;
    async fn update_news(&self, news: News) -> StoreResult<bool>;
    async fn delete_news(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads a session, or an empty one when the key is new.
    async fn load_session(&self, key: &str) -> StoreResult<SessionData>;
    async fn save_session(&self, key: &str, data: &SessionData) -> StoreResult<()>;
}

pub trait Store: CatalogStore + OrderStore + AccountStore + NewsStore + SessionStore {}

impl<T> Store for T where T: CatalogStore + OrderStore + AccountStore + NewsStore + SessionStore {}
