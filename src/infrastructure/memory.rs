use crate::domain::aggregates::{Category, News, NewsFilter, Order, Product, ProductReview, User, UserProfile};
use crate::domain::ports::{AccountStore, CatalogStore, NewsStore, OrderStore, SessionData, SessionStore, StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A thread-safe in-memory store for every storefront table.
///
/// Used when no `DATABASE_URL` is configured and throughout the tests.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    categories: Arc<RwLock<HashMap<Uuid, Category>>>,
    products: Arc<RwLock<HashMap<Uuid, Product>>>,
    reviews: Arc<RwLock<HashMap<Uuid, ProductReview>>>,
    orders: Arc<RwLock<HashMap<String, Order>>>,
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    profiles: Arc<RwLock<HashMap<Uuid, UserProfile>>>,
    news: Arc<RwLock<HashMap<Uuid, News>>>,
    sessions: Arc<RwLock<HashMap<String, SessionData>>>,
}

impl InMemoryStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn categories(&self) -> StoreResult<Vec<Category>> {
        let mut categories: Vec<Category> = self.categories.read().await.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn insert_category(&self, category: Category) -> StoreResult<()> {
        let mut categories = self.categories.write().await;
        if categories.values().any(|c| c.name == category.name) {
            return Err(StoreError::Conflict(format!("category {}", category.name)));
        }
        categories.insert(category.id, category);
        Ok(())
    }

    async fn category(&self, id: Uuid) -> StoreResult<Option<Category>> {
        Ok(self.categories.read().await.get(&id).cloned())
    }

    async fn products(&self) -> StoreResult<Vec<Product>> {
        let mut products: Vec<Product> = self.products.read().await.values().cloned().collect();
        products.sort_by_key(|p| p.id);
        Ok(products)
    }

    async fn products_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Product>> {
        let products = self.products.read().await;
        Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
    }

    async fn product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn insert_product(&self, product: Product) -> StoreResult<()> {
        self.products.write().await.insert(product.id, product);
        Ok(())
    }

    async fn update_product(&self, product: Product) -> StoreResult<bool> {
        let mut products = self.products.write().await;
        match products.get_mut(&product.id) {
            Some(existing) => {
                *existing = product;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<bool> {
        let removed = self.products.write().await.remove(&id).is_some();
        if removed {
            self.reviews.write().await.retain(|_, r| r.product_id != id);
        }
        Ok(removed)
    }

    async fn reviews_for(&self, product_id: Uuid) -> StoreResult<Vec<ProductReview>> {
        let mut reviews: Vec<ProductReview> =
            self.reviews.read().await.values().filter(|r| r.product_id == product_id).cloned().collect();
        reviews.sort_by(|a, b| b.created_on.cmp(&a.created_on).then(b.id.cmp(&a.id)));
        Ok(reviews)
    }

    async fn review(&self, id: Uuid) -> StoreResult<Option<ProductReview>> {
        Ok(self.reviews.read().await.get(&id).cloned())
    }

    async fn insert_review(&self, review: ProductReview) -> StoreResult<()> {
        self.reviews.write().await.insert(review.id, review);
        Ok(())
    }

    async fn delete_review(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.reviews.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(order.order_number.as_str()) {
            return Err(StoreError::Conflict(format!("order {}", order.order_number)));
        }
        orders.insert(order.order_number.to_string(), order.clone());
        Ok(())
    }

    async fn order_by_number(&self, order_number: &str) -> StoreResult<Option<Order>> {
        Ok(self.orders.read().await.get(order_number).cloned())
    }

    async fn assign_order_owner(&self, order_number: &str, user_id: Uuid) -> StoreResult<bool> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(order_number) {
            Some(order) => {
                order.attach_to(user_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn orders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> =
            self.orders.read().await.values().filter(|o| o.user_id == Some(user_id)).cloned().collect();
        orders.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(orders)
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn insert_user(&self, user: User) -> StoreResult<()> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict(format!("user {}", user.username)));
        }
        self.profiles.write().await.insert(user.id, UserProfile::for_user(user.id));
        users.insert(user.id, user);
        Ok(())
    }

    async fn user_by_token(&self, token: &str) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.values().find(|u| u.token == token).cloned())
    }

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.values().find(|u| u.username == username).cloned())
    }

    async fn profile(&self, user_id: Uuid) -> StoreResult<Option<UserProfile>> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }

    async fn save_profile(&self, profile: UserProfile) -> StoreResult<()> {
        self.profiles.write().await.insert(profile.user_id, profile);
        Ok(())
    }
}

#[async_trait]
impl NewsStore for InMemoryStore {
    async fn news(&self, filter: &NewsFilter) -> StoreResult<Vec<News>> {
        let mut news: Vec<News> = self.news.read().await.values().filter(|n| filter.matches(n)).cloned().collect();
        news.sort_by(|a, b| b.created_on.cmp(&a.created_on).then(b.id.cmp(&a.id)));
        Ok(news)
    }

    async fn news_by_slug(&self, slug: &str) -> StoreResult<Option<News>> {
        Ok(self.news.read().await.values().find(|n| n.slug == slug).cloned())
    }

    async fn news_by_id(&self, id: Uuid) -> StoreResult<Option<News>> {
        Ok(self.news.read().await.get(&id).cloned())
    }

    async fn insert_news(&self, news: News) -> StoreResult<()> {
        let mut all = self.news.write().await;
        ensure_unique_news(&all, &news)?;
        all.insert(news.id, news);
        Ok(())
    }

    async fn update_news(&self, news: News) -> StoreResult<bool> {
        let mut all = self.news.write().await;
        if !all.contains_key(&news.id) {
            return Ok(false);
        }
        ensure_unique_news(&all, &news)?;
        all.insert(news.id, news);
        Ok(true)
    }

    async fn delete_news(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.news.write().await.remove(&id).is_some())
    }
}

fn ensure_unique_news(all: &HashMap<Uuid, News>, news: &News) -> StoreResult<()> {
    let clash = all.values().filter(|n| n.id != news.id).find(|n| n.title == news.title || n.slug == news.slug);
    match clash {
        Some(_) => Err(StoreError::Conflict(format!("news post {}", news.slug))),
        None => Ok(()),
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn load_session(&self, key: &str) -> StoreResult<SessionData> {
        Ok(self.sessions.read().await.get(key).cloned().unwrap_or_default())
    }

    async fn save_session(&self, key: &str, data: &SessionData) -> StoreResult<()> {
        self.sessions.write().await.insert(key.to_string(), data.clone());
        Ok(())
    }
}
