use crate::domain::aggregates::{Bag, Category, News, NewsFilter, NewsStatus, Order, OrderLineItem, Product, ProductReview, User, UserProfile};
use crate::domain::ports::{AccountStore, CatalogStore, NewsStore, OrderStore, SessionData, SessionStore, StoreError, StoreResult};
use crate::domain::value_objects::OrderNumber;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use std::collections::HashMap;
use uuid::Uuid;

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Connects and runs the embedded migrations.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new().max_connections(10).connect(url).await?;
        sqlx::migrate!("./migrations").run(&db).await?;
        Ok(Self::new(db))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.constraint().unwrap_or("record").to_string())
            }
            _ => StoreError::Backend(e.to_string()),
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    user_id: Option<Uuid>,
    full_name: String,
    email: String,
    phone_number: String,
    country: String,
    postcode: String,
    town_or_city: String,
    street_address1: String,
    street_address2: Option<String>,
    date: DateTime<Utc>,
    delivery_cost: Decimal,
    order_total: Decimal,
    grand_total: Decimal,
    original_bag: Json<Bag>,
    stripe_pid: String,
}

#[derive(sqlx::FromRow)]
struct LineItemRow {
    id: Uuid,
    order_id: Uuid,
    product_id: Uuid,
    product_name: String,
    sku: Option<String>,
    quantity: i32,
    lineitem_total: Decimal,
}

impl From<LineItemRow> for OrderLineItem {
    fn from(r: LineItemRow) -> Self {
        Self {
            id: r.id, product_id: r.product_id, product_name: r.product_name, sku: r.sku,
            quantity: u32::try_from(r.quantity).unwrap_or_default(), lineitem_total: r.lineitem_total,
        }
    }
}

impl OrderRow {
    fn into_order(self, line_items: Vec<OrderLineItem>) -> Order {
        Order {
            id: self.id,
            order_number: OrderNumber::from_stored(self.order_number),
            user_id: self.user_id,
            full_name: self.full_name,
            email: self.email,
            phone_number: self.phone_number,
            country: self.country,
            postcode: self.postcode,
            town_or_city: self.town_or_city,
            street_address1: self.street_address1,
            street_address2: self.street_address2,
            date: self.date,
            delivery_cost: self.delivery_cost,
            order_total: self.order_total,
            grand_total: self.grand_total,
            original_bag: self.original_bag.0,
            stripe_pid: self.stripe_pid,
            line_items,
            events: vec![],
        }
    }
}

#[derive(sqlx::FromRow)]
struct NewsRow {
    id: Uuid,
    title: String,
    slug: String,
    author_id: Uuid,
    content: String,
    status: String,
    created_on: DateTime<Utc>,
    updated_on: DateTime<Utc>,
}

impl TryFrom<NewsRow> for News {
    type Error = StoreError;
    fn try_from(r: NewsRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id, title: r.title, slug: r.slug, author_id: r.author_id, content: r.content,
            status: r.status.parse::<NewsStatus>().map_err(StoreError::Backend)?,
            created_on: r.created_on, updated_on: r.updated_on,
        })
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn categories(&self) -> StoreResult<Vec<Category>> {
        Ok(sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name").fetch_all(&self.db).await?)
    }

    async fn insert_category(&self, category: Category) -> StoreResult<()> {
        sqlx::query("INSERT INTO categories (id, name, friendly_name) VALUES ($1, $2, $3)")
            .bind(category.id).bind(&category.name).bind(&category.friendly_name)
            .execute(&self.db).await?;
        Ok(())
    }

    async fn category(&self, id: Uuid) -> StoreResult<Option<Category>> {
        Ok(sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1").bind(id).fetch_optional(&self.db).await?)
    }

    async fn products(&self) -> StoreResult<Vec<Product>> {
        Ok(sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY id").fetch_all(&self.db).await?)
    }

    async fn products_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Product>> {
        Ok(sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ANY($1)").bind(ids).fetch_all(&self.db).await?)
    }

    async fn product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(&self.db).await?)
    }

    async fn insert_product(&self, p: Product) -> StoreResult<()> {
        sqlx::query("INSERT INTO products (id, category_id, sku, name, description, price, rating, image_url, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)")
            .bind(p.id).bind(p.category_id).bind(&p.sku).bind(&p.name).bind(&p.description)
            .bind(p.price).bind(p.rating).bind(&p.image_url).bind(p.created_at).bind(p.updated_at)
            .execute(&self.db).await?;
        Ok(())
    }

    async fn update_product(&self, p: Product) -> StoreResult<bool> {
        let res = sqlx::query("UPDATE products SET category_id = $2, sku = $3, name = $4, description = $5, price = $6, rating = $7, image_url = $8, updated_at = $9 WHERE id = $1")
            .bind(p.id).bind(p.category_id).bind(&p.sku).bind(&p.name).bind(&p.description)
            .bind(p.price).bind(p.rating).bind(&p.image_url).bind(p.updated_at)
            .execute(&self.db).await?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_product(&self, id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.db).await?;
        Ok(res.rows_affected() > 0)
    }

    async fn reviews_for(&self, product_id: Uuid) -> StoreResult<Vec<ProductReview>> {
        Ok(sqlx::query_as::<_, ProductReview>("SELECT * FROM product_reviews WHERE product_id = $1 ORDER BY created_on DESC, id DESC")
            .bind(product_id).fetch_all(&self.db).await?)
    }

    async fn review(&self, id: Uuid) -> StoreResult<Option<ProductReview>> {
        Ok(sqlx::query_as::<_, ProductReview>("SELECT * FROM product_reviews WHERE id = $1").bind(id).fetch_optional(&self.db).await?)
    }

    async fn insert_review(&self, r: ProductReview) -> StoreResult<()> {
        sqlx::query("INSERT INTO product_reviews (id, product_id, user_id, username, stars, content, created_on) VALUES ($1, $2, $3, $4, $5, $6, $7)")
            .bind(r.id).bind(r.product_id).bind(r.user_id).bind(&r.username).bind(r.stars).bind(&r.content).bind(r.created_on)
            .execute(&self.db).await?;
        Ok(())
    }

    async fn delete_review(&self, id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM product_reviews WHERE id = $1").bind(id).execute(&self.db).await?;
        Ok(res.rows_affected() > 0)
    }
}

impl PgStore {
    async fn with_line_items(&self, rows: Vec<OrderRow>) -> StoreResult<Vec<Order>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let items = sqlx::query_as::<_, LineItemRow>("SELECT * FROM order_line_items WHERE order_id = ANY($1) ORDER BY id")
            .bind(&ids).fetch_all(&self.db).await?;
        let mut by_order: HashMap<Uuid, Vec<OrderLineItem>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item.into());
        }
        Ok(rows.into_iter().map(|r| { let items = by_order.remove(&r.id).unwrap_or_default(); r.into_order(items) }).collect())
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn insert_order(&self, o: &Order) -> StoreResult<()> {
        let mut tx = self.db.begin().await?;
        sqlx::query("INSERT INTO orders (id, order_number, user_id, full_name, email, phone_number, country, postcode, town_or_city, street_address1, street_address2, date, delivery_cost, order_total, grand_total, original_bag, stripe_pid) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)")
            .bind(o.id).bind(o.order_number.as_str()).bind(o.user_id).bind(&o.full_name).bind(&o.email)
            .bind(&o.phone_number).bind(&o.country).bind(&o.postcode).bind(&o.town_or_city)
            .bind(&o.street_address1).bind(&o.street_address2).bind(o.date)
            .bind(o.delivery_cost).bind(o.order_total).bind(o.grand_total)
            .bind(Json(&o.original_bag)).bind(&o.stripe_pid)
            .execute(&mut *tx).await?;
        for item in &o.line_items {
            let quantity = i32::try_from(item.quantity).map_err(|e| StoreError::Backend(e.to_string()))?;
            sqlx::query("INSERT INTO order_line_items (id, order_id, product_id, product_name, sku, quantity, lineitem_total) VALUES ($1, $2, $3, $4, $5, $6, $7)")
                .bind(item.id).bind(o.id).bind(item.product_id).bind(&item.product_name).bind(&item.sku)
                .bind(quantity).bind(item.lineitem_total)
                .execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn order_by_number(&self, order_number: &str) -> StoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE order_number = $1")
            .bind(order_number).fetch_optional(&self.db).await?;
        match row {
            Some(row) => Ok(self.with_line_items(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn assign_order_owner(&self, order_number: &str, user_id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query("UPDATE orders SET user_id = $2 WHERE order_number = $1")
            .bind(order_number).bind(user_id).execute(&self.db).await?;
        Ok(res.rows_affected() > 0)
    }

    async fn orders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE user_id = $1 ORDER BY date DESC, id DESC")
            .bind(user_id).fetch_all(&self.db).await?;
        self.with_line_items(rows).await
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn insert_user(&self, u: User) -> StoreResult<()> {
        let mut tx = self.db.begin().await?;
        sqlx::query("INSERT INTO users (id, username, email, is_superuser, token, created_at) VALUES ($1, $2, $3, $4, $5, $6)")
            .bind(u.id).bind(&u.username).bind(&u.email).bind(u.is_superuser).bind(&u.token).bind(u.created_at)
            .execute(&mut *tx).await?;
        sqlx::query("INSERT INTO user_profiles (user_id) VALUES ($1)").bind(u.id).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn user_by_token(&self, token: &str) -> StoreResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE token = $1").bind(token).fetch_optional(&self.db).await?)
    }

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1").bind(username).fetch_optional(&self.db).await?)
    }

    async fn profile(&self, user_id: Uuid) -> StoreResult<Option<UserProfile>> {
        Ok(sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE user_id = $1").bind(user_id).fetch_optional(&self.db).await?)
    }

    async fn save_profile(&self, p: UserProfile) -> StoreResult<()> {
        sqlx::query("INSERT INTO user_profiles (user_id, default_phone_number, default_country, default_postcode, default_town_or_city, default_street_address1, default_street_address2) VALUES ($1, $2, $3, $4, $5, $6, $7) \
                     ON CONFLICT (user_id) DO UPDATE SET default_phone_number = $2, default_country = $3, default_postcode = $4, default_town_or_city = $5, default_street_address1 = $6, default_street_address2 = $7")
            .bind(p.user_id).bind(&p.default_phone_number).bind(&p.default_country).bind(&p.default_postcode)
            .bind(&p.default_town_or_city).bind(&p.default_street_address1).bind(&p.default_street_address2)
            .execute(&self.db).await?;
        Ok(())
    }
}

#[async_trait]
impl NewsStore for PgStore {
    async fn news(&self, filter: &NewsFilter) -> StoreResult<Vec<News>> {
        let pattern = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()).map(|q| format!("%{q}%"));
        let rows = sqlx::query_as::<_, NewsRow>("SELECT * FROM news WHERE ($1::TEXT IS NULL OR status = $1) AND ($2::TEXT IS NULL OR title ILIKE $2 OR content ILIKE $2) ORDER BY created_on DESC, id DESC")
            .bind(filter.status.map(|s| s.as_str())).bind(pattern)
            .fetch_all(&self.db).await?;
        rows.into_iter().map(News::try_from).collect()
    }

    async fn news_by_slug(&self, slug: &str) -> StoreResult<Option<News>> {
        let row = sqlx::query_as::<_, NewsRow>("SELECT * FROM news WHERE slug = $1").bind(slug).fetch_optional(&self.db).await?;
        row.map(News::try_from).transpose()
    }

    async fn news_by_id(&self, id: Uuid) -> StoreResult<Option<News>> {
        let row = sqlx::query_as::<_, NewsRow>("SELECT * FROM news WHERE id = $1").bind(id).fetch_optional(&self.db).await?;
        row.map(News::try_from).transpose()
    }

    async fn insert_news(&self, n: News) -> StoreResult<()> {
        sqlx::query("INSERT INTO news (id, title, slug, author_id, content, status, created_on, updated_on) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)")
            .bind(n.id).bind(&n.title).bind(&n.slug).bind(n.author_id).bind(&n.content).bind(n.status.as_str())
            .bind(n.created_on).bind(n.updated_on)
            .execute(&self.db).await?;
        Ok(())
    }

    async fn update_news(&self, n: News) -> StoreResult<bool> {
        let res = sqlx::query("UPDATE news SET title = $2, slug = $3, content = $4, status = $5, updated_on = $6 WHERE id = $1")
            .bind(n.id).bind(&n.title).bind(&n.slug).bind(&n.content).bind(n.status.as_str()).bind(n.updated_on)
            .execute(&self.db).await?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_news(&self, id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM news WHERE id = $1").bind(id).execute(&self.db).await?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn load_session(&self, key: &str) -> StoreResult<SessionData> {
        let row: Option<(Json<SessionData>,)> = sqlx::query_as("SELECT data FROM sessions WHERE session_key = $1")
            .bind(key).fetch_optional(&self.db).await?;
        Ok(row.map(|(data,)| data.0).unwrap_or_default())
    }

    async fn save_session(&self, key: &str, data: &SessionData) -> StoreResult<()> {
        sqlx::query("INSERT INTO sessions (session_key, data, updated_at) VALUES ($1, $2, NOW()) ON CONFLICT (session_key) DO UPDATE SET data = $2, updated_at = NOW()")
            .bind(key).bind(Json(data)).execute(&self.db).await?;
        Ok(())
    }
}
