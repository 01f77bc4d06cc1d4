//! Domain events
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "aggregate", content = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    Product(ProductEvent),
    Order(OrderEvent),
    News(NewsEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProductEvent {
    Created { product_id: Uuid, name: String },
    Updated { product_id: Uuid },
    Deleted { product_id: Uuid },
    ReviewPosted { product_id: Uuid, review_id: Uuid, stars: i16 },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_number: String, email: String, grand_total: Decimal },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NewsEvent {
    Published { news_id: Uuid, slug: String },
}

impl DomainEvent {
    /// Bus subject, `storefront.<aggregate>.<event>`.
    pub fn subject(&self) -> String {
        let (aggregate, event) = match self {
            Self::Product(ProductEvent::Created { .. }) => ("product", "created"),
            Self::Product(ProductEvent::Updated { .. }) => ("product", "updated"),
            Self::Product(ProductEvent::Deleted { .. }) => ("product", "deleted"),
            Self::Product(ProductEvent::ReviewPosted { .. }) => ("product", "review_posted"),
            Self::Order(OrderEvent::Placed { .. }) => ("order", "placed"),
            Self::News(NewsEvent::Published { .. }) => ("news", "published"),
        };
        format!("storefront.{aggregate}.{event}")
    }
}
