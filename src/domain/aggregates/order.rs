//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use crate::domain::aggregates::bag::Bag;
use crate::domain::aggregates::product::Product;
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::{validate_country_code, DeliveryPolicy, OrderNumber};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: OrderNumber,
    pub user_id: Option<Uuid>,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub country: String,
    pub postcode: String,
    pub town_or_city: String,
    pub street_address1: String,
    pub street_address2: Option<String>,
    pub date: DateTime<Utc>,
    pub delivery_cost: Decimal,
    pub order_total: Decimal,
    pub grand_total: Decimal,
    pub original_bag: Bag,
    pub stripe_pid: String,
    pub line_items: Vec<OrderLineItem>,
    #[serde(skip)]
    pub(crate) events: Vec<DomainEvent>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderLineItem { pub id: Uuid, pub product_id: Uuid, pub product_name: String, pub sku: Option<String>, pub quantity: u32, pub lineitem_total: Decimal }

impl OrderLineItem {
    pub fn for_product(product: &Product, quantity: u32) -> Result<Self, OrderError> {
        let lineitem_total = product.price.checked_mul(Decimal::from(quantity)).ok_or(OrderError::TotalOverflow)?;
        Ok(Self {
            id: Uuid::now_v7(), product_id: product.id, product_name: product.name.clone(), sku: product.sku.clone(),
            quantity, lineitem_total,
        })
    }
}

/// Delivery details submitted at checkout.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
pub struct OrderForm {
    #[validate(length(min = 1, max = 40))]
    pub full_name: String,
    #[validate(email, length(max = 100))]
    pub email: String,
    #[validate(length(min = 1, max = 20))]
    pub phone_number: String,
    #[validate(custom = "validate_country_code")]
    pub country: String,
    #[validate(length(min = 1, max = 20))]
    pub postcode: String,
    #[validate(length(min = 1, max = 40))]
    pub town_or_city: String,
    #[validate(length(min = 1, max = 80))]
    pub street_address1: String,
    #[validate(length(max = 80))]
    pub street_address2: Option<String>,
    #[serde(default)]
    pub save_info: bool,
    pub client_secret: Option<String>,
}

impl Order {
    /// Builds an order from the session bag. Every bag entry must resolve to a product.
    pub fn place(form: OrderForm, bag: &Bag, products: &[Product], policy: &DeliveryPolicy, user_id: Option<Uuid>) -> Result<Self, OrderError> {
        if bag.is_empty() { return Err(OrderError::EmptyBag); }
        let stripe_pid = form.client_secret.as_deref().and_then(|s| s.split("_secret").next()).unwrap_or_default().to_string();
        let mut order = Self {
            id: Uuid::now_v7(), order_number: OrderNumber::generate(), user_id,
            full_name: form.full_name, email: form.email, phone_number: form.phone_number, country: form.country,
            postcode: form.postcode, town_or_city: form.town_or_city, street_address1: form.street_address1,
            street_address2: form.street_address2.filter(|s| !s.trim().is_empty()),
            date: Utc::now(), delivery_cost: Decimal::ZERO, order_total: Decimal::ZERO, grand_total: Decimal::ZERO,
            original_bag: bag.clone(), stripe_pid, line_items: vec![], events: vec![],
        };
        for (item_id, quantity) in bag.iter() {
            let product = products.iter().find(|p| p.id == *item_id).ok_or(OrderError::ProductMissing(*item_id))?;
            order.line_items.push(OrderLineItem::for_product(product, *quantity)?);
        }
        order.update_total(policy)?;
        order.raise_event(DomainEvent::Order(OrderEvent::Placed {
            order_number: order.order_number.to_string(), email: order.email.clone(), grand_total: order.grand_total,
        }));
        Ok(order)
    }

    pub fn update_total(&mut self, policy: &DeliveryPolicy) -> Result<(), OrderError> {
        self.order_total = self
            .line_items
            .iter()
            .try_fold(Decimal::ZERO, |acc, i| acc.checked_add(i.lineitem_total))
            .ok_or(OrderError::TotalOverflow)?;
        self.delivery_cost = policy.delivery_for(self.order_total);
        self.grand_total = self.order_total.checked_add(self.delivery_cost).ok_or(OrderError::TotalOverflow)?;
        Ok(())
    }

    pub fn attach_to(&mut self, user_id: Uuid) { self.user_id = Some(user_id); }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("There's nothing in your bag at the moment")]
    EmptyBag,
    #[error("Product {0} not found")]
    ProductMissing(Uuid),
    #[error("Order total is too large")]
    TotalOverflow,
}
