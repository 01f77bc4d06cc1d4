//! Bag Aggregate
//!
//! The shopping bag lives in the visitor's session as a map of product id to
//! quantity. Prices are only looked up when the contents are computed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use crate::domain::aggregates::product::Product;
use crate::domain::value_objects::DeliveryPolicy;

/// Largest quantity of a single item; keeps a line total within `NUMERIC(10, 2)`.
pub const MAX_QUANTITY: u32 = 9_999;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bag {
    items: BTreeMap<Uuid, u32>,
}

/// Outcome of a bag mutation, used to word the flash message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BagChange {
    Added { quantity: u32 },
    Updated { quantity: u32 },
    Removed,
}

impl Bag {
    pub fn new() -> Self { Self::default() }

    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn len(&self) -> usize { self.items.len() }
    pub fn quantity(&self, item_id: &Uuid) -> Option<u32> { self.items.get(item_id).copied() }
    pub fn iter(&self) -> impl Iterator<Item = (&Uuid, &u32)> { self.items.iter() }
    pub fn item_ids(&self) -> Vec<Uuid> { self.items.keys().copied().collect() }

    pub fn add(&mut self, item_id: Uuid, quantity: i64) -> Result<BagChange, BagError> {
        let quantity = positive(quantity)?;
        match self.items.get_mut(&item_id) {
            Some(existing) => {
                let merged = existing.checked_add(quantity).filter(|q| *q <= MAX_QUANTITY).ok_or(BagError::InvalidQuantity)?;
                *existing = merged;
                Ok(BagChange::Updated { quantity: merged })
            }
            None => {
                self.items.insert(item_id, quantity);
                Ok(BagChange::Added { quantity })
            }
        }
    }

    /// Sets the quantity; zero or less removes the item.
    pub fn adjust(&mut self, item_id: Uuid, quantity: i64) -> Result<BagChange, BagError> {
        if quantity > 0 {
            let quantity = positive(quantity)?;
            self.items.insert(item_id, quantity);
            Ok(BagChange::Updated { quantity })
        } else {
            self.remove(item_id)?;
            Ok(BagChange::Removed)
        }
    }

    pub fn remove(&mut self, item_id: Uuid) -> Result<u32, BagError> {
        self.items.remove(&item_id).ok_or(BagError::ItemNotInBag)
    }

    pub fn retain_known(&mut self, known: &[Uuid]) { self.items.retain(|id, _| known.contains(id)); }

    pub fn clear(&mut self) { self.items.clear(); }
}

fn positive(quantity: i64) -> Result<u32, BagError> {
    u32::try_from(quantity).ok().filter(|q| (1..=MAX_QUANTITY).contains(q)).ok_or(BagError::InvalidQuantity)
}

#[derive(Clone, Debug, Serialize)]
pub struct BagLine {
    pub item_id: Uuid,
    pub quantity: u32,
    pub product: Product,
    pub subtotal: Decimal,
}

#[derive(Clone, Debug, Serialize)]
pub struct BagContents {
    pub bag_items: Vec<BagLine>,
    pub total: Decimal,
    pub product_count: u32,
    pub delivery: Decimal,
    pub free_delivery_delta: Decimal,
    pub free_delivery_threshold: Decimal,
    pub grand_total: Decimal,
}

impl BagContents {
    /// Prices the bag against the catalog. Entries whose product is gone are skipped.
    pub fn compute(bag: &Bag, products: &[Product], policy: &DeliveryPolicy) -> Result<Self, BagError> {
        let mut bag_items = Vec::with_capacity(bag.len());
        let mut total = Decimal::ZERO;
        let mut product_count = 0u32;

        for (item_id, quantity) in bag.iter() {
            let Some(product) = products.iter().find(|p| p.id == *item_id) else { continue };
            let subtotal = product.price.checked_mul(Decimal::from(*quantity)).ok_or(BagError::TotalOverflow)?;
            total = total.checked_add(subtotal).ok_or(BagError::TotalOverflow)?;
            product_count = product_count.saturating_add(*quantity);
            bag_items.push(BagLine { item_id: *item_id, quantity: *quantity, product: product.clone(), subtotal });
        }

        let delivery = policy.delivery_for(total);
        Ok(Self {
            bag_items,
            total,
            product_count,
            delivery,
            free_delivery_delta: policy.free_delivery_delta(total),
            free_delivery_threshold: policy.free_delivery_threshold,
            grand_total: total.checked_add(delivery).ok_or(BagError::TotalOverflow)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BagError {
    #[error("Item not in bag")]
    ItemNotInBag,
    #[error("Quantity must be a whole number between 1 and 9999")]
    InvalidQuantity,
    #[error("Bag total is too large")]
    TotalOverflow,
}
