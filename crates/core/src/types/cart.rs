//! Cart and line-item records.
//!
//! A cart is an ordered collection of line items, unique by product.
//! Aggregates (`total`, `item_count`) are always derived from the items,
//! never stored as independent truth.

use serde::{Deserialize, Serialize};

use crate::types::id::ProductId;
use crate::types::price::{CurrencyCode, Price};

/// Display data captured from the catalog at add-to-cart time.
///
/// The name and price may go stale if the product changes later; the
/// authoritative values are always re-fetched before checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Display name at time of add.
    pub name: String,
    /// Unit price at time of add.
    pub unit_price: Price,
    /// Optional display image reference.
    pub image_url: Option<String>,
}

/// A single line in a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Catalog product this line refers to.
    pub product_id: ProductId,
    /// Display name captured at time of add.
    pub name: String,
    /// Positive quantity, always >= 1.
    pub quantity: u32,
    /// Unit price captured at time of add.
    pub unit_price: Price,
    /// Optional display image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl CartItem {
    /// Build a line item from a catalog snapshot.
    #[must_use]
    pub fn from_snapshot(product_id: ProductId, quantity: u32, snapshot: &ProductSnapshot) -> Self {
        Self {
            product_id,
            name: snapshot.name.clone(),
            quantity,
            unit_price: snapshot.unit_price,
            image_url: snapshot.image_url.clone(),
        }
    }

    /// Line total: unit price × quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// An ordered cart, unique by product.
///
/// Invariants:
/// - no two items share a `product_id` (adds merge into the existing line)
/// - every item's quantity is >= 1 (quantity 0 means removal)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    /// Line items, in insertion order.
    pub items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self { items: Vec::new() }
    }

    /// Whether the cart has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find a line by product.
    #[must_use]
    pub fn find(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.product_id == product_id)
    }

    /// Total units across all lines (the badge-count convention).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Sum of line totals. Empty carts total zero in the default currency.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items
            .iter()
            .map(CartItem::line_total)
            .reduce(|acc, p| acc.plus(&p))
            .unwrap_or_else(|| Price::zero(CurrencyCode::default()))
    }

    /// Merge a quantity into an existing line, or append a new one built
    /// from the snapshot. Returns the resulting quantity for the product.
    pub fn merge_add(
        &mut self,
        product_id: ProductId,
        quantity: u32,
        snapshot: &ProductSnapshot,
    ) -> u32 {
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id)
        {
            item.quantity = item.quantity.saturating_add(quantity);
            return item.quantity;
        }
        self.items
            .push(CartItem::from_snapshot(product_id, quantity, snapshot));
        quantity
    }

    /// Set the quantity of an existing line. Returns `false` when no line
    /// matches the product. Callers must reject `quantity == 0` first.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) -> bool {
        match self
            .items
            .iter_mut()
            .find(|i| &i.product_id == product_id)
        {
            Some(item) => {
                item.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Remove a line. Returns `false` when no line matches the product.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| &i.product_id != product_id);
        self.items.len() != before
    }
}
